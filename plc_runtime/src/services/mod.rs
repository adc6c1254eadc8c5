//! Built-in runtime services.
//!
//! - [`monitor`] - Periodic logging of watched glue variables
//!
//! # Adding New Services
//!
//! 1. Create a new submodule under `services/`
//! 2. Implement the `ServiceDefinition` trait from `plc_common::service`
//! 3. Register an instance with the `ServiceRegistry` during bootstrap

pub mod monitor;

pub use monitor::MonitorService;

use plc_common::glue::GlueVariablesBinding;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::error::RuntimeResult;
use crate::service_registry::ServiceRegistry;

/// Build a registry holding the built-in services enabled in `config`.
///
/// # Errors
/// `RuntimeError::Registry` if a service name is rejected.
pub fn builtin_services<'b>(
    binding: &'b GlueVariablesBinding<'b>,
    config: &RuntimeConfig,
) -> RuntimeResult<ServiceRegistry<'b>> {
    let mut registry = ServiceRegistry::new();
    if config.monitor.enabled {
        registry.register(Box::new(MonitorService::new(binding, &config.monitor)))?;
    }
    info!("{} built-in services registered", registry.len());
    Ok(registry)
}
