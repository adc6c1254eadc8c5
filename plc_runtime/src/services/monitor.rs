//! Variable monitor service.
//!
//! Watches a configured list of located variables and logs their values
//! every N scan cycles. Values are copied out under the binding lock and
//! logged after it is released.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use plc_common::glue::{GlueValue, GlueVariable, GlueVariablesBinding, Location};
use plc_common::service::{ServiceDefinition, ServiceError};
use tracing::{debug, info};

use crate::config::MonitorConfig;

/// Service name used when registering the monitor.
pub const MONITOR_SERVICE_NAME: &str = "monitor";

/// Periodic logger for a fixed set of glue variables.
pub struct MonitorService<'b> {
    name: String,
    binding: &'b GlueVariablesBinding<'b>,
    addresses: Vec<String>,
    every_n_cycles: u64,
    watched: OnceLock<Vec<&'b GlueVariable<'b>>>,
    cycles: AtomicU64,
    stopped: AtomicBool,
    snapshot: Mutex<Vec<(Location, GlueValue)>>,
}

impl<'b> MonitorService<'b> {
    /// Create a monitor over `binding`. Addresses are resolved in `init()`.
    pub fn new(binding: &'b GlueVariablesBinding<'b>, config: &MonitorConfig) -> Self {
        Self {
            name: MONITOR_SERVICE_NAME.to_string(),
            binding,
            addresses: config.addresses.clone(),
            every_n_cycles: config.every_n_cycles.max(1),
            watched: OnceLock::new(),
            cycles: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            snapshot: Mutex::new(Vec::new()),
        }
    }

    /// Values captured at the most recent sampling cycle.
    pub fn snapshot(&self) -> Vec<(Location, GlueValue)> {
        self.snapshot.lock().clone()
    }

    /// Scan cycles observed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    fn resolve(&self) -> Result<Vec<&'b GlueVariable<'b>>, ServiceError> {
        let binding: &'b GlueVariablesBinding<'b> = self.binding;
        self.addresses
            .iter()
            .map(|addr| -> Result<&'b GlueVariable<'b>, ServiceError> {
                let location: Location = addr
                    .parse()
                    .map_err(|e| ServiceError::ConfigError(format!("{addr:?}: {e}")))?;
                binding
                    .find_key(&location)
                    .ok_or_else(|| ServiceError::LocationNotBound(location.to_string()))
            })
            .collect()
    }
}

impl ServiceDefinition for MonitorService<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> Result<(), ServiceError> {
        let resolved = self.resolve()?;
        info!(
            "Monitor watching {} variables every {} cycles",
            resolved.len(),
            self.every_n_cycles
        );
        self.watched
            .set(resolved)
            .map_err(|_| ServiceError::InitFailed("monitor already initialized".to_string()))
    }

    fn after_cycle(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        if cycle % self.every_n_cycles != 0 {
            return;
        }
        let Some(watched) = self.watched.get() else {
            return;
        };

        let values: Vec<(Location, GlueValue)> = {
            let guard = self.binding.lock();
            watched
                .iter()
                .map(|v| (v.location(), v.read(&guard)))
                .collect()
        };

        for (location, value) in &values {
            info!("[cycle {}] {} = {}", cycle, location, value);
        }
        *self.snapshot.lock() = values;
    }

    fn finalize(&self) -> Result<(), ServiceError> {
        debug!("Monitor finalized after {} cycles", self.cycles());
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}
