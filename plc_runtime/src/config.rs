//! Runtime configuration (`runtime.toml`) and the glue map (`glue.toml`).
//!
//! The glue map stands in for the code generator's output: the table of
//! located variables and the checksum of its generation.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "plc-runtime"
//! log_level = "info"
//!
//! [runtime]
//! cycle_time_us = 10000
//! expected_checksum = "5f1d2c"
//! strict_checksum = false
//!
//! [monitor]
//! enabled = true
//! addresses = ["%IX0.0", "%QX0.0", "%MD0"]
//! every_n_cycles = 100
//! ```

use serde::{Deserialize, Serialize};

use plc_common::config::{ConfigError, SharedConfig, Validate};
use plc_common::consts::CYCLE_TIME_US;
use plc_common::glue::{Location, ValueType};

// ─── runtime.toml ───────────────────────────────────────────────────

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Common settings shared with other binaries.
    pub shared: SharedConfig,
    /// Scan-cycle settings.
    #[serde(default)]
    pub runtime: RuntimeSection,
    /// Built-in monitor service.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Scan-cycle and bootstrap policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RuntimeSection {
    /// Scan cycle period [µs].
    pub cycle_time_us: u64,
    /// Stop after this many cycles. Runs until interrupted when absent.
    pub max_cycles: Option<u64>,
    /// Checksum recorded for the expected glue generation.
    pub expected_checksum: Option<String>,
    /// Refuse to start on checksum mismatch instead of warning.
    pub strict_checksum: bool,
    /// Refuse to start when any service fails to initialize.
    pub require_all_services: bool,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
            max_cycles: None,
            expected_checksum: None,
            strict_checksum: false,
            require_all_services: false,
        }
    }
}

/// Built-in variable monitor service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MonitorConfig {
    /// Register the monitor at startup.
    pub enabled: bool,
    /// Locations to watch, e.g. `%IX0.0`.
    pub addresses: Vec<String>,
    /// Log the watched values every N scan cycles.
    pub every_n_cycles: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addresses: Vec::new(),
            every_n_cycles: 100,
        }
    }
}

impl Validate for RuntimeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.runtime.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "runtime.cycle_time_us must be > 0".to_string(),
            ));
        }
        if self.monitor.enabled {
            if self.monitor.every_n_cycles == 0 {
                return Err(ConfigError::ValidationError(
                    "monitor.every_n_cycles must be > 0".to_string(),
                ));
            }
            for addr in &self.monitor.addresses {
                addr.parse::<Location>().map_err(|e| {
                    ConfigError::ValidationError(format!("monitor address {addr:?}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

// ─── glue.toml ──────────────────────────────────────────────────────

/// Generated glue map: located variables plus generation checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlueMap {
    /// Checksum of the generation that produced this map.
    pub checksum: String,
    /// Located variables, in table order.
    #[serde(default)]
    pub variables: Vec<GlueVarEntry>,
}

/// One located variable of the glue map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlueVarEntry {
    /// Address, e.g. `%QX2.3`.
    pub location: String,
    /// IEC type name, e.g. `"BOOL"`.
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Validate for GlueMap {
    fn validate(&self) -> Result<(), ConfigError> {
        for var in &self.variables {
            let loc: Location = var.location.parse().map_err(|e| {
                ConfigError::ValidationError(format!("glue location {:?}: {e}", var.location))
            })?;
            if var.value_type.size_class() != Some(loc.size()) {
                return Err(ConfigError::ValidationError(format!(
                    "glue location {} cannot hold {}",
                    var.location, var.value_type
                )));
            }
        }
        Ok(())
    }
}
