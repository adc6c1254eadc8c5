//! System-wide constants for the PLC runtime workspace.
//!
//! Single source of truth for addressing limits and default paths.
//! Imported by all crates: no duplication permitted.

use static_assertions::const_assert_eq;

/// Number of bit lanes in one boolean group (one byte).
pub const BOOL_GROUP_WIDTH: usize = 8;

/// Highest minor (bit) index accepted in a location, e.g. `%IX0.7`.
///
/// Tied to [`BOOL_GROUP_WIDTH`]: a bit address names one lane of a group.
pub const MAX_LSI: u8 = (BOOL_GROUP_WIDTH - 1) as u8;

/// Highest major index accepted in a location.
pub const MAX_MSI: u16 = u16::MAX;

/// Maximum length of a service name in bytes.
pub const MAX_SERVICE_NAME_SIZE: usize = 512;

/// Default scan cycle time in microseconds (100 Hz = 10 000 µs).
pub const CYCLE_TIME_US: u64 = 10_000;

/// Default runtime configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/plc/runtime.toml";

/// Default glue map file (generator output).
pub const DEFAULT_GLUE_PATH: &str = "/etc/plc/glue.toml";

const_assert_eq!(MAX_LSI as usize + 1, BOOL_GROUP_WIDTH);
