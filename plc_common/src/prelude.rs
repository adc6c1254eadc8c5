//! Prelude module for common re-exports.
//!
//! ```rust
//! use plc_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, Validate};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{BOOL_GROUP_WIDTH, CYCLE_TIME_US, MAX_LSI, MAX_SERVICE_NAME_SIZE};

// ─── Glue ───────────────────────────────────────────────────────────
pub use crate::glue::{
    BoolGroup, Direction, GlueError, GlueGuard, GlueValue, GlueVariable, GlueVariablesBinding,
    Location, SizeClass, ValueType,
};

// ─── Services ───────────────────────────────────────────────────────
pub use crate::service::{ServiceDefinition, ServiceError, ServiceState};
