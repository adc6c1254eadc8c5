//! Service trait and error types.
//!
//! This module defines:
//! - `ServiceDefinition` trait - Interface for auxiliary runtime services
//! - `ServiceError` enum - Failures reported by lifecycle hooks
//! - `ServiceState` enum - Lifecycle phase tracked by the registry

use core::fmt;
use thiserror::Error;

/// Error types reported by service lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Service initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// A configured location is not bound in the glue table
    #[error("Location not bound: {0}")]
    LocationNotBound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Finalization failed
    #[error("Finalization failed: {0}")]
    FinalizeFailed(String),
}

/// Lifecycle phase of a registered service.
///
/// `Uninitialized → Initialized → (BeforeCycle ⇄ AfterCycle)* → Finalized`.
/// `Failed` marks a service whose init hook failed; it never cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceState {
    Uninitialized = 0,
    Initialized = 1,
    BeforeCycle = 2,
    AfterCycle = 3,
    Finalized = 4,
    Failed = 5,
}

impl ServiceState {
    /// Decode a stored discriminant. Unknown values map to `Failed`.
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Uninitialized,
            1 => Self::Initialized,
            2 => Self::BeforeCycle,
            3 => Self::AfterCycle,
            4 => Self::Finalized,
            _ => Self::Failed,
        }
    }

    /// Whether the service takes part in scan-cycle hooks.
    pub const fn is_cycling(self) -> bool {
        matches!(self, Self::Initialized | Self::BeforeCycle | Self::AfterCycle)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::BeforeCycle => "before-cycle",
            Self::AfterCycle => "after-cycle",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Trait defining the interface for auxiliary runtime services
/// (protocol servers, persistence, diagnostics).
///
/// The service registry drives services through this trait. Services get
/// the glue binding at construction, resolve their locations in `init()`
/// and keep the resolved variables for the rest of their life.
///
/// All hooks take `&self`: `stop()` may arrive from another thread while
/// the scan thread is inside a cycle hook, so services keep mutable state
/// behind atomics or locks.
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the control loop starts
/// 2. `before_cycle()` / `after_cycle()` - Called every scan cycle
/// 3. `finalize()` - Called once at shutdown
///
/// `stop()` is a cooperative request and may come at any point after
/// `init()`. The service leaves its cycling work at its next safe point.
///
/// # Timing Contracts
///
/// | Operation | Max Duration | RT Constraint |
/// |-----------|--------------|---------------|
/// | `init()` | unbounded | None (pre-RT) |
/// | `before_cycle()` | short lock burst | **HARD** |
/// | `after_cycle()` | short lock burst | **HARD** |
/// | `finalize()` | unbounded | None (post-RT) |
/// | `stop()` | must not block | Any thread |
pub trait ServiceDefinition: Send + Sync {
    /// Unique service identifier, at most
    /// [`MAX_SERVICE_NAME_SIZE`](crate::consts::MAX_SERVICE_NAME_SIZE) bytes.
    fn name(&self) -> &str;

    /// Initialize the service.
    ///
    /// # Errors
    /// A failure is recorded by the registry; other services are still
    /// initialized and this one never receives cycle hooks.
    fn init(&self) -> Result<(), ServiceError>;

    /// Run before the control program's cycle body.
    ///
    /// Take the binding lock for as long as values are read or written,
    /// never across blocking I/O.
    fn before_cycle(&self) {}

    /// Run after the control program's cycle body.
    fn after_cycle(&self) {}

    /// Release resources at shutdown.
    fn finalize(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Request the service to stop. Must not block.
    fn stop(&self) {}
}

/// Lets a caller keep ownership of a service and register a borrow of it.
impl<T: ServiceDefinition + ?Sized> ServiceDefinition for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn init(&self) -> Result<(), ServiceError> {
        (**self).init()
    }

    fn before_cycle(&self) {
        (**self).before_cycle()
    }

    fn after_cycle(&self) {
        (**self).after_cycle()
    }

    fn finalize(&self) -> Result<(), ServiceError> {
        (**self).finalize()
    }

    fn stop(&self) {
        (**self).stop()
    }
}
