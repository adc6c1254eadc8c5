//! # PLC Runtime Library
//!
//! Scan-cycle orchestration around a glue variable binding.
//!
//! The runtime binds the located variables of a control program, runs the
//! program every scan cycle and drives auxiliary services through their
//! lifecycle hooks around it.
//!
//! # Module Structure
//!
//! - [`config`] - `runtime.toml` and `glue.toml` schemas
//! - [`core`] - RuntimeCore, scan loop, checksum policy
//! - [`error`] - Bootstrap errors
//! - [`image`] - Storage cells backing the glue table
//! - [`program`] - Control program seam
//! - [`service_registry`] - Service catalog and lifecycle
//! - [`services`] - Built-in services
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     plc_runtime (single crate)                   │
//! │  ┌──────────────┐    ┌──────────────┐    ┌────────────────────┐  │
//! │  │ ProcessImage │◄───│ Glue Binding │◄───│  Service Registry  │  │
//! │  │  (cells)     │    │  (+ lock)    │    │  (monitor, ...)    │  │
//! │  └──────────────┘    └──────▲───────┘    └─────────▲──────────┘  │
//! │                             │                      │             │
//! │                      ┌──────┴──────────────────────┴──┐          │
//! │                      │     RuntimeCore (scan loop)    │          │
//! │                      └──────────────┬─────────────────┘          │
//! │                                     ▼                            │
//! │                            ┌────────────────┐                    │
//! │                            │ ControlProgram │ (trait)            │
//! │                            └────────────────┘                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod core;
pub mod error;
pub mod image;
pub mod program;
pub mod service_registry;
pub mod services;

// Re-export key types for convenience
pub use crate::config::{GlueMap, MonitorConfig, RuntimeConfig, RuntimeSection};
pub use crate::core::{CycleStats, RuntimeCore, check_checksum};
pub use crate::error::{RuntimeError, RuntimeResult};
pub use crate::image::ProcessImage;
pub use crate::program::{ControlProgram, LoopbackProgram};
pub use crate::service_registry::{LifecycleReport, RegistryError, ServiceFailure, ServiceRegistry};
pub use crate::services::MonitorService;
