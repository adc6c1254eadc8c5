//! PLC Common Library
//!
//! Shared types for the PLC runtime workspace: the glue variable binding
//! between located variables and the program image, the service contract
//! driven around the scan cycle, and configuration loading.
//!
//! # Module Structure
//!
//! - [`glue`] - Location codec, glue table, bool grouping, binding + lock
//! - [`service`] - Service trait, lifecycle states and errors
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Addressing limits and defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use plc_common::prelude::*;
//!
//! let start = AtomicBool::new(false);
//! let table = vec![GlueVariable::located("%IX0.1", ValueType::Bool, &start).unwrap()];
//! let binding = GlueVariablesBinding::new(table, "c0ffee").unwrap();
//!
//! let var = binding.find_location("%IX0.1").unwrap();
//! let guard = binding.lock();
//! assert_eq!(var.read(&guard), GlueValue::Bool(false));
//! ```

pub mod config;
pub mod consts;
pub mod glue;
pub mod prelude;
pub mod service;
