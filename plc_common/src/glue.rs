//! Glue variables: the mapping between located controller variables
//! (`%IX0.1`, `%QW12`, `%MD3`) and the storage cells of the program image.
//!
//! - [`location`] - address codec
//! - [`value`] - IEC value types and typed values
//! - [`variable`] - variable descriptors and borrowed cells
//! - [`bool_group`] - byte-wide grouping of boolean cells
//! - [`binding`] - lookup façade and the value lock

pub mod binding;
pub mod bool_group;
pub mod location;
pub mod value;
pub mod variable;

pub use binding::{GlueGuard, GlueVariablesBinding};
pub use bool_group::{BoolGroup, group_bits};
pub use location::{Direction, Location, LocationError, SizeClass};
pub use value::{GlueValue, ValueType};
pub use variable::{BitRef, GlueCell, GlueError, GlueVariable};
