//! Dynamic query construction: validated, immutable plans over a resolved record type.

mod builder;
pub mod plan;
pub use builder::*;
pub use plan::*;
