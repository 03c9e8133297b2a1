//! Query module
//!
//! The UDF operations served to the HTTP layer.

pub mod engine;
pub mod types;

pub use engine::*;
pub use types::*;
