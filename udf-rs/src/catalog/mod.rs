//! Symbol catalog module
//!
//! Loads the exchange instrument list and publishes it as immutable snapshots.

pub mod loader;
pub mod snapshot;
pub mod symbol;

pub use loader::*;
pub use snapshot::*;
pub use symbol::*;
