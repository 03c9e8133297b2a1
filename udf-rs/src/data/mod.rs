//! Data model module
//!
//! Resolution table, market segment and the OHLC series wire format.

pub mod market;
pub mod ohlc;
pub mod resolution;

pub use market::*;
pub use ohlc::*;
pub use resolution::*;
