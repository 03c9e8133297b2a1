//! Ingestion module
//!
//! Turns kline chart updates into cached OHLC series.

pub mod pipeline;
pub mod transform;

pub use pipeline::*;
pub use transform::*;
