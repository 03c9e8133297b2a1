//! Candle cache module

pub mod ohlc_cache;
pub mod store;

pub use ohlc_cache::*;
pub use store::*;
