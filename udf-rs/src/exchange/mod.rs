//! Exchange integration module
//!
//! Binance metadata client and kline chart feeds for spot and futures.

pub mod chart;
pub mod client;
pub mod feed;
pub mod streaming;

pub use chart::*;
pub use client::*;
pub use feed::*;
pub use streaming::*;
