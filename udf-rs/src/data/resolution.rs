//! UDF resolution tokens and their Binance kline intervals

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar resolutions supported by the adapter.
///
/// Each variant maps one UDF resolution token (e.g. `"60"`) to one Binance
/// kline interval (e.g. `"1h"`). The mapping is fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H8,
    H12,
    D1,
    D3,
    W1,
    Mo1,
}

impl Resolution {
    /// All resolutions, in the order they are advertised to clients.
    pub const ALL: [Resolution; 15] = [
        Resolution::M1,
        Resolution::M3,
        Resolution::M5,
        Resolution::M15,
        Resolution::M30,
        Resolution::H1,
        Resolution::H2,
        Resolution::H4,
        Resolution::H6,
        Resolution::H8,
        Resolution::H12,
        Resolution::D1,
        Resolution::D3,
        Resolution::W1,
        Resolution::Mo1,
    ];

    /// UDF protocol token.
    pub fn as_udf(&self) -> &'static str {
        match self {
            Resolution::M1 => "1",
            Resolution::M3 => "3",
            Resolution::M5 => "5",
            Resolution::M15 => "15",
            Resolution::M30 => "30",
            Resolution::H1 => "60",
            Resolution::H2 => "120",
            Resolution::H4 => "240",
            Resolution::H6 => "360",
            Resolution::H8 => "480",
            Resolution::H12 => "720",
            Resolution::D1 => "1D",
            Resolution::D3 => "3D",
            Resolution::W1 => "1W",
            Resolution::Mo1 => "1M",
        }
    }

    /// Binance kline interval token.
    pub fn as_interval(&self) -> &'static str {
        match self {
            Resolution::M1 => "1m",
            Resolution::M3 => "3m",
            Resolution::M5 => "5m",
            Resolution::M15 => "15m",
            Resolution::M30 => "30m",
            Resolution::H1 => "1h",
            Resolution::H2 => "2h",
            Resolution::H4 => "4h",
            Resolution::H6 => "6h",
            Resolution::H8 => "8h",
            Resolution::H12 => "12h",
            Resolution::D1 => "1d",
            Resolution::D3 => "3d",
            Resolution::W1 => "1w",
            Resolution::Mo1 => "1M",
        }
    }

    /// Look up a UDF token. Tokens are case-sensitive: `"1M"` is a month,
    /// `"1m"` is not a UDF token at all.
    pub fn from_udf(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_udf() == token)
    }

    /// Look up a Binance interval token.
    pub fn from_interval(interval: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_interval() == interval)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_udf())
    }
}

impl FromStr for Resolution {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_udf(s).ok_or_else(|| anyhow::anyhow!("Unsupported resolution: {}", s))
    }
}

/// Map a UDF resolution token to its kline interval.
pub fn resolution_to_interval(resolution: &str) -> Option<&'static str> {
    Resolution::from_udf(resolution).map(|r| r.as_interval())
}

/// The `supported_resolutions` list shared by the config and every symbol.
pub fn supported_resolutions() -> Vec<String> {
    Resolution::ALL.iter().map(|r| r.as_udf().to_string()).collect()
}
