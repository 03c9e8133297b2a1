//! Market segment (spot or USD-M futures)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Spot,
    Futures,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Futures => "futures",
        }
    }
}

impl Default for Market {
    fn default() -> Self {
        Market::Futures
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spot" => Ok(Market::Spot),
            "futures" => Ok(Market::Futures),
            _ => Err(anyhow::anyhow!("Unsupported market type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_parse() {
        assert_eq!("spot".parse::<Market>().unwrap(), Market::Spot);
        assert_eq!(" FUTURES ".parse::<Market>().unwrap(), Market::Futures);
        assert!("margin".parse::<Market>().is_err());
        assert_eq!(Market::default(), Market::Futures);
    }
}
