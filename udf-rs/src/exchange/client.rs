//! Exchange metadata client
//!
//! Fetches the instrument list from Binance `exchangeInfo`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeedError;
use crate::Result;

/// Default metadata endpoint
pub const DEFAULT_EXCHANGE_INFO_URL: &str = "https://api.binance.com/api/v1/exchangeInfo";

/// `exchangeInfo` response; only the fields the catalog reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<Instrument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    /// Present on `PRICE_FILTER` only
    #[serde(default)]
    pub tick_size: Option<String>,
}

/// Source of the exchange instrument list
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_instruments(&self) -> Result<Vec<Instrument>>;
}

/// Binance REST metadata client
#[derive(Debug, Clone)]
pub struct BinanceMetadataClient {
    http: reqwest::Client,
    url: String,
}

impl BinanceMetadataClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn exchange_info(&self) -> std::result::Result<ExchangeInfo, FeedError> {
        debug!("Fetching exchange info from {}", self.url);
        let info = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<ExchangeInfo>()
            .await?;
        Ok(info)
    }
}

#[async_trait]
impl MetadataSource for BinanceMetadataClient {
    async fn fetch_instruments(&self) -> Result<Vec<Instrument>> {
        let info = self.exchange_info().await?;
        Ok(info.symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_info_decoding() {
        let raw = r#"{
            "timezone": "UTC",
            "symbols": [
                {
                    "symbol": "ETHBTC",
                    "status": "TRADING",
                    "baseAsset": "ETH",
                    "quoteAsset": "BTC",
                    "filters": [
                        {"filterType": "PRICE_FILTER", "minPrice": "0.00000100", "maxPrice": "922327.00000000", "tickSize": "0.00000100"},
                        {"filterType": "LOT_SIZE", "minQty": "0.00010000", "stepSize": "0.00010000"}
                    ]
                },
                {"symbol": "BNBBTC", "baseAsset": "BNB", "quoteAsset": "BTC"}
            ]
        }"#;

        let info: ExchangeInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.symbols.len(), 2);
        assert_eq!(info.symbols[0].base_asset, "ETH");
        assert_eq!(info.symbols[0].filters[0].tick_size.as_deref(), Some("0.00000100"));
        assert_eq!(info.symbols[0].filters[1].tick_size, None);
        assert!(info.symbols[1].filters.is_empty());
    }
}
