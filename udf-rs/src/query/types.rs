//! UDF configuration response

use serde::{Deserialize, Serialize};

use crate::catalog::{EXCHANGE_NAME, SYMBOL_TYPE};
use crate::data::supported_resolutions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeDescriptor {
    pub value: String,
    pub name: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTypeDescriptor {
    pub value: String,
    pub name: String,
}

/// Datafeed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdfConfig {
    pub exchanges: Vec<ExchangeDescriptor>,
    pub symbols_types: Vec<SymbolTypeDescriptor>,
    pub supported_resolutions: Vec<String>,
    pub supports_search: bool,
    pub supports_group_request: bool,
    pub supports_marks: bool,
    pub supports_timescale_marks: bool,
    pub supports_time: bool,
}

impl Default for UdfConfig {
    fn default() -> Self {
        Self {
            exchanges: vec![ExchangeDescriptor {
                value: EXCHANGE_NAME.to_string(),
                name: "Binance".to_string(),
                desc: "Binance Exchange".to_string(),
            }],
            symbols_types: vec![SymbolTypeDescriptor {
                value: SYMBOL_TYPE.to_string(),
                name: "Cryptocurrency".to_string(),
            }],
            supported_resolutions: supported_resolutions(),
            supports_search: true,
            supports_group_request: false,
            supports_marks: false,
            supports_timescale_marks: false,
            supports_time: true,
        }
    }
}
