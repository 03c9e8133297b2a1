//! Symbol records and their UDF projections

use serde::{Deserialize, Serialize};

use crate::data::supported_resolutions;
use crate::exchange::Instrument;

/// Exchange name reported for every symbol.
pub const EXCHANGE_NAME: &str = "BINANCE";
/// Symbol type reported for every symbol.
pub const SYMBOL_TYPE: &str = "crypto";

/// One exchange-listed instrument, in the UDF `symbols` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub symbol: String,
    pub ticker: String,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub exchange: String,
    pub listed_exchange: String,
    #[serde(rename = "type")]
    pub symbol_type: String,
    pub currency_code: String,
    pub session: String,
    pub timezone: String,
    pub minmovement: u32,
    pub minmov: u32,
    pub minmovement2: u32,
    pub minmov2: u32,
    pub pricescale: u64,
    pub supported_resolutions: Vec<String>,
    pub has_intraday: bool,
    pub has_daily: bool,
    pub has_weekly_and_monthly: bool,
    pub data_status: String,
    pub base_asset: String,
    pub quote_asset: String,
}

impl SymbolRecord {
    /// Build a record from exchange metadata.
    pub fn from_instrument(instrument: &Instrument, resolutions: &[String]) -> Self {
        let ticker = instrument.symbol.clone();
        Self {
            symbol: ticker.clone(),
            ticker: ticker.clone(),
            name: ticker.clone(),
            full_name: ticker,
            description: format!("{} / {}", instrument.base_asset, instrument.quote_asset),
            exchange: EXCHANGE_NAME.to_string(),
            listed_exchange: EXCHANGE_NAME.to_string(),
            symbol_type: SYMBOL_TYPE.to_string(),
            currency_code: instrument.quote_asset.clone(),
            session: "24x7".to_string(),
            timezone: "UTC".to_string(),
            minmovement: 1,
            minmov: 1,
            minmovement2: 0,
            minmov2: 0,
            pricescale: price_scale(instrument),
            supported_resolutions: resolutions.to_vec(),
            has_intraday: true,
            has_daily: true,
            has_weekly_and_monthly: true,
            data_status: "streaming".to_string(),
            base_asset: instrument.base_asset.clone(),
            quote_asset: instrument.quote_asset.clone(),
        }
    }

    /// Projection used by the `search` endpoint.
    pub fn to_search_result(&self) -> SearchResult {
        SearchResult {
            symbol: self.symbol.clone(),
            full_name: self.full_name.clone(),
            description: self.description.clone(),
            exchange: self.exchange.clone(),
            ticker: self.ticker.clone(),
            symbol_type: self.symbol_type.clone(),
        }
    }
}

/// `round(1 / tickSize)` from the `PRICE_FILTER`, or 1 when there is no usable
/// tick size.
pub fn price_scale(instrument: &Instrument) -> u64 {
    let tick_size = instrument
        .filters
        .iter()
        .find(|f| f.filter_type == "PRICE_FILTER")
        .and_then(|f| f.tick_size.as_deref())
        .and_then(|raw| raw.trim().parse::<f64>().ok());

    match tick_size {
        Some(tick) if tick.is_finite() && tick > 0.0 => {
            let scale = (1.0 / tick).round();
            if scale >= 1.0 && scale.is_finite() {
                scale as u64
            } else {
                1
            }
        }
        _ => 1,
    }
}

/// Row returned by `search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub full_name: String,
    pub description: String,
    pub exchange: String,
    pub ticker: String,
    #[serde(rename = "type")]
    pub symbol_type: String,
}

/// Column-wise view of the catalog for `symbol_info`.
///
/// Each field holds one `SymbolRecord` attribute across all symbols, in
/// catalog order. The field list is fixed here rather than derived from
/// serialized keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfoTable {
    pub symbol: Vec<String>,
    pub ticker: Vec<String>,
    pub name: Vec<String>,
    pub full_name: Vec<String>,
    pub description: Vec<String>,
    pub exchange: Vec<String>,
    pub listed_exchange: Vec<String>,
    #[serde(rename = "type")]
    pub symbol_type: Vec<String>,
    pub currency_code: Vec<String>,
    pub session: Vec<String>,
    pub timezone: Vec<String>,
    pub minmovement: Vec<u32>,
    pub minmov: Vec<u32>,
    pub minmovement2: Vec<u32>,
    pub minmov2: Vec<u32>,
    pub pricescale: Vec<u64>,
    pub supported_resolutions: Vec<Vec<String>>,
    pub has_intraday: Vec<bool>,
    pub has_daily: Vec<bool>,
    pub has_weekly_and_monthly: Vec<bool>,
    pub data_status: Vec<String>,
    pub base_asset: Vec<String>,
    pub quote_asset: Vec<String>,
}

impl SymbolInfoTable {
    /// Transpose row-oriented records into columns.
    pub fn from_records(records: &[SymbolRecord]) -> Self {
        let mut table = Self::default();
        for r in records {
            table.symbol.push(r.symbol.clone());
            table.ticker.push(r.ticker.clone());
            table.name.push(r.name.clone());
            table.full_name.push(r.full_name.clone());
            table.description.push(r.description.clone());
            table.exchange.push(r.exchange.clone());
            table.listed_exchange.push(r.listed_exchange.clone());
            table.symbol_type.push(r.symbol_type.clone());
            table.currency_code.push(r.currency_code.clone());
            table.session.push(r.session.clone());
            table.timezone.push(r.timezone.clone());
            table.minmovement.push(r.minmovement);
            table.minmov.push(r.minmov);
            table.minmovement2.push(r.minmovement2);
            table.minmov2.push(r.minmov2);
            table.pricescale.push(r.pricescale);
            table.supported_resolutions.push(r.supported_resolutions.clone());
            table.has_intraday.push(r.has_intraday);
            table.has_daily.push(r.has_daily);
            table.has_weekly_and_monthly.push(r.has_weekly_and_monthly);
            table.data_status.push(r.data_status.clone());
            table.base_asset.push(r.base_asset.clone());
            table.quote_asset.push(r.quote_asset.clone());
        }
        table
    }

    /// Number of symbols (rows) in the table
    pub fn len(&self) -> usize {
        self.symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// Build catalog rows for every instrument, sharing one resolution list.
pub fn build_records(instruments: &[Instrument]) -> Vec<SymbolRecord> {
    let resolutions = supported_resolutions();
    instruments
        .iter()
        .map(|i| SymbolRecord::from_instrument(i, &resolutions))
        .collect()
}
