//! Per-symbol kline window maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One kline bar as the exchange sends it: OHLCV as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineBar {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl KlineBar {
    pub fn new(
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
        volume: impl Into<String>,
    ) -> Self {
        Self {
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
            volume: volume.into(),
        }
    }

    /// Decode one row of the REST `klines` response:
    /// `[openTime, open, high, low, close, volume, closeTime, ...]`.
    pub fn from_rest_row(row: &[serde_json::Value]) -> Option<(i64, Self)> {
        let open_time = row.first()?.as_i64()?;
        let field = |i: usize| row.get(i).and_then(|v| v.as_str()).map(str::to_string);
        Some((
            open_time,
            Self {
                open: field(1)?,
                high: field(2)?,
                low: field(3)?,
                close: field(4)?,
                volume: field(5)?,
            },
        ))
    }
}

/// Window start time (milliseconds) → bar, ascending.
pub type WindowMap = BTreeMap<i64, KlineBar>;

/// Rolling chart of the most recent `limit` windows for one symbol/interval.
#[derive(Debug, Clone)]
pub struct Chart {
    windows: WindowMap,
    limit: usize,
}

impl Chart {
    pub fn new(limit: usize) -> Self {
        Self {
            windows: WindowMap::new(),
            limit: limit.max(1),
        }
    }

    /// Insert or overwrite a window, evicting the oldest past the limit.
    pub fn apply(&mut self, open_time: i64, bar: KlineBar) {
        self.windows.insert(open_time, bar);
        while self.windows.len() > self.limit {
            self.windows.pop_first();
        }
    }

    pub fn extend(&mut self, bars: impl IntoIterator<Item = (i64, KlineBar)>) {
        for (open_time, bar) in bars {
            self.apply(open_time, bar);
        }
    }

    pub fn windows(&self) -> &WindowMap {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: &str) -> KlineBar {
        KlineBar::new("1.0", "2.0", "0.5", close, "10")
    }

    #[test]
    fn test_chart_overwrites_same_window() {
        let mut chart = Chart::new(10);
        chart.apply(60_000, bar("1.1"));
        chart.apply(60_000, bar("1.2"));

        assert_eq!(chart.len(), 1);
        assert_eq!(chart.windows()[&60_000].close, "1.2");
    }

    #[test]
    fn test_chart_evicts_oldest() {
        let mut chart = Chart::new(2);
        chart.extend([(3, bar("3")), (1, bar("1")), (2, bar("2"))]);

        let times: Vec<i64> = chart.windows().keys().copied().collect();
        assert_eq!(times, vec![2, 3]);
    }

    #[test]
    fn test_rest_row_decoding() {
        let row: Vec<serde_json::Value> = serde_json::from_str(
            r#"[1499040000000,"0.01634790","0.80000000","0.01575800","0.01577100","148976.11427815",1499644799999,"2434.19055334",308,"1756.87402397","28.46694368","0"]"#,
        )
        .unwrap();

        let (open_time, bar) = KlineBar::from_rest_row(&row).unwrap();
        assert_eq!(open_time, 1_499_040_000_000);
        assert_eq!(bar.open, "0.01634790");
        assert_eq!(bar.volume, "148976.11427815");
        assert!(KlineBar::from_rest_row(&row[..3]).is_none());
    }
}
