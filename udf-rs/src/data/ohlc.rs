//! OHLC series in the UDF `history` wire format

use serde::{Deserialize, Serialize};

/// Status field of a history response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "no_data")]
    NoData,
}

/// Column-oriented candle series for one `(symbol, market, interval)`.
///
/// The six sequences are parallel: index `i` of every column describes the
/// same window. Serialized as `{"s":"ok","t":[..],"o":[..],...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcSeries {
    #[serde(rename = "s")]
    pub status: SeriesStatus,
    /// Window open times, unix seconds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub t: Vec<i64>,
    /// Open prices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub o: Vec<f64>,
    /// High prices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub h: Vec<f64>,
    /// Low prices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub l: Vec<f64>,
    /// Close prices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub c: Vec<f64>,
    /// Volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub v: Vec<f64>,
}

impl OhlcSeries {
    /// Empty `ok` series with room for `capacity` windows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            status: SeriesStatus::Ok,
            t: Vec::with_capacity(capacity),
            o: Vec::with_capacity(capacity),
            h: Vec::with_capacity(capacity),
            l: Vec::with_capacity(capacity),
            c: Vec::with_capacity(capacity),
            v: Vec::with_capacity(capacity),
        }
    }

    /// The `{"s":"no_data"}` response.
    pub fn no_data() -> Self {
        Self {
            status: SeriesStatus::NoData,
            ..Self::with_capacity(0)
        }
    }

    /// Append one window to every column.
    pub fn push(&mut self, time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) {
        self.t.push(time);
        self.o.push(open);
        self.h.push(high);
        self.l.push(low);
        self.c.push(close);
        self.v.push(volume);
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// True when all six columns have the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.t.len();
        [self.o.len(), self.h.len(), self.l.len(), self.c.len(), self.v.len()]
            .iter()
            .all(|&len| len == n)
    }

    /// Most recent window open time
    pub fn last_time(&self) -> Option<i64> {
        self.t.last().copied()
    }
}

impl Default for OhlcSeries {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
