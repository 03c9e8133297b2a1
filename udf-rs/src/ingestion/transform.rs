//! Kline window map → OHLC series

use crate::data::OhlcSeries;
use crate::error::TransformError;
use crate::exchange::WindowMap;

/// Convert a chart's window map into a series.
///
/// Window start times go from milliseconds to floored seconds; prices and
/// volume are parsed as `f64`. An empty map yields `Ok(None)`, and any
/// unparsable number rejects the whole update.
pub fn windows_to_series(windows: &WindowMap) -> Result<Option<OhlcSeries>, TransformError> {
    if windows.is_empty() {
        return Ok(None);
    }

    let mut series = OhlcSeries::with_capacity(windows.len());
    for (&open_time, bar) in windows {
        let parse = |field: &'static str, value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| TransformError::InvalidNumber {
                    window: open_time,
                    field,
                    value: value.to_string(),
                })
        };
        series.push(
            open_time.div_euclid(1000),
            parse("open", &bar.open)?,
            parse("high", &bar.high)?,
            parse("low", &bar.low)?,
            parse("close", &bar.close)?,
            parse("volume", &bar.volume)?,
        );
    }
    Ok(Some(series))
}
