//! Real-time kline charts from Binance websocket streams
//!
//! Each subscription keeps a rolling [`Chart`] per symbol. Charts are
//! optionally seeded from the REST `klines` endpoint, then updated from the
//! combined kline stream. Changed charts are emitted once per granularity
//! tick as full window maps.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::data::Market;
use crate::error::FeedError;
use crate::exchange::chart::{Chart, KlineBar};
use crate::exchange::feed::{ChartUpdate, KlineFeed};
use crate::Result;

/// Windows kept per chart
pub const DEFAULT_CHART_LIMIT: usize = 500;
/// Binance allows 1024 streams per connection; stay well below.
const MAX_STREAMS_PER_CONNECTION: usize = 200;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const CHANNEL_CAPACITY: usize = 1000;
/// Pause between REST seed requests of one worker
pub const DEFAULT_SEED_INTERVAL: Duration = Duration::from_millis(500);

/// REST and websocket endpoints of one Binance market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinanceEndpoints {
    pub klines_url: String,
    pub ws_base_url: String,
    /// Largest `limit` the REST klines endpoint accepts
    pub max_klines_limit: usize,
}

impl BinanceEndpoints {
    pub fn spot() -> Self {
        Self {
            klines_url: "https://api.binance.com/api/v3/klines".to_string(),
            ws_base_url: "wss://stream.binance.com:9443".to_string(),
            max_klines_limit: 1000,
        }
    }

    pub fn futures() -> Self {
        Self {
            klines_url: "https://fapi.binance.com/fapi/v1/klines".to_string(),
            ws_base_url: "wss://fstream.binance.com".to_string(),
            max_klines_limit: 1500,
        }
    }

    pub fn for_market(market: Market) -> Self {
        match market {
            Market::Spot => Self::spot(),
            Market::Futures => Self::futures(),
        }
    }

    /// Combined stream URL for the given stream names
    pub fn combined_stream_url(&self, streams: &[String]) -> String {
        format!("{}/stream?streams={}", self.ws_base_url, streams.join("/"))
    }
}

/// Stream name for one symbol's klines, e.g. `btcusdt@kline_1h`.
pub fn kline_stream_name(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{}", symbol.to_lowercase(), interval)
}

/// Combined-stream envelope; raw single-stream payloads are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreamMessage {
    Combined { data: KlineEvent },
    Raw(KlineEvent),
}

#[derive(Debug, Deserialize)]
struct KlineEvent {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    kline: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time: i64,
    #[serde(rename = "i")]
    interval: String,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
}

/// A decoded kline stream message
#[derive(Debug, Clone, PartialEq)]
pub struct KlineTick {
    pub symbol: String,
    pub interval: String,
    pub open_time: i64,
    pub bar: KlineBar,
}

/// Decode a websocket text frame. Non-kline frames yield `Ok(None)`.
pub fn parse_kline_message(text: &str) -> std::result::Result<Option<KlineTick>, FeedError> {
    if text.contains("\"result\"") {
        return Ok(None);
    }
    let message: StreamMessage =
        serde_json::from_str(text).map_err(|e| FeedError::Decode(e.to_string()))?;
    let event = match message {
        StreamMessage::Combined { data } => data,
        StreamMessage::Raw(event) => event,
    };
    if event.event_type != "kline" {
        return Ok(None);
    }
    let k = event.kline;
    Ok(Some(KlineTick {
        symbol: event.symbol,
        interval: k.interval,
        open_time: k.open_time,
        bar: KlineBar::new(k.open, k.high, k.low, k.close, k.volume),
    }))
}

/// Shared chart machinery behind the spot and futures feeds
#[derive(Debug, Clone)]
pub struct ChartStreamer {
    http: reqwest::Client,
    endpoints: BinanceEndpoints,
    chart_limit: usize,
    seed_history: bool,
    seed_interval: Duration,
}

impl ChartStreamer {
    pub fn new(endpoints: BinanceEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            chart_limit: DEFAULT_CHART_LIMIT,
            seed_history: true,
            seed_interval: DEFAULT_SEED_INTERVAL,
        }
    }

    pub fn with_chart_limit(mut self, chart_limit: usize) -> Self {
        self.chart_limit = chart_limit.max(1);
        self
    }

    pub fn with_seed_history(mut self, seed_history: bool) -> Self {
        self.seed_history = seed_history;
        self
    }

    pub fn with_seed_interval(mut self, seed_interval: Duration) -> Self {
        self.seed_interval = seed_interval;
        self
    }

    /// REST `limit` for seeding: the chart limit, capped by the market.
    pub fn seed_limit(&self) -> usize {
        self.chart_limit.min(self.endpoints.max_klines_limit)
    }

    pub fn endpoints(&self) -> &BinanceEndpoints {
        &self.endpoints
    }

    /// Start one worker per chunk of symbols, all feeding the same receiver.
    pub fn subscribe(
        &self,
        symbols: Vec<String>,
        interval: &str,
        granularity: Duration,
    ) -> mpsc::Receiver<ChartUpdate> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        for chunk in symbols.chunks(MAX_STREAMS_PER_CONNECTION) {
            let worker = ChartWorker {
                streamer: self.clone(),
                symbols: chunk.to_vec(),
                interval: interval.to_string(),
                granularity,
                tx: tx.clone(),
                charts: HashMap::new(),
                dirty: HashSet::new(),
            };
            tokio::spawn(worker.run());
        }
        info!(
            "Subscribed {} symbols to {} klines via {}",
            symbols.len(),
            interval,
            self.endpoints.ws_base_url
        );
        rx
    }

    /// Fetch the latest `chart_limit` windows for a symbol.
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
    ) -> std::result::Result<Vec<(i64, KlineBar)>, FeedError> {
        let limit = self.seed_limit().to_string();
        let rows: Vec<Vec<serde_json::Value>> = self
            .http
            .get(&self.endpoints.klines_url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| KlineBar::from_rest_row(row))
            .collect())
    }
}

enum StreamEnd {
    Closed,
    ReceiverDropped,
}

struct ChartWorker {
    streamer: ChartStreamer,
    symbols: Vec<String>,
    interval: String,
    granularity: Duration,
    tx: mpsc::Sender<ChartUpdate>,
    charts: HashMap<String, Chart>,
    dirty: HashSet<String>,
}

impl ChartWorker {
    async fn run(mut self) {
        if self.streamer.seed_history {
            self.seed().await;
        }
        loop {
            match self.stream().await {
                Ok(StreamEnd::ReceiverDropped) => {
                    debug!("Chart receiver dropped for {} klines, stopping", self.interval);
                    return;
                }
                Ok(StreamEnd::Closed) => {
                    warn!("Kline stream for {} closed, reconnecting...", self.interval);
                }
                Err(e) => {
                    error!("Kline stream for {} failed: {}, reconnecting...", self.interval, e);
                }
            }
            if self.tx.is_closed() {
                return;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn seed(&mut self) {
        let period = self.streamer.seed_interval.max(Duration::from_millis(1));
        let mut pacing = tokio::time::interval(period);
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        for symbol in self.symbols.clone() {
            pacing.tick().await;
            if self.tx.is_closed() {
                return;
            }
            match self.streamer.fetch_klines(&symbol, &self.interval).await {
                Ok(bars) => {
                    for (open_time, bar) in bars {
                        self.apply(&symbol, open_time, bar);
                    }
                }
                Err(e) => warn!("Failed to seed {} {} chart: {}", symbol, self.interval, e),
            }
        }
    }

    async fn stream(&mut self) -> std::result::Result<StreamEnd, FeedError> {
        let streams: Vec<String> = self
            .symbols
            .iter()
            .map(|s| kline_stream_name(s, &self.interval))
            .collect();
        let url = self.streamer.endpoints.combined_stream_url(&streams);
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();
        debug!("Connected {} kline streams", streams.len());

        let mut ticker = tokio::time::interval(self.granularity);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(txt))) => match parse_kline_message(&txt) {
                        Ok(Some(tick)) => self.apply(&tick.symbol, tick.open_time, tick.bar),
                        Ok(None) => {}
                        Err(e) => warn!("Failed to process kline message: {}", e),
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        write.send(Message::Pong(payload)).await.ok();
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!("Kline stream closed by server: {:?}", frame);
                        return Ok(StreamEnd::Closed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(StreamEnd::Closed),
                },
                _ = ticker.tick() => {
                    if !self.flush().await {
                        return Ok(StreamEnd::ReceiverDropped);
                    }
                }
            }
        }
    }

    fn apply(&mut self, symbol: &str, open_time: i64, bar: KlineBar) {
        let limit = self.streamer.chart_limit;
        self.charts
            .entry(symbol.to_string())
            .or_insert_with(|| Chart::new(limit))
            .apply(open_time, bar);
        self.dirty.insert(symbol.to_string());
    }

    /// Emit every chart touched since the last flush. False once the
    /// receiver is gone.
    async fn flush(&mut self) -> bool {
        let dirty = std::mem::take(&mut self.dirty);
        for symbol in dirty {
            let Some(chart) = self.charts.get(&symbol) else {
                continue;
            };
            let update = ChartUpdate {
                symbol,
                interval: self.interval.clone(),
                windows: chart.windows().clone(),
            };
            if self.tx.send(update).await.is_err() {
                return false;
            }
        }
        true
    }
}

/// Binance spot kline charts
#[derive(Debug, Clone)]
pub struct BinanceSpotFeed {
    streamer: ChartStreamer,
}

impl BinanceSpotFeed {
    pub fn new() -> Self {
        Self::with_streamer(ChartStreamer::new(BinanceEndpoints::spot()))
    }

    pub fn with_streamer(streamer: ChartStreamer) -> Self {
        Self { streamer }
    }
}

impl Default for BinanceSpotFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KlineFeed for BinanceSpotFeed {
    fn market(&self) -> Market {
        Market::Spot
    }

    async fn subscribe(
        &self,
        symbols: Vec<String>,
        interval: &str,
        granularity: Duration,
    ) -> Result<mpsc::Receiver<ChartUpdate>> {
        Ok(self.streamer.subscribe(symbols, interval, granularity))
    }
}

/// Binance USD-M futures kline charts
#[derive(Debug, Clone)]
pub struct BinanceFuturesFeed {
    streamer: ChartStreamer,
}

impl BinanceFuturesFeed {
    pub fn new() -> Self {
        Self::with_streamer(ChartStreamer::new(BinanceEndpoints::futures()))
    }

    pub fn with_streamer(streamer: ChartStreamer) -> Self {
        Self { streamer }
    }
}

impl Default for BinanceFuturesFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KlineFeed for BinanceFuturesFeed {
    fn market(&self) -> Market {
        Market::Futures
    }

    async fn subscribe(
        &self,
        symbols: Vec<String>,
        interval: &str,
        granularity: Duration,
    ) -> Result<mpsc::Receiver<ChartUpdate>> {
        Ok(self.streamer.subscribe(symbols, interval, granularity))
    }
}

/// Feed for the configured market
pub fn binance_feed(
    market: Market,
    chart_limit: usize,
    seed_history: bool,
    seed_interval: Duration,
) -> Arc<dyn KlineFeed> {
    let streamer = ChartStreamer::new(BinanceEndpoints::for_market(market))
        .with_chart_limit(chart_limit)
        .with_seed_history(seed_history)
        .with_seed_interval(seed_interval);
    match market {
        Market::Spot => Arc::new(BinanceSpotFeed::with_streamer(streamer)),
        Market::Futures => Arc::new(BinanceFuturesFeed::with_streamer(streamer)),
    }
}
