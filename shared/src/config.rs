use dotenv::dotenv;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    /// Raw `MARKET_TYPE` value; parsed into a market by the binary.
    pub market_type: String,
    pub http_addr: String,
    pub exchange_info_url: String,
    pub catalog_retry_delay: Duration,
    pub catalog_refresh_interval: Option<Duration>,
    pub catalog_wait: Duration,
    pub feed_granularity: Duration,
    pub feed_chart_limit: usize,
    pub feed_seed_history: bool,
    pub feed_seed_interval: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        Ok(Config {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            market_type: std::env::var("MARKET_TYPE").unwrap_or_else(|_| "futures".to_string()),
            http_addr: std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            exchange_info_url: std::env::var("EXCHANGE_INFO_URL")
                .unwrap_or_else(|_| "https://api.binance.com/api/v1/exchangeInfo".to_string()),
            catalog_retry_delay: Duration::from_millis(env_parse("CATALOG_RETRY_MS", 1000)?),
            catalog_refresh_interval: match std::env::var("CATALOG_REFRESH_SECS") {
                Ok(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|e| {
                    anyhow::anyhow!("CATALOG_REFRESH_SECS must be a number of seconds: {}", e)
                })?)),
                Err(_) => None,
            },
            catalog_wait: Duration::from_secs(env_parse("CATALOG_WAIT_SECS", 10)?),
            feed_granularity: Duration::from_millis(env_parse("FEED_GRANULARITY_MS", 1000)?),
            feed_chart_limit: env_parse("FEED_CHART_LIMIT", 500)?,
            feed_seed_history: env_parse("FEED_SEED_HISTORY", true)?,
            feed_seed_interval: Duration::from_millis(env_parse("FEED_SEED_INTERVAL_MS", 500)?),
            log_format: match std::env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}
