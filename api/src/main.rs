use std::sync::Arc;

use anyhow::Result;
use shared::{get_redis_client, get_redis_connection, Config, LogFormat};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use udf_rs::prelude::*;

mod error;
mod routes;
mod state;
#[cfg(test)]
mod tests;

use crate::routes::create_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Binance UDF adapter...");

    let market: Market = config.market_type.parse()?;
    info!("Serving {} market data", market);

    let redis = get_redis_client(&config.redis_url)?;
    let conn = get_redis_connection(&redis).await?;
    let cache = OhlcCache::new(Arc::new(RedisStore::new(conn)));

    // Symbol catalog
    let catalog = CatalogHandle::new();
    let source = Arc::new(BinanceMetadataClient::new(config.exchange_info_url.clone()));
    CatalogLoader::new(source, catalog.clone())
        .with_retry_delay(config.catalog_retry_delay)
        .with_refresh_interval(config.catalog_refresh_interval)
        .spawn();

    // Live ingestion follows every published snapshot
    let feed = binance_feed(
        market,
        config.feed_chart_limit,
        config.feed_seed_history,
        config.feed_seed_interval,
    );
    let pipeline =
        IngestionPipeline::new(feed, cache.clone()).with_granularity(config.feed_granularity);
    let ingestion_catalog = catalog.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline
            .follow_catalog(&ingestion_catalog, &Resolution::ALL)
            .await
        {
            error!("Ingestion stopped: {:#}", e);
        }
    });

    let engine = UdfEngine::new(catalog, cache, market).with_catalog_wait(config.catalog_wait);
    let app = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!("UDF server listening on http://{}", config.http_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
