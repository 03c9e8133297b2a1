use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tracing::info;

pub type Redis = Client;
pub type RedisConnection = MultiplexedConnection;

pub fn get_redis_client(redis_url: &str) -> Result<Redis> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Open a multiplexed async connection; clones share the same socket.
pub async fn get_redis_connection(client: &Redis) -> Result<RedisConnection> {
    let conn = client.get_multiplexed_async_connection().await?;
    info!("Connected to redis");
    Ok(conn)
}
