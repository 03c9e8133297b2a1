pub mod redis;
pub mod config;

pub use redis::{get_redis_client, get_redis_connection, Redis, RedisConnection};
pub use config::{Config, LogFormat};
