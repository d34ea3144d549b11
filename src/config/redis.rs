use redis::aio::ConnectionManager;
use tokio::time::{timeout, Duration};

pub async fn get_redis() -> anyhow::Result<ConnectionManager> {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let connect_timeout: u64 = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let client = redis::Client::open(redis_url)?;

    let manager = timeout(
        Duration::from_secs(connect_timeout),
        ConnectionManager::new(client),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Redis connection timeout after {connect_timeout} seconds"))??;

    Ok(manager)
}
