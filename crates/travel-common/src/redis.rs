/// Redis cache wrapper with graceful degradation.
///
/// Every operation either returns `Option<T>` or reports success as `bool`.
/// On any Redis failure the operation logs a warning and degrades; callers
/// fall through to compute from source. The system is fully functional
/// without Redis.
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// Build a cache handle. A `None` URL or an invalid URL yields a handle
    /// whose every operation is a no-op.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(
                    |e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"),
                )
                .ok()
        });
        Self { client }
    }

    async fn conn(&self) -> Option<MultiplexedConnection> {
        let client = self.client.as_ref()?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()
    }

    /// Test the connection with a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        let Some(mut conn) = self.conn().await else {
            return false;
        };
        let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        result.is_ok()
    }

    /// Get a raw string value. `None` if Redis is unavailable or the key is absent.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()
            .flatten()
    }

    /// Set a raw string value with no expiry.
    pub async fn set(&self, key: &str, value: &str) -> bool {
        let Some(mut conn) = self.conn().await else {
            return false;
        };
        conn.set::<_, _, ()>(key, value)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SET failed"))
            .is_ok()
    }

    /// Set a raw string value with a TTL in seconds.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.conn().await else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    /// Get a JSON-serialized value. Deserialization failures are treated as a
    /// cache miss so stale schema never wedges a reader.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = self.get(key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    /// Store a value as JSON, optionally with a TTL.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> bool {
        let Ok(json) = serde_json::to_string(value) else {
            return false;
        };
        match ttl_secs {
            Some(ttl) => self.set_with_ttl(key, &json, ttl).await,
            None => self.set(key, &json).await,
        }
    }

    /// Delete every key matching `{prefix}*` using SCAN (not KEYS, which blocks).
    pub async fn delete_by_prefix(&self, prefix: &str) -> bool {
        let Some(mut conn) = self.conn().await else {
            return false;
        };

        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        loop {
            let scanned: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;
            let (next_cursor, keys) = match scanned {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, pattern, "redis SCAN failed");
                    return false;
                }
            };

            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(&keys).await {
                    warn!(error = %e, "redis batch DEL failed during prefix delete");
                    return false;
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        true
    }
}
