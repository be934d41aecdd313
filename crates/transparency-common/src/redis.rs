/// Redis client wrapper used as the durable record store.
///
/// Unlike a cache, the store must not silently drop writes: every operation
/// logs a warning on failure and returns the error to the caller. Values are
/// opaque strings (JSON-encoded records); list operations back append-only
/// collections.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

use crate::error::CommonError;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    /// Create a client for the given URL. No connection is made until first use.
    pub fn open(url: &str) -> Result<Self, CommonError> {
        let client = redis::Client::open(url)
            .inspect_err(|e| warn!(error = %e, url, "failed to create redis client"))?;
        Ok(Self { client })
    }

    /// Test the connection by sending a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CommonError> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))?;
        Ok(conn)
    }

    /// Get a value. `Ok(None)` when the key doesn't exist.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CommonError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))?;
        Ok(value)
    }

    /// Set a value with no expiry, replacing any previous value.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), CommonError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SET failed"))?;
        Ok(())
    }

    /// Append a value to the tail of a list.
    pub async fn push(&self, key: &str, value: &str) -> Result<(), CommonError> {
        let mut conn = self.connection().await?;
        conn.rpush::<_, _, ()>(key, value)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis RPUSH failed"))?;
        Ok(())
    }

    /// Read a whole list in insertion order. Missing keys read as empty.
    pub async fn list(&self, key: &str) -> Result<Vec<String>, CommonError> {
        let mut conn = self.connection().await?;
        let values: Vec<String> = conn
            .lrange(key, 0, -1)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis LRANGE failed"))?;
        Ok(values)
    }

    /// Set a value and append `item` to `list` in one MULTI/EXEC transaction.
    pub async fn set_and_push(
        &self,
        key: &str,
        value: &str,
        list: &str,
        item: &str,
    ) -> Result<(), CommonError> {
        let mut conn = self.connection().await?;
        let _: () = set_and_push_pipeline(key, value, list, item)
            .query_async(&mut conn)
            .await
            .inspect_err(|e| warn!(error = %e, key, list, "redis SET+RPUSH failed"))?;
        Ok(())
    }

    /// Delete a list, returning how many entries it held. LLEN and DEL run in one
    /// MULTI/EXEC transaction.
    pub async fn delete_list(&self, key: &str) -> Result<usize, CommonError> {
        let mut conn = self.connection().await?;
        let (len, _removed): (usize, usize) = len_and_delete_pipeline(key)
            .query_async(&mut conn)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis LLEN+DEL failed"))?;
        Ok(len)
    }
}

fn set_and_push_pipeline(key: &str, value: &str, list: &str, item: &str) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .set(key, value)
        .ignore()
        .rpush(list, item)
        .ignore();
    pipe
}

fn len_and_delete_pipeline(key: &str) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic().llen(key).del(key);
    pipe
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(pipe: &redis::Pipeline) -> String {
        String::from_utf8_lossy(&pipe.get_packed_pipeline()).to_string()
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{needle} missing from {haystack:?}"))
    }

    #[test]
    fn test_set_and_push_is_one_transaction() {
        let wire = packed(&set_and_push_pipeline(
            "pt:v1:product:a",
            "{}",
            "pt:v1:products",
            "a",
        ));
        let multi = position(&wire, "MULTI");
        let set = position(&wire, "SET");
        let rpush = position(&wire, "RPUSH");
        let exec = position(&wire, "EXEC");
        assert!(multi < set && set < rpush && rpush < exec);
    }

    #[test]
    fn test_len_and_delete_is_one_transaction() {
        let wire = packed(&len_and_delete_pipeline("pt:v1:answers:a"));
        let multi = position(&wire, "MULTI");
        let llen = position(&wire, "LLEN");
        let del = position(&wire, "DEL");
        let exec = position(&wire, "EXEC");
        assert!(multi < llen && llen < del && del < exec);
    }
}
