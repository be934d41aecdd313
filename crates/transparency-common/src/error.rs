/// Error types shared across the transparency crates.
///
/// These errors represent failures in infrastructure components (Redis, record
/// serialization) that every consumer of the store sees. Application-specific
/// errors are defined in the server crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
