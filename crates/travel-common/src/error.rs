/// Error types shared across the travel content server crates.
///
/// These errors represent failures in infrastructure components (Redis, the
/// photo-search provider) that are common to the workspace. Application
/// errors live in each server crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis unavailable, degrading gracefully")]
    RedisUnavailable,

    #[error("photo provider error: {0}")]
    Photo(#[from] crate::unsplash::UnsplashClientError),
}
