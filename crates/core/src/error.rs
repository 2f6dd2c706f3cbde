//! Unified error types for yadz.

use tokio_rusqlite::rusqlite;

/// Unified error types for the yadz pipeline.
///
/// None of these are fatal to a running driver: callers log them and carry on
/// with the next address or the next scan.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty origin).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A stored cache entry could not be decoded.
    #[error("CACHE_CORRUPT: {0}")]
    CacheCorrupt(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Non-2xx response from the lookup service or a fetched page.
    #[error("HTTP_STATUS: {0}")]
    HttpStatus(u16),

    /// Response body was not the JSON we expected.
    #[error("RESPONSE_PARSE: {0}")]
    ResponseParse(String),

    /// Fetched page exceeded the configured byte limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CacheCorrupt(err.to_string())
    }
}
