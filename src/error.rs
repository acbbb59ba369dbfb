//! Top-level error type.
//!
//! Structural error kinds follow the engine's propagation policy: recover
//! in the innermost component with enough context, and surface only a
//! stable `code()` plus a human-readable message at the boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("market matching error: {0}")]
    Matching(String),

    #[error("data store error: {0}")]
    DataStore(String),

    #[error("trading error: {0}")]
    Trading(String),

    #[error("size limit exceeded: recommended size {recommended} exceeds max position size {max}")]
    SizeLimitExceeded { recommended: String, max: String },

    #[error("insufficient liquidity: {available} below minimum {minimum}")]
    InsufficientLiquidity { available: String, minimum: String },

    #[error("duplicate execution for opportunity {0}")]
    DuplicateExecution(String),

    #[error("auto-execute is disabled; enable it via set_auto_execute first")]
    AutoExecuteDisabled,

    #[error("opportunity not found: {0}")]
    NotFound(String),

    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl Error {
    /// Stable error code surfaced at the boundary (HTTP/WebSocket layer).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Matching(_) => "MATCHING_ERROR",
            Self::DataStore(_) | Self::Database(_) | Self::Pool(_) => "DATA_STORE_ERROR",
            Self::Trading(_) => "TRADING_ERROR",
            Self::SizeLimitExceeded { .. } => "SIZE_LIMIT_EXCEEDED",
            Self::InsufficientLiquidity { .. } => "INSUFFICIENT_LIQUIDITY",
            Self::DuplicateExecution(_) => "DUPLICATE_EXECUTION",
            Self::AutoExecuteDisabled => "AUTO_EXECUTE_DISABLED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::WebSocket(_) => "CONNECTION_ERROR",
            Self::Json(_) => "PROTOCOL_ERROR",
            Self::Http(_) => "TRADING_ERROR",
            Self::Io(_) => "CONNECTION_ERROR",
            Self::Url(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
