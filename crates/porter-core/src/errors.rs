/// Core error type for the bot.
///
/// Adapter crates should map their specific errors into this type so the
/// dispatch pipeline can handle failures consistently (operator log vs
/// user-facing reply).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("unknown chat kind: {0}")]
    UnknownChatKind(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
