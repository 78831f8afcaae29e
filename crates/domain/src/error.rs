/// Shared error type used across all telsearch crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("engine: {0}")]
    Engine(String),

    #[error("cache: {0}")]
    Cache(String),

    #[error("chat client: {0}")]
    Chat(String),

    /// Rate-limit signal from the chat service: pause for the advised
    /// interval, then continue the same iterator.
    #[error("flood wait: {seconds}s")]
    FloodWait { seconds: u64 },

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
