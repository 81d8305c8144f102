use crate::{config::ConfigError, store::StoreError};

/// Everything that can go wrong while handling one update.
///
/// Configuration problems are fatal for the current update and surfaced
/// distinctly; store and Telegram failures carry their source. A
/// `MalformedUpdate` is logged and dropped at the dispatch boundary, it
/// never produces an outbound message.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("malformed update: {0}")]
    MalformedUpdate(&'static str),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}
