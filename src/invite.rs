use std::time::{SystemTime, UNIX_EPOCH};

use crate::{error::BotError, store::ProgressStore, telegram::Messenger};

/// How long a minted invite link is served from the store before a fresh
/// one is exported.
pub const LINK_TTL_SECS: i64 = 300;

/// Returns the shared group invite link, minting a new one when the cached
/// record is missing, expired, or unreadable. Expiry is checked lazily on
/// read; there is no refresh timer.
pub async fn group_link<S: ProgressStore, M: Messenger>(
    store: &S,
    messenger: &M,
    now: i64,
) -> Result<String, BotError> {
    match store.load_group_link().await {
        Ok(Some(cached)) if now <= cached.expires_at => return Ok(cached.link),
        Ok(_) => {}
        Err(e) => {
            // unreadable cache record counts as a miss
            tracing::warn!(error = %e, "failed to read cached group link, minting a new one");
        }
    }

    let link = messenger.create_invite_link().await?;
    store.save_group_link(&link, now + LINK_TTL_SECS).await?;
    Ok(link)
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
