use std::collections::HashSet;

use teloxide::types::ChatId;

/// Runtime configuration, read once in `main`. `dotenvy` has already been
/// loaded by then, so plain `std::env` reads see `.env` values too.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub database_url: String,
    /// The group whose invite link is handed out on a perfect score.
    pub group_chat: ChatId,
    /// Recipients of "started the quiz" notifications.
    pub admins: Vec<ChatId>,
    pub policy: ChatPolicy,
    pub quiz_path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let group_chat_raw = require("TELEGRAM_GROUP_ID")?;
        let group_chat = group_chat_raw
            .trim()
            .parse()
            .map(ChatId)
            .map_err(|_| ConfigError::Invalid {
                var: "TELEGRAM_GROUP_ID",
                value: group_chat_raw,
            })?;

        let admins = parse_id_list("TELEGRAM_ADMIN", &optional("TELEGRAM_ADMIN"));

        let policy = match optional("TELEGRAM_ALLOWED_CHATS") {
            raw if raw.trim().is_empty() => ChatPolicy::private_only(),
            raw => ChatPolicy::allow_only(parse_id_list("TELEGRAM_ALLOWED_CHATS", &raw)),
        };

        Ok(Self {
            token: require("TELOXIDE_TOKEN")?,
            database_url: require("DATABASE_URL")?,
            group_chat,
            admins,
            policy,
            quiz_path: std::env::var("QUIZ_PATH").unwrap_or_else(|_| "quiz.json".into()),
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn optional(var: &str) -> String {
    std::env::var(var).unwrap_or_default()
}

/// Comma-separated chat ids. Entries that do not parse are skipped with a
/// warning, never fatal.
fn parse_id_list(var: &str, raw: &str) -> Vec<ChatId> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(id) => Some(ChatId(id)),
            Err(_) => {
                tracing::warn!(var, entry, "skipping unparseable chat id");
                None
            }
        })
        .collect()
}

/// Which chats the bot serves. With an allow-list the list is the sole
/// criterion; without one, only private chats (positive Telegram chat ids)
/// are served, which keeps the bot out of groups it gets added to.
#[derive(Debug, Clone)]
pub struct ChatPolicy {
    allowed: Option<HashSet<ChatId>>,
}

impl ChatPolicy {
    pub fn private_only() -> Self {
        Self { allowed: None }
    }

    pub fn allow_only(chats: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            allowed: Some(chats.into_iter().collect()),
        }
    }

    pub fn permits(&self, chat_id: ChatId) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.contains(&chat_id),
            None => chat_id.0 > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_serves_private_chats_only() {
        let policy = ChatPolicy::private_only();
        assert!(policy.permits(ChatId(42)));
        assert!(!policy.permits(ChatId(-100_123)));
    }

    #[test]
    fn allow_list_is_the_sole_criterion() {
        let policy = ChatPolicy::allow_only([ChatId(-100_123), ChatId(7)]);
        assert!(policy.permits(ChatId(-100_123)));
        assert!(policy.permits(ChatId(7)));
        assert!(!policy.permits(ChatId(42)));
    }

    #[test]
    fn id_list_skips_garbage_entries() {
        let ids = parse_id_list("TEST", "1, x, -100, ,7");
        assert_eq!(ids, vec![ChatId(1), ChatId(-100), ChatId(7)]);
    }

    #[test]
    fn id_list_of_empty_string_is_empty() {
        assert!(parse_id_list("TEST", "").is_empty());
    }
}
