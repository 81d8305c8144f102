use teloxide::types::{ChatId, MessageId, Update, UpdateKind, User};

use crate::error::BotError;

/// A normalized inbound event. Telegram delivers two shapes we care about
/// (plain message, inline-button callback); everything else is
/// `Unrecognized` and dropped downstream.
#[derive(Debug, Clone)]
pub enum InboundUpdate {
    TextMessage(TextMessage),
    CallbackAnswer(CallbackAnswer),
    Unrecognized,
}

#[derive(Debug, Clone)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct CallbackAnswer {
    /// Replies go to the sender's private chat, like the original bot.
    pub chat_id: ChatId,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// `-1` when the callback payload was malformed; the runner drops those.
    pub question_index: i64,
    pub choice: String,
    /// Absent when Telegram no longer exposes the originating message.
    pub origin: Option<Origin>,
}

/// The message whose inline keyboard produced a callback.
#[derive(Debug, Clone)]
pub struct Origin {
    pub message_id: MessageId,
    pub text: String,
}

/// Normalizes a raw Telegram update. A message without a sender cannot be
/// attributed to a user and fails with `MalformedUpdate`.
pub fn parse(update: &Update) -> Result<InboundUpdate, BotError> {
    match &update.kind {
        UpdateKind::Message(msg) => {
            let from = msg
                .from
                .as_ref()
                .ok_or(BotError::MalformedUpdate("message without sender"))?;
            Ok(InboundUpdate::TextMessage(TextMessage {
                chat_id: msg.chat.id,
                user_id: user_id(from),
                first_name: from.first_name.clone(),
                last_name: from.last_name.clone(),
                username: from.username.clone(),
                text: msg.text().unwrap_or_default().to_owned(),
            }))
        }
        UpdateKind::CallbackQuery(query) => {
            let (question_index, choice) =
                split_callback_data(query.data.as_deref().unwrap_or_default());
            let origin = query
                .message
                .as_ref()
                .and_then(|m| m.regular_message())
                .map(|m| Origin {
                    message_id: m.id,
                    text: m.text().unwrap_or_default().to_owned(),
                });
            Ok(InboundUpdate::CallbackAnswer(CallbackAnswer {
                chat_id: ChatId(user_id(&query.from)),
                user_id: user_id(&query.from),
                first_name: query.from.first_name.clone(),
                last_name: query.from.last_name.clone(),
                username: query.from.username.clone(),
                question_index,
                choice,
                origin,
            }))
        }
        _ => Ok(InboundUpdate::Unrecognized),
    }
}

fn user_id(user: &User) -> i64 {
    user.id.0 as i64
}

/// Splits a callback payload `"{index}#{choice}"` on the first `#`.
/// Anything malformed collapses to `(-1, "")`, which the runner ignores.
pub fn split_callback_data(data: &str) -> (i64, String) {
    match data.split_once('#') {
        Some((index, choice)) => match index.parse::<i64>() {
            Ok(index) => (index, choice.to_owned()),
            Err(_) => (-1, String::new()),
        },
        None => (-1, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        // `Update`'s custom deserializer misparses buffered `serde_json::Value`
        // input (falls back to `UpdateKind::Error`), so go through a string.
        serde_json::from_str(&value.to_string()).expect("fixture should deserialize")
    }

    fn text_update(text: &str) -> Update {
        update(json!({
            "update_id": 999_999_999,
            "message": {
                "message_id": 1234,
                "from": {
                    "id": 12345,
                    "is_bot": false,
                    "first_name": "John",
                    "last_name": "Doe",
                    "username": "JohnDoe",
                    "language_code": "en"
                },
                "chat": {
                    "id": 12345,
                    "first_name": "John",
                    "last_name": "Doe",
                    "username": "JohnDoe",
                    "type": "private"
                },
                "date": 1_687_615_926,
                "text": text
            }
        }))
    }

    fn callback_update(data: &str) -> Update {
        update(json!({
            "update_id": 999_999_999,
            "callback_query": {
                "id": "7999999999999990",
                "from": {
                    "id": 12345,
                    "is_bot": false,
                    "first_name": "John",
                    "last_name": "Doe",
                    "username": "JohnDoe"
                },
                "message": {
                    "message_id": 1111,
                    "from": {
                        "id": 321_321,
                        "is_bot": true,
                        "first_name": "test_bot",
                        "username": "test_bot"
                    },
                    "chat": {
                        "id": 12345,
                        "first_name": "John",
                        "last_name": "Doe",
                        "username": "JohnDoe",
                        "type": "private"
                    },
                    "date": 1_687_615_941,
                    "text": "Siapakah yang mencipta Python?"
                },
                "chat_instance": "-49999999999",
                "data": data
            }
        }))
    }

    #[test]
    fn plain_message_becomes_text_message() {
        let parsed = parse(&text_update("Test message from a telegram user")).unwrap();
        match parsed {
            InboundUpdate::TextMessage(msg) => {
                assert_eq!(msg.chat_id, ChatId(12345));
                assert_eq!(msg.user_id, 12345);
                assert_eq!(msg.first_name, "John");
                assert_eq!(msg.last_name.as_deref(), Some("Doe"));
                assert_eq!(msg.username.as_deref(), Some("JohnDoe"));
                assert_eq!(msg.text, "Test message from a telegram user");
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn callback_becomes_callback_answer() {
        let parsed = parse(&callback_update("0#Guido van Rossum")).unwrap();
        match parsed {
            InboundUpdate::CallbackAnswer(answer) => {
                assert_eq!(answer.chat_id, ChatId(12345));
                assert_eq!(answer.user_id, 12345);
                assert_eq!(answer.question_index, 0);
                assert_eq!(answer.choice, "Guido van Rossum");
                let origin = answer.origin.expect("origin message present");
                assert_eq!(origin.message_id, MessageId(1111));
                assert_eq!(origin.text, "Siapakah yang mencipta Python?");
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn malformed_callback_data_collapses_to_noop_marker() {
        let parsed = parse(&callback_update("abc")).unwrap();
        match parsed {
            InboundUpdate::CallbackAnswer(answer) => {
                assert_eq!(answer.question_index, -1);
                assert_eq!(answer.choice, "");
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn split_takes_the_first_separator() {
        assert_eq!(split_callback_data("0#Guido van Rossum"), (0, "Guido van Rossum".into()));
        assert_eq!(split_callback_data("3#a#b"), (3, "a#b".into()));
        assert_eq!(split_callback_data("2#"), (2, String::new()));
    }

    #[test]
    fn split_rejects_garbage() {
        assert_eq!(split_callback_data(""), (-1, String::new()));
        assert_eq!(split_callback_data("no separator"), (-1, String::new()));
        assert_eq!(split_callback_data("x#choice"), (-1, String::new()));
    }

    #[test]
    fn non_message_update_is_unrecognized() {
        let poll = update(json!({
            "update_id": 1,
            "poll": {
                "id": "1",
                "question": "q",
                "options": [
                    {"text": "a", "voter_count": 0},
                    {"text": "b", "voter_count": 0}
                ],
                "total_voter_count": 0,
                "is_closed": false,
                "is_anonymous": true,
                "type": "regular",
                "allows_multiple_answers": false
            }
        }));
        assert!(matches!(parse(&poll), Ok(InboundUpdate::Unrecognized)));
    }
}
