use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, InlineKeyboardMarkup, MessageId},
    Bot,
};

use crate::error::BotError;

/// The messaging-platform operations the quiz needs. The wire format is the
/// platform's business; tests substitute a recording double.
pub trait Messenger {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotError>;

    /// Replaces a message's text; Telegram drops the inline keyboard when
    /// the edit carries none, which is how stale answer buttons die.
    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), BotError>;

    async fn create_invite_link(&self) -> Result<String, BotError>;
}

/// `Messenger` over the real Bot API.
#[derive(Clone)]
pub struct Telegram {
    bot: Bot,
    group_chat: ChatId,
}

impl Telegram {
    pub fn new(bot: Bot, group_chat: ChatId) -> Self {
        Self { bot, group_chat }
    }
}

impl Messenger for Telegram {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotError> {
        tracing::debug!(%chat_id, text, with_keyboard = keyboard.is_some(), "send_message");
        let request = self.bot.send_message(chat_id, text);
        match keyboard {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), BotError> {
        tracing::debug!(%chat_id, message_id = message_id.0, "edit_message");
        self.bot.edit_message_text(chat_id, message_id, text).await?;
        Ok(())
    }

    async fn create_invite_link(&self) -> Result<String, BotError> {
        tracing::info!(group_chat = %self.group_chat, "exporting new group invite link");
        Ok(self.bot.export_chat_invite_link(self.group_chat).await?)
    }
}
