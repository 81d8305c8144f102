use teloxide::types::ChatId;
use tracing::instrument;

use crate::{
    config::ChatPolicy,
    error::BotError,
    invite,
    keyboard::answer_keyboard,
    quiz::QuizDefinition,
    store::{Outcome, ProgressStore, Stage},
    telegram::Messenger,
    update::{CallbackAnswer, InboundUpdate, TextMessage},
};

/// The quiz state machine. Every dependency is injected, so tests drive it
/// with an in-memory store and a recording messenger.
///
/// A user's position in the quiz is whatever their progress record says;
/// there is no session object. `/start` mid-quiz re-sends question 0 but
/// deliberately does not reset recorded answers.
pub struct QuizRunner<S, M> {
    quiz: QuizDefinition,
    store: S,
    messenger: M,
    admins: Vec<ChatId>,
    policy: ChatPolicy,
}

impl<S: ProgressStore, M: Messenger> QuizRunner<S, M> {
    pub fn new(
        quiz: QuizDefinition,
        store: S,
        messenger: M,
        admins: Vec<ChatId>,
        policy: ChatPolicy,
    ) -> Self {
        Self {
            quiz,
            store,
            messenger,
            admins,
            policy,
        }
    }

    /// The injected store, exposed for assertions in the scenario tests.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The injected messenger, exposed for assertions in the scenario tests.
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    #[instrument(level = "info", skip(self))]
    pub async fn handle(&self, update: InboundUpdate) -> Result<(), BotError> {
        match update {
            InboundUpdate::TextMessage(msg) => {
                if !self.policy.permits(msg.chat_id) {
                    tracing::debug!(chat_id = %msg.chat_id, "chat not served, dropping message");
                    return Ok(());
                }
                if msg.text == "/start" {
                    self.start(&msg).await
                } else {
                    self.echo(&msg).await
                }
            }
            InboundUpdate::CallbackAnswer(answer) => {
                if !self.policy.permits(answer.chat_id) {
                    tracing::debug!(chat_id = %answer.chat_id, "chat not served, dropping callback");
                    return Ok(());
                }
                self.answer(&answer).await
            }
            InboundUpdate::Unrecognized => {
                tracing::debug!("dropping unrecognized update");
                Ok(())
            }
        }
    }

    async fn start(&self, msg: &TextMessage) -> Result<(), BotError> {
        let progress = self
            .store
            .get_or_create(msg.user_id, &msg.first_name, msg.username.as_deref())
            .await?;
        let stage = Stage::of(Some(&progress), self.quiz.len());
        tracing::info!(user_id = msg.user_id, ?stage, "user started the quiz");

        let full_name = full_name(&msg.first_name, msg.last_name.as_deref());
        self.messenger
            .send_message(
                msg.chat_id,
                &format!("Hello {full_name}, please answer the following questions"),
                None,
            )
            .await?;
        self.send_question(msg.chat_id, 0).await?;

        let username = msg.username.as_deref().unwrap_or_default();
        self.notify_admins(&format!("{full_name} - {username} started the quiz"))
            .await;
        Ok(())
    }

    async fn echo(&self, msg: &TextMessage) -> Result<(), BotError> {
        self.messenger
            .send_message(msg.chat_id, &format!("Echo, {}", msg.text), None)
            .await
    }

    async fn answer(&self, answer: &CallbackAnswer) -> Result<(), BotError> {
        if answer.question_index < 0 {
            // malformed payload
            return Ok(());
        }
        let index = answer.question_index as usize;
        let Some(question) = self.quiz.get(index) else {
            tracing::warn!(
                user_id = answer.user_id,
                index,
                "callback for a question outside the quiz, ignoring"
            );
            return Ok(());
        };

        let outcome = if question.grade(&answer.choice) {
            Outcome::Correct
        } else {
            Outcome::Wrong
        };
        self.store
            .record_answer(answer.user_id, index, outcome)
            .await?;
        tracing::info!(user_id = answer.user_id, index, ?outcome, "answer recorded");

        // Strip the keyboard off the answered question so stale buttons
        // cannot be clicked again; the text stays as it was.
        if let Some(origin) = &answer.origin {
            self.messenger
                .edit_message(answer.chat_id, origin.message_id, &origin.text)
                .await?;
        }

        let next = index + 1;
        if next < self.quiz.len() {
            self.send_question(answer.chat_id, next).await
        } else {
            self.send_results(answer.chat_id, answer.user_id).await
        }
    }

    async fn send_question(&self, chat_id: ChatId, index: usize) -> Result<(), BotError> {
        let Some(question) = self.quiz.get(index) else {
            return Ok(());
        };
        self.messenger
            .send_message(
                chat_id,
                question.prompt(),
                Some(answer_keyboard(index, question.choices())),
            )
            .await
    }

    async fn send_results(&self, chat_id: ChatId, user_id: i64) -> Result<(), BotError> {
        let correct = self.store.count_correct(user_id).await?;
        self.messenger
            .send_message(
                chat_id,
                &format!("You have answered {correct} questions correctly"),
                None,
            )
            .await?;

        if correct == self.quiz.len() {
            let link =
                invite::group_link(&self.store, &self.messenger, invite::unix_now()).await?;
            self.messenger
                .send_message(
                    chat_id,
                    &format!(
                        "Congratulations, you have answered all questions correctly\n\
                         Join the group with this link {link}"
                    ),
                    None,
                )
                .await?;
        } else {
            self.messenger
                .send_message(chat_id, "Sorry, please try again. Click here /start", None)
                .await?;
        }
        Ok(())
    }

    /// Best effort: one unreachable admin must not break the user's flow.
    async fn notify_admins(&self, text: &str) {
        for admin in &self.admins {
            if let Err(e) = self.messenger.send_message(*admin, text, None).await {
                tracing::warn!(admin = %admin, error = %e, "failed to notify admin");
            }
        }
    }
}

fn full_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name {
        Some(last_name) => format!("{first_name} {last_name}"),
        None => first_name.to_owned(),
    }
}
