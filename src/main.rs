use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use url::Url;

use quizbot::config::Settings;
use quizbot::error::BotError;
use quizbot::quiz::QuizDefinition;
use quizbot::runner::QuizRunner;
use quizbot::store::PgStore;
use quizbot::telegram::Telegram;
use quizbot::update;

type Runner = QuizRunner<PgStore, Telegram>;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let settings = Settings::from_env().expect("configuration should be complete");
    let raw_quiz = std::fs::read_to_string(&settings.quiz_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", settings.quiz_path));
    let quiz = QuizDefinition::from_json(&raw_quiz).expect("quiz file should be valid");
    tracing::info!(questions = quiz.len(), path = %settings.quiz_path, "quiz loaded");

    let store = PgStore::connect(&settings.database_url)
        .await
        .expect("failed to connect to database");
    store.migrate().await.expect("migrations should apply");

    let bot = Bot::new(settings.token.clone());
    let telegram = Telegram::new(bot.clone(), settings.group_chat);
    let runner = Arc::new(QuizRunner::new(
        quiz,
        store,
        telegram,
        settings.admins.clone(),
        settings.policy.clone(),
    ));

    tracing::info!("starting quiz bot");
    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![runner])
        .enable_ctrlc_handler()
        .build();

    let webhook_url = std::env::var("WEBHOOK_URL")
        .ok()
        .map(|raw| raw.parse::<Url>().expect("WEBHOOK_URL should be a valid URL"));
    let webhook_addr = std::env::var("WEBHOOK_ADDR").ok().map(|raw| {
        raw.parse::<SocketAddr>()
            .expect("WEBHOOK_ADDR should be a socket address")
    });

    if let (Some(url), Some(addr)) = (webhook_url, webhook_addr) {
        let listener = webhooks::axum(bot, Options::new(addr, url))
            .await
            .expect("failed to build the webhook listener");
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("webhook listener error"),
            )
            .await;
    } else {
        dispatcher.dispatch().await;
    }
}

fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    tracing_log::LogTracer::init().ok();
    tracing_subscriber::fmt()
        .with_max_level(level.parse().unwrap_or(LevelFilter::INFO))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .with_target(false)
        .init();
}

fn schema() -> UpdateHandler<BotError> {
    dptree::entry().endpoint(dispatch)
}

/// The boundary: parse failures and handler failures are logged here with
/// the update id and swallowed, so nothing internal leaks back out and the
/// dispatcher keeps running.
async fn dispatch(raw: Update, runner: Arc<Runner>) -> Result<(), BotError> {
    let inbound = match update::parse(&raw) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(update_id = raw.id.0, error = %e, "dropping unparseable update");
            return Ok(());
        }
    };

    if let Err(e) = runner.handle(inbound).await {
        tracing::error!(update_id = raw.id.0, error = %e, "update processing failed");
    }
    Ok(())
}
