use std::collections::BTreeMap;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Sentinel key holding the cached group invite link. Sharing the user
/// keyspace is a deliberate simplification carried over from the original
/// single-table layout; real Telegram user ids are positive.
pub const GROUP_LINK_KEY: i64 = -9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Wrong,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Correct => "correct",
            Outcome::Wrong => "wrong",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "correct" => Some(Outcome::Correct),
            "wrong" => Some(Outcome::Wrong),
            _ => None,
        }
    }
}

/// One record per user. `answers` maps question index to the graded
/// outcome; re-answering the same index overwrites (last write wins).
#[derive(Debug, Clone)]
pub struct UserProgress {
    pub user_id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub answers: BTreeMap<usize, Outcome>,
}

impl UserProgress {
    pub fn count_correct(&self) -> usize {
        self.answers
            .values()
            .filter(|o| **o == Outcome::Correct)
            .count()
    }
}

/// Where a user stands in the quiz, computed from their progress record
/// rather than tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    InProgress(usize),
    Completed,
}

impl Stage {
    pub fn of(progress: Option<&UserProgress>, total: usize) -> Self {
        match progress {
            None => Stage::NotStarted,
            Some(p) if total > 0 && p.answers.len() >= total => Stage::Completed,
            Some(p) => Stage::InProgress(p.answers.len()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedLink {
    pub link: String,
    pub expires_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-user progress plus the shared invite-link record, keyed by user id.
///
/// `record_answer` must be a per-key atomic overwrite: updates are delivered
/// at least once and possibly concurrently from other processes, so the same
/// callback may be recorded twice. For an unknown user it is a silent no-op,
/// and `count_correct` for an unknown user is 0.
pub trait ProgressStore {
    async fn get_or_create(
        &self,
        user_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> Result<UserProgress, StoreError>;

    async fn record_answer(
        &self,
        user_id: i64,
        question_index: usize,
        outcome: Outcome,
    ) -> Result<(), StoreError>;

    async fn count_correct(&self, user_id: i64) -> Result<usize, StoreError>;

    async fn load_group_link(&self) -> Result<Option<CachedLink>, StoreError>;

    async fn save_group_link(&self, link: &str, expires_at: i64) -> Result<(), StoreError>;
}
