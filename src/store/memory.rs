use std::collections::HashMap;
use std::sync::Mutex;

use super::{CachedLink, Outcome, ProgressStore, StoreError, UserProgress};

/// In-memory store with the same contract as [`PgStore`](super::PgStore).
/// Used by the test suites and handy for running the bot without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<i64, UserProgress>>,
    group_link: Mutex<Option<CachedLink>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's record, for assertions.
    pub fn progress(&self, user_id: i64) -> Option<UserProgress> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }
}

impl ProgressStore for MemoryStore {
    async fn get_or_create(
        &self,
        user_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> Result<UserProgress, StoreError> {
        let mut users = self.users.lock().unwrap();
        let progress = users.entry(user_id).or_insert_with(|| UserProgress {
            user_id,
            first_name: first_name.to_owned(),
            username: username.map(str::to_owned),
            answers: Default::default(),
        });
        Ok(progress.clone())
    }

    async fn record_answer(
        &self,
        user_id: i64,
        question_index: usize,
        outcome: Outcome,
    ) -> Result<(), StoreError> {
        if let Some(progress) = self.users.lock().unwrap().get_mut(&user_id) {
            progress.answers.insert(question_index, outcome);
        }
        Ok(())
    }

    async fn count_correct(&self, user_id: i64) -> Result<usize, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(&user_id)
            .map(UserProgress::count_correct)
            .unwrap_or(0))
    }

    async fn load_group_link(&self) -> Result<Option<CachedLink>, StoreError> {
        Ok(self.group_link.lock().unwrap().clone())
    }

    async fn save_group_link(&self, link: &str, expires_at: i64) -> Result<(), StoreError> {
        *self.group_link.lock().unwrap() = Some(CachedLink {
            link: link.to_owned(),
            expires_at,
        });
        Ok(())
    }
}
