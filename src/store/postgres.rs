use std::collections::BTreeMap;

use sqlx::{postgres::PgPool, Row};

use super::{CachedLink, Outcome, ProgressStore, StoreError, UserProgress, GROUP_LINK_KEY};

/// Postgres-backed store. One row per user in `quiz_users`; the answers map
/// lives in a JSONB column so an answer write is a single-row atomic update,
/// and the invite-link cache sits in the sentinel row.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))
    }
}

impl ProgressStore for PgStore {
    async fn get_or_create(
        &self,
        user_id: i64,
        first_name: &str,
        username: Option<&str>,
    ) -> Result<UserProgress, StoreError> {
        sqlx::query(
            "INSERT INTO quiz_users (user_id, first_name, username) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(first_name)
        .bind(username)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT first_name, username, answers FROM quiz_users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserProgress {
            user_id,
            first_name: row.try_get("first_name")?,
            username: row.try_get("username")?,
            answers: answers_from_json(&row.try_get::<serde_json::Value, _>("answers")?),
        })
    }

    async fn record_answer(
        &self,
        user_id: i64,
        question_index: usize,
        outcome: Outcome,
    ) -> Result<(), StoreError> {
        // Single-statement jsonb_set keeps the write atomic per row; an
        // unknown user matches no row and the call is a no-op.
        sqlx::query(
            "UPDATE quiz_users SET answers = jsonb_set(answers, $2, to_jsonb($3::text), true) \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(vec![question_index.to_string()])
        .bind(outcome.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_correct(&self, user_id: i64) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM quiz_users, jsonb_each_text(answers) AS answer(idx, outcome) \
             WHERE user_id = $1 AND answer.outcome = 'correct'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as usize)
    }

    async fn load_group_link(&self) -> Result<Option<CachedLink>, StoreError> {
        let row = sqlx::query(
            "SELECT group_link, link_expires_at FROM quiz_users WHERE user_id = $1",
        )
        .bind(GROUP_LINK_KEY)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|row| {
            let link: Option<String> = row.try_get("group_link").ok()?;
            let expires_at: Option<i64> = row.try_get("link_expires_at").ok()?;
            Some(CachedLink {
                link: link?,
                expires_at: expires_at?,
            })
        }))
    }

    async fn save_group_link(&self, link: &str, expires_at: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO quiz_users (user_id, group_link, link_expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET group_link = $2, link_expires_at = $3",
        )
        .bind(GROUP_LINK_KEY)
        .bind(link)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Answers come back as a JSONB object of `{"0": "correct", ...}`. Entries
/// that do not look like an index/outcome pair are skipped rather than
/// failing the whole read.
fn answers_from_json(value: &serde_json::Value) -> BTreeMap<usize, Outcome> {
    let Some(object) = value.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            let index = key.parse().ok()?;
            let outcome = Outcome::from_str(value.as_str()?)?;
            Some((index, outcome))
        })
        .collect()
}
