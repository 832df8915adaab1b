//! services/bot/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `StatsStore` port from the core crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::NaiveDate;
use quiz_trainer_core::domain::{AnswerLogEntry, Mistake, MistakeStat, QuestionStat, UserId};
use quiz_trainer_core::ports::{PortError, PortResult, StatsStore};
use sqlx::{FromRow, PgPool, Row};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StatsStore` port.
#[derive(Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    /// Creates a new `PgStatsStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema at startup. All statements are idempotent.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stats (
                user_id BIGINT NOT NULL,
                question TEXT NOT NULL,
                shown INTEGER NOT NULL DEFAULT 0,
                wrong INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, question)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL,
                question TEXT NOT NULL,
                user_answer TEXT NOT NULL,
                correct_answer TEXT NOT NULL,
                is_correct BOOLEAN NOT NULL,
                answered_at DATE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_blocked_questions (
                user_id BIGINT NOT NULL,
                question TEXT NOT NULL,
                PRIMARY KEY (user_id, question)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn round_rate(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StatRecord {
    shown: i32,
    wrong: i32,
}

impl StatRecord {
    fn to_domain(self) -> QuestionStat {
        QuestionStat {
            shown: self.shown.max(0) as u32,
            wrong: self.wrong.max(0) as u32,
        }
    }
}

#[derive(FromRow)]
struct MistakeRecord {
    question: String,
    correct_answer: String,
}

impl MistakeRecord {
    fn to_domain(self) -> Mistake {
        Mistake {
            question_id: self.question,
            correct_answer: self.correct_answer,
        }
    }
}

#[derive(FromRow)]
struct MistakeStatRecord {
    question: String,
    wrong: i32,
    shown: i32,
}

impl MistakeStatRecord {
    fn to_domain(self) -> MistakeStat {
        let shown = self.shown.max(0) as u32;
        let wrong = self.wrong.max(0) as u32;
        let rate = if shown == 0 {
            0.0
        } else {
            round_rate(wrong as f64 / shown as f64 * 100.0)
        };
        MistakeStat {
            question_id: self.question,
            wrong,
            shown,
            rate,
        }
    }
}

//=========================================================================================
// `StatsStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn get_stat(&self, user_id: UserId, question_id: &str) -> PortResult<QuestionStat> {
        let record = sqlx::query_as::<_, StatRecord>(
            "SELECT shown, wrong FROM stats WHERE user_id = $1 AND question = $2",
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(StatRecord::to_domain).unwrap_or_default())
    }

    async fn record_answer(
        &self,
        user_id: UserId,
        question_id: &str,
        is_correct: bool,
    ) -> PortResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stats (user_id, question, shown, wrong)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (user_id, question) DO UPDATE SET
                shown = stats.shown + 1,
                wrong = stats.wrong + EXCLUDED.wrong
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .bind(if is_correct { 0i32 } else { 1i32 })
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn append_log(&self, entry: &AnswerLogEntry) -> PortResult<()> {
        sqlx::query(
            r#"
            INSERT INTO logs (user_id, question, user_answer, correct_answer, is_correct, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.question_id)
        .bind(&entry.selected)
        .bind(&entry.correct)
        .bind(entry.is_correct)
        .bind(entry.answered_on)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn distinct_answered_count(&self, user_id: UserId) -> PortResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stats WHERE user_id = $1 AND shown > 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(count.max(0) as u64)
    }

    async fn daily_totals(&self, user_id: UserId, day: NaiveDate) -> PortResult<(u64, u64)> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN is_correct THEN 1 ELSE 0 END), 0) AS correct
            FROM logs
            WHERE user_id = $1 AND answered_at = $2
            "#,
        )
        .bind(user_id)
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let total: i64 = row.try_get("total").map_err(unexpected)?;
        let correct: i64 = row.try_get("correct").map_err(unexpected)?;
        Ok((total.max(0) as u64, correct.max(0) as u64))
    }

    async fn mistakes(&self, user_id: UserId) -> PortResult<Vec<Mistake>> {
        let records = sqlx::query_as::<_, MistakeRecord>(
            r#"
            SELECT DISTINCT question, correct_answer
            FROM logs
            WHERE user_id = $1 AND is_correct = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(MistakeRecord::to_domain).collect())
    }

    async fn top_mistakes(&self, user_id: UserId, limit: u32) -> PortResult<Vec<MistakeStat>> {
        let records = sqlx::query_as::<_, MistakeStatRecord>(
            r#"
            SELECT question, wrong, shown
            FROM stats
            WHERE user_id = $1 AND shown > 0 AND wrong > 0
            ORDER BY wrong::float8 / shown DESC, wrong DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(MistakeStatRecord::to_domain)
            .collect())
    }

    async fn blacklist_add(&self, user_id: UserId, question_id: &str) -> PortResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_blocked_questions (user_id, question)
            VALUES ($1, $2)
            ON CONFLICT (user_id, question) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(question_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn blacklist_remove(&self, user_id: UserId, question_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM user_blocked_questions WHERE user_id = $1 AND question = $2")
            .bind(user_id)
            .bind(question_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn blacklist_list(&self, user_id: UserId) -> PortResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT question FROM user_blocked_questions WHERE user_id = $1 ORDER BY question",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(ids)
    }

    async fn blacklist_contains(&self, user_id: UserId, question_id: &str) -> PortResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_blocked_questions WHERE user_id = $1 AND question = $2)",
        )
        .bind(user_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(exists)
    }

    async fn reset(&self, user_id: UserId) -> PortResult<()> {
        // Stats and log rows go together; the blacklist survives.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM stats WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        sqlx::query("DELETE FROM logs WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}
