//! crates/quiz_trainer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the quiz trainer's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{AnswerLogEntry, Mistake, MistakeStat, QuestionStat, UserId};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Stats Store Port
//=========================================================================================

/// Durable per-user statistics: shown/wrong counters keyed by
/// `(user_id, question_id)`, an append-only answer log, and a per-user
/// blacklist of questions that must never be scheduled.
///
/// All counter updates are commutative increments, so at-least-once
/// delivery from a retried caller is tolerated.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Returns the exposure counters for one question, zeros if absent.
    async fn get_stat(&self, user_id: UserId, question_id: &str) -> PortResult<QuestionStat>;

    /// Upserts the counters: `shown += 1`, and `wrong += 1` when incorrect.
    async fn record_answer(
        &self,
        user_id: UserId,
        question_id: &str,
        is_correct: bool,
    ) -> PortResult<()>;

    /// Appends one row to the answer log. Rows are never mutated afterwards.
    async fn append_log(&self, entry: &AnswerLogEntry) -> PortResult<()>;

    /// Number of distinct questions this user has been shown at least once.
    async fn distinct_answered_count(&self, user_id: UserId) -> PortResult<u64>;

    /// `(total, correct)` answer counts for one calendar day.
    async fn daily_totals(&self, user_id: UserId, day: NaiveDate) -> PortResult<(u64, u64)>;

    /// Distinct questions the user has ever answered incorrectly,
    /// derived from the log.
    async fn mistakes(&self, user_id: UserId) -> PortResult<Vec<Mistake>>;

    /// The user's worst questions by error rate, at most `limit` rows.
    async fn top_mistakes(&self, user_id: UserId, limit: u32) -> PortResult<Vec<MistakeStat>>;

    // --- Blacklist (idempotent set membership) ---

    async fn blacklist_add(&self, user_id: UserId, question_id: &str) -> PortResult<()>;

    async fn blacklist_remove(&self, user_id: UserId, question_id: &str) -> PortResult<()>;

    async fn blacklist_list(&self, user_id: UserId) -> PortResult<Vec<String>>;

    async fn blacklist_contains(&self, user_id: UserId, question_id: &str) -> PortResult<bool>;

    /// Clears the user's counters and log rows. The blacklist survives.
    async fn reset(&self, user_id: UserId) -> PortResult<()>;
}
