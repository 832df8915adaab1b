//! crates/quiz_trainer_core/src/session.rs
//!
//! Per-user, process-lifetime session state and the keyed store that owns it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Question, UserId};

/// The current delivery mode of a user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Normal,
    MistakeTraining,
}

/// The question currently awaiting an answer, holding its own shuffled
/// presentation order. This is an explicit copy: the shared corpus entry
/// is never mutated.
#[derive(Debug, Clone)]
pub struct InFlightQuestion {
    pub question_id: String,
    /// Options in the order shown to the user; an answer arrives as an
    /// index into this sequence.
    pub options: Vec<String>,
    pub correct: String,
}

/// Running counters for the session, reset only by an explicit user reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    pub answered: u32,
    pub correct: u32,
}

/// Ephemeral per-user state. Lives in process memory only; it is a cache
/// of in-flight progress distinct from the durable stats store.
#[derive(Debug)]
pub struct SessionState {
    pub current: Option<InFlightQuestion>,
    pub previous_question_id: Option<String>,
    /// Question ids already shown at least once this session (normal mode only).
    pub seen: HashSet<String>,
    pub mode: SessionMode,
    /// Questions still to be cleared in mistake training.
    pub mistake_pool: Vec<Question>,
    /// Attempts on the current question within mistake mode.
    pub retry_count: u32,
    /// Set when the answer processor requested an immediate redelivery of
    /// the current question instead of a fresh draw.
    pub retry_pending: bool,
    pub progress: Progress,
}

impl SessionState {
    fn new() -> Self {
        Self {
            current: None,
            previous_question_id: None,
            seen: HashSet::new(),
            mode: SessionMode::Normal,
            mistake_pool: Vec::new(),
            retry_count: 0,
            retry_pending: false,
            progress: Progress::default(),
        }
    }

    /// Discards a pending question without touching any counters. Used when
    /// a new command supersedes an outstanding question.
    pub fn discard_pending(&mut self) {
        self.current = None;
        self.retry_count = 0;
        self.retry_pending = false;
    }

    /// Returns the session to a brand-new state. The durable store is
    /// reset separately by the caller.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

/// A keyed map of sessions owned by the engine.
///
/// Each user's state sits behind its own lock; engine operations hold that
/// lock for their full duration, which serializes scheduling, answer
/// processing and reporting per user while leaving different users fully
/// independent.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<UserId, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session handle for a user, creating it on first contact.
    pub async fn get_or_create(&self, user_id: UserId) -> Arc<Mutex<SessionState>> {
        let mut map = self.inner.lock().await;
        map.entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(SessionState::new())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_created_lazily_and_shared() {
        let store = SessionStore::new();
        let a = store.get_or_create(1).await;
        let b = store.get_or_create(1).await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = store.get_or_create(2).await;
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn discard_pending_keeps_progress() {
        let store = SessionStore::new();
        let handle = store.get_or_create(7).await;
        let mut session = handle.lock().await;
        session.progress.answered = 10;
        session.current = Some(InFlightQuestion {
            question_id: "Q".into(),
            options: vec!["a".into(), "b".into()],
            correct: "a".into(),
        });
        session.retry_count = 1;

        session.discard_pending();
        assert!(session.current.is_none());
        assert_eq!(session.retry_count, 0);
        assert_eq!(session.progress.answered, 10);
    }
}
