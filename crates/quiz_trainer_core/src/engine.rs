//! crates/quiz_trainer_core/src/engine.rs
//!
//! The quiz engine: question delivery, answer processing and the
//! mistake-training state machine, built on the `StatsStore` port.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rand::thread_rng;
use tracing::{debug, info, warn};

use crate::corpus::Corpus;
use crate::domain::{AnswerLogEntry, DayTotals, MistakeStat, Question, Summary, UserId};
use crate::ports::{PortError, StatsStore};
use crate::report;
use crate::scheduler;
use crate::session::{SessionMode, SessionStore};

//=========================================================================================
// Configuration and Errors
//=========================================================================================

/// Tunables for the engine. The retry cap and report interval are
/// arbitrary defaults, so they are configurable rather than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Attempts allowed on one question within mistake training before it
    /// is deferred back into the pool.
    pub retry_limit: u32,
    /// A progress summary is attached to every Nth processed answer.
    pub report_interval: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_limit: 2,
            report_interval: 50,
        }
    }
}

/// The primary error type for engine operations. Only `EmptyPool` is fatal
/// to the scheduling loop; everything else is recoverable for the session.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no questions available")]
    EmptyPool,

    #[error("no question is awaiting an answer")]
    NoActiveQuestion,

    #[error("selection {index} is out of range for {len} options")]
    InvalidSelection { index: usize, len: usize },

    #[error("no recorded mistakes to train on")]
    NoMistakes,

    #[error("Stats store error: {0}")]
    Store(#[from] PortError),
}

//=========================================================================================
// Engine Outputs
//=========================================================================================

/// A question ready for rendering: the prompt plus its shuffled options.
/// The transport returns an index into `options` as the user's answer.
#[derive(Debug, Clone)]
pub struct DeliveredQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

/// The scheduling action taken after an answer was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Proceed to a fresh draw.
    Continue,
    /// The same question must be redelivered immediately (mistake mode).
    Retry,
    /// The mistake pool was cleared and the session is back in normal mode.
    MistakeModeFinished,
}

/// The outcome of one submitted answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub transition: Transition,
    /// Present on every `report_interval`th processed answer.
    pub report: Option<Summary>,
}

//=========================================================================================
// The Engine
//=========================================================================================

/// Owns the corpus, the per-user sessions and the store handle.
///
/// Every operation locks the addressed user's session for its full duration,
/// so scheduling, answer processing and reporting for one user are serialized
/// while different users proceed in parallel.
pub struct QuizEngine {
    corpus: Arc<Corpus>,
    store: Arc<dyn StatsStore>,
    sessions: SessionStore,
    config: EngineConfig,
}

impl QuizEngine {
    pub fn new(corpus: Arc<Corpus>, store: Arc<dyn StatsStore>, config: EngineConfig) -> Self {
        Self {
            corpus,
            store,
            sessions: SessionStore::new(),
            config,
        }
    }

    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Selects and registers the next question for a user.
    ///
    /// Fails with `EmptyPool` only when the corpus itself is empty. A forced
    /// retry redelivers the pending question with freshly shuffled options
    /// instead of drawing anew.
    pub async fn next_question(&self, user_id: UserId) -> Result<DeliveredQuestion, EngineError> {
        if self.corpus.is_empty() {
            return Err(EngineError::EmptyPool);
        }

        let handle = self.sessions.get_or_create(user_id).await;
        let mut session = handle.lock().await;

        if session.retry_pending {
            if let Some(mut flight) = session.current.clone() {
                session.retry_pending = false;
                {
                    use rand::seq::SliceRandom;
                    let mut rng = thread_rng();
                    flight.options.shuffle(&mut rng);
                }
                debug!(user_id, question = %flight.question_id, "redelivering question for retry");
                session.current = Some(flight.clone());
                return Ok(DeliveredQuestion {
                    prompt: flight.question_id,
                    options: flight.options,
                });
            }
            // A retry without a pending question cannot happen through the
            // public API; fall through to a fresh draw.
            session.retry_pending = false;
        }

        // An exhausted mistake pool means training already ended.
        if session.mode == SessionMode::MistakeTraining && session.mistake_pool.is_empty() {
            session.mode = SessionMode::Normal;
        }

        let blacklist: HashSet<String> = self
            .store
            .blacklist_list(user_id)
            .await?
            .into_iter()
            .collect();
        let previous = session.previous_question_id.clone();

        let chosen: Question = match session.mode {
            SessionMode::Normal => {
                let all: Vec<&Question> = self.corpus.iter().collect();
                let pool = scheduler::relax(&all, &blacklist, previous.as_deref());
                let pool = scheduler::prefer_unseen(pool, &session.seen);

                let mut weighted = Vec::with_capacity(pool.len());
                for question in pool {
                    let stat = self.store.get_stat(user_id, &question.id).await?;
                    weighted.push((question, scheduler::weight(stat)));
                }

                let mut rng = thread_rng();
                scheduler::select_weighted(&weighted, &mut rng)
                    .cloned()
                    .ok_or(EngineError::EmptyPool)?
            }
            SessionMode::MistakeTraining => {
                let all: Vec<&Question> = session.mistake_pool.iter().collect();
                let pool = scheduler::relax(&all, &blacklist, previous.as_deref());

                let mut rng = thread_rng();
                scheduler::select_uniform(&pool, &mut rng)
                    .cloned()
                    .ok_or(EngineError::EmptyPool)?
            }
        };

        let flight = {
            let mut rng = thread_rng();
            scheduler::shuffle_into_flight(&chosen, &mut rng)
        };

        if session.mode == SessionMode::Normal {
            session.seen.insert(chosen.id.clone());
        }
        session.previous_question_id = Some(chosen.id.clone());
        session.current = Some(flight.clone());
        session.retry_count = 0;

        debug!(user_id, question = %flight.question_id, mode = ?session.mode, "question selected");
        Ok(DeliveredQuestion {
            prompt: flight.question_id,
            options: flight.options,
        })
    }

    /// Processes a submitted answer and decides the next transition.
    ///
    /// Durable writes happen before any session mutation, so a failed store
    /// call leaves the pending question intact and the submission can be
    /// retried safely.
    pub async fn submit_answer(
        &self,
        user_id: UserId,
        selected_index: usize,
    ) -> Result<AnswerOutcome, EngineError> {
        let handle = self.sessions.get_or_create(user_id).await;
        let mut session = handle.lock().await;

        let (question_id, selected, correct_answer) = {
            let current = session.current.as_ref().ok_or(EngineError::NoActiveQuestion)?;
            let len = current.options.len();
            let selected = current
                .options
                .get(selected_index)
                .ok_or(EngineError::InvalidSelection {
                    index: selected_index,
                    len,
                })?
                .clone();
            (current.question_id.clone(), selected, current.correct.clone())
        };

        // Exact string match after trimming is the sole correctness criterion.
        let is_correct = selected.trim() == correct_answer.trim();

        self.store
            .record_answer(user_id, &question_id, is_correct)
            .await?;
        self.store
            .append_log(&AnswerLogEntry {
                user_id,
                question_id: question_id.clone(),
                selected,
                correct: correct_answer.clone(),
                is_correct,
                answered_on: Utc::now().date_naive(),
            })
            .await?;

        session.progress.answered += 1;
        if is_correct {
            session.progress.correct += 1;
        }

        let transition = match session.mode {
            SessionMode::Normal => {
                session.current = None;
                Transition::Continue
            }
            SessionMode::MistakeTraining => {
                if is_correct {
                    session.mistake_pool.retain(|q| q.id != question_id);
                    session.current = None;
                    session.retry_count = 0;
                    if session.mistake_pool.is_empty() {
                        info!(user_id, "mistake pool cleared, back to normal mode");
                        session.mode = SessionMode::Normal;
                        Transition::MistakeModeFinished
                    } else {
                        Transition::Continue
                    }
                } else {
                    session.retry_count += 1;
                    if session.retry_count < self.config.retry_limit {
                        // The pending question stays in place for redelivery.
                        session.retry_pending = true;
                        Transition::Retry
                    } else {
                        // Deferred: the question stays in the pool and will
                        // resurface on a later draw.
                        session.current = None;
                        session.retry_count = 0;
                        Transition::Continue
                    }
                }
            }
        };

        // A forced retry skips the periodic report; the counters still count.
        let report = if transition != Transition::Retry
            && self.config.report_interval > 0
            && session.progress.answered % self.config.report_interval == 0
        {
            match self.store.distinct_answered_count(user_id).await {
                Ok(distinct) => Some(report::summarize(
                    session.progress,
                    self.corpus.len(),
                    distinct,
                )),
                Err(e) => {
                    warn!(user_id, error = %e, "periodic report skipped");
                    None
                }
            }
        } else {
            None
        };

        Ok(AnswerOutcome {
            question_id,
            is_correct,
            correct_answer,
            transition,
            report,
        })
    }

    /// Enters mistake training, populating the pool from every question the
    /// user has ever answered incorrectly. Logged mistakes whose question no
    /// longer exists in the corpus are silently skipped; blacklisted ones are
    /// excluded. Refused with `NoMistakes` when the resulting pool is empty.
    pub async fn start_mistake_training(&self, user_id: UserId) -> Result<usize, EngineError> {
        let mistakes = self.store.mistakes(user_id).await?;
        let blacklist: HashSet<String> = self
            .store
            .blacklist_list(user_id)
            .await?
            .into_iter()
            .collect();

        let handle = self.sessions.get_or_create(user_id).await;
        let mut session = handle.lock().await;

        let mut pool: Vec<Question> = Vec::new();
        let mut included: HashSet<&str> = HashSet::new();
        for mistake in &mistakes {
            if blacklist.contains(&mistake.question_id) {
                continue;
            }
            if !included.insert(mistake.question_id.as_str()) {
                continue;
            }
            if let Some(question) = self.corpus.get(&mistake.question_id) {
                pool.push(question.clone());
            }
        }

        if pool.is_empty() {
            return Err(EngineError::NoMistakes);
        }

        // A pending question is superseded without stat side effects.
        session.discard_pending();
        session.mode = SessionMode::MistakeTraining;
        session.mistake_pool = pool;
        info!(
            user_id,
            pool_size = session.mistake_pool.len(),
            "mistake training started"
        );
        Ok(session.mistake_pool.len())
    }

    /// Clears the user's durable stats and the in-memory session. The
    /// blacklist is deliberately left alone. Idempotent.
    pub async fn reset(&self, user_id: UserId) -> Result<(), EngineError> {
        let handle = self.sessions.get_or_create(user_id).await;
        let mut session = handle.lock().await;

        // Durable reset first; on failure the session stays untouched.
        self.store.reset(user_id).await?;
        session.clear();
        info!(user_id, "stats reset");
        Ok(())
    }

    /// Derives the current progress summary. Read-only.
    pub async fn report(&self, user_id: UserId) -> Result<Summary, EngineError> {
        let handle = self.sessions.get_or_create(user_id).await;
        let session = handle.lock().await;

        let distinct = self.store.distinct_answered_count(user_id).await?;
        Ok(report::summarize(
            session.progress,
            self.corpus.len(),
            distinct,
        ))
    }

    /// `(total, correct)` for today's calendar date.
    pub async fn daily_report(&self, user_id: UserId) -> Result<(u64, u64), EngineError> {
        let today = Utc::now().date_naive();
        Ok(self.store.daily_totals(user_id, today).await?)
    }

    /// Per-day totals over the last 7 calendar days, newest first. Days
    /// without answers are skipped.
    pub async fn weekly_report(&self, user_id: UserId) -> Result<Vec<DayTotals>, EngineError> {
        let today = Utc::now().date_naive();
        let mut days = Vec::new();
        for offset in 0..7 {
            let date = today - chrono::Duration::days(offset);
            let (total, correct) = self.store.daily_totals(user_id, date).await?;
            if total == 0 {
                continue;
            }
            days.push(DayTotals {
                date,
                total,
                correct,
                accuracy: report::round_rate(correct as f64 / total as f64 * 100.0),
            });
        }
        Ok(days)
    }

    /// The user's worst questions by error rate.
    pub async fn top_mistakes(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<MistakeStat>, EngineError> {
        Ok(self.store.top_mistakes(user_id, limit).await?)
    }

    /// Adds a question to the user's blacklist and keeps the live session
    /// consistent: the id is dropped from a running mistake pool, and a
    /// pending delivery of that question is discarded. Returns true when
    /// the removal emptied the mistake pool and ended training, so the
    /// caller can announce it.
    pub async fn blacklist_add(
        &self,
        user_id: UserId,
        question_id: &str,
    ) -> Result<bool, EngineError> {
        self.store.blacklist_add(user_id, question_id).await?;

        let handle = self.sessions.get_or_create(user_id).await;
        let mut session = handle.lock().await;
        session.mistake_pool.retain(|q| q.id != question_id);
        let mut training_ended = false;
        if session.mode == SessionMode::MistakeTraining && session.mistake_pool.is_empty() {
            info!(user_id, "mistake pool emptied by blacklisting, back to normal mode");
            session.mode = SessionMode::Normal;
            training_ended = true;
        }
        if session
            .current
            .as_ref()
            .is_some_and(|c| c.question_id == question_id)
        {
            session.discard_pending();
        }
        Ok(training_ended)
    }

    pub async fn blacklist_remove(
        &self,
        user_id: UserId,
        question_id: &str,
    ) -> Result<(), EngineError> {
        Ok(self.store.blacklist_remove(user_id, question_id).await?)
    }

    pub async fn blacklist_list(&self, user_id: UserId) -> Result<Vec<String>, EngineError> {
        Ok(self.store.blacklist_list(user_id).await?)
    }
}
