//! crates/quiz_trainer_core/src/memory.rs
//!
//! An in-memory `StatsStore`. Backs the engine tests and doubles as a
//! no-database backend for demos.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::domain::{AnswerLogEntry, Mistake, MistakeStat, QuestionStat, UserId};
use crate::ports::{PortResult, StatsStore};
use crate::report::round_rate;

#[derive(Default)]
struct Inner {
    stats: HashMap<(UserId, String), QuestionStat>,
    log: Vec<AnswerLogEntry>,
    blacklist: HashSet<(UserId, String)>,
}

/// Keeps the same semantics as the SQL store: upsert-increment counters,
/// an append-only log, and log-derived distinct mistakes.
#[derive(Default)]
pub struct InMemoryStatsStore {
    inner: Mutex<Inner>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn get_stat(&self, user_id: UserId, question_id: &str) -> PortResult<QuestionStat> {
        let inner = self.inner.lock().await;
        Ok(inner
            .stats
            .get(&(user_id, question_id.to_string()))
            .copied()
            .unwrap_or_default())
    }

    async fn record_answer(
        &self,
        user_id: UserId,
        question_id: &str,
        is_correct: bool,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        let stat = inner
            .stats
            .entry((user_id, question_id.to_string()))
            .or_default();
        stat.shown += 1;
        if !is_correct {
            stat.wrong += 1;
        }
        Ok(())
    }

    async fn append_log(&self, entry: &AnswerLogEntry) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        inner.log.push(entry.clone());
        Ok(())
    }

    async fn distinct_answered_count(&self, user_id: UserId) -> PortResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .stats
            .iter()
            .filter(|((uid, _), stat)| *uid == user_id && stat.shown > 0)
            .count() as u64)
    }

    async fn daily_totals(&self, user_id: UserId, day: NaiveDate) -> PortResult<(u64, u64)> {
        let inner = self.inner.lock().await;
        let mut total = 0;
        let mut correct = 0;
        for entry in inner
            .log
            .iter()
            .filter(|e| e.user_id == user_id && e.answered_on == day)
        {
            total += 1;
            if entry.is_correct {
                correct += 1;
            }
        }
        Ok((total, correct))
    }

    async fn mistakes(&self, user_id: UserId) -> PortResult<Vec<Mistake>> {
        let inner = self.inner.lock().await;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for entry in inner
            .log
            .iter()
            .filter(|e| e.user_id == user_id && !e.is_correct)
        {
            if seen.insert(entry.question_id.clone()) {
                out.push(Mistake {
                    question_id: entry.question_id.clone(),
                    correct_answer: entry.correct.clone(),
                });
            }
        }
        Ok(out)
    }

    async fn top_mistakes(&self, user_id: UserId, limit: u32) -> PortResult<Vec<MistakeStat>> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<MistakeStat> = inner
            .stats
            .iter()
            .filter(|((uid, _), stat)| *uid == user_id && stat.shown > 0 && stat.wrong > 0)
            .map(|((_, qid), stat)| MistakeStat {
                question_id: qid.clone(),
                wrong: stat.wrong,
                shown: stat.shown,
                rate: round_rate(stat.wrong as f64 / stat.shown as f64 * 100.0),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.rate
                .partial_cmp(&a.rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.wrong.cmp(&a.wrong))
        });
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn blacklist_add(&self, user_id: UserId, question_id: &str) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        inner.blacklist.insert((user_id, question_id.to_string()));
        Ok(())
    }

    async fn blacklist_remove(&self, user_id: UserId, question_id: &str) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        inner.blacklist.remove(&(user_id, question_id.to_string()));
        Ok(())
    }

    async fn blacklist_list(&self, user_id: UserId) -> PortResult<Vec<String>> {
        let inner = self.inner.lock().await;
        let mut ids: Vec<String> = inner
            .blacklist
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, qid)| qid.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn blacklist_contains(&self, user_id: UserId, question_id: &str) -> PortResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .blacklist
            .contains(&(user_id, question_id.to_string())))
    }

    async fn reset(&self, user_id: UserId) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        inner.stats.retain(|(uid, _), _| *uid != user_id);
        inner.log.retain(|e| e.user_id != user_id);
        // The blacklist survives a reset.
        Ok(())
    }
}
