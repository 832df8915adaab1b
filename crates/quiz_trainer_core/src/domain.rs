//! crates/quiz_trainer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the quiz trainer.
//! These structs are independent of any database or serialization format.

use chrono::NaiveDate;

/// Chat-platform numeric user id.
pub type UserId = i64;

/// A single multiple-choice question. The question body doubles as its
/// identity key, so `id` is the prompt text itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub options: Vec<String>,
    pub correct: String,
}

/// Errors raised when a question fails validation at corpus-load time.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("question has an empty prompt")]
    EmptyPrompt,
    #[error("question '{0}' has {1} options, expected 2 to 5")]
    BadOptionCount(String, usize),
    #[error("question '{0}' has an empty option")]
    EmptyOption(String),
    #[error("correct answer '{1}' of question '{0}' is not among its options")]
    CorrectNotInOptions(String, String),
}

impl Question {
    /// Builds a question, enforcing the corpus invariants: 2-5 non-empty
    /// options and a correct answer that matches one option after trimming.
    pub fn new(
        id: impl Into<String>,
        options: Vec<String>,
        correct: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let id = id.into();
        let correct = correct.into();

        if id.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 || options.len() > 5 {
            return Err(QuestionError::BadOptionCount(id, options.len()));
        }
        if options.iter().any(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption(id));
        }
        if !options.iter().any(|o| o.trim() == correct.trim()) {
            return Err(QuestionError::CorrectNotInOptions(id, correct));
        }

        Ok(Self { id, options, correct })
    }
}

/// Per-(user, question) exposure counters. Created lazily on first
/// exposure; `wrong` never exceeds `shown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionStat {
    pub shown: u32,
    pub wrong: u32,
}

/// One row of the append-only answer log.
#[derive(Debug, Clone)]
pub struct AnswerLogEntry {
    pub user_id: UserId,
    pub question_id: String,
    pub selected: String,
    pub correct: String,
    pub is_correct: bool,
    pub answered_on: NaiveDate,
}

/// A distinct question the user has answered incorrectly at least once,
/// derived from the answer log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mistake {
    pub question_id: String,
    pub correct_answer: String,
}

/// Error-rate row for the "worst questions" report.
#[derive(Debug, Clone, PartialEq)]
pub struct MistakeStat {
    pub question_id: String,
    pub wrong: u32,
    pub shown: u32,
    /// Percentage of wrong answers, rounded to one decimal place.
    pub rate: f64,
}

/// One day's answer totals for the weekly breakdown. Days without
/// answers produce no row.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub total: u64,
    pub correct: u64,
    /// Percentage, rounded to one decimal place.
    pub accuracy: f64,
}

/// A progress summary for one user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    /// Percentage, rounded to one decimal place; 0.0 when nothing answered.
    pub accuracy: f64,
    /// Corpus questions this user has never been shown.
    pub remaining: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn valid_question_passes() {
        let q = Question::new("Capital of France?", opts(&["Paris", "Lyon"]), "Paris");
        assert!(q.is_ok());
    }

    #[test]
    fn correct_answer_matches_after_trimming() {
        let q = Question::new("Q", opts(&["a ", "b"]), " a");
        assert!(q.is_ok());
    }

    #[test]
    fn rejects_single_option() {
        let q = Question::new("Q", opts(&["only"]), "only");
        assert!(matches!(q, Err(QuestionError::BadOptionCount(_, 1))));
    }

    #[test]
    fn rejects_six_options() {
        let q = Question::new("Q", opts(&["a", "b", "c", "d", "e", "f"]), "a");
        assert!(matches!(q, Err(QuestionError::BadOptionCount(_, 6))));
    }

    #[test]
    fn rejects_unlisted_correct_answer() {
        let q = Question::new("Q", opts(&["a", "b"]), "c");
        assert!(matches!(q, Err(QuestionError::CorrectNotInOptions(_, _))));
    }

    #[test]
    fn rejects_empty_prompt() {
        let q = Question::new("   ", opts(&["a", "b"]), "a");
        assert!(matches!(q, Err(QuestionError::EmptyPrompt)));
    }
}
