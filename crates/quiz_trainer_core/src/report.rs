//! crates/quiz_trainer_core/src/report.rs
//!
//! Progress summary computation. Pure functions of current state; reads only.

use crate::domain::Summary;
use crate::session::Progress;

/// Rounds a percentage to one decimal place.
pub(crate) fn round_rate(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derives a progress summary from the session counters and the durable
/// distinct-answered count.
pub fn summarize(progress: Progress, corpus_len: usize, distinct_answered: u64) -> Summary {
    let total = progress.answered;
    let correct = progress.correct;
    let accuracy = if total == 0 {
        0.0
    } else {
        round_rate(correct as f64 / total as f64 * 100.0)
    };
    let remaining = (corpus_len as u64).saturating_sub(distinct_answered);

    Summary {
        total,
        correct,
        incorrect: total - correct,
        accuracy,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_progress_reports_zero_accuracy() {
        let summary = summarize(Progress::default(), 10, 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.remaining, 10);
    }

    #[test]
    fn accuracy_is_rounded_to_one_decimal() {
        let progress = Progress { answered: 3, correct: 1 };
        let summary = summarize(progress, 5, 3);
        assert_eq!(summary.accuracy, 33.3);
        assert_eq!(summary.incorrect, 2);
        assert_eq!(summary.remaining, 2);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let progress = Progress { answered: 20, correct: 10 };
        // Distinct-answered can exceed the corpus size after a corpus shrink.
        let summary = summarize(progress, 5, 8);
        assert_eq!(summary.remaining, 0);
    }
}
