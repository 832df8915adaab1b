//! crates/quiz_trainer_core/src/scheduler.rs
//!
//! Question selection: candidate filtering, error-biased weighting and the
//! presentation shuffle.
//!
//! Everything here is synchronous and deterministic under a seeded rng; the
//! engine performs the async stat reads and hands the results in. That also
//! keeps rng handles out of await scopes, so the engine futures stay `Send`.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{Question, QuestionStat};
use crate::session::InFlightQuestion;

/// Sampling weight for one candidate: untested questions get baseline
/// priority, tested ones are biased toward their historical error rate.
pub fn weight(stat: QuestionStat) -> f64 {
    if stat.shown == 0 {
        1.0
    } else {
        (stat.wrong as f64 + 1.0) / stat.shown as f64
    }
}

/// Applies the exclusion ladder to a candidate set.
///
/// Strictest pool first: everything minus the blacklist minus the previous
/// question. If that leaves nothing, the anti-repeat exclusion is dropped,
/// then the blacklist, so a question is always returned from a non-empty
/// input. Variety is preferred over strict constraints.
pub fn relax<'a>(
    all: &[&'a Question],
    blacklist: &HashSet<String>,
    previous: Option<&str>,
) -> Vec<&'a Question> {
    let not_blacklisted: Vec<&Question> = all
        .iter()
        .copied()
        .filter(|q| !blacklist.contains(&q.id))
        .collect();

    let strict: Vec<&Question> = not_blacklisted
        .iter()
        .copied()
        .filter(|q| previous != Some(q.id.as_str()))
        .collect();

    if !strict.is_empty() {
        strict
    } else if !not_blacklisted.is_empty() {
        not_blacklisted
    } else {
        all.to_vec()
    }
}

/// Restricts the pool to questions unseen this session, when any exist.
/// This yields full-corpus coverage before repeats recur within a session.
pub fn prefer_unseen<'a>(candidates: Vec<&'a Question>, seen: &HashSet<String>) -> Vec<&'a Question> {
    let unseen: Vec<&Question> = candidates
        .iter()
        .copied()
        .filter(|q| !seen.contains(&q.id))
        .collect();

    if unseen.is_empty() {
        candidates
    } else {
        unseen
    }
}

/// Draws one candidate with probability proportional to its weight.
/// Weights need not sum to 1; only relative magnitude matters.
pub fn select_weighted<'a, R: Rng>(
    weighted: &[(&'a Question, f64)],
    rng: &mut R,
) -> Option<&'a Question> {
    weighted
        .choose_weighted(rng, |&(_, w)| w)
        .ok()
        .map(|&(q, _)| q)
}

/// Draws one candidate uniformly. Used in mistake training, where the pool
/// is already filtered to known weak points.
pub fn select_uniform<'a, R: Rng>(candidates: &[&'a Question], rng: &mut R) -> Option<&'a Question> {
    candidates.choose(rng).copied()
}

/// Copies the question into an in-flight record with a fresh uniform
/// shuffle of its options. The corpus entry is left untouched.
pub fn shuffle_into_flight<R: Rng>(question: &Question, rng: &mut R) -> InFlightQuestion {
    let mut options = question.options.clone();
    options.shuffle(rng);
    InFlightQuestion {
        question_id: question.id.clone(),
        options,
        correct: question.correct.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn q(id: &str) -> Question {
        Question::new(
            id,
            vec!["a".into(), "b".into(), "c".into()],
            "a",
        )
        .unwrap()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn weight_is_baseline_for_unshown() {
        assert_eq!(weight(QuestionStat { shown: 0, wrong: 0 }), 1.0);
    }

    #[test]
    fn weight_grows_with_wrong_count() {
        let a = weight(QuestionStat { shown: 4, wrong: 1 });
        let b = weight(QuestionStat { shown: 4, wrong: 3 });
        assert!(b > a);
    }

    #[test]
    fn weight_matches_worked_example() {
        // Shown 3 times, wrong 3 times: (3 + 1) / 3.
        let w = weight(QuestionStat { shown: 3, wrong: 3 });
        assert!((w - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn relax_excludes_blacklist_and_previous() {
        let (q1, q2, q3) = (q("Q1"), q("Q2"), q("Q3"));
        let all = vec![&q1, &q2, &q3];
        let pool = relax(&all, &set(&["Q2"]), Some("Q3"));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "Q1");
    }

    #[test]
    fn relax_drops_anti_repeat_first() {
        // Only candidate is the previous question: anti-repeat gives way.
        let q1 = q("Q1");
        let all = vec![&q1];
        let pool = relax(&all, &HashSet::new(), Some("Q1"));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn relax_falls_back_to_full_pool_when_everything_blacklisted() {
        let (q1, q2) = (q("Q1"), q("Q2"));
        let all = vec![&q1, &q2];
        let pool = relax(&all, &set(&["Q1", "Q2"]), None);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn unseen_candidates_take_priority() {
        let (q1, q2) = (q("Q1"), q("Q2"));
        let pool = prefer_unseen(vec![&q1, &q2], &set(&["Q1"]));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "Q2");
    }

    #[test]
    fn all_seen_keeps_full_pool() {
        let (q1, q2) = (q("Q1"), q("Q2"));
        let pool = prefer_unseen(vec![&q1, &q2], &set(&["Q1", "Q2"]));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn weighted_draw_never_picks_zero_weight() {
        let (q1, q2) = (q("Q1"), q("Q2"));
        let weighted = vec![(&q1, 0.0), (&q2, 1.0)];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let picked = select_weighted(&weighted, &mut rng).unwrap();
            assert_eq!(picked.id, "Q2");
        }
    }

    #[test]
    fn weighted_draw_on_empty_pool_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_weighted(&[], &mut rng).is_none());
    }

    #[test]
    fn shuffle_preserves_the_option_multiset() {
        let question = q("Q1");
        let mut rng = StdRng::seed_from_u64(7);
        let flight = shuffle_into_flight(&question, &mut rng);

        let mut shuffled = flight.options.clone();
        let mut original = question.options.clone();
        shuffled.sort();
        original.sort();
        assert_eq!(shuffled, original);
        assert_eq!(flight.correct, question.correct);
        // The corpus entry itself is untouched.
        assert_eq!(question.options, vec!["a", "b", "c"]);
    }
}
