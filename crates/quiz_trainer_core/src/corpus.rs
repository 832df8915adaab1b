//! crates/quiz_trainer_core/src/corpus.rs
//!
//! The immutable in-memory question set, loaded once per process lifetime.

use std::collections::HashMap;

use crate::domain::Question;

/// Errors raised while assembling the corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("duplicate question id: '{0}'")]
    DuplicateId(String),
}

/// The full set of available questions for a process run.
///
/// The scheduler treats this as read-only; shuffled presentation orders
/// live in the session state, never here.
#[derive(Debug)]
pub struct Corpus {
    questions: Vec<Question>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    pub fn new(questions: Vec<Question>) -> Result<Self, CorpusError> {
        let mut by_id = HashMap::with_capacity(questions.len());
        for (idx, q) in questions.iter().enumerate() {
            if by_id.insert(q.id.clone(), idx).is_some() {
                return Err(CorpusError::DuplicateId(q.id.clone()));
            }
        }
        Ok(Self { questions, by_id })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.by_id.get(id).map(|&idx| &self.questions[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str) -> Question {
        Question::new(id, vec!["a".into(), "b".into()], "a").unwrap()
    }

    #[test]
    fn lookup_by_id() {
        let corpus = Corpus::new(vec![q("Q1"), q("Q2")]).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("Q2").map(|x| x.id.as_str()), Some("Q2"));
        assert!(corpus.get("Q3").is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Corpus::new(vec![q("Q1"), q("Q1")]);
        assert!(matches!(result, Err(CorpusError::DuplicateId(_))));
    }

    #[test]
    fn empty_corpus_is_allowed_but_empty() {
        let corpus = Corpus::new(Vec::new()).unwrap();
        assert!(corpus.is_empty());
    }
}
