//! services/bot/src/adapters/corpus.rs
//!
//! CSV corpus import. Expected columns: `question`, `option_a` through
//! `option_e` (blank cells allowed) and `correct_answer`.

use std::io::Read;
use std::path::Path;

use quiz_trainer_core::corpus::{Corpus, CorpusError};
use quiz_trainer_core::domain::{Question, QuestionError};
use serde::Deserialize;
use tracing::info;

/// Errors raised while importing the question corpus.
#[derive(Debug, thiserror::Error)]
pub enum CorpusLoadError {
    #[error("failed to read questions CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid question at CSV line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: QuestionError,
    },

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

#[derive(Debug, Deserialize)]
struct QuestionRow {
    question: String,
    option_a: Option<String>,
    option_b: Option<String>,
    option_c: Option<String>,
    option_d: Option<String>,
    option_e: Option<String>,
    correct_answer: String,
}

impl QuestionRow {
    fn options(&self) -> Vec<String> {
        [
            &self.option_a,
            &self.option_b,
            &self.option_c,
            &self.option_d,
            &self.option_e,
        ]
        .into_iter()
        .filter_map(|o| o.as_deref())
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
    }
}

/// Parses a corpus from any CSV reader. Malformed rows are rejected with
/// their line number rather than silently skipped.
pub fn parse_corpus<R: Read>(reader: R) -> Result<Corpus, CorpusLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut questions = Vec::new();
    for (idx, result) in csv_reader.deserialize::<QuestionRow>().enumerate() {
        // Line 1 is the header row.
        let line = idx + 2;
        let row = result?;
        let options = row.options();
        let question = Question::new(row.question, options, row.correct_answer)
            .map_err(|source| CorpusLoadError::Row { line, source })?;
        questions.push(question);
    }

    Ok(Corpus::new(questions)?)
}

/// Loads the corpus from a CSV file at process start.
pub fn load_corpus(path: &Path) -> Result<Corpus, CorpusLoadError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    let corpus = parse_corpus(file)?;
    info!(path = %path.display(), questions = corpus.len(), "corpus loaded");
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "question,option_a,option_b,option_c,option_d,option_e,correct_answer\n";

    #[test]
    fn parses_rows_and_skips_blank_options() {
        let csv = format!("{HEADER}What is 2+2?,3,4,5,,,4\nCapital of France?,Paris,Lyon,,,,Paris\n");
        let corpus = parse_corpus(csv.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 2);

        let q = corpus.get("What is 2+2?").unwrap();
        assert_eq!(q.options, vec!["3", "4", "5"]);
        assert_eq!(q.correct, "4");
    }

    #[test]
    fn rejects_row_with_unlisted_correct_answer() {
        let csv = format!("{HEADER}Q?,a,b,,,,c\n");
        let err = parse_corpus(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CorpusLoadError::Row { line: 2, .. }));
    }

    #[test]
    fn rejects_duplicate_questions() {
        let csv = format!("{HEADER}Q?,a,b,,,,a\nQ?,a,b,,,,a\n");
        let err = parse_corpus(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CorpusLoadError::Corpus(_)));
    }

    #[test]
    fn rejects_row_with_single_option() {
        let csv = format!("{HEADER}Q?,a,,,,,a\n");
        let err = parse_corpus(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CorpusLoadError::Row { line: 2, .. }));
    }
}
