pub mod corpus;
pub mod domain;
pub mod engine;
pub mod memory;
pub mod ports;
pub mod report;
pub mod scheduler;
pub mod session;

pub use corpus::{Corpus, CorpusError};
pub use domain::{
    AnswerLogEntry, DayTotals, Mistake, MistakeStat, Question, QuestionError, QuestionStat,
    Summary, UserId,
};
pub use engine::{
    AnswerOutcome, DeliveredQuestion, EngineConfig, EngineError, QuizEngine, Transition,
};
pub use memory::InMemoryStatsStore;
pub use ports::{PortError, PortResult, StatsStore};
pub use session::{SessionMode, SessionState, SessionStore};
