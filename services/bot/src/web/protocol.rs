//! services/bot/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the chat client and the
//! quiz trainer service. The transport is agnostic to rendering: a question
//! is a prompt plus an ordered option list, and an answer is an ordinal
//! index into that list.

use chrono::NaiveDate;
use quiz_trainer_core::domain::{DayTotals, MistakeStat, Summary};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Names the user. This must be the first message sent on the connection.
    Init { user_id: i64 },

    /// Requests the first (or next) question of a practice run.
    Start,

    /// Answers the pending question by its position in the shown options.
    Answer { index: usize },

    /// Switches to the focused mistake-retraining loop.
    TrainMistakes,

    /// Requests an on-demand progress summary.
    Report,

    /// Requests today's answer totals.
    DailyReport,

    /// Requests the per-day breakdown of the last 7 days.
    WeeklyReport,

    /// Requests the worst-questions leaderboard.
    TopMistakes,

    BlacklistAdd { question_id: String },

    BlacklistRemove { question_id: String },

    BlacklistList,

    /// Clears the user's statistics and session counters.
    Reset,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// One row of the worst-questions leaderboard.
#[derive(Serialize, Debug, Clone)]
pub struct MistakeRow {
    pub question_id: String,
    pub wrong: u32,
    pub shown: u32,
    pub rate: f64,
}

impl From<MistakeStat> for MistakeRow {
    fn from(stat: MistakeStat) -> Self {
        Self {
            question_id: stat.question_id,
            wrong: stat.wrong,
            shown: stat.shown,
            rate: stat.rate,
        }
    }
}

/// One day of the weekly breakdown.
#[derive(Serialize, Debug, Clone)]
pub struct DayRow {
    pub date: NaiveDate,
    pub total: u64,
    pub correct: u64,
    pub accuracy: f64,
}

impl From<DayTotals> for DayRow {
    fn from(day: DayTotals) -> Self {
        Self {
            date: day.date,
            total: day.total,
            correct: day.correct,
            accuracy: day.accuracy,
        }
    }
}

/// A serializable progress summary.
#[derive(Serialize, Debug, Clone)]
pub struct SummaryView {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy: f64,
    pub remaining: u64,
}

impl From<Summary> for SummaryView {
    fn from(summary: Summary) -> Self {
        Self {
            total: summary.total,
            correct: summary.correct,
            incorrect: summary.incorrect,
            accuracy: summary.accuracy,
            remaining: summary.remaining,
        }
    }
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the Init handshake.
    SessionReady { user_id: i64 },

    /// A question to render: prompt plus options in presentation order.
    Question { prompt: String, options: Vec<String> },

    /// The result of the last answer.
    Answered {
        is_correct: bool,
        correct_answer: String,
    },

    /// Mistake training began with this many questions to clear.
    TrainingStarted { pool_size: usize },

    /// The mistake pool was cleared; the session is back to normal practice.
    TrainingFinished,

    Report { summary: SummaryView },

    DailyReport { total: u64, correct: u64 },

    /// Newest day first; days without answers are omitted.
    WeeklyReport { days: Vec<DayRow> },

    TopMistakes { rows: Vec<MistakeRow> },

    Blacklist { question_ids: Vec<String> },

    ResetDone,

    /// Reports a recoverable error the client should display.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize_from_tagged_json() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"init","user_id":7}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Init { user_id: 7 }));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"answer","index":2}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Answer { index: 2 }));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"train_mistakes"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::TrainMistakes));
    }

    #[test]
    fn unknown_client_message_is_an_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn question_message_serializes_with_tag() {
        let msg = ServerMessage::Question {
            prompt: "Q1".into(),
            options: vec!["a".into(), "b".into()],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"question""#));
        assert!(json.contains(r#""options":["a","b"]"#));
    }

    #[test]
    fn weekly_report_serializes_dates_as_iso_strings() {
        let msg = ServerMessage::WeeklyReport {
            days: vec![DayRow {
                date: NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
                total: 10,
                correct: 7,
                accuracy: 70.0,
            }],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"weekly_report""#));
        assert!(json.contains(r#""date":"2026-08-25""#));
        assert!(json.contains(r#""accuracy":70.0"#));
    }

    #[test]
    fn report_message_carries_the_summary_fields() {
        let msg = ServerMessage::Report {
            summary: SummaryView {
                total: 50,
                correct: 40,
                incorrect: 10,
                accuracy: 80.0,
                remaining: 12,
            },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""accuracy":80.0"#));
        assert!(json.contains(r#""remaining":12"#));
    }
}
