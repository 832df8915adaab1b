//! services/bot/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use quiz_trainer_core::QuizEngine;

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// connection handlers. Per-user session state lives inside the engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QuizEngine>,
    pub config: Arc<Config>,
}
