//! services/bot/src/bin/bot.rs

use bot_lib::{
    adapters::{corpus::load_corpus, db::PgStatsStore},
    config::Config,
    error::BotError,
    web::{state::AppState, ws_handler},
};
use axum::{routing::get, Router};
use quiz_trainer_core::{EngineConfig, QuizEngine};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), BotError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Create the Schema ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStatsStore::new(db_pool));
    store.init_schema().await?;
    info!("Database schema ready.");

    // --- 3. Load the Question Corpus ---
    let corpus = Arc::new(load_corpus(&config.questions_path)?);
    if corpus.is_empty() {
        return Err(BotError::Internal(format!(
            "No questions found in {}",
            config.questions_path.display()
        )));
    }

    // --- 4. Build the Engine and Shared AppState ---
    let engine_config = EngineConfig {
        retry_limit: config.retry_limit,
        report_interval: config.report_interval,
    };
    let engine = Arc::new(QuizEngine::new(corpus, store, engine_config));
    info!(questions = engine.corpus_len(), "quiz engine ready");

    let app_state = Arc::new(AppState {
        engine,
        config: config.clone(),
    });

    // --- 5. Create the Web Router & Start the Server ---
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(app_state);

    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
