//! services/bot/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! It translates chat messages into engine calls and renders the results.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use quiz_trainer_core::{EngineError, Transition};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};

/// How many rows the worst-questions leaderboard shows.
const TOP_MISTAKES_LIMIT: u32 = 5;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // The sender is wrapped in an Arc<Mutex<>> to allow shared access from helpers.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Init Handshake ---
    let user_id = if let Some(Ok(Message::Text(init_json))) = receiver.next().await {
        match serde_json::from_str::<ClientMessage>(&init_json) {
            Ok(ClientMessage::Init { user_id }) => user_id,
            Ok(_) => {
                error!("First message was not an Init message.");
                send(
                    &ws_sender,
                    &ServerMessage::Error {
                        message: "The first message must name the user.".to_string(),
                    },
                )
                .await;
                return;
            }
            Err(e) => {
                error!("Failed to deserialize the Init message: {}", e);
                return;
            }
        }
    } else {
        error!("Client disconnected before sending an Init message.");
        return;
    };

    info!(user_id, "chat session established");
    if !send(&ws_sender, &ServerMessage::SessionReady { user_id }).await {
        return;
    }

    // --- 2. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                handle_text_message(text.to_string(), &app_state, user_id, &ws_sender).await;
            }
            Message::Close(_) => {
                info!(user_id, "client sent close message");
                break;
            }
            _ => {}
        }
    }

    info!(user_id, "chat session closed");
}

/// Serializes and delivers one server message. Returns false when the client
/// is gone; delivery failures never reach the engine.
async fn send(ws_sender: &WsSender, msg: &ServerMessage) -> bool {
    let json = serde_json::to_string(msg).unwrap();
    if ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_err()
    {
        warn!("Failed to deliver a message. Client may have disconnected.");
        false
    } else {
        true
    }
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: String,
    app_state: &Arc<AppState>,
    user_id: i64,
    ws_sender: &WsSender,
) {
    let engine = &app_state.engine;

    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(client_msg) => match client_msg {
            ClientMessage::Init { .. } => {
                warn!(user_id, "received subsequent Init message, which is ignored");
            }

            ClientMessage::Start => {
                deliver_next(app_state, user_id, ws_sender).await;
            }

            ClientMessage::Answer { index } => {
                match engine.submit_answer(user_id, index).await {
                    Ok(outcome) => {
                        send(
                            ws_sender,
                            &ServerMessage::Answered {
                                is_correct: outcome.is_correct,
                                correct_answer: outcome.correct_answer.clone(),
                            },
                        )
                        .await;

                        if let Some(summary) = outcome.report {
                            send(
                                ws_sender,
                                &ServerMessage::Report {
                                    summary: summary.into(),
                                },
                            )
                            .await;
                        }
                        if outcome.transition == Transition::MistakeModeFinished {
                            send(ws_sender, &ServerMessage::TrainingFinished).await;
                        }

                        // UX pacing between the result and the next question.
                        tokio::time::sleep(app_state.config.pacing_delay).await;
                        deliver_next(app_state, user_id, ws_sender).await;
                    }
                    Err(
                        e @ (EngineError::NoActiveQuestion | EngineError::InvalidSelection { .. }),
                    ) => {
                        send(
                            ws_sender,
                            &ServerMessage::Error {
                                message: e.to_string(),
                            },
                        )
                        .await;
                    }
                    Err(e) => {
                        error!(user_id, "failed to process answer: {e}");
                        send(
                            ws_sender,
                            &ServerMessage::Error {
                                message: "Failed to process the answer. Please retry.".to_string(),
                            },
                        )
                        .await;
                    }
                }
            }

            ClientMessage::TrainMistakes => match engine.start_mistake_training(user_id).await {
                Ok(pool_size) => {
                    send(ws_sender, &ServerMessage::TrainingStarted { pool_size }).await;
                    deliver_next(app_state, user_id, ws_sender).await;
                }
                Err(e @ EngineError::NoMistakes) => {
                    send(
                        ws_sender,
                        &ServerMessage::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    error!(user_id, "failed to start mistake training: {e}");
                    send(
                        ws_sender,
                        &ServerMessage::Error {
                            message: "Failed to start mistake training.".to_string(),
                        },
                    )
                    .await;
                }
            },

            ClientMessage::Report => match engine.report(user_id).await {
                Ok(summary) => {
                    send(
                        ws_sender,
                        &ServerMessage::Report {
                            summary: summary.into(),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    error!(user_id, "failed to build report: {e}");
                    send(
                        ws_sender,
                        &ServerMessage::Error {
                            message: "Failed to build the report.".to_string(),
                        },
                    )
                    .await;
                }
            },

            ClientMessage::DailyReport => match engine.daily_report(user_id).await {
                Ok((total, correct)) => {
                    send(ws_sender, &ServerMessage::DailyReport { total, correct }).await;
                }
                Err(e) => {
                    error!(user_id, "failed to build daily report: {e}");
                    send(
                        ws_sender,
                        &ServerMessage::Error {
                            message: "Failed to build the daily report.".to_string(),
                        },
                    )
                    .await;
                }
            },

            ClientMessage::WeeklyReport => match engine.weekly_report(user_id).await {
                Ok(days) => {
                    send(
                        ws_sender,
                        &ServerMessage::WeeklyReport {
                            days: days.into_iter().map(Into::into).collect(),
                        },
                    )
                    .await;
                }
                Err(e) => {
                    error!(user_id, "failed to build weekly report: {e}");
                    send(
                        ws_sender,
                        &ServerMessage::Error {
                            message: "Failed to build the weekly report.".to_string(),
                        },
                    )
                    .await;
                }
            },

            ClientMessage::TopMistakes => {
                match engine.top_mistakes(user_id, TOP_MISTAKES_LIMIT).await {
                    Ok(rows) => {
                        send(
                            ws_sender,
                            &ServerMessage::TopMistakes {
                                rows: rows.into_iter().map(Into::into).collect(),
                            },
                        )
                        .await;
                    }
                    Err(e) => {
                        error!(user_id, "failed to list top mistakes: {e}");
                        send(
                            ws_sender,
                            &ServerMessage::Error {
                                message: "Failed to list mistakes.".to_string(),
                            },
                        )
                        .await;
                    }
                }
            }

            ClientMessage::BlacklistAdd { question_id } => {
                match engine.blacklist_add(user_id, &question_id).await {
                    Ok(training_ended) => {
                        // Blacklisting the last pool entry ends training.
                        if training_ended {
                            send(ws_sender, &ServerMessage::TrainingFinished).await;
                        }
                        send_blacklist(engine, user_id, ws_sender).await;
                    }
                    Err(e) => {
                        error!(user_id, "failed to blacklist question: {e}");
                        send(
                            ws_sender,
                            &ServerMessage::Error {
                                message: "Failed to blacklist the question.".to_string(),
                            },
                        )
                        .await;
                    }
                }
            }

            ClientMessage::BlacklistRemove { question_id } => {
                match engine.blacklist_remove(user_id, &question_id).await {
                    Ok(()) => send_blacklist(engine, user_id, ws_sender).await,
                    Err(e) => {
                        error!(user_id, "failed to unblacklist question: {e}");
                        send(
                            ws_sender,
                            &ServerMessage::Error {
                                message: "Failed to remove the question from the blacklist."
                                    .to_string(),
                            },
                        )
                        .await;
                    }
                }
            }

            ClientMessage::BlacklistList => {
                send_blacklist(engine, user_id, ws_sender).await;
            }

            ClientMessage::Reset => match engine.reset(user_id).await {
                Ok(()) => {
                    send(ws_sender, &ServerMessage::ResetDone).await;
                }
                Err(e) => {
                    error!(user_id, "failed to reset stats: {e}");
                    send(
                        ws_sender,
                        &ServerMessage::Error {
                            message: "Failed to reset your statistics.".to_string(),
                        },
                    )
                    .await;
                }
            },
        },
        Err(e) => {
            warn!(user_id, "failed to deserialize client message: {e}");
        }
    }
}

async fn send_blacklist(
    engine: &Arc<quiz_trainer_core::QuizEngine>,
    user_id: i64,
    ws_sender: &WsSender,
) {
    match engine.blacklist_list(user_id).await {
        Ok(question_ids) => {
            send(ws_sender, &ServerMessage::Blacklist { question_ids }).await;
        }
        Err(e) => {
            error!(user_id, "failed to list blacklist: {e}");
            send(
                ws_sender,
                &ServerMessage::Error {
                    message: "Failed to read the blacklist.".to_string(),
                },
            )
            .await;
        }
    }
}

/// Draws and delivers the next question. `EmptyPool` halts the loop with a
/// user-facing message; everything else is reported and logged.
async fn deliver_next(app_state: &Arc<AppState>, user_id: i64, ws_sender: &WsSender) {
    match app_state.engine.next_question(user_id).await {
        Ok(question) => {
            send(
                ws_sender,
                &ServerMessage::Question {
                    prompt: question.prompt,
                    options: question.options,
                },
            )
            .await;
        }
        Err(EngineError::EmptyPool) => {
            send(
                ws_sender,
                &ServerMessage::Error {
                    message: "No questions available.".to_string(),
                },
            )
            .await;
        }
        Err(e) => {
            error!(user_id, "failed to select the next question: {e}");
            send(
                ws_sender,
                &ServerMessage::Error {
                    message: "Failed to select the next question.".to_string(),
                },
            )
            .await;
        }
    }
}
