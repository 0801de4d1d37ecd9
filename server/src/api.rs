//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the wallet backend's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                            | Description                          |
//! |--------|---------------------------------|--------------------------------------|
//! | GET    | `/health`                       | Liveness probe                       |
//! | GET    | `/status`                       | Version, uptime, record counts       |
//! | GET    | `/ws`                           | WebSocket for live wallet events     |
//! | GET    | `/api/transactions/:address`    | Transactions involving an address    |
//! | POST   | `/api/transactions`             | Record a transaction                 |
//! | PATCH  | `/api/transactions/:id/status`  | Change a transaction's status        |
//! | GET    | `/api/rewards/:address`         | Unclaimed rewards for an address     |
//! | POST   | `/api/rewards`                  | Credit a reward                      |
//! | POST   | `/api/rewards/:id/claim`        | Claim a reward                       |
//! | POST   | `/api/generate-code`            | Transaction code for a hash          |
//! | POST   | `/api/users`                    | Register a user                      |
//! | GET    | `/api/users/:id`                | User by id                           |
//! | PATCH  | `/api/users/:id/wallet`         | Link a wallet address to a user      |
//! | GET    | `/api/users/:id/rewards`        | All rewards of a user                |
//! | GET    | `/api/wallets/:address/user`    | User owning a wallet address         |

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use xaro_ledger::address::{is_valid_address, shorten_address};
use xaro_ledger::validation::{
    CodeRequestDraft, RewardDraft, StatusUpdateDraft, TransactionDraft, UserDraft,
    WalletUpdateDraft,
};
use xaro_ledger::{
    generate_transaction_code, Reward, Storage, Transaction, TransactionStatus, User,
    ValidationErrors,
};

use crate::error::ApiError;
use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The server's reported version string.
    pub version: String,
    /// When this process started serving.
    pub started_at: DateTime<Utc>,
    /// The record store. Injected at startup; tests pass a fresh one.
    pub storage: Arc<dyn Storage>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<WalletEvent>,
}

impl AppState {
    /// Pushes an event to WebSocket subscribers. Having none is fine.
    fn publish(&self, event: WalletEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WalletEvent {
    /// A transaction was recorded.
    TransactionCreated {
        id: Uuid,
        tx_hash: String,
        from_address: String,
        to_address: String,
        amount: String,
    },
    /// A transaction's status changed.
    TransactionStatusChanged {
        id: Uuid,
        status: TransactionStatus,
        block_height: Option<u64>,
    },
    /// A reward was credited to a wallet.
    RewardCreated {
        id: Uuid,
        wallet_address: String,
        amount: String,
    },
    /// A reward was claimed.
    RewardClaimed {
        id: Uuid,
        wallet_address: String,
        amount: String,
    },
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    // The router requires one parameter name per path segment, so the
    // address lookups share `:id` with the id-based routes below them.
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/ws", get(ws_handler))
        .route("/api/transactions", post(create_transaction_handler))
        .route("/api/transactions/:id", get(transactions_by_address_handler))
        .route(
            "/api/transactions/:id/status",
            patch(update_transaction_status_handler),
        )
        .route("/api/rewards", post(create_reward_handler))
        .route("/api/rewards/:id", get(unclaimed_rewards_handler))
        .route("/api/rewards/:id/claim", post(claim_reward_handler))
        .route("/api/generate-code", post(generate_code_handler))
        .route("/api/users", post(create_user_handler))
        .route("/api/users/:id", get(user_handler))
        .route("/api/users/:id/wallet", patch(update_user_wallet_handler))
        .route("/api/users/:id/rewards", get(user_rewards_handler))
        .route("/api/wallets/:address/user", get(user_by_wallet_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: i64,
    pub users: usize,
    pub transactions: usize,
    pub rewards: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `POST /api/generate-code`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CodeResponse {
    pub code: String,
}

// ---------------------------------------------------------------------------
// Extraction Helpers
// ---------------------------------------------------------------------------

/// Unwraps a JSON body, turning a rejection (not JSON, wrong content type)
/// into a 400 carrying `message`.
fn json_body<T>(body: Result<Json<T>, JsonRejection>, message: &str) -> Result<T, ApiError> {
    body.map(|Json(v)| v).map_err(|rejection| {
        ApiError::validation(message, ValidationErrors::single("body", rejection.body_text()))
    })
}

/// Parses a record id from the path. Anything that is not a UUID cannot
/// name a record, so it reads as "not found".
fn path_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(not_found))
}

fn note_address(field: &'static str, address: &str) {
    if !is_valid_address(address) {
        tracing::debug!(field, address, "address does not follow the wallet address convention");
    }
}

// ---------------------------------------------------------------------------
// Handlers: operational
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the server is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: version, uptime and record counts.
async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let counts = state
        .storage
        .counts()
        .await
        .map_err(|e| ApiError::internal("Failed to read status", e))?;
    let now = Utc::now();

    Ok(Json(StatusResponse {
        version: state.version.clone(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        users: counts.users,
        transactions: counts.transactions,
        rewards: counts.rewards,
        timestamp: now.to_rfc3339(),
    }))
}

/// `GET /ws`: WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`WalletEvent`] messages. The connection is
/// read-only from the server's perspective; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let rx = state.event_tx.subscribe();
    let (sender, receiver) = socket.split();
    state.metrics.ws_subscribers.inc();

    forward_events(rx, sender, receiver).await;

    state.metrics.ws_subscribers.dec();
}

/// Pumps events from `rx` into `sender` as JSON text frames. Returns when
/// the client closes, the send side fails, or the event channel closes.
/// A lagging subscriber skips the dropped events and keeps going.
async fn forward_events<S, R, E>(
    mut rx: broadcast::Receiver<WalletEvent>,
    mut sender: S,
    mut receiver: R,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers: transactions
// ---------------------------------------------------------------------------

/// `GET /api/transactions/:address`: transactions sent from or to the
/// address, newest first.
async fn transactions_by_address_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let txs = state
        .storage
        .get_transactions_by_address(&address)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch transactions", e))?;
    Ok(Json(txs))
}

/// `POST /api/transactions`: records a transaction.
async fn create_transaction_handler(
    State(state): State<AppState>,
    body: Result<Json<TransactionDraft>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
    const INVALID: &str = "Invalid transaction data";

    let new = json_body(body, INVALID)?
        .validate()
        .map_err(|e| ApiError::validation(INVALID, e))?;
    note_address("fromAddress", &new.from_address);
    note_address("toAddress", &new.to_address);

    let tx = state
        .storage
        .create_transaction(new)
        .await
        .map_err(|e| ApiError::internal("Failed to create transaction", e))?;

    state.metrics.transactions_created_total.inc();
    tracing::info!(
        id = %tx.id,
        kind = %tx.kind,
        from = %shorten_address(&tx.from_address),
        to = %shorten_address(&tx.to_address),
        amount = %tx.amount,
        "transaction recorded"
    );
    state.publish(WalletEvent::TransactionCreated {
        id: tx.id,
        tx_hash: tx.tx_hash.clone(),
        from_address: tx.from_address.clone(),
        to_address: tx.to_address.clone(),
        amount: tx.amount.clone(),
    });

    Ok(Json(tx))
}

/// `PATCH /api/transactions/:id/status`: changes a transaction's status.
///
/// The body is checked before the id, so a bad status on an unknown id is
/// a 400, not a 404.
async fn update_transaction_status_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<StatusUpdateDraft>, JsonRejection>,
) -> Result<Json<Transaction>, ApiError> {
    const INVALID: &str = "Invalid status";
    const NOT_FOUND: &str = "Transaction not found";

    let update = json_body(body, INVALID)?
        .validate()
        .map_err(|e| ApiError::validation(INVALID, e))?;
    let id = path_id(&id, NOT_FOUND)?;

    let tx = state
        .storage
        .update_transaction_status(id, update)
        .await
        .map_err(|e| ApiError::internal("Failed to update transaction status", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    state.metrics.transaction_status_updates_total.inc();
    tracing::info!(id = %tx.id, status = %tx.status, block_height = ?tx.block_height, "transaction status updated");
    state.publish(WalletEvent::TransactionStatusChanged {
        id: tx.id,
        status: tx.status,
        block_height: tx.block_height,
    });

    Ok(Json(tx))
}

// ---------------------------------------------------------------------------
// Handlers: rewards
// ---------------------------------------------------------------------------

/// `GET /api/rewards/:address`: unclaimed rewards, newest first.
async fn unclaimed_rewards_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Reward>>, ApiError> {
    let rewards = state
        .storage
        .get_unclaimed_rewards_by_address(&address)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch rewards", e))?;
    Ok(Json(rewards))
}

/// `POST /api/rewards`: credits a reward.
async fn create_reward_handler(
    State(state): State<AppState>,
    body: Result<Json<RewardDraft>, JsonRejection>,
) -> Result<Json<Reward>, ApiError> {
    const INVALID: &str = "Invalid reward data";

    let new = json_body(body, INVALID)?
        .validate()
        .map_err(|e| ApiError::validation(INVALID, e))?;
    note_address("walletAddress", &new.wallet_address);

    let reward = state
        .storage
        .create_reward(new)
        .await
        .map_err(|e| ApiError::internal("Failed to create reward", e))?;

    state.metrics.rewards_created_total.inc();
    tracing::info!(
        id = %reward.id,
        wallet = %shorten_address(&reward.wallet_address),
        amount = %reward.amount,
        reason = %reward.reason,
        "reward credited"
    );
    state.publish(WalletEvent::RewardCreated {
        id: reward.id,
        wallet_address: reward.wallet_address.clone(),
        amount: reward.amount.clone(),
    });

    Ok(Json(reward))
}

/// `POST /api/rewards/:id/claim`: claims a reward once.
async fn claim_reward_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Reward>, ApiError> {
    const NOT_FOUND: &str = "Reward not found or already claimed";

    let claimed = match Uuid::parse_str(&id) {
        Ok(id) => state
            .storage
            .claim_reward(id)
            .await
            .map_err(|e| ApiError::internal("Failed to claim reward", e))?,
        Err(_) => None,
    };

    let Some(reward) = claimed else {
        state.metrics.reward_claims_rejected_total.inc();
        return Err(ApiError::not_found(NOT_FOUND));
    };

    state.metrics.rewards_claimed_total.inc();
    tracing::info!(
        id = %reward.id,
        wallet = %shorten_address(&reward.wallet_address),
        amount = %reward.amount,
        "reward claimed"
    );
    state.publish(WalletEvent::RewardClaimed {
        id: reward.id,
        wallet_address: reward.wallet_address.clone(),
        amount: reward.amount.clone(),
    });

    Ok(Json(reward))
}

// ---------------------------------------------------------------------------
// Handlers: transaction codes
// ---------------------------------------------------------------------------

/// `POST /api/generate-code`: derives the transaction code for `txHash`.
///
/// A missing hash is the client's fault (400). A hash that does not decode
/// is reported as a generation failure (500).
async fn generate_code_handler(
    State(state): State<AppState>,
    body: Result<Json<CodeRequestDraft>, JsonRejection>,
) -> Result<Json<CodeResponse>, ApiError> {
    const MISSING: &str = "Transaction hash is required";

    let tx_hash = json_body(body, MISSING)?
        .validate()
        .map_err(|e| ApiError::validation(MISSING, e))?;

    let code = generate_transaction_code(&tx_hash)
        .map_err(|e| ApiError::internal("Failed to generate transaction code", e))?;

    state.metrics.codes_generated_total.inc();
    Ok(Json(CodeResponse { code }))
}

// ---------------------------------------------------------------------------
// Handlers: users
// ---------------------------------------------------------------------------

/// `POST /api/users`: registers a user. The password is never echoed.
async fn create_user_handler(
    State(state): State<AppState>,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    const INVALID: &str = "Invalid user data";

    let new = json_body(body, INVALID)?
        .validate()
        .map_err(|e| ApiError::validation(INVALID, e))?;

    let user = state
        .storage
        .create_user(new)
        .await
        .map_err(|e| ApiError::internal("Failed to create user", e))?;

    state.metrics.users_created_total.inc();
    tracing::info!(id = %user.id, username = %user.username, "user registered");
    Ok(Json(user))
}

/// `GET /api/users/:id`
async fn user_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    const NOT_FOUND: &str = "User not found";

    let id = path_id(&id, NOT_FOUND)?;
    state
        .storage
        .get_user(id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// `PATCH /api/users/:id/wallet`: links a wallet address to the user.
async fn update_user_wallet_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<WalletUpdateDraft>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    const INVALID: &str = "Invalid wallet address";
    const NOT_FOUND: &str = "User not found";

    let address = json_body(body, INVALID)?
        .validate()
        .map_err(|e| ApiError::validation(INVALID, e))?;
    note_address("walletAddress", &address);
    let id = path_id(&id, NOT_FOUND)?;

    let user = state
        .storage
        .update_user_wallet(id, &address)
        .await
        .map_err(|e| ApiError::internal("Failed to update wallet", e))?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    tracing::info!(id = %user.id, wallet = %shorten_address(&address), "wallet linked");
    Ok(Json(user))
}

/// `GET /api/users/:id/rewards`: every reward of the user, claimed or not.
async fn user_rewards_handler(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Reward>>, ApiError> {
    let rewards = state
        .storage
        .get_rewards_by_user(&user_id)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch rewards", e))?;
    Ok(Json(rewards))
}

/// `GET /api/wallets/:address/user`: the user a wallet is linked to.
async fn user_by_wallet_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    state
        .storage
        .get_user_by_wallet_address(&address)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch user", e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No user linked to this wallet"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
