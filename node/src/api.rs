//! # REST API
//!
//! Builds the axum router that exposes the redemption engine over HTTP.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                                  | Description                      |
//! |--------|---------------------------------------|----------------------------------|
//! | GET    | `/health`                             | Liveness probe                   |
//! | GET    | `/status`                             | Engine status summary            |
//! | GET    | `/chain-id`                           | Deployment chain id              |
//! | POST   | `/redeem`                             | Redeem a signed voucher          |
//! | GET    | `/level/:chain_id/:contract/:token_id`| Radioactivity of any reference   |
//! | GET    | `/tokens/:id`                         | Minted warhead by token id       |
//! | POST   | `/admin/rotate-issuer`                | Rotate the issuer role           |
//! | POST   | `/admin/rotate-administrator`         | Rotate the administrator role    |
//! | POST   | `/admin/withdraw`                     | Withdraw from the treasury       |
//!
//! Redemption failures return HTTP 400 with the engine's stable error
//! strings verbatim in the body — clients match on them. Authorization
//! failures return 403.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use fission_contracts::voucher::{NftReference, Voucher};
use fission_contracts::warhead::{WarheadContract, WithdrawError};
use fission_protocol::crypto::Address;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`. The contract sits behind a
/// single async `RwLock`; every redemption takes the write lock, which is
/// what makes execution strictly serialized and all-or-nothing.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The deployed engine.
    pub contract: Arc<RwLock<WarheadContract>>,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Request body for `POST /redeem`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemRequest {
    /// The address claiming the voucher. Must match the voucher's asserted
    /// parent owner.
    pub redeemer: Address,
    /// The signed voucher.
    pub voucher: Voucher,
    /// Offered payment in the smallest native unit.
    pub payment: u128,
}

/// Response payload for a successful `POST /redeem`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    /// The freshly minted token id.
    pub token_id: u64,
    /// The radioactivity level the new warhead carries.
    pub level: u8,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Deployment chain id.
    pub chain_id: u64,
    /// The engine's contract address.
    pub contract_address: Address,
    /// Current issuer address.
    pub issuer: Address,
    /// Current administrator address.
    pub administrator: Address,
    /// Warheads minted so far.
    pub minted: u64,
    /// Hard supply cap.
    pub max_supply: u64,
    /// Unwithdrawn treasury balance.
    pub treasury: u128,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /level/...`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LevelResponse {
    /// The queried reference.
    pub reference: NftReference,
    /// Recorded radioactivity level (0 for unknown references).
    pub level: u8,
    /// Whether the reference has been consumed as a redemption parent.
    pub nuked: bool,
}

/// Response payload for `GET /tokens/:id`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Token id.
    pub token_id: u64,
    /// Current owner.
    pub owner: Address,
    /// Metadata URI recorded at mint time.
    pub uri: String,
    /// Radioactivity level of this warhead.
    pub level: u8,
}

/// Request body for the two role rotation endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct RotateRequest {
    /// Must be the current administrator.
    pub caller: Address,
    /// The expected current role holder.
    pub old: Address,
    /// The new role holder.
    pub new: Address,
}

/// Request body for `POST /admin/withdraw`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Must be the current administrator.
    pub caller: Address,
    /// Recipient of the funds.
    pub to: Address,
    /// Amount in the smallest native unit.
    pub amount: u128,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/chain-id", get(chain_id_handler))
        .route("/redeem", post(redeem_handler))
        .route("/level/:chain_id/:contract/:token_id", get(level_handler))
        .route("/tokens/:id", get(token_handler))
        .route("/admin/rotate-issuer", post(rotate_issuer_handler))
        .route(
            "/admin/rotate-administrator",
            post(rotate_administrator_handler),
        )
        .route("/admin/withdraw", post(withdraw_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.). It
/// intentionally does not inspect engine state — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns the engine status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let contract = state.contract.read().await;
    let resp = StatusResponse {
        version: state.version.clone(),
        chain_id: contract.chain_id(),
        contract_address: contract.address(),
        issuer: contract.issuer(),
        administrator: contract.administrator(),
        minted: contract.minted(),
        max_supply: contract.max_supply(),
        treasury: contract.treasury(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /chain-id` — the chain id the engine considers its own. Issuance
/// tooling reads this to build the correct signing domain.
async fn chain_id_handler(State(state): State<AppState>) -> impl IntoResponse {
    let contract = state.contract.read().await;
    Json(serde_json::json!({ "chain_id": contract.chain_id() }))
}

/// `POST /redeem` — runs the full redemption pipeline.
///
/// Takes the contract write lock for the duration, so concurrent requests
/// are serialized and each sees the supply counter and ledger states its
/// pricing and provenance decisions were made against.
async fn redeem_handler(
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> impl IntoResponse {
    let timer = state.metrics.redemption_latency_seconds.start_timer();

    let mut contract = state.contract.write().await;
    let outcome = contract.redeem(req.redeemer, &req.voucher, req.payment);
    let (minted, treasury, chain_id, address) = (
        contract.minted(),
        contract.treasury(),
        contract.chain_id(),
        contract.address(),
    );

    let response = match outcome {
        Ok(token_id) => {
            let level = contract.get_level(&NftReference {
                chain_id,
                contract_address: address,
                token_id,
            });
            state.metrics.redemptions_total.inc();
            (StatusCode::OK, Json(RedeemResponse { token_id, level })).into_response()
        }
        Err(e) => {
            state.metrics.redemption_failures_total.inc();
            tracing::warn!(redeemer = %req.redeemer, parent = %req.voucher.parent_nft, "redemption rejected: {}", e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    };
    drop(contract);

    state.metrics.observe_contract(minted, treasury);
    timer.observe_duration();
    response
}

/// `GET /level/:chain_id/:contract/:token_id` — radioactivity and nuked
/// state of any NFT reference, on any chain. Unknown references report
/// level 0, not an error.
async fn level_handler(
    Path((chain_id, contract_address, token_id)): Path<(u64, String, u64)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let contract_address: Address = match contract_address.parse() {
        Ok(a) => a,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid address: {}", e))
        }
    };
    let reference = NftReference {
        chain_id,
        contract_address,
        token_id,
    };

    let contract = state.contract.read().await;
    Json(LevelResponse {
        reference,
        level: contract.get_level(&reference),
        nuked: contract.is_nuked(&reference),
    })
    .into_response()
}

/// `GET /tokens/:id` — a minted warhead by token id. 404 for ids that have
/// never been minted.
async fn token_handler(
    Path(token_id): Path<u64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let contract = state.contract.read().await;
    let owner = match contract.tokens().owner_of(token_id) {
        Ok(owner) => owner,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e.to_string()),
    };
    let uri = match contract.tokens().token_uri(token_id) {
        Ok(uri) => uri.to_string(),
        Err(e) => return error_response(StatusCode::NOT_FOUND, e.to_string()),
    };
    let level = contract.get_level(&NftReference {
        chain_id: contract.chain_id(),
        contract_address: contract.address(),
        token_id,
    });

    Json(TokenResponse {
        token_id,
        owner,
        uri,
        level,
    })
    .into_response()
}

/// `POST /admin/rotate-issuer` — rotates the issuer role. 403 unless the
/// caller is the current administrator.
async fn rotate_issuer_handler(
    State(state): State<AppState>,
    Json(req): Json<RotateRequest>,
) -> impl IntoResponse {
    let mut contract = state.contract.write().await;
    match contract.rotate_issuer(req.caller, req.old, req.new) {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "issuer": req.new }))).into_response(),
        Err(e) => error_response(StatusCode::FORBIDDEN, e.to_string()),
    }
}

/// `POST /admin/rotate-administrator` — rotates the administrator role.
async fn rotate_administrator_handler(
    State(state): State<AppState>,
    Json(req): Json<RotateRequest>,
) -> impl IntoResponse {
    let mut contract = state.contract.write().await;
    match contract.rotate_administrator(req.caller, req.old, req.new) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "administrator": req.new })),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::FORBIDDEN, e.to_string()),
    }
}

/// `POST /admin/withdraw` — withdraws from the treasury. 403 for non-admin
/// callers, 400 for over-withdrawals and zero recipients.
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> impl IntoResponse {
    let mut contract = state.contract.write().await;
    let outcome = contract.withdraw(req.caller, req.to, req.amount);
    let (minted, treasury) = (contract.minted(), contract.treasury());
    drop(contract);

    let response = match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "remaining": treasury })),
        )
            .into_response(),
        Err(e @ WithdrawError::Unauthorized(_)) => {
            error_response(StatusCode::FORBIDDEN, e.to_string())
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    state.metrics.observe_contract(minted, treasury);
    response
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
