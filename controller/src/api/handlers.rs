//! # API Request Handlers
//!
//! Each handler maps one page action onto a controller operation:
//! 1. Extracts request data
//! 2. Calls the session controller or the orchestrator
//! 3. Returns the emitted status event plus the resulting state
//!
//! ## Error Handling
//!
//! Operation failures are not HTTP errors: they come back as a status
//! event with `severity: "error"`. Deposits and withdrawals run as their
//! own task, so a client that disconnects mid-request does not cancel
//! settlement. The only request-level error is calling a contract
//! operation before a wallet is connected:
//!
//! ```json
//! {
//!     "success": false,
//!     "error": {
//!         "code": "WALLET_NOT_CONNECTED",
//!         "message": "Connect a wallet first"
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info};

use crate::models::{
    ApiResponse, HealthResponse, OperationResponse, SetAmountRequest, SubmitAmountRequest,
};
use crate::status::StatusEvent;
use crate::AppState;

/// API information endpoint (root).
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let info = json!({
        "name": "Ledger DApp Controller",
        "version": env!("CARGO_PKG_VERSION"),
        "contract": state.session.contract_address().to_string(),
        "submissionLatch": state.config.submission_latch,
        "endpoints": {
            "health": { "method": "GET", "path": "/health" },
            "state": { "method": "GET", "path": "/state" },
            "connect": { "method": "POST", "path": "/wallet/connect" },
            "balance": { "method": "GET", "path": "/contract/balance" },
            "amount": { "method": "PUT", "path": "/amount" },
            "deposit": { "method": "POST", "path": "/contract/deposit" },
            "withdraw": { "method": "POST", "path": "/contract/withdraw" },
            "websocket": { "method": "GET", "path": "/ws" }
        }
    });

    HttpResponse::Ok().json(ApiResponse::success(info))
}

/// Health check endpoint.
///
/// ## Endpoint
///
/// `GET /health`
///
/// ## Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "status": "healthy",
///         "providerAvailable": true,
///         "chainId": 31337,
///         "session": "connected",
///         "websocketConnections": 1,
///         "version": "0.1.0",
///         "timestamp": "2025-12-08T12:00:00Z"
///     }
/// }
/// ```
///
/// `degraded` means no wallet provider answered. The controller still
/// serves requests; `connect()` will just report the missing wallet.
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let adapter = state.session.adapter();
    let chain_id = adapter.chain_id().await.ok();

    let response = HealthResponse {
        status: if chain_id.is_some() { "healthy" } else { "degraded" }.to_string(),
        provider_available: adapter.is_available(),
        chain_id,
        session: state.session.state().await,
        websocket_connections: state.ws_registry.total_connections(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    HttpResponse::Ok().json(ApiResponse::success(response))
}

/// Current controller state.
///
/// ## Endpoint
///
/// `GET /state`
pub async fn get_state(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let snapshot = state.orchestrator.snapshot().await;
    HttpResponse::Ok().json(ApiResponse::success(snapshot))
}

/// Connect the wallet.
///
/// Prompts the wallet for account access and binds the ledger contract.
/// Calling it again re-prompts and rebinds.
///
/// ## Endpoint
///
/// `POST /wallet/connect`
pub async fn connect_wallet(state: web::Data<Arc<AppState>>) -> HttpResponse {
    info!("Connect wallet request");

    let status = state.session.connect().await;
    operation_response(&state, status).await
}

/// Read the contract balance.
///
/// ## Endpoint
///
/// `GET /contract/balance`
pub async fn get_balance(state: web::Data<Arc<AppState>>) -> HttpResponse {
    match state.orchestrator.fetch_balance().await {
        Some(status) => operation_response(&state, status).await,
        None => not_connected(),
    }
}

/// Replace the pending amount input.
///
/// ## Endpoint
///
/// `PUT /amount`
///
/// ## Request Body
///
/// ```json
/// { "amount": "1.5" }
/// ```
pub async fn set_amount(
    state: web::Data<Arc<AppState>>,
    body: web::Json<SetAmountRequest>,
) -> HttpResponse {
    debug!("Amount input: {:?}", body.amount);

    state.orchestrator.set_amount(body.into_inner().amount).await;
    let snapshot = state.orchestrator.snapshot().await;
    HttpResponse::Ok().json(ApiResponse::success(snapshot))
}

/// Deposit ether into the ledger.
///
/// Waits until the transaction is mined and the balance refreshed.
///
/// ## Endpoint
///
/// `POST /contract/deposit`
///
/// ## Request Body
///
/// ```json
/// { "amount": "2" }
/// ```
///
/// Without a body the stored amount input is used.
pub async fn deposit(
    state: web::Data<Arc<AppState>>,
    body: Option<web::Json<SubmitAmountRequest>>,
) -> HttpResponse {
    let amount = resolve_amount(&state, body).await;
    info!("Deposit request: {} ETH", amount);

    run_detached(&state, move |app| async move {
        app.orchestrator.deposit(&amount).await
    })
    .await
}

/// Withdraw ether from the ledger.
///
/// On failure the response's `state.errorMessage` carries the revert
/// reason.
///
/// ## Endpoint
///
/// `POST /contract/withdraw`
pub async fn withdraw(
    state: web::Data<Arc<AppState>>,
    body: Option<web::Json<SubmitAmountRequest>>,
) -> HttpResponse {
    let amount = resolve_amount(&state, body).await;
    info!("Withdraw request: {} ETH", amount);

    run_detached(&state, move |app| async move {
        app.orchestrator.withdraw(&amount).await
    })
    .await
}

/// Run a submission on its own task and wait for it.
///
/// Dropping the returned future (the client went away) leaves the task
/// running to completion.
async fn run_detached<F, Fut>(state: &Arc<AppState>, operation: F) -> HttpResponse
where
    F: FnOnce(Arc<AppState>) -> Fut,
    Fut: Future<Output = Option<StatusEvent>> + 'static,
{
    let task = actix_rt::spawn(operation(state.clone()));

    match task.await {
        Ok(Some(status)) => operation_response(state, status).await,
        Ok(None) => not_connected(),
        Err(e) => {
            error!("Submission task failed: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("TASK_FAILED", "Submission task failed"))
        }
    }
}

/// Body amount if given, else the stored amount input.
async fn resolve_amount(
    state: &AppState,
    body: Option<web::Json<SubmitAmountRequest>>,
) -> String {
    match body.and_then(|b| b.into_inner().amount) {
        Some(amount) => amount,
        None => state.orchestrator.amount().await,
    }
}

async fn operation_response(state: &AppState, status: StatusEvent) -> HttpResponse {
    let response = OperationResponse {
        status,
        state: state.orchestrator.snapshot().await,
    };
    HttpResponse::Ok().json(ApiResponse::success(response))
}

fn not_connected() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::<()>::error(
        "WALLET_NOT_CONNECTED",
        "Connect a wallet first",
    ))
}
