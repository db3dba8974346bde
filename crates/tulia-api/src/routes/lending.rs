//! Tulia Lend View API Routes
//!
//! REST endpoints hosting lend-view sessions:
//! - POST /lending/sessions - Mount a view for a pool row
//! - GET /lending/sessions/:id - Refresh reads and return the view
//! - DELETE /lending/sessions/:id - Unmount
//! - POST /lending/sessions/:id/row - Replace the pool row
//! - POST /lending/sessions/:id/account - Switch the connected account
//! - POST /lending/sessions/:id/actions/:action - Dispatch a lend action
//! - GET /lending/sessions/:id/notices - Drain queued notices
//! - GET /lending/flash-loan/template - Reference flash-loan borrower
//! - GET /lending/watched - Transactions being watched

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use evm_client::ContractClient;
use lending::constants::FLASH_BORROWER_TEMPLATE;
use lending::{
    dispatch, fetch_reads, DispatchContext, DispatchOutcome, LendAction, LendView, LoanRow,
    LoanStateTransition,
};
use tulia_core::ProtocolError;

use crate::dto::{
    protocol_failure, tx_failure, ActionResponse, ApiError, ApiFailure,
    FlashLoanTemplateResponse, MountRequest, NoticesResponse, SessionResponse,
    UpdateAccountRequest, UpdateRowRequest,
};
use crate::state::{Session, SharedSession};
use crate::tx_watcher::{self, WatchedItemInfo};
use crate::AppState;

/// Create lending routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(mount_session))
        .route("/sessions/:id", get(get_session).delete(unmount_session))
        .route("/sessions/:id/row", post(update_row))
        .route("/sessions/:id/account", post(update_account))
        .route("/sessions/:id/actions/:action", post(dispatch_action))
        .route("/sessions/:id/notices", get(drain_notices))
        .route("/flash-loan/template", get(flash_loan_template))
        .route("/watched", get(watched))
}

fn session_not_found(id: Uuid) -> ApiFailure {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::not_found(format!("No lend session {}", id))),
    )
}

fn rpc_unavailable() -> ApiFailure {
    protocol_failure(ProtocolError::StateUnavailable {
        reason: "RPC endpoint unavailable".to_string(),
    })
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SharedSession, ApiFailure> {
    state.session(id).await.ok_or_else(|| session_not_found(id))
}

fn validate_row(row: &LoanRow) -> Result<(), ApiFailure> {
    let rate = row.interest_rate;
    if !rate.is_finite() || rate < 0.0 {
        return Err(protocol_failure(ProtocolError::InvalidAmount {
            message: format!("interest rate must be a non-negative number, got {}", rate),
        }));
    }
    Ok(())
}

/// Issue one round of reads and fold them into the view
async fn refresh(
    state: &AppState,
    client: &dyn ContractClient,
    view: &mut LendView,
) -> Option<LoanStateTransition> {
    let contracts = state.config().await.contracts;
    let reads = fetch_reads(client, view.row(), view.account(), &contracts).await;
    view.apply_reads(reads)
}

/// POST /lending/sessions - Mount a lend view
pub async fn mount_session(
    State(state): State<AppState>,
    Json(request): Json<MountRequest>,
) -> Result<Json<SessionResponse>, ApiFailure> {
    validate_row(&request.row)?;

    tracing::info!(pool = %request.row.pool, account = ?request.account, "Mounting lend view");
    let mut view = LendView::mount(request.row, request.account);

    let transition = match state.contract_client().await {
        Some(client) => refresh(&state, client.as_ref(), &mut view).await,
        None => {
            tracing::warn!("RPC endpoint unavailable, view mounted without reads");
            None
        }
    };

    let snapshot = view.snapshot();
    let (id, _) = state.insert_session(view).await;

    Ok(Json(SessionResponse {
        id,
        state: snapshot,
        transition,
    }))
}

/// GET /lending/sessions/:id - Refresh reads and return the view
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiFailure> {
    let session = find_session(&state, id).await?;
    let client = state.contract_client().await.ok_or_else(rpc_unavailable)?;

    let mut session = session.lock().await;
    let transition = refresh(&state, client.as_ref(), &mut session.view).await;

    Ok(Json(SessionResponse {
        id,
        state: session.view.snapshot(),
        transition,
    }))
}

/// DELETE /lending/sessions/:id - Unmount a lend view
pub async fn unmount_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiFailure> {
    if state.remove_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// POST /lending/sessions/:id/row - Replace the pool row
pub async fn update_row(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRowRequest>,
) -> Result<Json<SessionResponse>, ApiFailure> {
    validate_row(&request.row)?;

    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.view.set_row(request.row);

    // Reads may belong to another pool now, so take a fresh round
    let transition = match state.contract_client().await {
        Some(client) => refresh(&state, client.as_ref(), &mut session.view).await,
        None => None,
    };

    Ok(Json(SessionResponse {
        id,
        state: session.view.snapshot(),
        transition,
    }))
}

/// POST /lending/sessions/:id/account - Switch the connected account
pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<SessionResponse>, ApiFailure> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.view.set_account(request.account);

    // Allowance belongs to the account, so reload it right away
    let transition = match state.contract_client().await {
        Some(client) => refresh(&state, client.as_ref(), &mut session.view).await,
        None => None,
    };

    Ok(Json(SessionResponse {
        id,
        state: session.view.snapshot(),
        transition,
    }))
}

/// POST /lending/sessions/:id/actions/:action - Dispatch a lend action
pub async fn dispatch_action(
    State(state): State<AppState>,
    Path((id, action)): Path<(Uuid, String)>,
) -> Result<Json<ActionResponse>, ApiFailure> {
    let action: LendAction = action
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(e))))?;

    let session = find_session(&state, id).await?;
    let client = state.contract_client().await.ok_or_else(rpc_unavailable)?;
    let config = state.config().await;

    let mut guard = session.lock().await;
    let Session { view, notices } = &mut *guard;

    let ctx = DispatchContext {
        client: client.as_ref(),
        notifier: &*notices,
        contracts: &config.contracts,
        approval: &config.approval,
    };
    let outcome = dispatch(&ctx, view, action).await.map_err(tx_failure)?;

    match outcome {
        DispatchOutcome::Blocked { code, reason, .. } => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(code, reason)),
        )),
        DispatchOutcome::Submitted { tx_hash, .. } => {
            let pool = view.row().pool;
            drop(guard);
            let watch_id = tx_watcher::watch(&state, id, action, tx_hash, pool).await;
            Ok(Json(ActionResponse {
                outcome,
                watch_id: Some(watch_id),
            }))
        }
    }
}

/// GET /lending/sessions/:id/notices - Drain queued notices
pub async fn drain_notices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoticesResponse>, ApiFailure> {
    let session = find_session(&state, id).await?;
    let notices = session.lock().await.notices.drain();
    Ok(Json(NoticesResponse { notices }))
}

/// GET /lending/flash-loan/template - Reference ERC-3156 borrower contract
pub async fn flash_loan_template() -> Json<FlashLoanTemplateResponse> {
    Json(FlashLoanTemplateResponse {
        language: "solidity",
        source: FLASH_BORROWER_TEMPLATE,
    })
}

/// GET /lending/watched - Transactions the watcher is tracking
pub async fn watched(State(state): State<AppState>) -> Json<Vec<WatchedItemInfo>> {
    Json(state.watcher().watched_items().await)
}
