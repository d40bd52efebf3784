//! Review queue routes: listing, refresh, update detection, resolution,
//! polling controls, and bulk visibility.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use revq_core::review::{DateFilter, DateFilterMode, ReviewFilters, ReviewTab};
use revq_core::types::{DbId, Timestamp};
use revq_queue::{
    ConfirmationWorkflow, DetectorState, PollingBaseline, QueueSnapshot, ResolutionMode,
};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews/refresh", post(refresh_reviews))
        .route("/reviews/updates", get(get_updates))
        .route("/reviews/{id}/resolve", post(resolve_review))
        .route("/reviews/polling", post(set_polling))
        .route("/reviews/focus", post(set_focus))
        .route("/reviews/visibility", patch(set_visibility))
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for the review listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    pub tab: Option<ReviewTab>,
    pub page: Option<u32>,
    #[serde(default)]
    pub hidden_only: bool,
    /// Unix seconds; interpreted per `mode`.
    pub start_ts: Option<i64>,
    /// Unix seconds; interpreted per `mode`.
    pub end_ts: Option<i64>,
    pub mode: Option<DateFilterMode>,
}

/// The queue page plus the detector's view of it.
#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    #[serde(flatten)]
    pub queue: QueueSnapshot,
    pub updates: PollingBaseline,
}

/// Detector snapshot for the updates endpoint.
#[derive(Debug, Serialize)]
pub struct UpdatesResponse {
    #[serde(flatten)]
    pub baseline: PollingBaseline,
    pub state: DetectorState,
}

/// Request body for the resolve endpoint.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub mode: ResolutionMode,
}

/// Request body for the polling toggle.
#[derive(Debug, Deserialize)]
pub struct PollingRequest {
    pub enabled: bool,
}

/// Request body for the console visibility hook.
#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    pub visible: bool,
}

/// Request body for the bulk visibility toggle.
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub answer_ids: Vec<DbId>,
    pub is_hidden: bool,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub updated: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /reviews
///
/// Apply the requested view (tab, page, filters) and return the resulting
/// page. Tab and filter changes reset the page to 1.
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewListParams>,
) -> AppResult<Json<DataResponse<ReviewListResponse>>> {
    let filters = filters_from(&params)?;
    let tab = params.tab.unwrap_or_default();
    let page = params.page.unwrap_or(1);

    let queue = state.controller.navigate(tab, page, filters).await;
    Ok(Json(DataResponse {
        data: ReviewListResponse {
            queue,
            updates: state.detector.baseline(),
        },
    }))
}

/// POST /reviews/refresh
///
/// Re-fetch the current view and zero the pending-delta badge (the "N new
/// items, refresh" button).
pub async fn refresh_reviews(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ReviewListResponse>>> {
    state.controller.refresh_after_action().await;
    let queue = state.controller.snapshot().await;
    Ok(Json(DataResponse {
        data: ReviewListResponse {
            queue,
            updates: state.detector.baseline(),
        },
    }))
}

/// GET /reviews/updates
pub async fn get_updates(State(state): State<AppState>) -> Json<DataResponse<UpdatesResponse>> {
    Json(DataResponse {
        data: updates_response(&state),
    })
}

/// POST /reviews/{id}/resolve
///
/// Drive one confirmation workflow to completion. The item must be on the
/// currently loaded page, exactly as the console modal only opens for a
/// rendered row. A backend failure leaves the queue untouched and maps the
/// status through.
pub async fn resolve_review(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(request): Json<ResolveRequest>,
) -> AppResult<Json<DataResponse<ReviewListResponse>>> {
    let item = state.controller.find_item(id).await.ok_or_else(|| {
        AppError::NotFound(format!("review item {id} is not on the current page"))
    })?;

    let workflow = ConfirmationWorkflow::new(
        Arc::clone(&state.store),
        Arc::clone(&state.controller),
        state.events.clone(),
    );
    workflow.open(item, request.mode).await?;
    workflow.confirm().await?;

    let queue = state.controller.snapshot().await;
    Ok(Json(DataResponse {
        data: ReviewListResponse {
            queue,
            updates: state.detector.baseline(),
        },
    }))
}

/// POST /reviews/polling
///
/// User-level polling toggle; the controller reconciles the detector.
pub async fn set_polling(
    State(state): State<AppState>,
    Json(request): Json<PollingRequest>,
) -> Json<DataResponse<UpdatesResponse>> {
    state.controller.set_polling_enabled(request.enabled).await;
    Json(DataResponse {
        data: updates_response(&state),
    })
}

/// POST /reviews/focus
///
/// Console visibility hook: hidden suspends polling, visible resumes with
/// one immediate check against the rendered total.
pub async fn set_focus(
    State(state): State<AppState>,
    Json(request): Json<FocusRequest>,
) -> Json<DataResponse<UpdatesResponse>> {
    if request.visible {
        let total = state.controller.snapshot().await.total_items;
        state.detector.resume(total);
        // If polling was fully stopped rather than suspended, fall back
        // to the regular precondition reconciliation.
        state.controller.resync_polling().await;
    } else {
        state.detector.pause();
    }
    Json(DataResponse {
        data: updates_response(&state),
    })
}

/// PATCH /reviews/visibility
///
/// Bulk-toggle the hidden flag on confirmed items, then reload.
pub async fn set_visibility(
    State(state): State<AppState>,
    Json(request): Json<VisibilityRequest>,
) -> AppResult<Json<DataResponse<VisibilityResponse>>> {
    if request.answer_ids.is_empty() {
        return Err(AppError::BadRequest(
            "answer_ids must not be empty".to_string(),
        ));
    }
    let updated = state
        .controller
        .set_items_visibility(&request.answer_ids, request.is_hidden)
        .await?;
    Ok(Json(DataResponse {
        data: VisibilityResponse { updated },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn updates_response(state: &AppState) -> UpdatesResponse {
    UpdatesResponse {
        baseline: state.detector.baseline(),
        state: state.detector.state(),
    }
}

fn filters_from(params: &ReviewListParams) -> AppResult<ReviewFilters> {
    let start = params.start_ts.map(parse_ts).transpose()?;
    let end = params.end_ts.map(parse_ts).transpose()?;
    Ok(ReviewFilters {
        hidden_only: params.hidden_only,
        date: DateFilter {
            start,
            end,
            mode: params.mode.unwrap_or_default(),
        },
    })
}

fn parse_ts(ts: i64) -> AppResult<Timestamp> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid unix timestamp: {ts}")))
}
