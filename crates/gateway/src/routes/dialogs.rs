//! Conversation-context passthrough for the expandable review rows.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use revq_core::review::{ChatDialog, DIALOG_FETCH_LENGTH};
use revq_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/chatrooms/{id}/dialogs", get(list_dialogs))
}

/// Query parameters for the dialog listing endpoint.
#[derive(Debug, Deserialize)]
pub struct DialogParams {
    pub chat_dialog_id: DbId,
    pub dialog_length: Option<u32>,
}

/// GET /chatrooms/{id}/dialogs
///
/// Messages surrounding the dialog a review item was generated for.
pub async fn list_dialogs(
    State(state): State<AppState>,
    Path(chatroom_id): Path<DbId>,
    Query(params): Query<DialogParams>,
) -> AppResult<Json<DataResponse<Vec<ChatDialog>>>> {
    let length = params.dialog_length.unwrap_or(DIALOG_FETCH_LENGTH);
    let dialogs = state
        .store
        .fetch_dialogs(chatroom_id, params.chat_dialog_id, length)
        .await?;
    Ok(Json(DataResponse { data: dialogs }))
}
