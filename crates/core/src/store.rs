//! The seam between the queue state machine and the backend client.

use async_trait::async_trait;

use crate::error::{ActionError, UpstreamError};
use crate::review::{ChatDialog, ReviewFilters, ReviewPage, ReviewTab};
use crate::types::DbId;

/// Read and write access to the review queue, as the backend exposes it.
///
/// Implemented by the HTTP client in `revq-rag`; queue tests substitute an
/// in-memory mock. All operations are single calls with no retries -- the
/// caller decides what a failure means.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fetch one page of the given tab, honoring the filter state.
    async fn fetch_page(
        &self,
        tab: ReviewTab,
        page: u32,
        page_size: u32,
        filters: &ReviewFilters,
    ) -> Result<ReviewPage, UpstreamError>;

    /// Total number of items currently in the waiting tab.
    ///
    /// Must be cheap: implementations probe with a minimal page size and
    /// read only the pagination envelope.
    async fn waiting_count(&self) -> Result<i64, UpstreamError>;

    /// Resolve an item by sending the AI draft answer.
    async fn approve(&self, id: DbId) -> Result<(), ActionError>;

    /// Resolve an item without sending the AI answer.
    async fn reject(&self, id: DbId) -> Result<(), ActionError>;

    /// Bulk-toggle the hidden flag on confirmed items.
    async fn set_visibility(&self, answer_ids: &[DbId], hidden: bool) -> Result<(), ActionError>;

    /// Fetch surrounding conversation messages for a review item.
    async fn fetch_dialogs(
        &self,
        chatroom_id: DbId,
        chat_dialog_id: DbId,
        length: u32,
    ) -> Result<Vec<ChatDialog>, UpstreamError>;
}
