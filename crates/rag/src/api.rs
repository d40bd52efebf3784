//! REST API client for the RAG backend.
//!
//! Wraps the backend's review endpoints (paginated answer listing,
//! approve/reject actions, bulk visibility toggles, conversation context)
//! using [`reqwest`]. One instance fronts one backend and is shared via
//! `Arc` as the [`ReviewStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use revq_core::error::{ActionError, UpstreamError};
use revq_core::review::{
    ChatDialog, ReviewFilters, ReviewPage, ReviewItem, ReviewTab, COUNT_PROBE_SIZE,
};
use revq_core::store::ReviewStore;
use revq_core::types::DbId;

/// Upper bound on any single backend call. The backend imposes no timeout
/// of its own; without this an unresponsive upstream would hang a poll
/// tick or a confirm action indefinitely.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a single RAG backend.
pub struct RagApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

/// Pagination envelope returned alongside every answer listing.
#[derive(Debug, Deserialize)]
struct Pagination {
    total_items: i64,
    total_pages: u32,
    current_page: u32,
}

/// Response shape of `GET /chatrooms/answers`.
#[derive(Debug, Deserialize)]
struct AnswersEnvelope {
    #[serde(default)]
    data: Vec<ReviewItem>,
    pagination: Pagination,
}

/// Same endpoint, but only the envelope is of interest (count probe).
#[derive(Debug, Deserialize)]
struct CountEnvelope {
    pagination: Pagination,
}

/// Response shape of `GET /chatrooms/{id}/dialogs`.
#[derive(Debug, Deserialize)]
struct DialogsEnvelope {
    #[serde(default)]
    messages: Vec<ChatDialog>,
}

impl RagApi {
    /// Create a new client for the backend at `base_url`.
    ///
    /// * `base_url` - e.g. `https://rag.example.com` (trailing slash is
    ///   stripped).
    /// * `token`    - bearer token sent with every request.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout (default 30 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base HTTP URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    fn answers_url(&self) -> String {
        format!("{}/chatrooms/answers", self.base_url)
    }

    /// Build the query string for the answers endpoint.
    ///
    /// `has_assignee=false&requires_confirmation=true` scope the listing to
    /// answers this console is responsible for. `is_hidden` only applies on
    /// the confirmed tab; the waiting tab never carries it.
    fn answers_query(
        tab: ReviewTab,
        page: u32,
        page_size: u32,
        filters: &ReviewFilters,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("has_assignee", "false".to_string()),
            ("requires_confirmation", "true".to_string()),
            ("is_confirmed", tab.is_confirmed().to_string()),
            ("page", page.to_string()),
            ("size", page_size.to_string()),
        ];
        if tab.is_confirmed() {
            query.push(("is_hidden", filters.hidden_only.to_string()));
        }
        if let Some(start) = filters.date.start_ts() {
            query.push(("start_ts", start.to_string()));
        }
        if let Some(end) = filters.date.end_ts() {
            query.push(("end_ts", end.to_string()));
        }
        query
    }

    /// GET a JSON document, mapping failures into the read-path taxonomy.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, UpstreamError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let response = ensure_success(response)
            .await
            .map_err(|(status, body)| UpstreamError::Api { status, body })?;

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    /// Send a prepared write request, mapping failures into the
    /// write-path taxonomy.
    async fn run_action(&self, request: reqwest::RequestBuilder) -> Result<(), ActionError> {
        let response = request
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ActionError::Request(e.to_string()))?;

        ensure_success(response)
            .await
            .map_err(|(status, body)| ActionError::Api { status, body })?;
        Ok(())
    }
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or the status and body text on failure.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, (u16, String)> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err((status.as_u16(), body));
    }
    Ok(response)
}

#[async_trait]
impl ReviewStore for RagApi {
    async fn fetch_page(
        &self,
        tab: ReviewTab,
        page: u32,
        page_size: u32,
        filters: &ReviewFilters,
    ) -> Result<ReviewPage, UpstreamError> {
        tracing::debug!(tab = tab.as_str(), page, page_size, "Fetching review page");

        let query = Self::answers_query(tab, page, page_size, filters);
        let envelope: AnswersEnvelope = self.get_json(&self.answers_url(), &query).await?;

        Ok(ReviewPage {
            items: envelope.data,
            page: envelope.pagination.current_page,
            page_size,
            total_items: envelope.pagination.total_items,
            total_pages: envelope.pagination.total_pages,
        })
    }

    async fn waiting_count(&self) -> Result<i64, UpstreamError> {
        let query = Self::answers_query(
            ReviewTab::Waiting,
            1,
            COUNT_PROBE_SIZE,
            &ReviewFilters::default(),
        );
        let envelope: CountEnvelope = self.get_json(&self.answers_url(), &query).await?;
        Ok(envelope.pagination.total_items)
    }

    async fn approve(&self, id: DbId) -> Result<(), ActionError> {
        tracing::debug!(id, "Approving review item (AI answer will be sent)");
        let url = format!("{}/chatrooms/answers/{id}/approve", self.base_url);
        self.run_action(self.client.post(url)).await
    }

    async fn reject(&self, id: DbId) -> Result<(), ActionError> {
        tracing::debug!(id, "Resolving review item without sending the AI answer");
        let url = format!("{}/chatrooms/answers/{id}/reject", self.base_url);
        self.run_action(self.client.post(url)).await
    }

    async fn set_visibility(&self, answer_ids: &[DbId], hidden: bool) -> Result<(), ActionError> {
        tracing::debug!(count = answer_ids.len(), hidden, "Toggling answer visibility");
        let url = format!("{}/chatrooms/answers/visibility", self.base_url);
        let body = serde_json::json!({
            "answer_ids": answer_ids,
            "is_hidden": hidden,
        });
        self.run_action(self.client.patch(url).json(&body)).await
    }

    async fn fetch_dialogs(
        &self,
        chatroom_id: DbId,
        chat_dialog_id: DbId,
        length: u32,
    ) -> Result<Vec<ChatDialog>, UpstreamError> {
        let url = format!("{}/chatrooms/{chatroom_id}/dialogs", self.base_url);
        let query = vec![
            ("chat_dialog_id", chat_dialog_id.to_string()),
            ("dialog_length", length.to_string()),
        ];
        let envelope: DialogsEnvelope = self.get_json(&url, &query).await?;
        Ok(envelope.messages)
    }
}
