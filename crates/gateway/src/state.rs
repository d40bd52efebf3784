use std::sync::Arc;

use revq_core::store::ReviewStore;
use revq_queue::{ReviewEvents, ReviewQueueController, UpdateDetector};

use crate::config::GatewayConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration.
    pub config: Arc<GatewayConfig>,
    /// Backend access used by passthrough routes.
    pub store: Arc<dyn ReviewStore>,
    /// Owner of the review list view.
    pub controller: Arc<ReviewQueueController>,
    /// Background new-item detector.
    pub detector: Arc<UpdateDetector>,
    /// Review event bus.
    pub events: ReviewEvents,
}
