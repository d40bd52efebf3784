//! Owner of the review list view.
//!
//! [`ReviewQueueController`] holds the tab, page, filter and selection
//! state, performs reloads against the store, and reconciles the
//! [`UpdateDetector`] with the polling preconditions. It is the only
//! component that mutates this state; everyone else reads snapshots.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use revq_core::error::ActionError;
use revq_core::review::{ReviewFilters, ReviewItem, ReviewPage, ReviewTab};
use revq_core::store::ReviewStore;
use revq_core::types::DbId;

use crate::detector::{DetectorState, UpdateDetector};
use crate::events::{ReviewEvent, ReviewEvents};

/// Mutable view state, all owned here.
struct ViewState {
    tab: ReviewTab,
    page: u32,
    filters: ReviewFilters,
    polling_enabled: bool,
    current: ReviewPage,
    /// Selected item ids; only meaningful on the confirmed tab.
    selection: Vec<DbId>,
    last_error: Option<String>,
}

/// Read-only copy of the controller's state for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub tab: ReviewTab,
    pub page: u32,
    pub filters: ReviewFilters,
    pub polling_enabled: bool,
    pub items: Vec<ReviewItem>,
    pub total_items: i64,
    pub total_pages: u32,
    pub selection: Vec<DbId>,
    /// True when the last reload failed and the items shown come from an
    /// older successful fetch.
    pub stale: bool,
    pub last_error: Option<String>,
}

/// Orchestrates loads, reloads and polling for the review queue.
pub struct ReviewQueueController {
    store: Arc<dyn ReviewStore>,
    detector: Arc<UpdateDetector>,
    events: ReviewEvents,
    page_size: u32,
    poll_interval: Duration,
    view: Mutex<ViewState>,
}

impl ReviewQueueController {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        detector: Arc<UpdateDetector>,
        events: ReviewEvents,
        page_size: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            detector,
            events,
            page_size,
            poll_interval,
            view: Mutex::new(ViewState {
                tab: ReviewTab::Waiting,
                page: 1,
                filters: ReviewFilters::default(),
                polling_enabled: true,
                current: ReviewPage::empty(page_size),
                selection: Vec::new(),
                last_error: None,
            }),
        }
    }

    /// Items per page this controller requests.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// A copy of the current view state.
    pub async fn snapshot(&self) -> QueueSnapshot {
        let view = self.view.lock().await;
        make_snapshot(&view)
    }

    /// Look up an item on the currently loaded page.
    pub async fn find_item(&self, id: DbId) -> Option<ReviewItem> {
        let view = self.view.lock().await;
        view.current.items.iter().find(|item| item.id == id).cloned()
    }

    /// Switch tabs: page resets to 1, the selection is cleared, and the
    /// new tab is loaded.
    pub async fn set_tab(&self, tab: ReviewTab) {
        let mut view = self.view.lock().await;
        view.tab = tab;
        view.page = 1;
        view.selection.clear();
        self.do_reload(&mut view).await;
        self.sync_detector(&view);
    }

    /// Replace the filter state: page resets to 1 and the list reloads.
    pub async fn set_filters(&self, filters: ReviewFilters) {
        let mut view = self.view.lock().await;
        view.filters = filters;
        view.page = 1;
        self.do_reload(&mut view).await;
        self.sync_detector(&view);
    }

    /// Toggle the hidden-only filter (confirmed tab). Follows the same
    /// reset rules as [`set_filters`](Self::set_filters).
    pub async fn set_hidden_only(&self, hidden_only: bool) {
        let mut view = self.view.lock().await;
        view.filters.hidden_only = hidden_only;
        view.page = 1;
        self.do_reload(&mut view).await;
        self.sync_detector(&view);
    }

    /// Move to another page of the current view; filters are untouched.
    pub async fn set_page(&self, page: u32) {
        let mut view = self.view.lock().await;
        view.page = page.max(1);
        self.do_reload(&mut view).await;
    }

    /// User-level polling toggle.
    pub async fn set_polling_enabled(&self, enabled: bool) {
        let mut view = self.view.lock().await;
        view.polling_enabled = enabled;
        self.sync_detector(&view);
    }

    /// Re-fetch the current view.
    ///
    /// On failure the previous page stays visible and the error is kept
    /// as a non-blocking indicator; see [`QueueSnapshot::stale`].
    pub async fn reload(&self) {
        let mut view = self.view.lock().await;
        self.do_reload(&mut view).await;
    }

    /// Reload and zero the detector's pending delta: the caller has just
    /// acted on the queue, so whatever was pending is now on screen.
    pub async fn refresh_after_action(&self) {
        let mut view = self.view.lock().await;
        self.do_reload(&mut view).await;
        self.detector.reset();
    }

    /// Reconcile the detector with the current view without reloading.
    /// Used at startup and by the visibility hooks.
    pub async fn resync_polling(&self) {
        let view = self.view.lock().await;
        self.sync_detector(&view);
    }

    /// Apply a full view description in one step, following the same
    /// reset rules as the granular setters but with a single reload.
    pub async fn navigate(
        &self,
        tab: ReviewTab,
        page: u32,
        filters: ReviewFilters,
    ) -> QueueSnapshot {
        let mut view = self.view.lock().await;
        let tab_changed = view.tab != tab;
        let filters_changed = view.filters != filters;

        view.tab = tab;
        view.filters = filters;
        if tab_changed {
            view.selection.clear();
        }
        view.page = if tab_changed || filters_changed {
            1
        } else {
            page.max(1)
        };

        self.do_reload(&mut view).await;
        self.sync_detector(&view);
        make_snapshot(&view)
    }

    /// Toggle an item in the confirmed-tab selection. Returns whether the
    /// item is selected afterwards.
    pub async fn toggle_selection(&self, id: DbId) -> bool {
        let mut view = self.view.lock().await;
        if view.tab != ReviewTab::Confirmed {
            tracing::debug!(id, "Selection ignored outside the confirmed tab");
            return false;
        }
        if let Some(pos) = view.selection.iter().position(|&s| s == id) {
            view.selection.remove(pos);
            false
        } else {
            view.selection.push(id);
            true
        }
    }

    pub async fn clear_selection(&self) {
        self.view.lock().await.selection.clear();
    }

    /// Bulk-toggle the hidden flag, then reload so the list reflects it.
    ///
    /// An empty id list is a no-op. Returns how many ids were submitted.
    pub async fn set_items_visibility(
        &self,
        ids: &[DbId],
        hidden: bool,
    ) -> Result<usize, ActionError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.store.set_visibility(ids, hidden).await?;

        let mut view = self.view.lock().await;
        view.selection.retain(|id| !ids.contains(id));
        self.do_reload(&mut view).await;
        Ok(ids.len())
    }

    // ---- private helpers ----

    async fn do_reload(&self, view: &mut MutexGuard<'_, ViewState>) {
        match self
            .store
            .fetch_page(view.tab, view.page, self.page_size, &view.filters)
            .await
        {
            Ok(page) => {
                view.last_error = None;
                // The unfiltered waiting-tab total is the detector's
                // baseline; filtered totals would corrupt it.
                if view.tab == ReviewTab::Waiting && !view.filters.has_date_bound() {
                    self.detector.update_baseline(page.total_items);
                }
                self.events.publish(ReviewEvent::QueueReloaded {
                    tab: view.tab,
                    page: page.page,
                    total_items: page.total_items,
                });
                view.current = page;
            }
            Err(e) => {
                // Keep the previous page visible; a transient failure
                // must not blank the console.
                tracing::error!(error = %e, "Review page reload failed");
                view.last_error = Some(e.to_string());
            }
        }
    }

    /// Reconcile the detector with the three polling preconditions:
    /// waiting tab, no date bound, polling user-enabled.
    fn sync_detector(&self, view: &ViewState) {
        let should_poll = view.tab == ReviewTab::Waiting
            && !view.filters.has_date_bound()
            && view.polling_enabled;

        match (should_poll, self.detector.state()) {
            // Already polling; restarting would reset the schedule for nothing.
            (true, DetectorState::Polling) => {}
            // Visibility suspension outlives filter changes; the focus
            // hook resumes polling when the console is visible again.
            (true, DetectorState::Suspended) => {}
            (true, DetectorState::Idle) => {
                self.detector
                    .start(view.current.total_items, self.poll_interval);
            }
            (false, DetectorState::Idle) => {}
            (false, _) => self.detector.stop(),
        }
    }
}

fn make_snapshot(view: &ViewState) -> QueueSnapshot {
    QueueSnapshot {
        tab: view.tab,
        page: view.page,
        filters: view.filters,
        polling_enabled: view.polling_enabled,
        items: view.current.items.clone(),
        total_items: view.current.total_items,
        total_pages: view.current.total_pages,
        selection: view.selection.clone(),
        stale: view.last_error.is_some(),
        last_error: view.last_error.clone(),
    }
}
