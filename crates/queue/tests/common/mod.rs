//! Shared scripted `ReviewStore` mock for the queue test suites.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use revq_core::error::{ActionError, UpstreamError};
use revq_core::review::{ChatDialog, ReviewFilters, ReviewItem, ReviewPage, ReviewTab};
use revq_core::store::ReviewStore;
use revq_core::types::DbId;

/// An in-memory store with scripted responses and call instrumentation.
///
/// Counts and pages are consumed front-to-back; when a script runs dry the
/// last count repeats and pages fall back to an empty page carrying
/// `default_total`.
#[derive(Default)]
pub struct MockStore {
    counts: Mutex<VecDeque<Result<i64, ()>>>,
    last_count: Mutex<i64>,
    pub count_calls: AtomicUsize,
    counts_in_flight: AtomicUsize,
    pub max_counts_in_flight: AtomicUsize,
    count_delay: Mutex<Duration>,

    pages: Mutex<VecDeque<Result<ReviewPage, ()>>>,
    pub fetch_calls: AtomicUsize,
    pub last_fetch: Mutex<Option<(ReviewTab, u32, u32, ReviewFilters)>>,
    default_total: Mutex<i64>,

    pub approve_calls: AtomicUsize,
    pub reject_calls: AtomicUsize,
    pub visibility_calls: AtomicUsize,
    action_fail_status: Mutex<Option<u16>>,
    action_delay: Mutex<Duration>,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_counts(&self, counts: &[i64]) {
        let mut queue = self.counts.lock().unwrap();
        queue.extend(counts.iter().map(|&n| Ok(n)));
    }

    pub fn script_count_error(&self) {
        self.counts.lock().unwrap().push_back(Err(()));
    }

    pub fn set_count_delay(&self, delay: Duration) {
        *self.count_delay.lock().unwrap() = delay;
    }

    pub fn script_page(&self, page: ReviewPage) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn script_page_error(&self) {
        self.pages.lock().unwrap().push_back(Err(()));
    }

    /// Total reported by fallback (un-scripted) page fetches.
    pub fn set_default_total(&self, total: i64) {
        *self.default_total.lock().unwrap() = total;
    }

    pub fn fail_actions_with(&self, status: u16) {
        *self.action_fail_status.lock().unwrap() = Some(status);
    }

    pub fn clear_action_failure(&self) {
        *self.action_fail_status.lock().unwrap() = None;
    }

    pub fn set_action_delay(&self, delay: Duration) {
        *self.action_delay.lock().unwrap() = delay;
    }

    async fn run_action(&self) -> Result<(), ActionError> {
        let delay = *self.action_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match *self.action_fail_status.lock().unwrap() {
            Some(status) => Err(ActionError::Api {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReviewStore for MockStore {
    async fn fetch_page(
        &self,
        tab: ReviewTab,
        page: u32,
        page_size: u32,
        filters: &ReviewFilters,
    ) -> Result<ReviewPage, UpstreamError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_fetch.lock().unwrap() = Some((tab, page, page_size, *filters));

        let scripted = self.pages.lock().unwrap().pop_front();
        match scripted {
            Some(Ok(p)) => Ok(p),
            Some(Err(())) => Err(UpstreamError::Api {
                status: 500,
                body: "scripted failure".to_string(),
            }),
            None => {
                let total = *self.default_total.lock().unwrap();
                Ok(ReviewPage {
                    items: Vec::new(),
                    page,
                    page_size,
                    total_items: total,
                    total_pages: ReviewPage::expected_pages(total, page_size),
                })
            }
        }
    }

    async fn waiting_count(&self) -> Result<i64, UpstreamError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.counts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_counts_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.count_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut counts = self.counts.lock().unwrap();
            match counts.pop_front() {
                Some(Ok(n)) => {
                    *self.last_count.lock().unwrap() = n;
                    Ok(n)
                }
                Some(Err(())) => Err(UpstreamError::Request("scripted failure".to_string())),
                None => Ok(*self.last_count.lock().unwrap()),
            }
        };

        self.counts_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn approve(&self, _id: DbId) -> Result<(), ActionError> {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);
        self.run_action().await
    }

    async fn reject(&self, _id: DbId) -> Result<(), ActionError> {
        self.reject_calls.fetch_add(1, Ordering::SeqCst);
        self.run_action().await
    }

    async fn set_visibility(&self, _answer_ids: &[DbId], _hidden: bool) -> Result<(), ActionError> {
        self.visibility_calls.fetch_add(1, Ordering::SeqCst);
        self.run_action().await
    }

    async fn fetch_dialogs(
        &self,
        _chatroom_id: DbId,
        _chat_dialog_id: DbId,
        _length: u32,
    ) -> Result<Vec<ChatDialog>, UpstreamError> {
        Ok(Vec::new())
    }
}

/// A plausible review item for list and workflow tests.
pub fn item(id: DbId) -> ReviewItem {
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
    ReviewItem {
        id,
        chatroom_id: 7,
        chatroom_name: "room-7".to_string(),
        chat_dialog_id: 1000 + id,
        generated_answer: "Use the reset link.".to_string(),
        confidence: 0.55,
        is_confirmed: false,
        requires_confirmation: true,
        status: "pending".to_string(),
        created_at: at,
        updated_at: at,
    }
}

/// Build a page the way the backend would report it.
pub fn page_of(items: Vec<ReviewItem>, page: u32, page_size: u32, total_items: i64) -> ReviewPage {
    ReviewPage {
        items,
        page,
        page_size,
        total_items,
        total_pages: ReviewPage::expected_pages(total_items, page_size),
    }
}
