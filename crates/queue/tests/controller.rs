//! Behavioral tests for the review queue controller.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{item, page_of, MockStore};
use revq_core::review::{DateFilter, DateFilterMode, ReviewFilters, ReviewTab};
use revq_core::store::ReviewStore;
use revq_queue::{DetectorState, ReviewEvents, ReviewQueueController, UpdateDetector};

use chrono::{TimeZone, Utc};

const PAGE_SIZE: u32 = 5;
const POLL_INTERVAL: Duration = Duration::from_millis(40);

fn setup(store: &Arc<MockStore>) -> (Arc<ReviewQueueController>, Arc<UpdateDetector>) {
    let events = ReviewEvents::default();
    let detector = Arc::new(UpdateDetector::new(
        Arc::clone(store) as Arc<dyn ReviewStore>,
        events.clone(),
    ));
    let controller = Arc::new(ReviewQueueController::new(
        Arc::clone(store) as Arc<dyn ReviewStore>,
        Arc::clone(&detector),
        events,
        PAGE_SIZE,
        POLL_INTERVAL,
    ));
    (controller, detector)
}

fn date_filter_after(secs: i64) -> ReviewFilters {
    ReviewFilters {
        hidden_only: false,
        date: DateFilter {
            start: Some(Utc.timestamp_opt(secs, 0).unwrap()),
            end: None,
            mode: DateFilterMode::After,
        },
    }
}

// ---------------------------------------------------------------------------
// Reset rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_tab_resets_page_and_reloads_once() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    controller.set_page(3).await;
    assert_eq!(controller.snapshot().await.page, 3);
    let calls_before = store.fetch_calls.load(Ordering::SeqCst);

    controller.set_tab(ReviewTab::Confirmed).await;

    assert_eq!(store.fetch_calls.load(Ordering::SeqCst), calls_before + 1);
    let (tab, page, page_size, _) = store.last_fetch.lock().unwrap().unwrap();
    assert_eq!(tab, ReviewTab::Confirmed);
    assert_eq!(page, 1);
    assert_eq!(page_size, PAGE_SIZE);
    assert_eq!(controller.snapshot().await.page, 1);
}

#[tokio::test]
async fn set_filters_resets_page_and_reloads_once() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    controller.set_page(4).await;
    let calls_before = store.fetch_calls.load(Ordering::SeqCst);

    controller.set_filters(date_filter_after(100)).await;

    assert_eq!(store.fetch_calls.load(Ordering::SeqCst), calls_before + 1);
    let (_, page, _, filters) = store.last_fetch.lock().unwrap().unwrap();
    assert_eq!(page, 1);
    assert_eq!(filters.date.start_ts(), Some(100));
}

#[tokio::test]
async fn set_page_keeps_filters_and_clamps_to_one() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    controller.set_filters(date_filter_after(100)).await;
    controller.set_page(2).await;
    let (_, page, _, filters) = store.last_fetch.lock().unwrap().unwrap();
    assert_eq!(page, 2);
    assert_eq!(filters.date.start_ts(), Some(100));

    controller.set_page(0).await;
    let (_, page, _, _) = store.last_fetch.lock().unwrap().unwrap();
    assert_eq!(page, 1);
}

#[tokio::test]
async fn tab_switch_clears_the_selection() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    controller.set_tab(ReviewTab::Confirmed).await;
    assert!(controller.toggle_selection(11).await);
    assert!(controller.toggle_selection(12).await);
    assert_eq!(controller.snapshot().await.selection, vec![11, 12]);

    controller.set_tab(ReviewTab::Waiting).await;
    assert!(controller.snapshot().await.selection.is_empty());
}

#[tokio::test]
async fn selection_is_ignored_on_the_waiting_tab() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    assert!(!controller.toggle_selection(11).await);
    assert!(controller.snapshot().await.selection.is_empty());
}

// ---------------------------------------------------------------------------
// Reload semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_reload_keeps_the_previous_page() {
    let store = MockStore::new();
    store.script_page(page_of(vec![item(1), item(2)], 1, PAGE_SIZE, 2));
    let (controller, _detector) = setup(&store);

    controller.reload().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.items.len(), 2);
    assert!(!snapshot.stale);

    store.script_page_error();
    controller.reload().await;
    let snapshot = controller.snapshot().await;
    // Stale-but-valid data wins over no data.
    assert_eq!(snapshot.items.len(), 2);
    assert!(snapshot.stale);
    assert!(snapshot.last_error.is_some());

    store.script_page(page_of(vec![item(3)], 1, PAGE_SIZE, 1));
    controller.reload().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.items.len(), 1);
    assert!(!snapshot.stale);
}

#[tokio::test]
async fn waiting_reload_forwards_the_baseline() {
    let store = MockStore::new();
    store.set_default_total(7);
    let (controller, detector) = setup(&store);

    controller.reload().await;
    assert_eq!(detector.baseline().known_count, 7);
}

#[tokio::test]
async fn confirmed_reload_does_not_touch_the_baseline() {
    let store = MockStore::new();
    store.set_default_total(7);
    let (controller, detector) = setup(&store);

    controller.reload().await;
    assert_eq!(detector.baseline().known_count, 7);

    store.set_default_total(99);
    controller.set_tab(ReviewTab::Confirmed).await;
    assert_eq!(detector.baseline().known_count, 7);
}

#[tokio::test]
async fn date_filtered_reload_does_not_touch_the_baseline() {
    let store = MockStore::new();
    store.set_default_total(7);
    let (controller, detector) = setup(&store);

    controller.reload().await;
    store.set_default_total(3);
    controller.set_filters(date_filter_after(100)).await;
    // The filtered total is not the waiting count.
    assert_eq!(detector.baseline().known_count, 7);
}

// ---------------------------------------------------------------------------
// Polling preconditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn polling_runs_only_on_unfiltered_waiting_tab_with_user_consent() {
    let store = MockStore::new();
    store.set_default_total(5);
    let (controller, detector) = setup(&store);

    controller.reload().await;
    controller.resync_polling().await;
    assert_eq!(detector.state(), DetectorState::Polling);

    // Setting a date bound stops polling even though it was running.
    controller.set_filters(date_filter_after(100)).await;
    assert_eq!(detector.state(), DetectorState::Idle);

    // Clearing the bound brings it back.
    controller.set_filters(ReviewFilters::default()).await;
    assert_eq!(detector.state(), DetectorState::Polling);

    // The user toggle wins over everything else.
    controller.set_polling_enabled(false).await;
    assert_eq!(detector.state(), DetectorState::Idle);
    controller.set_polling_enabled(true).await;
    assert_eq!(detector.state(), DetectorState::Polling);

    // The confirmed tab never polls.
    controller.set_tab(ReviewTab::Confirmed).await;
    assert_eq!(detector.state(), DetectorState::Idle);
    controller.set_tab(ReviewTab::Waiting).await;
    assert_eq!(detector.state(), DetectorState::Polling);
}

#[tokio::test]
async fn refresh_after_action_reloads_and_zeroes_the_delta() {
    let store = MockStore::new();
    store.set_default_total(5);
    let (controller, detector) = setup(&store);

    controller.reload().await;
    controller.resync_polling().await;

    store.script_counts(&[8]);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(detector.baseline().pending_delta, 3);

    store.set_default_total(8);
    let calls_before = store.fetch_calls.load(Ordering::SeqCst);
    controller.refresh_after_action().await;

    assert_eq!(store.fetch_calls.load(Ordering::SeqCst), calls_before + 1);
    let snapshot = detector.baseline();
    assert_eq!(snapshot.pending_delta, 0);
    assert_eq!(snapshot.known_count, 8);
}

// ---------------------------------------------------------------------------
// Navigate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn navigate_honors_the_reset_rules() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    // Same tab and filters: the requested page is respected.
    let snapshot = controller
        .navigate(ReviewTab::Waiting, 3, ReviewFilters::default())
        .await;
    assert_eq!(snapshot.page, 3);

    // Tab change forces page 1 regardless of the requested page.
    let snapshot = controller
        .navigate(ReviewTab::Confirmed, 5, ReviewFilters::default())
        .await;
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.tab, ReviewTab::Confirmed);

    // Filter change forces page 1 as well.
    let snapshot = controller
        .navigate(ReviewTab::Confirmed, 4, date_filter_after(100))
        .await;
    assert_eq!(snapshot.page, 1);
}

// ---------------------------------------------------------------------------
// Bulk visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_visibility_submits_then_reloads() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    controller.set_tab(ReviewTab::Confirmed).await;
    controller.toggle_selection(11).await;
    let calls_before = store.fetch_calls.load(Ordering::SeqCst);

    let updated = controller.set_items_visibility(&[11, 12], true).await.unwrap();
    assert_eq!(updated, 2);
    assert_eq!(store.visibility_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.fetch_calls.load(Ordering::SeqCst), calls_before + 1);
    // Submitted ids drop out of the selection.
    assert!(controller.snapshot().await.selection.is_empty());
}

#[tokio::test]
async fn bulk_visibility_with_no_ids_is_a_no_op() {
    let store = MockStore::new();
    let (controller, _detector) = setup(&store);

    let updated = controller.set_items_visibility(&[], true).await.unwrap();
    assert_eq!(updated, 0);
    assert_eq!(store.visibility_calls.load(Ordering::SeqCst), 0);
}
