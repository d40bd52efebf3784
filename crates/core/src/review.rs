//! Review queue domain model.
//!
//! Mirrors the backend's `/chatrooms/answers` wire format: a review item is
//! one AI-generated answer that was flagged for human confirmation. Items
//! move from the waiting tab to the confirmed tab exclusively through the
//! confirmation workflow; this subsystem never deletes them.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Default number of review items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Default interval between background waiting-count checks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Page size used by the waiting-count probe. Only the pagination envelope
/// is read, so the payload is kept as small as the backend allows.
pub const COUNT_PROBE_SIZE: u32 = 1;

/// Default number of conversation messages fetched for item context.
pub const DIALOG_FETCH_LENGTH: u32 = 15;

/// Confidence at or above this is considered high.
pub const CONFIDENCE_HIGH_THRESHOLD: f64 = 0.7;

/// Confidence at or above this (but below high) is considered medium.
pub const CONFIDENCE_MEDIUM_THRESHOLD: f64 = 0.4;

/* --------------------------------------------------------------------------
Tabs and filters
-------------------------------------------------------------------------- */

/// The two views of the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewTab {
    /// Items with `is_confirmed == false`, awaiting a human decision.
    #[default]
    Waiting,
    /// Items already resolved.
    Confirmed,
}

impl ReviewTab {
    /// The `is_confirmed` query value this tab maps to.
    pub fn is_confirmed(self) -> bool {
        matches!(self, ReviewTab::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewTab::Waiting => "waiting",
            ReviewTab::Confirmed => "confirmed",
        }
    }
}

/// How the two date bounds of a [`DateFilter`] are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilterMode {
    /// Both bounds apply.
    #[default]
    Range,
    /// Only the start bound applies.
    After,
    /// Only the end bound applies.
    Before,
}

/// Optional creation-time window for the review list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateFilter {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub mode: DateFilterMode,
}

impl DateFilter {
    /// True when neither bound is set.
    ///
    /// Note this looks at the raw bounds, not the mode-effective ones: a
    /// start date under `Before` mode still counts as an active filter,
    /// matching how the console treats any entered date as "filtering".
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Unix-seconds lower bound to send upstream, honoring the mode.
    pub fn start_ts(&self) -> Option<i64> {
        match self.mode {
            DateFilterMode::Before => None,
            DateFilterMode::Range | DateFilterMode::After => {
                self.start.map(|t| t.timestamp())
            }
        }
    }

    /// Unix-seconds upper bound to send upstream, honoring the mode.
    pub fn end_ts(&self) -> Option<i64> {
        match self.mode {
            DateFilterMode::After => None,
            DateFilterMode::Range | DateFilterMode::Before => {
                self.end.map(|t| t.timestamp())
            }
        }
    }
}

/// The full filter state of the review list.
///
/// Owned by the queue controller; any change resets the page to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewFilters {
    /// Show only hidden items (meaningful on the confirmed tab).
    pub hidden_only: bool,
    pub date: DateFilter,
}

impl ReviewFilters {
    /// True when any date bound is set. Background polling is suppressed
    /// while this holds, because the waiting-count baseline is not
    /// filter-aware.
    pub fn has_date_bound(&self) -> bool {
        !self.date.is_empty()
    }
}

/* --------------------------------------------------------------------------
Wire types
-------------------------------------------------------------------------- */

/// One pending-or-resolved AI answer awaiting human confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: DbId,
    pub chatroom_id: DbId,
    pub chatroom_name: String,
    /// The backend serializes this as either a JSON number or a digit
    /// string (values of 16+ digits get stringified upstream to dodge a
    /// double-precision overflow). Both forms are accepted and normalized
    /// to an `i64`.
    #[serde(deserialize_with = "dialog_id_compat")]
    pub chat_dialog_id: DbId,
    pub generated_answer: String,
    /// Model confidence in [0, 1].
    pub confidence: f64,
    pub is_confirmed: bool,
    pub requires_confirmation: bool,
    #[serde(default)]
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One message of the conversation a review item originated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDialog {
    pub id: DbId,
    pub message: String,
    /// `"0"` marks the end user; anything else is the bot side.
    pub sender_type: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub collected_at: Option<Timestamp>,
}

impl ChatDialog {
    pub fn is_from_user(&self) -> bool {
        self.sender_type == "0"
    }
}

/// A fetched slice of the review queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPage {
    pub items: Vec<ReviewItem>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl ReviewPage {
    /// An empty first page, used before the initial load completes.
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            page_size,
            total_items: 0,
            total_pages: 0,
        }
    }

    /// Page count implied by a total and a page size
    /// (`ceil(total_items / page_size)`, 0 when the page size is 0).
    pub fn expected_pages(total_items: i64, page_size: u32) -> u32 {
        if page_size == 0 || total_items <= 0 {
            return 0;
        }
        let page_size = i64::from(page_size);
        ((total_items + page_size - 1) / page_size) as u32
    }
}

/// Accept `chat_dialog_id` as either a JSON integer or a digit string.
fn dialog_id_compat<'de, D>(deserializer: D) -> Result<DbId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Visitor};

    struct DialogIdVisitor;

    impl<'de> Visitor<'de> for DialogIdVisitor {
        type Value = DbId;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or a string of digits")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<DbId, E> {
            Ok(v)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<DbId, E> {
            DbId::try_from(v).map_err(|_| E::custom(format!("chat_dialog_id {v} out of range")))
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<DbId, E> {
            v.parse()
                .map_err(|_| E::custom(format!("chat_dialog_id {v:?} is not a valid integer")))
        }
    }

    deserializer.deserialize_any(DialogIdVisitor)
}

/* --------------------------------------------------------------------------
Confidence bands
-------------------------------------------------------------------------- */

/// Coarse confidence classification used by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

/// Classify a confidence score into its display band.
pub fn confidence_band(confidence: f64) -> ConfidenceBand {
    if confidence >= CONFIDENCE_HIGH_THRESHOLD {
        ConfidenceBand::High
    } else if confidence >= CONFIDENCE_MEDIUM_THRESHOLD {
        ConfidenceBand::Medium
    } else {
        ConfidenceBand::Low
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
