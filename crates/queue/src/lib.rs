//! The review-queue state machine.
//!
//! Three cooperating pieces, each owning its own state:
//!
//! - [`controller::ReviewQueueController`] owns the current page, tab,
//!   filters and selection, and decides when background polling may run.
//! - [`detector::UpdateDetector`] owns the polling baseline and the timer
//!   that watches for new waiting items.
//! - [`workflow::ConfirmationWorkflow`] drives the resolution of a single
//!   item, and on success asks the controller to refresh.
//!
//! Cross-component reads are one-way snapshots; nothing here is shared
//! mutable state.

pub mod controller;
pub mod detector;
pub mod events;
pub mod workflow;

pub use controller::{QueueSnapshot, ReviewQueueController};
pub use detector::{DetectorState, PollingBaseline, UpdateDetector};
pub use events::{ReviewEvent, ReviewEvents};
pub use workflow::{ConfirmationWorkflow, ResolutionMode, WorkflowError, WorkflowStatus};
