//! # Domain Layer
//!
//! Rotation rules, sync states and the committed-state snapshot the
//! sync agent works from.

pub mod config;
pub mod errors;
pub mod rotation;
pub mod snapshot;
pub mod sync_state;

pub use config::SchedulerConfig;
pub use errors::{SchedulerError, SchedulerResult};
pub use rotation::{is_rotation_height, rotate_window, round_id, round_sender, top_consuls};
pub use snapshot::{FeedSnapshot, SyncSnapshot};
pub use sync_state::{SyncState, SyncTracker};
