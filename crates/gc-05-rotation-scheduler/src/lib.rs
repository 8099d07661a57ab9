//! # GC-05 Rotation Scheduler
//!
//! Rotates the consul set and every feed's oracle window once per score
//! interval, and carries each rotation to the target chains.
//!
//! **Subsystem ID:** 05
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Two Halves
//!
//! | Half | Runs in | Does |
//! |------|---------|------|
//! | [`Scheduler`] | ledger `EndBlock` | recompute scores, promote, pick candidate, slide windows |
//! | [`SyncAgent`] | validator process | sign new sets, publish at threshold, approve the round |
//!
//! The scheduler is deterministic and touches only ledger state. The
//! agent is the only part that talks to target chains.
//!
//! ## Round Lifecycle
//!
//! ```text
//! height I·r ──→ Scheduler: ConsulsCandidate := top-N, BftOraclesByNebula := window
//!            ──→ SyncAgent: SignNewConsuls / SignNewOracles from every consul
//!            ──→ sender: publish at ceil(2n/3), then ApproveLastRound(r)
//! height I·(r+1) ──→ Scheduler: LastRoundApproved == r, promote candidate
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! gc-05-rotation-scheduler/
//! ├── domain/       # rotation rules, SyncState, SyncSnapshot, config, errors
//! ├── ports/        # SyncLedger
//! ├── metrics.rs    # Prometheus counters (feature "metrics")
//! ├── scheduler.rs  # EndBlock rotation step
//! └── agent.rs      # SyncAgent tick/run loop
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod scheduler;

pub use agent::SyncAgent;
pub use domain::{
    is_rotation_height, rotate_window, round_id, round_sender, top_consuls, FeedSnapshot,
    SchedulerConfig, SchedulerError, SchedulerResult, SyncSnapshot, SyncState, SyncTracker,
};
pub use ports::SyncLedger;
pub use scheduler::{RotationOutcome, Scheduler};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
