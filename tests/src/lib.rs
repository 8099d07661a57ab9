//! # Gravity Core Test Suite
//!
//! Multi-validator scenarios that no single subsystem crate can cover on
//! its own: several validators sharing one ledger and one target chain,
//! each running its own oracle loop and sync agent.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks per subsystem
//! └── src/integration/
//!     ├── harness.rs    # deterministic in-process devnet
//!     ├── pulses.rs     # commit → reveal → result → pulse
//!     └── rotation.rs   # scoring, consul and oracle rotation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p gc-tests
//!
//! # By flow
//! cargo test -p gc-tests integration::pulses::
//! cargo test -p gc-tests integration::rotation::
//!
//! # Benchmarks
//! cargo bench -p gc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
