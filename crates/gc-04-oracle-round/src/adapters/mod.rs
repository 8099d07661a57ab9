//! # Adapters Layer
//!
//! Data extractor implementations.

pub mod fixed;
pub mod http;

pub use fixed::FixedExtractor;
pub use http::HttpExtractor;
