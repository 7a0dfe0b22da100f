//! Shared types for tick-liquidity charts
//!
//! This crate provides the data model that flows between the pool snapshot
//! provider, the curve builder, and the range selection controller.

pub mod pool;
pub mod range;
pub mod serde_helpers;
pub mod tick;

// Re-export all public types
pub use pool::*;
pub use range::*;
pub use tick::*;
