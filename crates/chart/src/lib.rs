//! # Tick Range Chart
//!
//! Turns sparse pool tick records into a liquidity-density curve and drives
//! a two-handled, zoomable price range selector whose committed bounds are
//! always usable ticks.
//!
//! Data flows one way:
//!
//! - pool snapshot -> [`normalizer`] -> [`curve`] -> read-only curve
//! - pointer gestures -> [`viewport`] -> [`brush`] -> committed range
//!
//! [`chart::LiquidityRangeChart`] owns one instance of each and arbitrates
//! snapshot refreshes that arrive while a gesture is in progress.

pub mod brush;
pub mod chart;
pub mod config;
pub mod curve;
pub mod error;
pub mod labels;
pub mod normalizer;
pub mod render;
pub mod viewport;

// Re-export commonly used items
pub use brush::{
    CommitMode, CommittedRange, DragHandle, GestureState, HandleVisibility, RangeCommittedCallback,
    RangeSelectionController, StepDirection, TicksAtLimit,
};
pub use chart::{ChartStatus, LiquidityRangeChart, SnapshotOutcome, StartingRange};
pub use config::{create_example_config, ChartConfig, LabelConfig};
pub use curve::{build_curve, Curve, CurveCache, Traversal};
pub use error::{ChartError, ChartResult};
pub use labels::{LabelFormatter, LabelMode, Sentinel};
pub use normalizer::{normalize_ticks, NormalizedTicks};
pub use render::{render_model, HandleModel, MonospaceMeasure, Rect, RenderModel, TextMeasure};
pub use viewport::{ZoomLevels, ZoomTransform, ZoomViewport};
