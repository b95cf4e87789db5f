//! # waymo-ap-eval
//!
//! Average Precision (AP) and heading-weighted Average Precision (APH)
//! metrics for the Waymo Open Dataset, broken down the way the Waymo
//! benchmark reports them: overall, and optionally by object type, range
//! or velocity.
//!
//! The box matching itself is delegated to a [`DetectionMatcher`]; this
//! crate builds the matcher config, selects the boxes of each class, runs
//! the matcher once per class, gathers the per-breakdown results and
//! renders them as a [`SummaryReport`] of scalars and PR curves.
//!
//! ## Features
//!
//! - Matcher config with evenly spaced score cutoffs and per-class IoU thresholds
//! - Breakdown naming (`ONE_SHARD_LEVEL_2`, `RANGE_TYPE_VEHICLE_[0, 30)_LEVEL_2`, ...)
//! - NaN placeholders for classes without ground truth or predictions
//! - Lazy, at-most-once evaluation
//! - Weighted mAP and per-class, per-breakdown AP/APH scalars
//!
//! ## Quick Start
//!
//! ```rust
//! use waymo_ap_eval::{
//!     BoxStore, DetectionMatcher, MatcherInput, MatcherOutput, WaymoApMetric,
//!     WaymoApParams, WaymoMetadata,
//! };
//!
//! // A stand-in for the real matcher: every class scores AP = 0.5.
//! struct ConstantMatcher;
//!
//! impl DetectionMatcher for ConstantMatcher {
//!     fn detection_metrics(
//!         &self,
//!         _input: &MatcherInput<'_>,
//!         _config: &[u8],
//!     ) -> waymo_ap_eval::Result<MatcherOutput> {
//!         Ok(MatcherOutput {
//!             average_precision: vec![0.5],
//!             average_precision_ha_weighted: vec![0.4],
//!             precision_recall: vec![vec![[1.0, 0.0]; 21]],
//!             precision_recall_ha_weighted: vec![vec![[1.0, 0.0]; 21]],
//!             breakdown: Vec::new(),
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // let store = BoxStore::from_json_file("boxes.json")?;
//! let store = BoxStore::new();
//! let mut metric = WaymoApMetric::new(
//!     WaymoMetadata::new(),
//!     store,
//!     ConstantMatcher,
//!     WaymoApParams::default(),
//! )?;
//!
//! let report = metric.summary("waymo")?;
//! println!("weighted mAP: {:.4}", report.scalar("waymo/weighted_mAP").unwrap_or(0.0));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;
pub mod metadata;
pub mod breakdown;
pub mod config;
pub mod loader;
pub mod selector;
pub mod matcher;
pub mod evaluator;
pub mod aggregator;
pub mod summary;
pub mod metric;

// Re-export commonly used types and functions
pub use error::{Result, WaymoEvalError};
pub use types::{
    BoundingBox3D, BoxType, DetectionSet, GroundTruthBoxes, PrCurve, PredictionBoxes, Speed,
};
pub use metadata::{EvalMetadata, WaymoMetadata};
pub use breakdown::{Breakdown, BreakdownGeneratorId, Difficulty, DifficultyLevel};
pub use config::{build_metric_config, MetricConfig, WaymoApParams};
pub use loader::{BinFilter, BoxLoader, BoxStore};
pub use matcher::{DetectionMatcher, MatcherInput, MatcherOutput};
pub use evaluator::{BreakdownMetrics, ClassMetrics};
pub use summary::{CurvePlot, ScalarSummary, SummaryReport};
pub use metric::WaymoApMetric;
