//! Contract of the external detection matcher.
//!
//! The matcher performs the box matching and AP integration for every
//! breakdown in a [`MetricConfig`](crate::config::MetricConfig). It is
//! treated as a pure function of its inputs and the serialized config.

use crate::error::{Result, WaymoEvalError};
use crate::types::{BoundingBox3D, DetectionSet, PrCurve, Speed};

/// Per-box inputs for one matcher invocation.
///
/// Prediction and ground truth arrays are each parallel; the two sides may
/// have different lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherInput<'a> {
    pub prediction_bbox: &'a [BoundingBox3D],
    pub prediction_type: Vec<u8>,
    pub prediction_score: &'a [f64],
    pub prediction_frame_id: Vec<i64>,
    pub prediction_overlap_nlz: Vec<bool>,
    pub ground_truth_bbox: &'a [BoundingBox3D],
    pub ground_truth_type: Vec<u8>,
    pub ground_truth_frame_id: Vec<i64>,
    pub ground_truth_difficulty: Vec<u8>,
    pub ground_truth_speed: &'a [Speed],
}

impl<'a> MatcherInput<'a> {
    /// Build matcher inputs for a single-class detection set.
    ///
    /// Every box is typed as `class_id`. Ground truth gets the default
    /// difficulty (0) and no prediction overlaps a no-label zone.
    pub fn for_class(set: &'a DetectionSet, class_id: usize) -> Result<Self> {
        let object_type = u8::try_from(class_id).map_err(|_| {
            WaymoEvalError::InvalidConfig(format!(
                "Class id {} does not fit an object type",
                class_id
            ))
        })?;
        let num_gt = set.groundtruth.len();
        let num_pd = set.predictions.len();

        Ok(Self {
            prediction_bbox: &set.predictions.bbox,
            prediction_type: vec![object_type; num_pd],
            prediction_score: &set.predictions.score,
            prediction_frame_id: set.predictions.imgid.clone(),
            prediction_overlap_nlz: vec![false; num_pd],
            ground_truth_bbox: &set.groundtruth.bbox,
            ground_truth_type: vec![object_type; num_gt],
            ground_truth_frame_id: set.groundtruth.imgid.clone(),
            ground_truth_difficulty: vec![0; num_gt],
            ground_truth_speed: &set.groundtruth.speed,
        })
    }

    pub fn num_predictions(&self) -> usize {
        self.prediction_bbox.len()
    }

    pub fn num_groundtruths(&self) -> usize {
        self.ground_truth_bbox.len()
    }
}

/// Matcher results, one entry per breakdown in config order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatcherOutput {
    pub average_precision: Vec<f64>,
    pub average_precision_ha_weighted: Vec<f64>,
    pub precision_recall: Vec<PrCurve>,
    pub precision_recall_ha_weighted: Vec<PrCurve>,
    /// `(generator id, shard, difficulty level)` per breakdown. Not used.
    pub breakdown: Vec<[u8; 3]>,
}

impl MatcherOutput {
    /// Check the output holds `num_breakdowns` entries of `num_pr_points`-row curves.
    pub fn validate(&self, num_breakdowns: usize, num_pr_points: usize) -> Result<()> {
        let lengths = [
            ("AP", self.average_precision.len()),
            ("APH", self.average_precision_ha_weighted.len()),
            ("PR", self.precision_recall.len()),
            ("PR heading-weighted", self.precision_recall_ha_weighted.len()),
        ];
        for (what, len) in lengths {
            if len != num_breakdowns {
                return Err(WaymoEvalError::ShapeMismatch(format!(
                    "matcher returned {} {} entries, expected {}",
                    len, what, num_breakdowns
                )));
            }
        }

        let curves = self
            .precision_recall
            .iter()
            .chain(&self.precision_recall_ha_weighted);
        for curve in curves {
            if curve.len() != num_pr_points {
                return Err(WaymoEvalError::ShapeMismatch(format!(
                    "matcher returned a PR curve with {} points, expected {}",
                    curve.len(),
                    num_pr_points
                )));
            }
        }
        Ok(())
    }
}

/// The external detection matcher.
pub trait DetectionMatcher {
    /// Match boxes and compute per-breakdown metrics.
    ///
    /// `config` is the serialized [`MetricConfig`](crate::config::MetricConfig).
    fn detection_metrics(&self, input: &MatcherInput<'_>, config: &[u8]) -> Result<MatcherOutput>;
}
