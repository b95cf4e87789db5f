//! Matcher configuration: score cutoffs, IoU thresholds and breakdowns.

use crate::breakdown::{expand_breakdowns, Breakdown, BreakdownGeneratorId, Difficulty};
use crate::error::{Result, WaymoEvalError};
use crate::metadata::EvalMetadata;
use crate::types::BoxType;
use serde::{Deserialize, Serialize};

/// IoU threshold for classes without an override.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.7;

/// Box matching algorithm used by the detection matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatcherType {
    #[default]
    #[serde(rename = "TYPE_HUNGARIAN")]
    Hungarian,
}

/// User-facing parameters of the Waymo AP metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaymoApParams {
    /// Whether boxes are matched as 2D or 3D boxes.
    pub box_type: BoxType,
    /// Extra breakdown generators to compute, by enumeration name
    /// (e.g. `RANGE` or `OBJECT_TYPE`).
    pub breakdown_metrics: Vec<String>,
}

impl WaymoApParams {
    pub fn new(box_type: BoxType) -> Self {
        Self {
            box_type,
            breakdown_metrics: Vec::new(),
        }
    }

    /// Add an extra breakdown generator by name.
    pub fn with_breakdown(mut self, name: impl Into<String>) -> Self {
        self.breakdown_metrics.push(name.into());
        self
    }

    /// Parse params from a JSON string.
    pub fn from_json_str(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }
}

/// Immutable configuration handed to the detection matcher.
///
/// `breakdown_generator_ids` and `difficulties` are parallel arrays; the
/// first generator is always [`BreakdownGeneratorId::OneShard`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricConfig {
    score_cutoffs: Vec<f64>,
    matcher_type: MatcherType,
    box_type: BoxType,
    iou_thresholds: Vec<f64>,
    breakdown_generator_ids: Vec<BreakdownGeneratorId>,
    difficulties: Vec<Difficulty>,
    #[serde(skip)]
    breakdowns: Vec<Breakdown>,
}

impl MetricConfig {
    pub fn score_cutoffs(&self) -> &[f64] {
        &self.score_cutoffs
    }

    pub fn matcher_type(&self) -> MatcherType {
        self.matcher_type
    }

    pub fn box_type(&self) -> BoxType {
        self.box_type
    }

    /// IoU thresholds indexed by class id.
    pub fn iou_thresholds(&self) -> &[f64] {
        &self.iou_thresholds
    }

    /// IoU threshold for one class id.
    pub fn iou_threshold(&self, class_id: usize) -> Option<f64> {
        self.iou_thresholds.get(class_id).copied()
    }

    pub fn breakdown_generator_ids(&self) -> &[BreakdownGeneratorId] {
        &self.breakdown_generator_ids
    }

    pub fn difficulties(&self) -> &[Difficulty] {
        &self.difficulties
    }

    /// Number of points on every precision-recall curve.
    pub fn num_pr_points(&self) -> usize {
        self.score_cutoffs.len()
    }

    /// Ordered breakdowns; index 0 is the overall breakdown.
    pub fn breakdowns(&self) -> &[Breakdown] {
        &self.breakdowns
    }

    /// Ordered breakdown names, parallel to [`breakdowns`](Self::breakdowns).
    pub fn breakdown_names(&self) -> Vec<String> {
        self.breakdowns.iter().map(Breakdown::name).collect()
    }

    /// Serialized form passed to the detection matcher.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Generate `num_points` evenly spaced score cutoffs over `[0, 1]`, endpoints included.
///
/// # Errors
///
/// Returns an error if fewer than two points are requested.
///
/// # Example
///
/// ```
/// use waymo_ap_eval::config::generate_score_cutoffs;
///
/// let cutoffs = generate_score_cutoffs(5).unwrap();
/// assert_eq!(cutoffs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn generate_score_cutoffs(num_points: usize) -> Result<Vec<f64>> {
    if num_points < 2 {
        return Err(WaymoEvalError::InvalidConfig(format!(
            "Number of precision-recall points must be at least 2, got {}",
            num_points
        )));
    }

    let last = (num_points - 1) as f64;
    Ok((0..num_points).map(|i| i as f64 / last).collect())
}

/// Build the matcher config from dataset metadata and metric params.
///
/// Every class starts at [`DEFAULT_IOU_THRESHOLD`] and is then overridden by
/// the metadata's per-class thresholds. The overall `ONE_SHARD` breakdown is
/// always first, followed by one generator per extra breakdown name.
///
/// # Errors
///
/// Fails if the metadata asks for fewer than two PR points, if an IoU
/// override names an unknown class or lies outside `[0, 1]`, or if an extra
/// breakdown name is unknown. Repeated names are kept, each one adding its
/// own generator entry.
pub fn build_metric_config<M, S>(
    metadata: &M,
    box_type: BoxType,
    extra_breakdown_names: &[S],
) -> Result<MetricConfig>
where
    M: EvalMetadata + ?Sized,
    S: AsRef<str>,
{
    let score_cutoffs = generate_score_cutoffs(metadata.number_of_precision_recall_points())?;

    let mut iou_thresholds = vec![DEFAULT_IOU_THRESHOLD; metadata.num_classes()];
    for (class_name, &threshold) in metadata.iou_thresholds() {
        let class_index = metadata
            .class_index(class_name)
            .ok_or_else(|| WaymoEvalError::UnknownClass(class_name.clone()))?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(WaymoEvalError::InvalidConfig(format!(
                "IoU threshold for {} must be between 0.0 and 1.0, got {}",
                class_name, threshold
            )));
        }
        iou_thresholds[class_index] = threshold;
    }

    let mut breakdown_generator_ids = vec![BreakdownGeneratorId::OneShard];
    let mut difficulties = vec![Difficulty::default()];
    for name in extra_breakdown_names {
        breakdown_generator_ids.push(name.as_ref().parse()?);
        difficulties.push(Difficulty::default());
    }

    let breakdowns = expand_breakdowns(&breakdown_generator_ids, &difficulties);

    Ok(MetricConfig {
        score_cutoffs,
        matcher_type: MatcherType::Hungarian,
        box_type,
        iou_thresholds,
        breakdown_generator_ids,
        difficulties,
        breakdowns,
    })
}
