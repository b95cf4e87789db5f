//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use waymo_ap_eval::breakdown::expand_breakdowns;
use waymo_ap_eval::loader::{GroundTruthRecord, PredictionRecord};
use waymo_ap_eval::{
    BoundingBox3D, BreakdownGeneratorId, Difficulty, DetectionMatcher, MatcherInput,
    MatcherOutput, Result, Speed, WaymoMetadata,
};

/// Fake matcher that decodes the config like the real one and returns
/// deterministic per-breakdown values.
///
/// Breakdown `k` gets AP = `num_gt / (num_gt + num_pd) / (k + 1)` and
/// APH = 0.9 * AP. PR rows are `[precision, recall]` with recall equal to
/// the fraction of predictions scoring at least the cutoff.
#[derive(Default)]
pub struct FakeMatcher {
    pub calls: Cell<usize>,
}

#[derive(serde::Deserialize)]
struct DecodedConfig {
    score_cutoffs: Vec<f64>,
    breakdown_generator_ids: Vec<BreakdownGeneratorId>,
    difficulties: Vec<Difficulty>,
}

impl DetectionMatcher for FakeMatcher {
    fn detection_metrics(&self, input: &MatcherInput<'_>, config: &[u8]) -> Result<MatcherOutput> {
        self.calls.set(self.calls.get() + 1);
        let config: DecodedConfig = serde_json::from_slice(config)?;
        let breakdowns = expand_breakdowns(&config.breakdown_generator_ids, &config.difficulties);

        let num_gt = input.num_groundtruths() as f64;
        let num_pd = input.num_predictions() as f64;
        let base = num_gt / (num_gt + num_pd);

        let curve: Vec<[f64; 2]> = config
            .score_cutoffs
            .iter()
            .map(|&cutoff| {
                let kept = input.prediction_score.iter().filter(|&&s| s >= cutoff).count() as f64;
                [1.0 - cutoff, kept / num_pd]
            })
            .collect();

        let ap: Vec<f64> = (0..breakdowns.len()).map(|k| base / (k + 1) as f64).collect();
        Ok(MatcherOutput {
            average_precision_ha_weighted: ap.iter().map(|v| v * 0.9).collect(),
            average_precision: ap,
            precision_recall: vec![curve.clone(); breakdowns.len()],
            precision_recall_ha_weighted: vec![curve; breakdowns.len()],
            breakdown: Vec::new(),
        })
    }
}

pub fn metadata(
    class_names: &[&str],
    eval_class_indices: &[usize],
    num_pr_points: usize,
) -> WaymoMetadata {
    WaymoMetadata {
        class_names: class_names.iter().map(|s| s.to_string()).collect(),
        iou_thresholds: Default::default(),
        num_pr_points,
        eval_class_indices: eval_class_indices.to_vec(),
    }
}

pub fn car_box(x: f64) -> BoundingBox3D {
    BoundingBox3D::new(x, 0.0, 0.8, 4.5, 2.0, 1.6, 0.0)
}

pub fn groundtruth(imgid: i64, class_id: usize, bbox: BoundingBox3D) -> GroundTruthRecord {
    GroundTruthRecord {
        imgid,
        class_id,
        bbox,
        speed: Speed::new(1.0, 0.0),
        distance_bin: None,
        num_points_bin: None,
        rotation_bin: None,
    }
}

pub fn prediction(
    imgid: i64,
    class_id: usize,
    bbox: BoundingBox3D,
    score: f64,
) -> PredictionRecord {
    PredictionRecord {
        imgid,
        class_id,
        bbox,
        score,
        distance_bin: None,
        rotation_bin: None,
    }
}
