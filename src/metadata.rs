//! Dataset metadata consumed by the metric: classes, IoU thresholds and PR sampling.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read-only view of the dataset metadata the AP metric needs.
pub trait EvalMetadata {
    /// Ordered class names; index 0 is the background class.
    fn class_names(&self) -> &[String];

    /// Per-class IoU threshold overrides, keyed by class name.
    fn iou_thresholds(&self) -> &BTreeMap<String, f64>;

    /// Number of score cutoffs sampled along each precision-recall curve.
    fn number_of_precision_recall_points(&self) -> usize;

    /// Class indices evaluated and reported, in report order.
    fn eval_class_indices(&self) -> &[usize];

    /// Number of classes, background included.
    fn num_classes(&self) -> usize {
        self.class_names().len()
    }

    /// Position of `name` in [`class_names`](Self::class_names).
    fn class_index(&self, name: &str) -> Option<usize> {
        self.class_names().iter().position(|c| c == name)
    }
}

/// Metadata for the Waymo Open Dataset detection task.
///
/// Every field has a Waymo default, so a JSON config only needs the
/// values it changes:
///
/// ```
/// use waymo_ap_eval::metadata::{EvalMetadata, WaymoMetadata};
///
/// let metadata = WaymoMetadata::from_json_str(r#"{"num_pr_points": 11}"#).unwrap();
/// assert_eq!(metadata.number_of_precision_recall_points(), 11);
/// assert_eq!(metadata.class_names()[1], "Vehicle");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaymoMetadata {
    pub class_names: Vec<String>,
    pub iou_thresholds: BTreeMap<String, f64>,
    pub num_pr_points: usize,
    pub eval_class_indices: Vec<usize>,
}

impl Default for WaymoMetadata {
    fn default() -> Self {
        let class_names = ["Background", "Vehicle", "Pedestrian", "Sign", "Cyclist"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let iou_thresholds = [
            ("Vehicle", 0.7),
            ("Pedestrian", 0.5),
            ("Sign", 0.5),
            ("Cyclist", 0.5),
        ]
        .iter()
        .map(|&(name, iou)| (name.to_string(), iou))
        .collect();

        Self {
            class_names,
            iou_thresholds,
            num_pr_points: 21,
            // Signs are labeled but not part of the detection benchmark.
            eval_class_indices: vec![1, 2, 4],
        }
    }
}

impl WaymoMetadata {
    /// Create metadata with the Waymo defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse metadata from a JSON string. Missing fields take Waymo defaults.
    pub fn from_json_str(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load metadata from a JSON file. Missing fields take Waymo defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl EvalMetadata for WaymoMetadata {
    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn iou_thresholds(&self) -> &BTreeMap<String, f64> {
        &self.iou_thresholds
    }

    fn number_of_precision_recall_points(&self) -> usize {
        self.num_pr_points
    }

    fn eval_class_indices(&self) -> &[usize] {
        &self.eval_class_indices
    }
}
