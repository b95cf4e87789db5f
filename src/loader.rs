//! Box loading: the [`BoxLoader`] seam and an in-memory, JSON-backed store.

use crate::error::{Result, WaymoEvalError};
use crate::types::{BoundingBox3D, GroundTruthBoxes, PredictionBoxes, Speed};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Bin filter for ground truth boxes. `None` leaves a dimension unfiltered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinFilter {
    pub distance: Option<usize>,
    pub num_points: Option<usize>,
    pub rotation: Option<usize>,
}

impl BinFilter {
    /// The matching filter for predictions.
    ///
    /// Only ground truth boxes carry laser points, so the point-count bin
    /// is dropped.
    pub fn for_predictions(&self) -> PredictionFilter {
        PredictionFilter {
            distance: self.distance,
            rotation: self.rotation,
        }
    }
}

/// Bin filter for predicted boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionFilter {
    pub distance: Option<usize>,
    pub rotation: Option<usize>,
}

/// Source of ground truth and predicted boxes, per class and bin.
///
/// Implementations return `Ok(None)` when no box matches.
pub trait BoxLoader {
    fn load_groundtruth(&self, class_id: usize, filter: &BinFilter)
        -> Result<Option<GroundTruthBoxes>>;

    fn load_predictions(
        &self,
        class_id: usize,
        filter: &PredictionFilter,
    ) -> Result<Option<PredictionBoxes>>;
}

/// A ground truth box with its pre-computed bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    pub imgid: i64,
    pub class_id: usize,
    pub bbox: BoundingBox3D,
    #[serde(default)]
    pub speed: Speed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_bin: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_points_bin: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_bin: Option<usize>,
}

/// A predicted box with its score and pre-computed bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub imgid: i64,
    pub class_id: usize,
    pub bbox: BoundingBox3D,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_bin: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_bin: Option<usize>,
}

fn bin_matches(wanted: Option<usize>, actual: Option<usize>) -> bool {
    wanted.map_or(true, |bin| actual == Some(bin))
}

/// In-memory box store.
///
/// # Example
///
/// ```
/// use waymo_ap_eval::loader::{BinFilter, BoxLoader, BoxStore};
///
/// let json = r#"{
///     "groundtruth": [
///         {"imgid": 7, "class_id": 1,
///          "bbox": {"center_x": 10.0, "center_y": 2.0, "center_z": 0.5,
///                   "length": 4.5, "width": 2.0, "height": 1.6, "heading": 0.0},
///          "speed": {"x": 3.0, "y": 0.0}}
///     ],
///     "predictions": []
/// }"#;
/// let store = BoxStore::from_json_str(json).unwrap();
/// let gt = store.load_groundtruth(1, &BinFilter::default()).unwrap().unwrap();
/// assert_eq!(gt.imgid, vec![7]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxStore {
    #[serde(default)]
    pub groundtruth: Vec<GroundTruthRecord>,
    #[serde(default)]
    pub predictions: Vec<PredictionRecord>,
}

impl BoxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ground truth box after validating it.
    pub fn add_groundtruth(&mut self, record: GroundTruthRecord) -> Result<()> {
        validate_groundtruth(&record)?;
        self.groundtruth.push(record);
        Ok(())
    }

    /// Add a predicted box after validating it.
    pub fn add_prediction(&mut self, record: PredictionRecord) -> Result<()> {
        validate_prediction(&record)?;
        self.predictions.push(record);
        Ok(())
    }

    /// Parse a store from a JSON string.
    pub fn from_json_str(json_str: &str) -> Result<Self> {
        let store: BoxStore = serde_json::from_str(json_str)?;
        store.validate()?;
        Ok(store)
    }

    /// Load a store from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let store: BoxStore = serde_json::from_reader(reader)?;
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> Result<()> {
        self.groundtruth.iter().try_for_each(validate_groundtruth)?;
        self.predictions.iter().try_for_each(validate_prediction)
    }
}

fn validate_groundtruth(record: &GroundTruthRecord) -> Result<()> {
    if !record.bbox.is_valid() {
        return Err(WaymoEvalError::InvalidBox(format!(
            "Groundtruth box in image {} has non-finite values or negative extents",
            record.imgid
        )));
    }
    Ok(())
}

fn validate_prediction(record: &PredictionRecord) -> Result<()> {
    if !record.bbox.is_valid() {
        return Err(WaymoEvalError::InvalidBox(format!(
            "Prediction box in image {} has non-finite values or negative extents",
            record.imgid
        )));
    }
    if !(0.0..=1.0).contains(&record.score) {
        return Err(WaymoEvalError::InvalidBox(format!(
            "Prediction in image {} has score {} outside [0, 1]",
            record.imgid, record.score
        )));
    }
    Ok(())
}

impl BoxLoader for BoxStore {
    fn load_groundtruth(
        &self,
        class_id: usize,
        filter: &BinFilter,
    ) -> Result<Option<GroundTruthBoxes>> {
        let mut boxes = GroundTruthBoxes::default();
        for record in self.groundtruth.iter().filter(|r| {
            r.class_id == class_id
                && bin_matches(filter.distance, r.distance_bin)
                && bin_matches(filter.num_points, r.num_points_bin)
                && bin_matches(filter.rotation, r.rotation_bin)
        }) {
            boxes.imgid.push(record.imgid);
            boxes.bbox.push(record.bbox);
            boxes.speed.push(record.speed);
        }

        Ok((!boxes.is_empty()).then_some(boxes))
    }

    fn load_predictions(
        &self,
        class_id: usize,
        filter: &PredictionFilter,
    ) -> Result<Option<PredictionBoxes>> {
        let mut boxes = PredictionBoxes::default();
        for record in self.predictions.iter().filter(|r| {
            r.class_id == class_id
                && bin_matches(filter.distance, r.distance_bin)
                && bin_matches(filter.rotation, r.rotation_bin)
        }) {
            boxes.imgid.push(record.imgid);
            boxes.bbox.push(record.bbox);
            boxes.score.push(record.score);
        }

        Ok((!boxes.is_empty()).then_some(boxes))
    }
}
