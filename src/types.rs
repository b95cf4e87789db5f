//! Core data types for Waymo boxes, detection sets and PR curves.

use crate::error::{Result, WaymoEvalError};
use serde::{Deserialize, Serialize};

/// A 7-DOF box in the Waymo label format.
///
/// Coordinates are the box center, its extent along the heading
/// (`length`), across it (`width`), vertically (`height`), and the yaw
/// angle in radians. 2D boxes leave `center_z` and `height` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3D {
    pub center_x: f64,
    pub center_y: f64,
    pub center_z: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub heading: f64,
}

impl BoundingBox3D {
    /// Create a new 3D bounding box.
    pub fn new(
        center_x: f64,
        center_y: f64,
        center_z: f64,
        length: f64,
        width: f64,
        height: f64,
        heading: f64,
    ) -> Self {
        Self {
            center_x,
            center_y,
            center_z,
            length,
            width,
            height,
            heading,
        }
    }

    /// Create a 2D box (no vertical extent).
    pub fn new_2d(center_x: f64, center_y: f64, length: f64, width: f64, heading: f64) -> Self {
        Self::new(center_x, center_y, 0.0, length, width, 0.0, heading)
    }

    /// Check the box is finite with non-negative extents.
    pub fn is_valid(&self) -> bool {
        let values = [
            self.center_x,
            self.center_y,
            self.center_z,
            self.length,
            self.width,
            self.height,
            self.heading,
        ];
        values.iter().all(|v| v.is_finite())
            && self.length >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Ground truth velocity in the vehicle frame (m/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Speed {
    pub x: f64,
    pub y: f64,
}

impl Speed {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Kind of box the matcher compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoxType {
    #[serde(rename = "2d")]
    TwoD,
    #[default]
    #[serde(rename = "3d")]
    ThreeD,
}

/// A precision-recall curve: one `[precision, recall]` row per score cutoff.
pub type PrCurve = Vec<[f64; 2]>;

/// A `[P, 2]` curve of zeros, used when a class has no data.
pub fn zero_curve(num_points: usize) -> PrCurve {
    vec![[0.0, 0.0]; num_points]
}

/// Ground truth boxes for one selection, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthBoxes {
    pub imgid: Vec<i64>,
    pub bbox: Vec<BoundingBox3D>,
    pub speed: Vec<Speed>,
}

impl GroundTruthBoxes {
    pub fn len(&self) -> usize {
        self.imgid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imgid.is_empty()
    }

    /// Check that all parallel arrays have the same length.
    pub fn validate(&self) -> Result<()> {
        if self.bbox.len() != self.imgid.len() || self.speed.len() != self.imgid.len() {
            return Err(WaymoEvalError::ShapeMismatch(format!(
                "groundtruth arrays differ in length: imgid={}, bbox={}, speed={}",
                self.imgid.len(),
                self.bbox.len(),
                self.speed.len()
            )));
        }
        Ok(())
    }
}

/// Predicted boxes for one selection, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionBoxes {
    pub imgid: Vec<i64>,
    pub bbox: Vec<BoundingBox3D>,
    pub score: Vec<f64>,
}

impl PredictionBoxes {
    pub fn len(&self) -> usize {
        self.imgid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imgid.is_empty()
    }

    /// Check that all parallel arrays have the same length.
    pub fn validate(&self) -> Result<()> {
        if self.bbox.len() != self.imgid.len() || self.score.len() != self.imgid.len() {
            return Err(WaymoEvalError::ShapeMismatch(format!(
                "prediction arrays differ in length: imgid={}, bbox={}, score={}",
                self.imgid.len(),
                self.bbox.len(),
                self.score.len()
            )));
        }
        Ok(())
    }
}

/// Ground truth and predictions selected for one class and filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    /// IoU threshold configured for the selected class.
    pub iou_threshold: f64,
    pub groundtruth: GroundTruthBoxes,
    pub predictions: PredictionBoxes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_validity() {
        let bbox = BoundingBox3D::new(1.0, 2.0, 0.5, 4.0, 2.0, 1.5, 0.1);
        assert!(bbox.is_valid());

        let bad = BoundingBox3D::new(f64::NAN, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0);
        assert!(!bad.is_valid());

        let negative = BoundingBox3D::new(0.0, 0.0, 0.0, -1.0, 1.0, 1.0, 0.0);
        assert!(!negative.is_valid());
    }

    #[test]
    fn test_box_2d() {
        let bbox = BoundingBox3D::new_2d(3.0, 4.0, 2.0, 1.0, 0.0);
        assert_eq!(bbox.center_z, 0.0);
        assert_eq!(bbox.height, 0.0);
        assert!(bbox.is_valid());
    }

    #[test]
    fn test_box_type_serde() {
        let parsed: BoxType = serde_json::from_str("\"2d\"").unwrap();
        assert_eq!(parsed, BoxType::TwoD);
        assert_eq!(serde_json::to_string(&BoxType::ThreeD).unwrap(), "\"3d\"");
    }

    #[test]
    fn test_parallel_array_validation() {
        let gt = GroundTruthBoxes {
            imgid: vec![1, 2],
            bbox: vec![BoundingBox3D::new_2d(0.0, 0.0, 1.0, 1.0, 0.0)],
            speed: vec![Speed::default(); 2],
        };
        assert!(matches!(gt.validate(), Err(WaymoEvalError::ShapeMismatch(_))));

        let pd = PredictionBoxes {
            imgid: vec![1],
            bbox: vec![BoundingBox3D::new_2d(0.0, 0.0, 1.0, 1.0, 0.0)],
            score: vec![0.5],
        };
        assert!(pd.validate().is_ok());
    }

    #[test]
    fn test_zero_curve() {
        let curve = zero_curve(3);
        assert_eq!(curve, vec![[0.0, 0.0]; 3]);
    }
}
