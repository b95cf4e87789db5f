//! Selection of ground truth and predictions for one class.

use crate::breakdown::DifficultyLevel;
use crate::config::MetricConfig;
use crate::error::{Result, WaymoEvalError};
use crate::loader::{BinFilter, BoxLoader};
use crate::metadata::EvalMetadata;
use crate::types::DetectionSet;
use tracing::debug;

/// Pulls the boxes for one class out of a [`BoxLoader`].
pub struct DataSelector<'a, M: ?Sized, L: ?Sized> {
    metadata: &'a M,
    loader: &'a L,
    config: &'a MetricConfig,
}

impl<'a, M, L> DataSelector<'a, M, L>
where
    M: EvalMetadata + ?Sized,
    L: BoxLoader + ?Sized,
{
    pub fn new(metadata: &'a M, loader: &'a L, config: &'a MetricConfig) -> Self {
        Self {
            metadata,
            loader,
            config,
        }
    }

    /// Select ground truth and predictions for `class_id`.
    ///
    /// Ground truth is filtered by every bin in `filter`; predictions by
    /// distance and rotation only, since predictions have no point count.
    /// `difficulty` does not filter boxes: difficulty levels are applied by
    /// the matcher through the config's per-breakdown difficulties.
    ///
    /// Returns `Ok(None)` when either side has no boxes.
    ///
    /// # Errors
    ///
    /// Fails if `class_id` is the background class or out of range, or if
    /// the loader returns inconsistent arrays.
    pub fn select(
        &self,
        class_id: usize,
        difficulty: Option<DifficultyLevel>,
        filter: &BinFilter,
    ) -> Result<Option<DetectionSet>> {
        let num_classes = self.metadata.num_classes();
        if class_id == 0 || class_id >= num_classes {
            return Err(WaymoEvalError::InvalidClassId {
                class_id,
                num_classes,
            });
        }

        if let Some(level) = difficulty {
            debug!(
                class_id,
                level = level.as_str(),
                "difficulty is applied by the matcher, not the selector"
            );
        }

        let groundtruth = self.loader.load_groundtruth(class_id, filter)?;
        let predictions = self
            .loader
            .load_predictions(class_id, &filter.for_predictions())?;

        let (groundtruth, predictions) = match (groundtruth, predictions) {
            (Some(g), Some(p)) => (g, p),
            (g, p) => {
                debug!(
                    class_id,
                    has_groundtruth = g.is_some(),
                    has_predictions = p.is_some(),
                    "no data for class selection"
                );
                return Ok(None);
            }
        };

        groundtruth.validate()?;
        predictions.validate()?;

        let iou_threshold = self.config.iou_threshold(class_id).ok_or_else(|| {
            WaymoEvalError::InvalidConfig(format!(
                "No IoU threshold configured for class {}",
                class_id
            ))
        })?;

        Ok(Some(DetectionSet {
            iou_threshold,
            groundtruth,
            predictions,
        }))
    }
}
