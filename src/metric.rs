//! The Waymo AP metric: configuration, lazy evaluation and summaries.

use crate::aggregator::{BreakdownAggregator, BreakdownTables};
use crate::breakdown::DifficultyLevel;
use crate::config::{build_metric_config, MetricConfig, WaymoApParams};
use crate::error::{Result, WaymoEvalError};
use crate::evaluator::{ClassMetrics, MetricEvaluator};
use crate::loader::{BinFilter, BoxLoader};
use crate::matcher::DetectionMatcher;
use crate::metadata::EvalMetadata;
use crate::selector::DataSelector;
use crate::summary::{render_summary, weighted_mean_ap, SummaryReport};
use crate::types::DetectionSet;
use tracing::debug;

/// AP and APH metrics over the Waymo breakdowns.
///
/// Evaluation runs lazily, at most once, the first time [`value`](Self::value),
/// [`summary`](Self::summary) or [`evaluate_if_necessary`](Self::evaluate_if_necessary)
/// is called. Boxes added to the loader after that are not picked up.
pub struct WaymoApMetric<M, L, X> {
    metadata: M,
    loader: L,
    matcher: X,
    params: WaymoApParams,
    config: MetricConfig,
    aggregator: BreakdownAggregator,
}

impl<M, L, X> WaymoApMetric<M, L, X>
where
    M: EvalMetadata,
    L: BoxLoader,
    X: DetectionMatcher,
{
    /// Build the metric and its matcher config.
    ///
    /// # Errors
    ///
    /// Fails on any invalid configuration: fewer than two PR points, an IoU
    /// override for an unknown class, an unknown breakdown name, or eval
    /// classes that are empty, background or out of range.
    pub fn new(metadata: M, loader: L, matcher: X, params: WaymoApParams) -> Result<Self> {
        let config = build_metric_config(&metadata, params.box_type, &params.breakdown_metrics)?;

        let eval_classes = metadata.eval_class_indices();
        if eval_classes.is_empty() {
            return Err(WaymoEvalError::InvalidConfig(
                "At least one eval class is required".to_string(),
            ));
        }
        let num_classes = metadata.num_classes();
        if let Some(&class_id) = eval_classes.iter().find(|&&j| j == 0 || j >= num_classes) {
            return Err(WaymoEvalError::InvalidClassId {
                class_id,
                num_classes,
            });
        }

        let aggregator = BreakdownAggregator::new(config.breakdowns().to_vec());
        Ok(Self {
            metadata,
            loader,
            matcher,
            params,
            config,
            aggregator,
        })
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn params(&self) -> &WaymoApParams {
        &self.params
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    pub fn matcher(&self) -> &X {
        &self.matcher
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Mutable access to the box loader, for adding boxes before evaluation.
    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Select the ground truth and predictions of one class.
    ///
    /// See [`DataSelector::select`].
    pub fn select(
        &self,
        class_id: usize,
        difficulty: Option<DifficultyLevel>,
        filter: &BinFilter,
    ) -> Result<Option<DetectionSet>> {
        DataSelector::new(&self.metadata, &self.loader, &self.config).select(
            class_id,
            difficulty,
            filter,
        )
    }

    /// Run the matcher for one class, or build placeholders when `data` is `None`.
    pub fn evaluate_class(
        &self,
        data: Option<&DetectionSet>,
        class_id: usize,
    ) -> Result<ClassMetrics> {
        MetricEvaluator::new(&self.matcher, &self.config)?.evaluate(data, class_id)
    }

    /// Whether the evaluation pass has completed.
    pub fn is_evaluated(&self) -> bool {
        self.aggregator.is_evaluated()
    }

    /// Evaluate every eval class, unless that already happened.
    pub fn evaluate_if_necessary(&mut self) -> Result<()> {
        let metadata = &self.metadata;
        let loader = &self.loader;
        let matcher = &self.matcher;
        let config = &self.config;

        self.aggregator.accumulate(|| {
            let selector = DataSelector::new(metadata, loader, config);
            let evaluator = MetricEvaluator::new(matcher, config)?;
            metadata
                .eval_class_indices()
                .iter()
                .map(|&class_id| {
                    let data = selector.select(class_id, None, &BinFilter::default())?;
                    debug!(class_id, has_data = data.is_some(), "evaluating class");
                    evaluator.evaluate(data.as_ref(), class_id)
                })
                .collect()
        })
    }

    /// Evaluated per-breakdown tables, triggering evaluation if needed.
    pub fn tables(&mut self) -> Result<&BreakdownTables> {
        self.evaluate_if_necessary()?;
        self.aggregator
            .tables()
            .ok_or(WaymoEvalError::EvaluationInProgress)
    }

    /// Weighted mAP: mean overall AP over the eval classes, NaN as zero.
    pub fn value(&mut self) -> Result<f64> {
        let num_eval_classes = self.metadata.eval_class_indices().len();
        let tables = self.tables()?;
        Ok(weighted_mean_ap(tables, num_eval_classes))
    }

    /// Render scalars and PR curves under `name`.
    pub fn summary(&mut self, name: &str) -> Result<SummaryReport> {
        self.evaluate_if_necessary()?;
        let tables = self
            .aggregator
            .tables()
            .ok_or(WaymoEvalError::EvaluationInProgress)?;
        render_summary(name, &self.metadata, tables)
    }
}
