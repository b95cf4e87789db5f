//! Accumulation of per-class results into per-breakdown tables.

use crate::breakdown::Breakdown;
use crate::error::{Result, WaymoEvalError};
use crate::evaluator::ClassMetrics;
use crate::types::PrCurve;
use std::collections::HashMap;
use tracing::info;

/// Per-breakdown metric tables, each indexed by eval-class position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakdownTables {
    breakdowns: Vec<Breakdown>,
    average_precisions: HashMap<Breakdown, Vec<f64>>,
    average_precision_headings: HashMap<Breakdown, Vec<f64>>,
    precision_recall: HashMap<Breakdown, Vec<PrCurve>>,
    precision_recall_headings: HashMap<Breakdown, Vec<PrCurve>>,
}

impl BreakdownTables {
    /// Gather the per-class results, in eval-class order, for every breakdown.
    pub fn from_class_metrics(breakdowns: &[Breakdown], results: &[ClassMetrics]) -> Result<Self> {
        let mut tables = BreakdownTables {
            breakdowns: breakdowns.to_vec(),
            ..BreakdownTables::default()
        };

        for breakdown in breakdowns {
            let mut ap = Vec::with_capacity(results.len());
            let mut aph = Vec::with_capacity(results.len());
            let mut pr = Vec::with_capacity(results.len());
            let mut prh = Vec::with_capacity(results.len());

            for result in results {
                let metrics = result.get(breakdown).ok_or_else(|| {
                    WaymoEvalError::ShapeMismatch(format!(
                        "class {} has no result for breakdown {}",
                        result.class_id, breakdown
                    ))
                })?;
                ap.push(metrics.ap);
                aph.push(metrics.ap_ha_weighted);
                pr.push(metrics.pr.clone());
                prh.push(metrics.pr_ha_weighted.clone());
            }

            tables.average_precisions.insert(*breakdown, ap);
            tables.average_precision_headings.insert(*breakdown, aph);
            tables.precision_recall.insert(*breakdown, pr);
            tables.precision_recall_headings.insert(*breakdown, prh);
        }

        Ok(tables)
    }

    /// Breakdowns in config order; the first is the overall breakdown.
    pub fn breakdowns(&self) -> &[Breakdown] {
        &self.breakdowns
    }

    /// Look up a breakdown by its display name.
    pub fn breakdown_by_name(&self, name: &str) -> Option<Breakdown> {
        self.breakdowns.iter().copied().find(|b| b.name() == name)
    }

    pub fn average_precisions(&self) -> &HashMap<Breakdown, Vec<f64>> {
        &self.average_precisions
    }

    pub fn average_precision_headings(&self) -> &HashMap<Breakdown, Vec<f64>> {
        &self.average_precision_headings
    }

    pub fn precision_recall(&self) -> &HashMap<Breakdown, Vec<PrCurve>> {
        &self.precision_recall
    }

    pub fn precision_recall_headings(&self) -> &HashMap<Breakdown, Vec<PrCurve>> {
        &self.precision_recall_headings
    }

    /// AP of every eval class for one breakdown.
    pub fn ap(&self, breakdown: &Breakdown) -> Option<&[f64]> {
        self.average_precisions.get(breakdown).map(Vec::as_slice)
    }

    /// Heading-weighted AP of every eval class for one breakdown.
    pub fn aph(&self, breakdown: &Breakdown) -> Option<&[f64]> {
        self.average_precision_headings.get(breakdown).map(Vec::as_slice)
    }

    /// PR curve of every eval class for one breakdown.
    pub fn pr(&self, breakdown: &Breakdown) -> Option<&[PrCurve]> {
        self.precision_recall.get(breakdown).map(Vec::as_slice)
    }
}

/// Lifecycle of the aggregate tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EvaluationState {
    #[default]
    Unevaluated,
    Evaluating,
    Evaluated(BreakdownTables),
}

/// Collects per-class evaluation results once per metric lifetime.
#[derive(Debug, Clone)]
pub struct BreakdownAggregator {
    breakdowns: Vec<Breakdown>,
    state: EvaluationState,
}

impl BreakdownAggregator {
    pub fn new(breakdowns: Vec<Breakdown>) -> Self {
        Self {
            breakdowns,
            state: EvaluationState::Unevaluated,
        }
    }

    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self.state, EvaluationState::Evaluated(_))
    }

    /// Tables, once evaluation has completed.
    pub fn tables(&self) -> Option<&BreakdownTables> {
        match &self.state {
            EvaluationState::Evaluated(tables) => Some(tables),
            _ => None,
        }
    }

    /// Run `evaluate_all_classes` and store its results, unless already done.
    ///
    /// A failed pass leaves the aggregator unevaluated so it can be retried.
    pub fn accumulate<F>(&mut self, evaluate_all_classes: F) -> Result<()>
    where
        F: FnOnce() -> Result<Vec<ClassMetrics>>,
    {
        match self.state {
            EvaluationState::Evaluated(_) => return Ok(()),
            EvaluationState::Evaluating => return Err(WaymoEvalError::EvaluationInProgress),
            EvaluationState::Unevaluated => {}
        }

        self.state = EvaluationState::Evaluating;
        info!("Calculating waymo AP breakdowns: start");

        let tables = evaluate_all_classes()
            .and_then(|results| BreakdownTables::from_class_metrics(&self.breakdowns, &results));
        match tables {
            Ok(tables) => {
                self.state = EvaluationState::Evaluated(tables);
                info!("Calculating waymo AP breakdowns: finished");
                Ok(())
            }
            Err(e) => {
                self.state = EvaluationState::Unevaluated;
                Err(e)
            }
        }
    }
}
