//! Per-class evaluation: one matcher call per class, reshaped by breakdown.

use crate::breakdown::Breakdown;
use crate::config::MetricConfig;
use crate::error::{Result, WaymoEvalError};
use crate::matcher::{DetectionMatcher, MatcherInput};
use crate::types::{zero_curve, DetectionSet, PrCurve};

/// AP, APH and PR curves of one class in one breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownMetrics {
    pub ap: f64,
    pub ap_ha_weighted: f64,
    pub pr: PrCurve,
    pub pr_ha_weighted: PrCurve,
}

impl BreakdownMetrics {
    /// Metrics for a breakdown with nothing to evaluate: NaN scalars, zero curves.
    pub fn placeholder(num_pr_points: usize) -> Self {
        Self {
            ap: f64::NAN,
            ap_ha_weighted: f64::NAN,
            pr: zero_curve(num_pr_points),
            pr_ha_weighted: zero_curve(num_pr_points),
        }
    }
}

/// Metrics of one class across every configured breakdown.
///
/// Entries follow the config's breakdown order, so the first one is always
/// the overall breakdown. Placeholder and matcher-backed results have the
/// same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class_id: usize,
    breakdowns: Vec<(Breakdown, BreakdownMetrics)>,
}

impl ClassMetrics {
    /// Build class metrics from `(breakdown, metrics)` pairs in config order.
    ///
    /// # Errors
    ///
    /// Fails if `breakdowns` is empty; the overall breakdown is always present.
    pub fn new(class_id: usize, breakdowns: Vec<(Breakdown, BreakdownMetrics)>) -> Result<Self> {
        if breakdowns.is_empty() {
            return Err(WaymoEvalError::ShapeMismatch(format!(
                "class {} has no breakdown results",
                class_id
            )));
        }
        Ok(Self {
            class_id,
            breakdowns,
        })
    }

    /// Metrics for the overall breakdown.
    pub fn overall(&self) -> &BreakdownMetrics {
        &self.breakdowns[0].1
    }

    /// Metrics of one breakdown. A breakdown repeated in the config resolves
    /// to its last entry.
    pub fn get(&self, breakdown: &Breakdown) -> Option<&BreakdownMetrics> {
        self.breakdowns
            .iter()
            .rev()
            .find(|(b, _)| b == breakdown)
            .map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Breakdown, &BreakdownMetrics)> {
        self.breakdowns.iter().map(|(b, m)| (b, m))
    }

    pub fn len(&self) -> usize {
        self.breakdowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakdowns.is_empty()
    }

    /// Scalar metrics under their flat names: `ap`, `ap_ha_weighted`, then
    /// `ap_<breakdown>` and `ap_ha_weighted_<breakdown>` per breakdown.
    pub fn scalars(&self) -> Vec<(String, f64)> {
        let overall = self.overall();
        let mut scalars = vec![
            ("ap".to_string(), overall.ap),
            ("ap_ha_weighted".to_string(), overall.ap_ha_weighted),
        ];
        for (breakdown, metrics) in &self.breakdowns {
            let name = breakdown.name();
            scalars.push((format!("ap_{}", name), metrics.ap));
            scalars.push((format!("ap_ha_weighted_{}", name), metrics.ap_ha_weighted));
        }
        scalars
    }

    /// Curve metrics under their flat names, mirroring [`scalars`](Self::scalars)
    /// with `pr` in place of `ap`.
    pub fn curves(&self) -> Vec<(String, &PrCurve)> {
        let overall = self.overall();
        let mut curves = vec![
            ("pr".to_string(), &overall.pr),
            ("pr_ha_weighted".to_string(), &overall.pr_ha_weighted),
        ];
        for (breakdown, metrics) in &self.breakdowns {
            let name = breakdown.name();
            curves.push((format!("pr_{}", name), &metrics.pr));
            curves.push((format!("pr_ha_weighted_{}", name), &metrics.pr_ha_weighted));
        }
        curves
    }
}

/// Runs the detection matcher for one class at a time.
pub struct MetricEvaluator<'a, X: ?Sized> {
    matcher: &'a X,
    config: &'a MetricConfig,
    config_bytes: Vec<u8>,
}

impl<'a, X> MetricEvaluator<'a, X>
where
    X: DetectionMatcher + ?Sized,
{
    pub fn new(matcher: &'a X, config: &'a MetricConfig) -> Result<Self> {
        Ok(Self {
            matcher,
            config,
            config_bytes: config.to_bytes()?,
        })
    }

    /// Evaluate one class.
    ///
    /// `None` data yields placeholder metrics for every breakdown without
    /// calling the matcher. Otherwise the matcher runs exactly once and its
    /// per-breakdown arrays are attributed to breakdowns by position.
    pub fn evaluate(&self, data: Option<&DetectionSet>, class_id: usize) -> Result<ClassMetrics> {
        let breakdowns = self.config.breakdowns();
        let num_pr_points = self.config.num_pr_points();

        let Some(set) = data else {
            return Ok(ClassMetrics {
                class_id,
                breakdowns: breakdowns
                    .iter()
                    .map(|&b| (b, BreakdownMetrics::placeholder(num_pr_points)))
                    .collect(),
            });
        };

        let input = MatcherInput::for_class(set, class_id)?;
        let output = self.matcher.detection_metrics(&input, &self.config_bytes)?;
        output.validate(breakdowns.len(), num_pr_points)?;

        let entries = breakdowns
            .iter()
            .zip(output.average_precision)
            .zip(output.average_precision_ha_weighted)
            .zip(output.precision_recall)
            .zip(output.precision_recall_ha_weighted)
            .map(|((((&breakdown, ap), ap_ha_weighted), pr), pr_ha_weighted)| {
                (
                    breakdown,
                    BreakdownMetrics {
                        ap,
                        ap_ha_weighted,
                        pr,
                        pr_ha_weighted,
                    },
                )
            })
            .collect();

        Ok(ClassMetrics {
            class_id,
            breakdowns: entries,
        })
    }
}
