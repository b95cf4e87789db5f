//! Summary rendering: weighted mAP, per-class scalars and PR curve plots.

use crate::aggregator::BreakdownTables;
use crate::breakdown::Breakdown;
use crate::error::{Result, WaymoEvalError};
use crate::metadata::EvalMetadata;
use serde::{Deserialize, Serialize};

/// A named scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSummary {
    pub tag: String,
    pub value: f64,
}

/// Axis of a curve plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub label: String,
    pub range: [f64; 2],
    pub ticks: Vec<f64>,
}

impl AxisConfig {
    /// A `[0, 1]` axis with a tick every 0.1.
    pub fn unit(label: &str) -> Self {
        Self {
            label: label.to_string(),
            range: [0.0, 1.0],
            ticks: (0..=10).map(|i| i as f64 / 10.0).collect(),
        }
    }
}

/// Rendering style of a curve plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotStyle {
    pub figsize: [f64; 2],
    pub marker: String,
    pub markersize: f64,
    pub linestyle: String,
    pub linewidth: f64,
    pub alpha: f64,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            figsize: [10.0, 8.0],
            marker: ".".to_string(),
            markersize: 14.0,
            linestyle: "-".to_string(),
            linewidth: 2.0,
            alpha: 0.5,
        }
    }
}

/// A precision-recall curve to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePlot {
    pub title: String,
    /// Recall values.
    pub xs: Vec<f64>,
    /// Precision values.
    pub ys: Vec<f64>,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub style: PlotStyle,
}

/// Scalars and plots produced for one metric, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub scalars: Vec<ScalarSummary>,
    pub curves: Vec<CurvePlot>,
}

impl SummaryReport {
    /// Value of the first scalar tagged `tag`.
    pub fn scalar(&self, tag: &str) -> Option<f64> {
        self.scalars.iter().find(|s| s.tag == tag).map(|s| s.value)
    }

    /// Render the report as JSON. NaN scalars become `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn push_scalar(&mut self, tag: String, value: f64) {
        self.scalars.push(ScalarSummary { tag, value });
    }
}

/// Mean overall-breakdown AP across `num_eval_classes` classes.
///
/// NaN entries (classes without data) count as zero, and the denominator
/// is always the number of eval classes, whatever their box counts.
pub fn weighted_mean_ap(tables: &BreakdownTables, num_eval_classes: usize) -> f64 {
    let overall = tables.ap(&Breakdown::overall()).unwrap_or(&[]);
    let values: Vec<f64> = (0..num_eval_classes)
        .map(|i| overall.get(i).copied().unwrap_or(f64::NAN))
        .collect();
    nan_to_zero_mean(&values)
}

/// Mean of `values` with NaN replaced by zero; 0.0 for an empty slice.
///
/// # Example
///
/// ```
/// use waymo_ap_eval::summary::nan_to_zero_mean;
///
/// let mean = nan_to_zero_mean(&[0.8, f64::NAN, 0.6]);
/// assert!((mean - 1.4 / 3.0).abs() < 1e-12);
/// ```
pub fn nan_to_zero_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sum: f64 = values
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { *v })
        .sum();
    sum / values.len() as f64
}

/// Breakdowns reported under `class_name`, with their positions.
///
/// The overall breakdown is always reported. Extra breakdowns only appear
/// under the class whose name they contain, ignoring case.
fn reported_breakdowns<'t>(
    class_name: &str,
    breakdowns: &'t [Breakdown],
) -> impl Iterator<Item = (usize, &'t Breakdown)> + 't {
    let class_name = class_name.to_lowercase();
    breakdowns
        .iter()
        .enumerate()
        .filter(move |(k, b)| *k == 0 || b.name().to_lowercase().contains(&class_name))
}

/// Render the summary of an evaluated metric.
///
/// Emits `<name>/weighted_mAP` first, then `AP_*`/`APH_*` scalars for every
/// eval class and reported breakdown, then one PR curve per class and
/// reported breakdown. The overall breakdown is tagged
/// `<name>/<class>/AP_default`; extra breakdowns are tagged
/// `<name>_extra/AP_<breakdown>`.
pub fn render_summary<M>(
    name: &str,
    metadata: &M,
    tables: &BreakdownTables,
) -> Result<SummaryReport>
where
    M: EvalMetadata + ?Sized,
{
    let eval_classes = metadata.eval_class_indices();
    let class_names = eval_classes
        .iter()
        .map(|&j| {
            metadata
                .class_names()
                .get(j)
                .map(String::as_str)
                .ok_or(WaymoEvalError::InvalidClassId {
                    class_id: j,
                    num_classes: metadata.num_classes(),
                })
        })
        .collect::<Result<Vec<&str>>>()?;

    let mut report = SummaryReport::default();
    report.push_scalar(
        format!("{}/weighted_mAP", name),
        weighted_mean_ap(tables, eval_classes.len()),
    );

    for (i, class_name) in class_names.iter().enumerate() {
        for (k, breakdown) in reported_breakdowns(class_name, tables.breakdowns()) {
            let (prefix, breakdown_str) = if k == 0 {
                (format!("{}/{}", name, class_name), "default".to_string())
            } else {
                (format!("{}_extra", name), breakdown.name())
            };

            let ap = value_at(tables.ap(breakdown), i);
            let aph = value_at(tables.aph(breakdown), i);
            report.push_scalar(format!("{}/AP_{}", prefix, breakdown_str), ap);
            report.push_scalar(format!("{}/APH_{}", prefix, breakdown_str), aph);
        }
    }

    for (i, class_name) in class_names.iter().enumerate() {
        for (k, breakdown) in reported_breakdowns(class_name, tables.breakdowns()) {
            let title = if k == 0 {
                format!("{}/{}/PR", name, class_name)
            } else {
                format!("{}/{}/{}/PR", name, class_name, breakdown.name())
            };
            let curve = tables
                .pr(breakdown)
                .and_then(|curves| curves.get(i))
                .ok_or_else(|| {
                    WaymoEvalError::ShapeMismatch(format!(
                        "no PR curve for eval class {} in breakdown {}",
                        i, breakdown
                    ))
                })?;

            report.curves.push(CurvePlot {
                title,
                xs: curve.iter().map(|row| row[1]).collect(),
                ys: curve.iter().map(|row| row[0]).collect(),
                x_axis: AxisConfig::unit("Recall"),
                y_axis: AxisConfig::unit("Precision"),
                style: PlotStyle::default(),
            });
        }
    }

    Ok(report)
}

fn value_at(values: Option<&[f64]>, i: usize) -> f64 {
    values.and_then(|v| v.get(i)).copied().unwrap_or(f64::NAN)
}
