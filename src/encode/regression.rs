//! Scatter-based charts: plain scatter plots, meta-regression and standard
//! regression plots, and the normal quantile plot with its prediction
//! envelope.

use super::{min_max, positive_variance, push_linked};
use crate::caption::Caption;
use crate::chart::{ChartDocument, VisualElement};
use crate::config::ChartConfig;
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::StudyEffect;
use crate::stats;
use crate::style::{LineDash, LineStyle, SILVER, ScatterStyle};

/// `y = intercept + slope * x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Ordinary least squares; `None` when the x values do not vary.
    pub fn least_squares(points: &[(f64, f64)]) -> Option<Self> {
        let n = points.len() as f64;
        let mx = stats::mean(&points.iter().map(|p| p.0).collect::<Vec<_>>())?;
        let my = stats::mean(&points.iter().map(|p| p.1).collect::<Vec<_>>())?;
        let sxx: f64 = points.iter().map(|(x, _)| (x - mx).powi(2)).sum();
        if !(sxx > 0.0) || n < 2.0 {
            return None;
        }
        let sxy: f64 = points.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: my - slope * mx,
        })
    }
}

fn regression_style() -> LineStyle {
    LineStyle {
        color: SILVER,
        width: 1.5,
        dash: LineDash::Solid,
    }
}

pub fn scatter_plot(
    points: &[(f64, f64)],
    x_label: &str,
    y_label: &str,
    loc: &dyn Localizer,
) -> ChartDocument {
    let mut doc = ChartDocument::new(x_label, y_label);
    doc.push(VisualElement::scatter(loc.translate("Point Data"), points.to_vec(), ScatterStyle::default()).z(10));
    doc.caption = Caption::Scatter;
    doc
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct MetaRegressionOptions {
    pub effect_label: String,
    pub independent_label: String,
    /// Model wording for the caption ("fixed effects", "random effects").
    pub model: String,
    /// Reference keys of the fitting method.
    pub citations: Vec<String>,
}

/// Effect sizes against an independent variable with the fitted line drawn
/// over the observed x range. Points are `(independent, effect)`.
pub fn meta_regression_plot(
    points: &[(f64, f64)],
    fit: LinearFit,
    opts: &MetaRegressionOptions,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    let (x0, x1) = min_max(points.iter().map(|p| p.0))
        .ok_or_else(|| ChartError::InvalidInput("meta-regression plot needs data".into()))?;
    let mut doc = ChartDocument::new(opts.independent_label.clone(), opts.effect_label.clone());
    doc.push(VisualElement::scatter(loc.translate("Point Data"), points.to_vec(), ScatterStyle::default()).z(10));
    doc.push(
        VisualElement::line(
            loc.translate("Regression Line"),
            vec![(x0, fit.at(x0)), (x1, fit.at(x1))],
            regression_style(),
        )
        .z(8),
    );
    doc.caption = Caption::MetaRegression {
        effect_label: opts.effect_label.clone(),
        independent_label: opts.independent_label.clone(),
        model: opts.model.clone(),
        citations: opts.citations.clone(),
    };
    Ok(doc)
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct StandardRegressionOptions {
    pub x_label: String,
    pub y_label: String,
    pub model: String,
    /// Height of a dotted reference line ("no effect"), if any.
    pub y_marker: Option<f64>,
}

/// Regression plot whose x range always includes zero.
pub fn standard_regression_plot(
    points: &[(f64, f64)],
    fit: LinearFit,
    opts: &StandardRegressionOptions,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    let (lo, hi) = min_max(points.iter().map(|p| p.0))
        .ok_or_else(|| ChartError::InvalidInput("regression plot needs data".into()))?;
    let (x0, x1) = (lo.min(0.0), hi.max(0.0));
    let mut doc = ChartDocument::new(opts.x_label.clone(), opts.y_label.clone());
    doc.rescale_x = Some((x0, x1));
    if let Some(m) = opts.y_marker {
        doc.push(
            VisualElement::line(
                loc.translate("Line of No Effect"),
                vec![(x0, m), (x1, m)],
                LineStyle {
                    color: SILVER,
                    width: 1.0,
                    dash: LineDash::Dotted,
                },
            )
            .z(1),
        );
    }
    doc.push(VisualElement::scatter(loc.translate("Point Data"), points.to_vec(), ScatterStyle::default()).z(10));
    doc.push(
        VisualElement::line(
            loc.translate("Regression Line"),
            vec![(x0, fit.at(x0)), (x1, fit.at(x1))],
            regression_style(),
        )
        .z(8),
    );
    doc.caption = Caption::StandardRegression {
        model: opts.model.clone(),
    };
    Ok(doc)
}

/// Envelope sample count along the normal quantile axis.
pub const ENVELOPE_POINTS: usize = 100;

/// Standardized effects (effect / standard error), sorted and paired with
/// the expected Normal quantile of their rank: `(quantile, z)`.
pub fn normal_quantile_points(studies: &[StudyEffect]) -> Result<Vec<(f64, f64)>> {
    let n = studies.len() as f64;
    let mut z = studies
        .iter()
        .enumerate()
        .map(|(i, s)| Ok(s.effect / positive_variance(&format!("study {i}"), s.variance)?.sqrt()))
        .collect::<Result<Vec<f64>>>()?;
    z.sort_by(f64::total_cmp);
    Ok(z.into_iter()
        .enumerate()
        .map(|(i, y)| (stats::norm_ppf((i as f64 + 0.5) / n), y))
        .collect())
}

/// Normal quantile plot of `points` from [`normal_quantile_points`] with
/// the supplied fit and its prediction envelope. Needs at least three points.
pub fn normal_quantile_plot(
    points: &[(f64, f64)],
    fit: LinearFit,
    cfg: &ChartConfig,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    let n = points.len();
    if n < 3 {
        return Err(ChartError::InvalidInput(format!(
            "normal quantile plot needs at least 3 studies, got {n}"
        )));
    }
    if !(fit.slope.is_finite() && fit.intercept.is_finite()) {
        return Err(ChartError::InvalidInput(format!(
            "normal quantile fit must be finite, got slope {} and intercept {}",
            fit.slope, fit.intercept
        )));
    }

    let nf = n as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / nf;
    let ss_x: f64 = points.iter().map(|p| (p.0 - x_mean).powi(2)).sum();
    let mse = points.iter().map(|(x, y)| (y - fit.at(*x)).powi(2)).sum::<f64>() / (nf - 2.0);
    let t = stats::t_ppf(1.0 - cfg.alpha / 2.0, nf - 2.0);

    let envelope: Vec<(f64, f64, f64)> = (0..ENVELOPE_POINTS)
        .map(|i| {
            let x = stats::norm_ppf((i as f64 + 0.5) / ENVELOPE_POINTS as f64);
            let half = t * (mse * (1.0 + 1.0 / nf + (x - x_mean).powi(2) / ss_x)).sqrt();
            (x, fit.at(x) - half, fit.at(x) + half)
        })
        .collect();
    let (x_min, x_max) = min_max(points.iter().map(|p| p.0)).unwrap_or((-1.0, 1.0));
    let (y_lo, y_hi) = min_max(points.iter().map(|p| p.1)).unwrap_or((0.0, 0.0));
    let low = envelope.iter().map(|e| e.1).fold(y_lo, f64::min);
    let high = envelope.iter().map(|e| e.2).fold(y_hi, f64::max);

    let mut doc = ChartDocument::new(
        loc.translate("Normal Quantile"),
        loc.translate("Standardized Effect Size"),
    );
    let dashed = LineStyle {
        color: SILVER,
        width: 1.0,
        dash: LineDash::Dashed,
    };
    let limits = loc.translate("Prediction Limits");
    let (prediction, _) = push_linked(
        &mut doc,
        VisualElement::line(limits.clone(), envelope.iter().map(|e| (e.0, e.1)).collect(), dashed.clone()).z(3),
        VisualElement::line(limits, envelope.iter().map(|e| (e.0, e.2)).collect(), dashed).z(3),
    )?;
    let dotted = LineStyle {
        dash: LineDash::Dotted,
        ..LineStyle::default()
    };
    let axes = loc.translate("Axes Means");
    push_linked(
        &mut doc,
        VisualElement::line(axes.clone(), vec![(0.0, low), (0.0, high)], dotted.clone()).z(2),
        VisualElement::line(axes, vec![(x_min, y_mean), (x_max, y_mean)], dotted).z(2),
    )?;
    doc.push(VisualElement::scatter(loc.translate("Point Data"), points.to_vec(), ScatterStyle::default()).z(10));
    let regression = doc.push(
        VisualElement::line(
            loc.translate("Regression Line"),
            vec![(x_min, fit.at(x_min)), (x_max, fit.at(x_max))],
            regression_style(),
        )
        .z(4),
    );
    doc.caption = Caption::NormalQuantile {
        regression,
        prediction,
    };
    Ok(doc)
}
