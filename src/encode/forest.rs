//! Forest plots: one row per study (or subgroup), confidence bars around
//! the estimates, optional medians, bootstrap limits and raindrops.

use super::{min_max, require_variance};
use crate::caption::{BootstrapRefs, Caption, ForestCaption};
use crate::chart::{
    BootstrapDistribution, ChartDocument, CiRow, DensityCloud, ElementKind, Raindrop,
    VisualElement,
};
use crate::config::{AggregateWeight, ChartConfig, CiDistribution};
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::{AnalysisKind, ForestRow, ForestStyle};
use crate::style::{
    ACCENT_GREEN, ACCENT_ORANGE, ACCENT_RED, CiStyle, Fill, LineDash, LineStyle,
    MarkerShape, RED, SILVER, ScatterStyle, Sizing, WHITE, WeightScale,
};
use crate::text::{fill_template, format_percent};
use log::debug;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ForestOptions {
    pub analysis: AnalysisKind,
    pub style: ForestStyle,
    /// Axis label and caption wording for the effect size ("ln Response Ratio").
    pub effect_label: String,
    /// Iterations reported in the caption; defaults to the longest replicate array.
    pub bootstrap_iterations: Option<u64>,
}

/// Scaled sizing over `weights`, or the fixed midpoint when every weight is equal.
fn scaled_or_fixed(min: f64, max: f64, weights: &[f64]) -> Result<Sizing> {
    match WeightScale::from_weights(min, max, weights.to_vec()) {
        Ok(scale) => Ok(Sizing::Scaled(scale)),
        Err(ChartError::DegenerateWeights(w)) => {
            debug!("all forest weights equal {w}; using fixed size {}", (min + max) / 2.0);
            Ok(Sizing::Fixed((min + max) / 2.0))
        }
        Err(e) => Err(e),
    }
}

/// Row weights: inverse variance, with the aggregate row of a basic
/// analysis replaced according to `policy`.
pub fn row_weights(
    rows: &[ForestRow],
    analysis: &AnalysisKind,
    policy: AggregateWeight,
) -> Result<Vec<f64>> {
    let mut weights = rows
        .iter()
        .map(|r| require_variance(r).map(|v| 1.0 / v))
        .collect::<Result<Vec<f64>>>()?;
    if analysis.has_aggregate_row() && weights.len() > 1 {
        let studies = &weights[1..];
        weights[0] = match policy {
            AggregateWeight::StudyAverage => studies.iter().sum::<f64>() / studies.len() as f64,
            AggregateWeight::StudyMaximum => studies.iter().copied().fold(f64::MIN, f64::max),
            AggregateWeight::Own => weights[0],
        };
    }
    Ok(weights)
}

/// Assemble a forest plot.
///
/// Every row needs a variance and both confidence limits; a missing one
/// fails the whole chart with [`ChartError::MissingField`].
pub fn forest_plot(
    rows: &[ForestRow],
    opts: &ForestOptions,
    cfg: &ChartConfig,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    if rows.is_empty() {
        return Err(ChartError::InvalidInput("forest plot needs at least one row".into()));
    }
    let step = cfg.forest_step;
    let missing = |row: &ForestRow, field| ChartError::MissingField {
        row: row.name.clone(),
        field,
    };
    let mut ci_rows = Vec::with_capacity(rows.len());
    for r in rows {
        let lower = r.lower_ci.ok_or_else(|| missing(r, "lower_ci"))?;
        let upper = r.upper_ci.ok_or_else(|| missing(r, "upper_ci"))?;
        ci_rows.push(CiRow {
            lower,
            upper,
            y: -step * r.order as f64,
        });
    }
    let weights = row_weights(rows, &opts.analysis, cfg.aggregate_weight)?;
    let ys: Vec<f64> = ci_rows.iter().map(|c| c.y).collect();
    let max_order = rows.iter().map(|r| r.order).max().unwrap_or(0);
    let bottom = -step * (max_order as f64 + 1.0);

    let mut means_style = ScatterStyle::default();
    let mut ci_style = CiStyle::default();
    let mut no_effect_z = 1;
    match opts.style {
        ForestStyle::Plain => {}
        ForestStyle::Scaled => means_style.size = scaled_or_fixed(1.0, 100.0, &weights)?,
        ForestStyle::Thick => {
            means_style.marker = MarkerShape::VerticalLine;
            means_style.size = Sizing::Fixed(100.0);
            means_style.fill = Fill::Solid(RED);
            means_style.edge = RED;
            ci_style.width = scaled_or_fixed(1.0, 10.0, &weights)?;
        }
        ForestStyle::Rainforest => {
            means_style.marker = MarkerShape::VerticalLine;
            means_style.size = Sizing::Fixed(200.0);
            means_style.fill = Fill::Solid(WHITE);
            means_style.edge = WHITE;
            ci_style.width = Sizing::Fixed(1.0);
            ci_style.color = WHITE;
            no_effect_z = 10;
        }
    }
    let pct = format_percent(1.0 - cfg.alpha, 0);
    means_style.label = fill_template(&loc.translate("forest_means_label"), &[&pct]);
    if cfg.ci_distribution == CiDistribution::StudentsT {
        means_style.label.push_str(" (t-dist)");
    }

    let mut doc = ChartDocument::new(opts.effect_label.clone(), "");
    doc.suppress_y = true;
    doc.rescale_y = Some((bottom, step));

    let no_effect = doc.push(
        VisualElement::line(
            loc.translate("Line of No Effect"),
            vec![(0.0, step), (0.0, bottom)],
            LineStyle {
                color: SILVER,
                width: 1.0,
                dash: LineDash::Dotted,
            },
        )
        .z(no_effect_z),
    );
    doc.push(
        VisualElement::new(
            loc.translate("Confidence Intervals"),
            ElementKind::ConfidenceBars {
                rows: ci_rows.clone(),
                style: ci_style,
            },
        )
        .z(3),
    );
    if opts.style == ForestStyle::Rainforest {
        let drops = rows
            .iter()
            .zip(ci_rows.iter().zip(weights.iter()))
            .map(|(r, (ci, w))| {
                Ok(Raindrop {
                    mean: r.mean,
                    variance: require_variance(r)?,
                    y: ci.y,
                    lower: ci.lower,
                    upper: ci.upper,
                    weight: *w,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        doc.push(
            VisualElement::new(
                loc.translate("PDF Raindrops"),
                ElementKind::DensityCloud(DensityCloud::new(drops)),
            )
            .z(2),
        );
    }
    let means = doc.push(
        VisualElement::scatter(
            loc.translate("Means"),
            rows.iter().zip(&ys).map(|(r, y)| (r.mean, *y)).collect(),
            means_style,
        )
        .z(5),
    );

    let medians: Vec<(f64, f64)> = rows
        .iter()
        .zip(&ys)
        .filter_map(|(r, y)| r.median.map(|m| (m, *y)))
        .collect();
    let medians = if medians.is_empty() {
        None
    } else {
        Some(
            doc.push(
                VisualElement::scatter(
                    loc.translate("Medians"),
                    medians,
                    ScatterStyle {
                        marker: MarkerShape::X,
                        fill: Fill::Solid(ACCENT_ORANGE),
                        edge: ACCENT_ORANGE,
                        ..Default::default()
                    },
                )
                .z(5),
            ),
        )
    };

    let bootstrap = bootstrap_elements(&mut doc, rows, &ys, opts, step, loc);

    doc.push(VisualElement::new(
        loc.translate("Vertical Axis Tick Labels"),
        ElementKind::CategoryLabels {
            positions: rows.iter().zip(&ys).map(|(r, y)| (*y, r.name.clone())).collect(),
        },
    ));

    if let Some((lo, hi)) = min_max(ci_rows.iter().flat_map(|c| [c.lower, c.upper])) {
        debug!("forest plot: {} rows, intervals span {lo}..{hi}", rows.len());
    }
    doc.caption = Caption::Forest(ForestCaption {
        analysis: opts.analysis.clone(),
        style: opts.style,
        effect_label: opts.effect_label.clone(),
        alpha: cfg.alpha,
        ci_distribution: cfg.ci_distribution,
        aggregate_weight: cfg.aggregate_weight,
        no_effect,
        means,
        medians,
        bootstrap,
    });
    Ok(doc)
}

/// Bootstrap markers and violins, when at least one row carries both limit pairs.
fn bootstrap_elements(
    doc: &mut ChartDocument,
    rows: &[ForestRow],
    ys: &[f64],
    opts: &ForestOptions,
    step: f64,
    loc: &dyn Localizer,
) -> Option<BootstrapRefs> {
    let mut limits = Vec::new();
    let mut bias = Vec::new();
    for (r, y) in rows.iter().zip(ys) {
        if let (Some(lo), Some(hi)) = (r.lower_bs_ci, r.upper_bs_ci) {
            limits.extend([(lo, *y), (hi, *y)]);
        }
        if let (Some(lo), Some(hi)) = (r.lower_bias_ci, r.upper_bias_ci) {
            bias.extend([(lo, *y), (hi, *y)]);
        }
    }
    if limits.is_empty() {
        return None;
    }
    let caret = |marker, color| ScatterStyle {
        marker,
        fill: Fill::Solid(color),
        edge: color,
        ..Default::default()
    };
    let limits = doc.push(
        VisualElement::scatter(
            loc.translate("Bootstrap Confidence Limits"),
            limits,
            caret(MarkerShape::CaretUp, ACCENT_GREEN),
        )
        .z(4),
    );
    let bias_corrected = doc.push(
        VisualElement::scatter(
            loc.translate("Bias-corrected Bootstrap Confidence Limits"),
            bias,
            caret(MarkerShape::CaretDown, ACCENT_RED),
        )
        .z(4),
    );
    let replicates: Vec<(f64, Vec<f64>)> = rows
        .iter()
        .zip(ys)
        .filter(|(r, _)| !r.bootstrap_means.is_empty())
        .map(|(r, y)| (*y, r.bootstrap_means.clone()))
        .collect();
    let iterations = opts.bootstrap_iterations.unwrap_or_else(|| {
        rows.iter()
            .map(|r| r.bootstrap_means.len() as u64)
            .max()
            .unwrap_or(0)
    });
    let distribution = doc.push(
        VisualElement::new(
            loc.translate("Bootstrap Distribution"),
            ElementKind::BootstrapDistribution(BootstrapDistribution::new(replicates, step - 1.0)),
        )
        .z(2),
    );
    Some(BootstrapRefs {
        iterations,
        limits,
        bias_corrected,
        distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisContext;
    use crate::locale::ENGLISH;

    fn rows() -> Vec<ForestRow> {
        vec![
            ForestRow::new("Alpha 2001", 0, 0.5, 0.04, (0.1, 0.9)),
            ForestRow::new("Beta 2003", 1, 0.2, 0.01, (0.0, 0.4)),
            ForestRow::new("Gamma 2010", 2, -0.1, 0.09, (-0.7, 0.5)),
        ]
    }

    fn plot(rows: &[ForestRow], style: ForestStyle) -> ChartDocument {
        let opts = ForestOptions {
            style,
            effect_label: "Hedges' d".into(),
            ..Default::default()
        };
        forest_plot(rows, &opts, &ChartConfig::default(), &ENGLISH).unwrap()
    }

    fn scatter_sizes(doc: &ChartDocument, name: &str) -> Vec<f64> {
        let id = doc.find(name).unwrap();
        match &doc.get(id).unwrap().kind {
            ElementKind::Scatter { points, style } => style.size.resolve(points.len()),
            other => panic!("{name} is {other:?}"),
        }
    }

    #[test]
    fn rows_stack_downward_by_step() {
        let doc = plot(&rows(), ForestStyle::Plain);
        let id = doc.find("Means").unwrap();
        let ElementKind::Scatter { points, .. } = &doc.get(id).unwrap().kind else {
            panic!("not a scatter")
        };
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        assert_eq!(ys, vec![0.0, -10.0, -20.0]);
        let labels = doc.find("Vertical Axis Tick Labels").unwrap();
        let ElementKind::CategoryLabels { positions } = &doc.get(labels).unwrap().kind else {
            panic!("not labels")
        };
        assert_eq!(positions[2], (-20.0, "Gamma 2010".to_string()));
    }

    #[test]
    fn aggregate_weight_policies() {
        let rows = rows();
        let basic = AnalysisKind::Basic;
        let avg = row_weights(&rows, &basic, AggregateWeight::StudyAverage).unwrap();
        assert!((avg[0] - (100.0 + 1.0 / 0.09) / 2.0).abs() < 1e-9);
        let max = row_weights(&rows, &basic, AggregateWeight::StudyMaximum).unwrap();
        assert!((max[0] - 100.0).abs() < 1e-9);
        let own = row_weights(&rows, &basic, AggregateWeight::Own).unwrap();
        assert!((own[0] - 25.0).abs() < 1e-9);
        let studies = row_weights(&rows, &AnalysisKind::Studies, AggregateWeight::StudyAverage).unwrap();
        assert!((studies[0] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn scaled_markers_span_configured_range() {
        let doc = plot(&rows(), ForestStyle::Scaled);
        let sizes = scatter_sizes(&doc, "Means");
        assert!((sizes[1] - 100.0).abs() < 1e-9);
        assert!((sizes[2] - 1.0).abs() < 1e-9);
        assert!(sizes[0] > 1.0 && sizes[0] < 100.0);
    }

    #[test]
    fn equal_weights_fall_back_to_fixed_size() {
        let rows: Vec<ForestRow> = (0..3)
            .map(|i| ForestRow::new(format!("S{i}"), i, 0.1 * i as f64, 0.05, (-0.3, 0.5)))
            .collect();
        let doc = plot(&rows, ForestStyle::Scaled);
        assert_eq!(scatter_sizes(&doc, "Means"), vec![50.5; 3]);
    }

    #[test]
    fn thick_style_scales_bar_widths() {
        let doc = plot(&rows(), ForestStyle::Thick);
        let id = doc.find("Confidence Intervals").unwrap();
        let ElementKind::ConfidenceBars { rows, style } = &doc.get(id).unwrap().kind else {
            panic!("not confidence bars")
        };
        let widths = style.width.resolve(rows.len());
        assert!((widths[1] - 10.0).abs() < 1e-9);
        assert!((widths[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn medians_only_when_present() {
        let doc = plot(&rows(), ForestStyle::Plain);
        assert!(doc.find("Medians").is_none());
        let mut with = rows();
        with[1] = with[1].clone().with_median(0.25);
        let doc = plot(&with, ForestStyle::Plain);
        let id = doc.find("Medians").unwrap();
        let ElementKind::Scatter { points, .. } = &doc.get(id).unwrap().kind else {
            panic!("not a scatter")
        };
        assert_eq!(points, &vec![(0.25, -10.0)]);
    }

    #[test]
    fn rainforest_adds_raindrops_under_white_ticks() {
        let doc = plot(&rows(), ForestStyle::Rainforest);
        let id = doc.find("PDF Raindrops").unwrap();
        assert!(matches!(doc.get(id).unwrap().kind, ElementKind::DensityCloud(_)));
        let line = doc.get(doc.find("Line of No Effect").unwrap()).unwrap();
        assert_eq!(line.z_order, 10);
        let text = doc.caption_text(&SynthesisContext::default());
        assert!(text.contains("Schild and Voracek (2014)"));
    }

    #[test]
    fn missing_confidence_limit_fails() {
        let mut rows = rows();
        rows[2].upper_ci = None;
        let err = forest_plot(&rows, &ForestOptions::default(), &ChartConfig::default(), &ENGLISH)
            .unwrap_err();
        assert_eq!(
            err,
            ChartError::MissingField {
                row: "Gamma 2010".into(),
                field: "upper_ci"
            }
        );
    }
}
