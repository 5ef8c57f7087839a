//! Meta-analytic rain cloud (MARC) plots.
//!
//! Studies sit at (effect, relative weight) with marker area growing with
//! weight. With a mean included, the mean's sampling distribution is drawn
//! as a cloud of simulated effects around a baseline of 1, with a callout
//! and a summary banner.

use super::{push_linked, require_variance};
use crate::caption::Caption;
use crate::chart::{
    Annotation, ArrowStyle, BandRow, BoxStyle, ChartDocument, ElementKind, HAlign,
    LegendComposite, PanelLayout, TextSize, TextStyle, VAlign, VisualElement,
};
use crate::config::ChartConfig;
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::{ForestRow, MarcStyle};
use crate::stats;
use crate::style::{
    BLUE, BandStyle, DARK_BLUE, DARK_GRAY, Fill, LineDash, LineStyle, RED, RectangleStyle,
    ScatterStyle, Sizing, WHITE, WeightScale,
};
use crate::text::{fill_template, format_general, format_percent};
use log::debug;
use rand::Rng;

/// Reference weights shown in the size legend.
pub const LEGEND_WEIGHTS: [f64; 3] = [0.1, 0.01, 0.001];

/// Assemble a MARC plot. For the two mean-including styles row 0 is the
/// aggregate mean; the cloud is drawn from `rng`.
pub fn marc_plot<R: Rng>(
    rows: &[ForestRow],
    style: MarcStyle,
    effect_label: &str,
    cfg: &ChartConfig,
    loc: &dyn Localizer,
    rng: &mut R,
) -> Result<ChartDocument> {
    let min_rows = if style == MarcStyle::MeanPanel { 2 } else { 1 };
    if rows.len() < min_rows {
        return Err(ChartError::InvalidInput(format!(
            "MARC plot needs at least {min_rows} rows, got {}",
            rows.len()
        )));
    }
    let grand = style.includes_mean().then(|| &rows[0]);
    let shown = if style == MarcStyle::MeanPanel {
        &rows[1..]
    } else {
        rows
    };

    let inverse: Vec<f64> = shown
        .iter()
        .map(|r| require_variance(r).map(|v| 1.0 / v))
        .collect::<Result<_>>()?;
    let total: f64 = match style {
        MarcStyle::MeanIncluded => inverse.iter().skip(1).sum(),
        _ => inverse.iter().sum(),
    };
    if !(total > 0.0) {
        return Err(ChartError::InvalidInput(
            "MARC plot needs at least one study besides the mean".into(),
        ));
    }
    let rel: Vec<f64> = inverse.iter().map(|w| w / total).collect();
    let top = rel.iter().copied().fold(0.0_f64, f64::max);

    let max_x = match shown.iter().map(|r| r.mean.abs()).fold(0.0_f64, f64::max) {
        m if m > 0.0 => m * 1.1,
        _ => 1.0,
    };
    let (max_w, max_wy, max_size) = match style {
        MarcStyle::StudiesOnly => {
            let w = top.max(cfg.marc_weight_floor);
            (w, w, 400.0)
        }
        MarcStyle::MeanIncluded => (1.0, 1.0, 1600.0),
        MarcStyle::MeanPanel => (1.0, top, 1600.0),
    };
    let max_y = max_wy * 1.1;
    let min_y = -max_wy / 10.0;
    debug!("MARC {style:?}: max relative weight {top}, x range ±{max_x}, y {min_y}..{max_y}");

    let mut doc = ChartDocument::new(effect_label, loc.translate("Relative Weight"));
    doc.rescale_x = Some((-max_x, max_x));
    doc.rescale_y = Some((min_y, max_y));

    let axis_line = LineStyle {
        color: DARK_GRAY,
        width: 1.0,
        dash: LineDash::Solid,
    };
    let axes_name = loc.translate("Lines of No Effect and Weight");
    push_linked(
        &mut doc,
        VisualElement::line(axes_name.clone(), vec![(0.0, min_y), (0.0, max_y)], axis_line.clone()).z(2),
        VisualElement::line(axes_name, vec![(-max_x, 0.0), (max_x, 0.0)], axis_line).z(2),
    )?;

    // markers span 0..max_wy; the legend keeps 0..max_w
    let scale = WeightScale::new(1.0, max_size, rel.clone(), 0.0, max_wy)?;
    let means = doc.push(
        VisualElement::scatter(
            loc.translate("Means"),
            shown.iter().zip(&rel).map(|(r, w)| (r.mean, *w)).collect(),
            ScatterStyle {
                size: Sizing::Scaled(scale),
                ..Default::default()
            },
        )
        .z(5),
    );

    background(&mut doc, -max_x, max_x, (min_y, max_y), None, loc);

    if let Some(mean_row) = grand {
        let panel = (style == MarcStyle::MeanPanel).then_some(0);
        if let Some(axes) = panel {
            doc.layout = PanelLayout::StackedSummary;
            doc.aux_rescale_y = Some((0.0, 2.0));
            doc.push(
                VisualElement::scatter(
                    loc.translate("Mean Effect Size"),
                    vec![(mean_row.mean, 1.0)],
                    ScatterStyle {
                        size: Sizing::Fixed(1600.0),
                        ..Default::default()
                    },
                )
                .z(5)
                .on_axes(axes),
            );
            background(&mut doc, -max_x, max_x, (-1.0, 2.0), Some(axes), loc);
        }
        mean_cloud(&mut doc, mean_row, max_x, panel, cfg, loc, rng)?;
    }

    let box_style = BoxStyle {
        face: WHITE,
        edge: DARK_GRAY,
        edge_width: 1.0,
    };
    doc.push(
        VisualElement::annotations(
            loc.translate("Effect Direction Labels"),
            vec![
                Annotation::at(loc.translate("Negative Effect"), -max_x / 2.0, min_y / 2.0),
                Annotation::at(loc.translate("Positive Effect"), max_x / 2.0, min_y / 2.0),
            ],
            TextStyle {
                h_align: HAlign::Center,
                v_align: VAlign::Center,
                boxed: Some(box_style),
                ..Default::default()
            },
        )
        .z(6),
    );

    doc.push(
        VisualElement::new(
            loc.translate("Weight Legend"),
            ElementKind::Legend(LegendComposite {
                source: means,
                weights: LEGEND_WEIGHTS,
                max_weight: Some(max_w),
                labels: LEGEND_WEIGHTS.map(|w| w.to_string()),
                title: loc.translate("Relative Weight"),
                more: loc.translate("More certain"),
                less: loc.translate("Less certain"),
            }),
        )
        .z(30),
    );

    doc.caption = Caption::Marc {
        includes_mean: style.includes_mean(),
    };
    Ok(doc)
}

/// Translucent negative (red) and positive (blue) half-planes over `ys`.
fn background(
    doc: &mut ChartDocument,
    min_x: f64,
    max_x: f64,
    (y0, y1): (f64, f64),
    axes: Option<usize>,
    loc: &dyn Localizer,
) {
    for (key, x1, x2, color) in [
        ("Negative Background", min_x, 0.0, RED),
        ("Positive Background", 0.0, max_x, BLUE),
    ] {
        let mut band = VisualElement::band(
            loc.translate(key),
            vec![BandRow { x1, x2, y: y0 }, BandRow { x1, x2, y: y1 }],
            BandStyle {
                color,
                opacity: 0.25,
            },
        )
        .z(1);
        band.axes = axes;
        doc.push(band);
    }
}

/// Simulated cloud around the mean plus its callout and summary banner.
fn mean_cloud<R: Rng>(
    doc: &mut ChartDocument,
    mean_row: &ForestRow,
    max_x: f64,
    axes: Option<usize>,
    cfg: &ChartConfig,
    loc: &dyn Localizer,
    rng: &mut R,
) -> Result<()> {
    let sd = require_variance(mean_row)?.sqrt();
    let mean = mean_row.mean;
    if !(sd.is_finite() && mean.is_finite()) {
        return Err(ChartError::InvalidInput(format!(
            "cannot sample the mean {mean} with standard deviation {sd}"
        )));
    }
    // Tighter vertical spread when the cloud shares the study axis.
    let spread = if axes.is_some() { 1.0 } else { 10.0 };

    let xs: Vec<f64> = (0..cfg.marc_cloud_points)
        .map(|_| mean + sd * stats::norm_ppf(rng.random_range(f64::EPSILON..1.0)))
        .collect();
    let pdf: Vec<f64> = xs.iter().map(|x| stats::norm_pdf(*x, mean, sd)).collect();
    let peak = pdf.iter().copied().fold(0.0_f64, f64::max);
    let cloud: Vec<(f64, f64)> = xs
        .iter()
        .zip(&pdf)
        .map(|(x, d)| {
            let h = if peak > 0.0 { d / (peak * spread) } else { 0.0 };
            let jitter = if h > 0.0 { rng.random_range(0.0..h) } else { 0.0 };
            (*x, jitter - h / 2.0 + 1.0)
        })
        .collect();

    let lowest = cloud
        .iter()
        .copied()
        .fold((mean, f64::INFINITY), |acc, p| if p.1 < acc.1 { p } else { acc });

    let mut simulated = VisualElement::scatter(
        loc.translate("Simulated Effects"),
        cloud,
        ScatterStyle {
            fill: Fill::Solid(WHITE),
            edge: DARK_BLUE,
            size: Sizing::Fixed(9.0),
            edge_width: 0.5,
            opacity: 0.2,
            ..Default::default()
        },
    )
    .z(20);
    simulated.axes = axes;
    doc.push(simulated);

    let missing = |field| ChartError::MissingField {
        row: mean_row.name.clone(),
        field,
    };
    let lo = mean_row.lower_ci.ok_or_else(|| missing("lower_ci"))?;
    let hi = mean_row.upper_ci.ok_or_else(|| missing("upper_ci"))?;
    let confidence = 1.0 - cfg.alpha;
    let text = fill_template(
        &loc.translate("MARC_point_annotation"),
        &[
            &format_percent(confidence, 1),
            &format_general(lo, 2),
            &format_general(hi, 2),
            &format_general(mean, 3),
        ],
    );
    let end_y = if axes.is_some() { 0.0 } else { lowest.1 - 0.1 };
    let mut callout = VisualElement::annotations(
        loc.translate("Cloud Annotation"),
        vec![Annotation::with_leader(text, lowest, (lowest.0 + max_x / 10.0, end_y))],
        TextStyle {
            h_align: HAlign::Center,
            v_align: VAlign::Top,
            size: TextSize::Small,
            boxed: Some(BoxStyle {
                face: WHITE,
                edge: DARK_GRAY,
                edge_width: 2.0,
            }),
            arrow: Some(ArrowStyle {
                color: DARK_BLUE,
                curvature: -0.5,
            }),
        },
    )
    .z(25);
    callout.axes = axes;
    doc.push(callout);

    let (rect_y, rect_h) = if axes.is_some() { (0.2, 1.6) } else { (0.91, 0.18) };
    let mut banner_box = VisualElement::new(
        loc.translate("Summary Banner"),
        ElementKind::Rectangle {
            corner: (-max_x + max_x / 20.0, rect_y),
            width: 2.0 * max_x - max_x / 10.0,
            height: rect_h,
            style: RectangleStyle {
                face: WHITE,
                edge: DARK_GRAY,
            },
            clip: true,
        },
    )
    .z(2);
    banner_box.axes = axes;
    doc.push(banner_box);

    let banner = |items, h_align, size| {
        let mut e = VisualElement::annotations(
            loc.translate("Summary Banner"),
            items,
            TextStyle {
                h_align,
                v_align: VAlign::Center,
                size,
                ..Default::default()
            },
        )
        .z(3);
        e.axes = axes;
        e
    };
    doc.push(banner(
        vec![Annotation::at(
            loc.translate("SUMMARY OF THE EVIDENCE:"),
            -max_x + max_x / 10.0,
            1.0,
        )],
        HAlign::Left,
        TextSize::Large,
    ));
    doc.push(banner(
        vec![Annotation::at(
            fill_template(&loc.translate("MARC_summary_label"), &[&format_general(mean, 3)]),
            0.9 * max_x,
            1.0,
        )],
        HAlign::Right,
        TextSize::Medium,
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::ENGLISH;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rows() -> Vec<ForestRow> {
        vec![
            ForestRow::new("Mean", 0, 0.3, 0.008, (0.12, 0.48)),
            ForestRow::new("A", 1, 0.5, 0.01, (0.3, 0.7)),
            ForestRow::new("B", 2, 0.1, 0.04, (-0.3, 0.5)),
        ]
    }

    fn points(doc: &ChartDocument, name: &str) -> Vec<(f64, f64)> {
        match &doc.get(doc.find(name).unwrap()).unwrap().kind {
            ElementKind::Scatter { points, .. } => points.clone(),
            other => panic!("{name}: {other:?}"),
        }
    }

    #[test]
    fn studies_only_weights_sum_to_one_and_floor_applies() {
        let rows: Vec<ForestRow> = (0..20)
            .map(|i| ForestRow::new(format!("S{i}"), i, 0.1, 0.05, (0.0, 0.2)))
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        let doc = marc_plot(&rows, MarcStyle::StudiesOnly, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        let pts = points(&doc, "Means");
        let sum: f64 = pts.iter().map(|p| p.1).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // every study weighs 0.05, so the floor of 0.1 sets the axis
        let (lo, hi) = doc.rescale_y.unwrap();
        assert!((hi - 0.11).abs() < 1e-12);
        assert!((lo + 0.01).abs() < 1e-12);
        assert!(doc.find("Simulated Effects").is_none());
    }

    #[test]
    fn mean_cloud_is_seeded_and_bounded() {
        let cfg = ChartConfig::default();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            marc_plot(&rows(), MarcStyle::MeanIncluded, "d", &cfg, &ENGLISH, &mut rng).unwrap()
        };
        let a = points(&run(3), "Simulated Effects");
        let b = points(&run(3), "Simulated Effects");
        assert_eq!(a, b);
        assert_eq!(a.len(), 250);
        // jitter is at most a tenth of a unit wide around 1
        assert!(a.iter().all(|p| (p.1 - 1.0).abs() <= 0.05 + 1e-12));
    }

    #[test]
    fn mean_included_normalizes_over_studies() {
        let mut rng = StdRng::seed_from_u64(1);
        let doc = marc_plot(&rows(), MarcStyle::MeanIncluded, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        let pts = points(&doc, "Means");
        assert_eq!(pts.len(), 3);
        assert!((pts[1].1 - 0.8).abs() < 1e-9);
        assert!((pts[2].1 - 0.2).abs() < 1e-9);
        assert!((pts[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mean_panel_moves_mean_to_summary_axes() {
        let mut rng = StdRng::seed_from_u64(11);
        let doc = marc_plot(&rows(), MarcStyle::MeanPanel, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        assert_eq!(doc.layout, PanelLayout::StackedSummary);
        assert_eq!(points(&doc, "Means").len(), 2);
        let mean = doc.get(doc.find("Mean Effect Size").unwrap()).unwrap();
        assert_eq!(mean.axes, Some(0));
        let cloud = doc.get(doc.find("Simulated Effects").unwrap()).unwrap();
        assert_eq!(cloud.axes, Some(0));
    }

    #[test]
    fn callout_formats_interval() {
        let mut rng = StdRng::seed_from_u64(5);
        let doc = marc_plot(&rows(), MarcStyle::MeanIncluded, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        let id = doc.find("Cloud Annotation").unwrap();
        let ElementKind::Annotations { items, .. } = &doc.get(id).unwrap().kind else {
            panic!("not annotations")
        };
        assert!(items[0].text.contains("95.0% of the values fall between 0.12 and 0.48"));
        assert!(items[0].text.ends_with("average value of 0.3."));
    }

    #[test]
    fn callout_reports_the_stored_interval() {
        // a bootstrap-style interval well away from mean +/- 1.96 sd
        let mut rows = rows();
        rows[0].lower_ci = Some(0.05);
        rows[0].upper_ci = Some(0.6);
        let mut rng = StdRng::seed_from_u64(5);
        let doc = marc_plot(&rows, MarcStyle::MeanIncluded, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        let ElementKind::Annotations { items, .. } = &doc.get(doc.find("Cloud Annotation").unwrap()).unwrap().kind
        else {
            panic!("not annotations")
        };
        assert!(items[0].text.contains("between 0.05 and 0.6"), "{}", items[0].text);

        rows[0].upper_ci = None;
        let err = marc_plot(&rows, MarcStyle::MeanPanel, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            ChartError::MissingField {
                row: "Mean".into(),
                field: "upper_ci"
            }
        );
    }

    #[test]
    fn mean_panel_scales_markers_to_the_heaviest_study() {
        let mut rng = StdRng::seed_from_u64(4);
        let doc = marc_plot(&rows(), MarcStyle::MeanPanel, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        let id = doc.find("Means").unwrap();
        let ElementKind::Scatter { style, .. } = &doc.get(id).unwrap().kind else {
            panic!("not a scatter")
        };
        let Sizing::Scaled(scale) = &style.size else {
            panic!("fixed sizing")
        };
        // relative weights 0.8 and 0.2
        let sizes = scale.values();
        assert!((sizes[0] - 1600.0).abs() < 1e-9);
        assert!((sizes[1] - 400.75).abs() < 1e-9);
        // legend glyphs stay on the 0..1 weight range
        let glyphs = doc.legend_glyphs(doc.find("Weight Legend").unwrap()).unwrap();
        assert!((glyphs[0].size - 160.9_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn legend_uses_reference_weights() {
        let mut rng = StdRng::seed_from_u64(2);
        let doc = marc_plot(&rows(), MarcStyle::StudiesOnly, "d", &ChartConfig::default(), &ENGLISH, &mut rng)
            .unwrap();
        let id = doc.find("Weight Legend").unwrap();
        let glyphs = doc.legend_glyphs(id).unwrap();
        let labels: Vec<&str> = glyphs.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["0.1", "0.01", "0.001"]);
        assert!(glyphs[0].size > glyphs[1].size && glyphs[1].size > glyphs[2].size);
    }
}
