//! Funnel plots with optional pseudo-confidence limits, significance contour
//! zones and power ("sunset") shading.

use super::{min_max, positive_variance, push_linked};
use crate::caption::{Caption, FunnelCaption};
use crate::chart::{BandRow, ChartDocument, ElementId, ElementKind, VisualElement};
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::StudyEffect;
use crate::stats;
use crate::style::{BandStyle, LineDash, LineStyle, MapStyle, Rgba, SILVER, ScatterStyle};
use log::debug;
use serde::{Deserialize, Serialize};

/// Vertical axis of a funnel plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMetric {
    #[default]
    StandardError,
    Variance,
    Precision,
    SampleSize,
}

impl PrecisionMetric {
    /// Catalog key of the axis label.
    pub fn label_key(&self) -> &'static str {
        match self {
            PrecisionMetric::StandardError => "standard error",
            PrecisionMetric::Variance => "variance",
            PrecisionMetric::Precision => "precision",
            PrecisionMetric::SampleSize => "sample size",
        }
    }

    /// Small standard errors and variances are plotted at the top.
    pub fn inverted(&self) -> bool {
        matches!(self, PrecisionMetric::StandardError | PrecisionMetric::Variance)
    }

    /// Metric value of one study.
    pub fn value(&self, study: &StudyEffect, index: usize) -> Result<f64> {
        let row = format!("study {index}");
        match self {
            PrecisionMetric::StandardError => Ok(positive_variance(&row, study.variance)?.sqrt()),
            PrecisionMetric::Variance => positive_variance(&row, study.variance),
            PrecisionMetric::Precision => Ok(1.0 / positive_variance(&row, study.variance)?.sqrt()),
            PrecisionMetric::SampleSize => study
                .sample_size
                .ok_or(ChartError::MissingField {
                    row,
                    field: "sample_size",
                }),
        }
    }

    /// Standard-error equivalent of a metric value.
    pub fn standard_error(&self, y: f64) -> f64 {
        match self {
            PrecisionMetric::StandardError => y,
            PrecisionMetric::Variance => y.sqrt(),
            PrecisionMetric::Precision => 1.0 / y,
            PrecisionMetric::SampleSize => 1.0 / y.sqrt(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct FunnelOptions {
    pub metric: PrecisionMetric,
    pub effect_label: String,
    /// Mean effect; the inverse-variance weighted mean when `None`.
    pub mean: Option<f64>,
    pub pseudo_ci: bool,
    pub contours: bool,
    pub power: bool,
    /// Samples along the y range for curves and zones.
    pub curve_points: usize,
}

/// Contour zone colors, outermost (p < 0.01) first.
pub const ZONE_COLORS: [Rgba; 3] = [
    Rgba::from_hex(0xeeeeee),
    Rgba::from_hex(0xcccccc),
    Rgba::from_hex(0xa3a3a3),
];

const ZONE_NAMES: [&str; 3] = ["p < 0.01 Zone", "0.01 < p < 0.05 Zone", "0.05 < p < 0.10 Zone"];

pub fn funnel_plot(
    studies: &[StudyEffect],
    opts: &FunnelOptions,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    if studies.is_empty() {
        return Err(ChartError::InvalidInput("funnel plot needs at least one study".into()));
    }
    let metric = opts.metric;
    let points = studies
        .iter()
        .enumerate()
        .map(|(i, s)| metric.value(s, i).map(|y| (s.effect, y)))
        .collect::<Result<Vec<_>>>()?;
    let mean = match opts.mean {
        Some(m) => m,
        None => weighted_mean(studies)?,
    };

    let (mut x_min, mut x_max) = min_max(points.iter().map(|p| p.0)).unwrap_or((0.0, 0.0));
    let (y_lo, y_hi) = min_max(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let y_min = if metric.inverted() {
        y_lo.min(0.001)
    } else {
        y_lo * 0.85
    };
    let y_max = y_hi * 1.15;

    let mut doc = ChartDocument::new(opts.effect_label.clone(), loc.translate(metric.label_key()));
    doc.invert_y = metric.inverted();

    doc.push(VisualElement::scatter(loc.translate("Point Data"), points, ScatterStyle::default()).z(10));
    let mean_line = doc.push(
        VisualElement::line(
            loc.translate("Mean Effect Size"),
            vec![(mean, y_min), (mean, y_max)],
            LineStyle {
                color: SILVER,
                width: 1.0,
                dash: LineDash::Dotted,
            },
        )
        .z(5),
    );

    let needs_curves = opts.pseudo_ci || opts.contours || opts.power;
    let ys = if needs_curves {
        stats::linspace(y_min, y_max, opts.curve_points.max(2))
    } else {
        Vec::new()
    };
    let ses: Vec<f64> = ys.iter().map(|y| metric.standard_error(*y)).collect();

    let mut pseudo_ci = None;
    if opts.pseudo_ci {
        let bounds: Vec<(f64, f64)> = ses
            .iter()
            .map(|se| stats::normal_interval(0.95, mean, *se))
            .collect();
        for (lo, hi) in &bounds {
            x_min = x_min.min(*lo);
            x_max = x_max.max(*hi);
        }
        let style = LineStyle {
            color: SILVER,
            width: 1.0,
            dash: LineDash::Dashed,
        };
        let name = loc.translate("Pseudo-Confidence Limits");
        let (lower, _) = push_linked(
            &mut doc,
            VisualElement::line(
                name.clone(),
                bounds.iter().zip(&ys).map(|((lo, _), y)| (*lo, *y)).collect(),
                style.clone(),
            )
            .z(3),
            VisualElement::line(
                name,
                bounds.iter().zip(&ys).map(|((_, hi), y)| (*hi, *y)).collect(),
                style,
            )
            .z(3),
        )?;
        pseudo_ci = Some(lower);
    }

    let half_widths: Vec<[f64; 3]> = ses
        .iter()
        .map(|se| [0.99, 0.95, 0.90].map(|c| stats::normal_interval(c, 0.0, *se).1))
        .collect();
    let mut contours = None;
    if opts.contours {
        let widest = half_widths.iter().map(|h| h[0]).fold(0.0_f64, f64::max);
        x_min = x_min.min(-widest);
        x_max = x_max.max(widest);
        contours = Some(contour_zones(&mut doc, &ys, &half_widths, x_min, x_max, loc)?);
    }

    if opts.power {
        let values: Vec<Vec<f64>> = ses
            .iter()
            .map(|se| {
                let p = stats::two_tailed_power(mean, *se);
                vec![p, p]
            })
            .collect();
        doc.push(VisualElement::new(
            loc.translate("Power Color Scheme"),
            ElementKind::ColorMesh {
                xs: vec![x_min, x_max],
                ys: ys.clone(),
                values,
                vmin: 0.0,
                vmax: 100.0,
                style: MapStyle {
                    colormap: "RdYlGn".into(),
                    label: loc.translate("Power"),
                },
            },
        ));
    }

    debug!("funnel over {metric:?}: x {x_min}..{x_max}, y {y_min}..{y_max}, mean {mean}");
    doc.rescale_x = Some((x_min, x_max));
    doc.rescale_y = Some((y_min, y_max));
    doc.caption = Caption::Funnel(FunnelCaption {
        mean_line,
        pseudo_ci,
        contours,
        power: opts.power,
    });
    Ok(doc)
}

/// Three linked band pairs; zone `k` lies between interval `k` and the next
/// one inwards (or the plot edge for the outermost zone).
fn contour_zones(
    doc: &mut ChartDocument,
    ys: &[f64],
    half_widths: &[[f64; 3]],
    x_min: f64,
    x_max: f64,
    loc: &dyn Localizer,
) -> Result<[ElementId; 3]> {
    let mut ids = [ElementId(0); 3];
    for (k, color) in ZONE_COLORS.iter().enumerate() {
        let (left, right): (Vec<BandRow>, Vec<BandRow>) = ys
            .iter()
            .zip(half_widths)
            .map(|(y, h)| {
                let (outer_l, outer_r) = if k == 0 { (x_min, x_max) } else { (-h[k - 1], h[k - 1]) };
                (
                    BandRow {
                        x1: outer_l,
                        x2: -h[k],
                        y: *y,
                    },
                    BandRow {
                        x1: h[k],
                        x2: outer_r,
                        y: *y,
                    },
                )
            })
            .unzip();
        let style = BandStyle {
            color: *color,
            opacity: 1.0,
        };
        let name = loc.translate(ZONE_NAMES[k]);
        let (id, _) = push_linked(
            doc,
            VisualElement::band(name.clone(), left, style.clone()).z(1),
            VisualElement::band(name, right, style).z(1),
        )?;
        ids[k] = id;
    }
    Ok(ids)
}

/// Inverse-variance weighted mean effect.
pub fn weighted_mean(studies: &[StudyEffect]) -> Result<f64> {
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, s) in studies.iter().enumerate() {
        let w = 1.0 / positive_variance(&format!("study {i}"), s.variance)?;
        num += w * s.effect;
        den += w;
    }
    if den > 0.0 {
        Ok(num / den)
    } else {
        Err(ChartError::InvalidInput("no studies to average".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::ENGLISH;

    fn studies() -> Vec<StudyEffect> {
        vec![
            StudyEffect::new(0.1, 0.01),
            StudyEffect::new(0.4, 0.04),
            StudyEffect::new(-0.2, 0.09),
            StudyEffect::new(0.3, 0.0025),
        ]
    }

    fn options() -> FunnelOptions {
        FunnelOptions {
            effect_label: "Effect".into(),
            pseudo_ci: true,
            contours: true,
            power: true,
            curve_points: 50,
            ..Default::default()
        }
    }

    fn band_rows(doc: &ChartDocument, id: ElementId) -> Vec<BandRow> {
        match &doc.get(id).unwrap().kind {
            ElementKind::FilledBand { rows, .. } => rows.clone(),
            other => panic!("not a band: {other:?}"),
        }
    }

    #[test]
    fn standard_error_axis_is_inverted_and_floored() {
        let doc = funnel_plot(&studies(), &options(), &ENGLISH).unwrap();
        assert!(doc.invert_y);
        let (lo, hi) = doc.rescale_y.unwrap();
        assert_eq!(lo, 0.001);
        assert!((hi - 0.3 * 1.15).abs() < 1e-12);
        assert_eq!(doc.y_label, "standard error");
    }

    #[test]
    fn contour_zones_nest() {
        let doc = funnel_plot(&studies(), &options(), &ENGLISH).unwrap();
        let Caption::Funnel(FunnelCaption {
            contours: Some([outer, mid, inner]),
            ..
        }) = &doc.caption
        else {
            panic!("funnel caption without contours")
        };
        let (o, m, i) = (band_rows(&doc, *outer), band_rows(&doc, *mid), band_rows(&doc, *inner));
        for ((o, m), i) in o.iter().zip(&m).zip(&i) {
            // left side: outer edge at the 99% limit, then 95%, then 90%
            let (h99, h95, h90) = (-o.x2, -m.x2, -i.x2);
            assert!(h99 >= h95 && h95 >= h90);
            assert_eq!(m.x1, o.x2);
            assert_eq!(i.x1, m.x2);
        }
    }

    #[test]
    fn contour_pairs_are_linked() {
        let doc = funnel_plot(&studies(), &options(), &ENGLISH).unwrap();
        let id = doc.find("p < 0.01 Zone").unwrap();
        assert!(matches!(
            doc.get(id).unwrap().link,
            crate::chart::StyleLink::Primary(_)
        ));
    }

    #[test]
    fn power_mesh_spans_percent_range() {
        let doc = funnel_plot(&studies(), &options(), &ENGLISH).unwrap();
        let id = doc.find("Power Color Scheme").unwrap();
        let ElementKind::ColorMesh { xs, ys, values, .. } = &doc.get(id).unwrap().kind else {
            panic!("not a mesh")
        };
        assert_eq!(xs.len(), 2);
        assert_eq!(values.len(), ys.len());
        assert!(values.iter().all(|r| r[0] == r[1] && (0.0..=100.0).contains(&r[0])));
        // smaller standard errors give more power
        assert!(values[0][0] > values[values.len() - 1][0]);
    }

    #[test]
    fn sample_size_metric_needs_sizes() {
        let opts = FunnelOptions {
            metric: PrecisionMetric::SampleSize,
            ..options()
        };
        let err = funnel_plot(&studies(), &opts, &ENGLISH).unwrap_err();
        assert!(matches!(err, ChartError::MissingField { field: "sample_size", .. }));
        assert!((PrecisionMetric::SampleSize.standard_error(25.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn no_curves_without_toggles() {
        let opts = FunnelOptions {
            effect_label: "Effect".into(),
            curve_points: 50,
            ..Default::default()
        };
        let doc = funnel_plot(&studies(), &opts, &ENGLISH).unwrap();
        assert_eq!(doc.len(), 2);
        let weighted = weighted_mean(&studies()).unwrap();
        let ElementKind::Polyline { vertices, .. } = &doc.get(doc.find("Mean Effect Size").unwrap()).unwrap().kind
        else {
            panic!("not a line")
        };
        assert!((vertices[0].0 - weighted).abs() < 1e-12);
    }
}
