//! Radial (Galbraith) charts: standardized effect against precision, with a
//! reference arc whose angle encodes the effect size.

use super::positive_variance;
use crate::caption::Caption;
use crate::chart::{Annotation, ChartDocument, ElementKind, HAlign, TextStyle, VAlign, VisualElement};
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::StudyEffect;
use crate::style::{LineDash, LineStyle, SILVER, ScatterStyle};
use crate::text::exponential_label;

/// Radial chart inputs estimated upstream: the slope of the regression
/// through the origin (the weighted mean effect) and the effect range the
/// reference arc spans.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RadialOptions {
    pub effect_label: String,
    /// Effects are logarithms (log ratios); arc labels show the ratio.
    pub log_scale: bool,
    pub slope: f64,
    pub min_effect: f64,
    pub max_effect: f64,
}

/// Arc tick: effect value (on the plotted scale), its label and the
/// vertical nudge applied to the label.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcTick {
    pub effect: f64,
    pub label: String,
    pub y_offset: f64,
}

const LABEL_NUDGE: f64 = 0.25;

/// Ticks for the reference arc between `min_e` and `max_e`.
///
/// Linear mode walks the integers and adds ±1/2; log mode walks the ratios
/// 1/9..1/2, 1, 2..9 and adds 2/3 and 3/2, each kept when its logarithm lies
/// in range. Labels are nudged away from the zero line, except the linear
/// ±1/2 labels which are nudged toward it to clear their whole neighbours.
pub fn arc_ticks(min_e: f64, max_e: f64, log_scale: bool) -> Vec<ArcTick> {
    let in_range = |e: f64| e >= min_e && e <= max_e;
    let away = |e: f64| {
        if e > 0.0 {
            LABEL_NUDGE
        } else if e < 0.0 {
            -LABEL_NUDGE
        } else {
            0.0
        }
    };
    let mut ticks = Vec::new();
    if log_scale {
        let mut ratios: Vec<(f64, String)> = (2..=9).rev().map(|k| (1.0 / k as f64, format!("1/{k}"))).collect();
        ratios.push((1.0, "1".into()));
        ratios.extend((2..=9).map(|k| (k as f64, k.to_string())));
        ratios.push((2.0 / 3.0, "2/3".into()));
        ratios.push((1.5, "3/2".into()));
        for (ratio, label) in ratios {
            let e = ratio.ln();
            if in_range(e) {
                ticks.push(ArcTick {
                    effect: e,
                    label,
                    y_offset: away(e),
                });
            }
        }
    } else {
        let first = min_e.ceil() as i64;
        let last = max_e.floor() as i64;
        for k in first..=last {
            ticks.push(ArcTick {
                effect: k as f64,
                label: k.to_string(),
                y_offset: away(k as f64),
            });
        }
        for (e, label) in [(0.5, "1/2"), (-0.5, "-1/2")] {
            if in_range(e) {
                ticks.push(ArcTick {
                    effect: e,
                    label: label.into(),
                    y_offset: -away(e),
                });
            }
        }
    }
    ticks
}

pub fn radial_plot(
    studies: &[StudyEffect],
    opts: &RadialOptions,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    if studies.is_empty() {
        return Err(ChartError::InvalidInput("radial plot needs at least one study".into()));
    }
    let points = studies
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let se = positive_variance(&format!("study {i}"), s.variance)?.sqrt();
            Ok((1.0 / se, s.effect / se))
        })
        .collect::<Result<Vec<(f64, f64)>>>()?;
    let slope = opts.slope;
    let (min_e, max_e) = (opts.min_effect, opts.max_effect);
    if !(slope.is_finite() && min_e.is_finite() && max_e.is_finite() && min_e <= max_e) {
        return Err(ChartError::InvalidInput(format!(
            "radial plot needs a finite slope and effect range, got slope {slope} over {min_e}..{max_e}"
        )));
    }
    let radius = points
        .iter()
        .map(|(x, y)| x.hypot(*y))
        .fold(0.0_f64, f64::max)
        + 1.0;

    let mut doc = ChartDocument::new(
        loc.translate("Precision"),
        format!("{} {}", loc.translate("Standardized"), opts.effect_label),
    );
    doc.rescale_x = Some((0.0, radius + 2.0));

    let reference = LineStyle {
        color: SILVER,
        width: 1.0,
        dash: LineDash::Dotted,
    };
    doc.push(VisualElement::scatter(loc.translate("Point Data"), points, ScatterStyle::default()).z(10));
    let x_end = (radius + 1.0) * slope.atan().cos();
    doc.push(
        VisualElement::line(
            loc.translate("Regression Line"),
            vec![(0.0, 0.0), (x_end, slope * x_end)],
            LineStyle {
                color: SILVER,
                width: 1.5,
                dash: LineDash::Solid,
            },
        )
        .z(8),
    );
    doc.push(
        VisualElement::new(
            loc.translate("Radial Arc"),
            ElementKind::Arc {
                center: (0.0, 0.0),
                width: 2.0 * radius,
                height: 2.0 * radius,
                start_deg: min_e.atan().to_degrees(),
                end_deg: max_e.atan().to_degrees(),
                style: reference.clone(),
            },
        )
        .z(2),
    );

    let mut labels: Vec<Annotation> = arc_ticks(min_e, max_e, opts.log_scale)
        .into_iter()
        .map(|t| {
            let theta = t.effect.atan();
            Annotation::at(
                t.label,
                radius * theta.cos() + LABEL_NUDGE,
                radius * theta.sin() + t.y_offset,
            )
        })
        .collect();
    let arc_label = if opts.log_scale {
        exponential_label(&opts.effect_label)
    } else {
        opts.effect_label.clone()
    };
    labels.push(Annotation::at(arc_label, radius, 2.0));
    doc.push(
        VisualElement::annotations(
            loc.translate("Radial Arc Labels"),
            labels,
            TextStyle {
                h_align: HAlign::Left,
                v_align: VAlign::Center,
                ..Default::default()
            },
        )
        .z(2),
    );
    doc.push(
        VisualElement::line(
            loc.translate("Vertical Axis Zero Line"),
            vec![(0.0, 0.0), (radius + 1.0, 0.0)],
            reference,
        )
        .z(2),
    );
    doc.caption = Caption::Radial {
        effect_label: opts.effect_label.clone(),
    };
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::ENGLISH;

    fn labels(ticks: &[ArcTick]) -> Vec<&str> {
        ticks.iter().map(|t| t.label.as_str()).collect()
    }

    #[test]
    fn linear_ticks_include_halves() {
        let ticks = arc_ticks(-1.2, 2.5, false);
        assert_eq!(labels(&ticks), vec!["-1", "0", "1", "2", "1/2", "-1/2"]);
        let offsets: Vec<f64> = ticks.iter().map(|t| t.y_offset).collect();
        assert_eq!(offsets, vec![-0.25, 0.0, 0.25, 0.25, -0.25, 0.25]);
    }

    #[test]
    fn log_ticks_use_reciprocals_and_thirds() {
        // ln(1/3) = -1.0986, ln(4) = 1.386
        let ticks = arc_ticks(-1.1, 1.4, true);
        assert_eq!(labels(&ticks), vec!["1/3", "1/2", "1", "2", "3", "4", "2/3", "3/2"]);
        assert!(ticks.iter().all(|t| t.effect >= -1.1 && t.effect <= 1.4));
        let offsets: Vec<f64> = ticks.iter().map(|t| t.y_offset).collect();
        assert_eq!(offsets, vec![-0.25, -0.25, 0.0, 0.25, 0.25, 0.25, -0.25, 0.25]);
    }

    fn arc_labels(doc: &ChartDocument) -> Vec<Annotation> {
        let id = doc.find("Radial Arc Labels").unwrap();
        match &doc.get(id).unwrap().kind {
            ElementKind::Annotations { items, .. } => items.clone(),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn regression_line_uses_the_given_slope() {
        let studies = vec![StudyEffect::new(0.5, 0.04), StudyEffect::new(0.1, 0.01)];
        // deliberately not the weighted mean of 0.18
        let doc = radial_plot(
            &studies,
            &RadialOptions {
                effect_label: "d".into(),
                log_scale: false,
                slope: 0.35,
                min_effect: -1.0,
                max_effect: 1.0,
            },
            &ENGLISH,
        )
        .unwrap();
        let id = doc.find("Regression Line").unwrap();
        let ElementKind::Polyline { vertices, .. } = &doc.get(id).unwrap().kind else {
            panic!("not a line")
        };
        assert!((vertices[1].1 / vertices[1].0 - 0.35).abs() < 1e-12);
        assert_eq!(doc.y_label, "Standardized d");
        assert_eq!(doc.x_label, "Precision");
        // bounds come from the options, so the ±1 ticks appear
        let texts: Vec<String> = arc_labels(&doc).into_iter().map(|a| a.text).collect();
        assert!(texts.contains(&"-1".to_string()) && texts.contains(&"1".to_string()));
        assert_eq!(texts.last().map(String::as_str), Some("d"));
    }

    #[test]
    fn log_mode_labels_the_arc_on_the_ratio_scale() {
        let studies = vec![StudyEffect::new(0.4, 0.02), StudyEffect::new(-0.2, 0.05)];
        let doc = radial_plot(
            &studies,
            &RadialOptions {
                effect_label: "lnRR".into(),
                log_scale: true,
                slope: 0.2,
                min_effect: -0.8,
                max_effect: 0.8,
            },
            &ENGLISH,
        )
        .unwrap();
        let labels = arc_labels(&doc);
        assert_eq!(labels.last().unwrap().text, "RR");
        assert_eq!(doc.y_label, "Standardized lnRR");
    }

    #[test]
    fn half_labels_sit_inside_their_neighbours() {
        let studies = vec![StudyEffect::new(0.3, 0.01)];
        let opts = RadialOptions {
            effect_label: "d".into(),
            slope: 0.3,
            min_effect: -0.6,
            max_effect: 0.6,
            ..Default::default()
        };
        let doc = radial_plot(&studies, &opts, &ENGLISH).unwrap();
        let radius = 10.0_f64.hypot(3.0) + 1.0;
        for a in arc_labels(&doc) {
            let (e, dy) = match a.text.as_str() {
                "1/2" => (0.5_f64, -0.25),
                "-1/2" => (-0.5_f64, 0.25),
                _ => continue,
            };
            assert!((a.anchor.1 - (radius * e.atan().sin() + dy)).abs() < 1e-12, "{}", a.text);
        }
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let studies = vec![StudyEffect::new(0.3, 0.01)];
        let opts = RadialOptions {
            slope: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            radial_plot(&studies, &opts, &ENGLISH),
            Err(ChartError::InvalidInput(_))
        ));
        let reversed = RadialOptions {
            min_effect: 1.0,
            max_effect: -1.0,
            ..Default::default()
        };
        assert!(radial_plot(&studies, &reversed, &ENGLISH).is_err());
    }

    #[test]
    fn arc_radius_clears_farthest_point() {
        let studies = vec![StudyEffect::new(0.3, 0.01), StudyEffect::new(-0.4, 0.04)];
        let opts = RadialOptions {
            slope: 0.16,
            min_effect: -0.4,
            max_effect: 0.3,
            ..Default::default()
        };
        let doc = radial_plot(&studies, &opts, &ENGLISH).unwrap();
        let id = doc.find("Radial Arc").unwrap();
        let ElementKind::Arc { width, start_deg, end_deg, .. } = &doc.get(id).unwrap().kind else {
            panic!("not an arc")
        };
        // farthest point is (10, 3)
        assert!((width / 2.0 - (109.0_f64.sqrt() + 1.0)).abs() < 1e-9);
        assert!((start_deg - (-0.4_f64).atan().to_degrees()).abs() < 1e-12);
        assert!((end_deg - 0.3_f64.atan().to_degrees()).abs() < 1e-12);
    }
}
