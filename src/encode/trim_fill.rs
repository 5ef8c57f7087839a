//! Trim-and-fill funnel: observed studies, the inferred "missing" studies,
//! and the mean before and after filling.

use super::{min_max, positive_variance};
use crate::caption::Caption;
use crate::chart::{ChartDocument, VisualElement};
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::StudyEffect;
use crate::style::{BLACK, Fill, LineDash, LineStyle, RED, SILVER, ScatterStyle};

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TrimFillInput {
    pub original: Vec<StudyEffect>,
    pub inferred: Vec<StudyEffect>,
    pub original_mean: f64,
    pub inferred_mean: f64,
    pub effect_label: String,
}

fn precision_points(studies: &[StudyEffect], offset: usize) -> Result<Vec<(f64, f64)>> {
    studies
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let v = positive_variance(&format!("study {}", i + offset), s.variance)?;
            Ok((s.effect, 1.0 / v.sqrt()))
        })
        .collect()
}

pub fn trim_fill_plot(input: &TrimFillInput, loc: &dyn Localizer) -> Result<ChartDocument> {
    let original = precision_points(&input.original, 0)?;
    let inferred = precision_points(&input.inferred, input.original.len())?;
    let (y0, y1) = min_max(original.iter().map(|p| p.1))
        .ok_or_else(|| ChartError::InvalidInput("trim and fill plot needs observed studies".into()))?;

    let mut doc = ChartDocument::new(input.effect_label.clone(), loc.translate("Precision (1/SE)"));
    let original = doc.push(
        VisualElement::scatter(
            loc.translate("Original Data"),
            original,
            ScatterStyle {
                fill: Fill::Solid(BLACK),
                edge: BLACK,
                ..Default::default()
            },
        )
        .z(5),
    );
    let inferred = doc.push(
        VisualElement::scatter(
            loc.translate("Inferred Data"),
            inferred,
            ScatterStyle {
                fill: Fill::None,
                edge: RED,
                ..Default::default()
            },
        )
        .z(5),
    );
    let mean_line = |key: &str, x: f64, color| {
        VisualElement::line(
            loc.translate(key),
            vec![(x, y0), (x, y1)],
            LineStyle {
                color,
                width: 1.0,
                dash: LineDash::Dashed,
            },
        )
        .z(1)
    };
    let original_mean = doc.push(mean_line("Original Mean", input.original_mean, SILVER));
    let inferred_mean = doc.push(mean_line("Inferred Mean", input.inferred_mean, RED));
    doc.caption = Caption::TrimFill {
        effect_label: input.effect_label.clone(),
        original,
        inferred,
        original_mean,
        inferred_mean,
    };
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisContext;
    use crate::locale::ENGLISH;

    fn input() -> TrimFillInput {
        TrimFillInput {
            original: vec![
                StudyEffect::new(0.4, 0.04),
                StudyEffect::new(0.6, 0.09),
                StudyEffect::new(0.3, 0.01),
            ],
            inferred: vec![StudyEffect::new(0.0, 0.09)],
            original_mean: 0.35,
            inferred_mean: 0.28,
            effect_label: "Fisher's z".into(),
        }
    }

    #[test]
    fn mean_lines_span_observed_precision() {
        let doc = trim_fill_plot(&input(), &ENGLISH).unwrap();
        let text = doc.export_text();
        assert!(text.contains("Line Data\nName\tInferred Mean\nx\ty\n0.28\t3.3333333333333335\n0.28\t10\n"));
        assert_eq!(doc.y_label, "Precision (1/SE)");
    }

    #[test]
    fn caption_describes_both_point_sets() {
        let doc = trim_fill_plot(&input(), &ENGLISH).unwrap();
        let text = doc.caption_text(&SynthesisContext::default());
        assert!(text.starts_with("Funnel plot of Fisher's z vs. precision"));
        assert!(text.contains("Original data are represented by black circles"));
        assert!(text.contains("open circles with a fire engine red border"));
        assert!(text.contains("Duval, S. and R. Tweedie (2000b)"));
    }

    #[test]
    fn no_observed_studies_is_an_error() {
        let empty = TrimFillInput::default();
        assert!(trim_fill_plot(&empty, &ENGLISH).is_err());
    }
}
