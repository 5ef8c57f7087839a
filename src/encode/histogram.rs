//! Histograms of effect sizes, optionally weighted per study.

use super::positive_variance;
use crate::caption::{Caption, HistogramWeighting};
use crate::chart::{ChartDocument, ElementKind, VisualElement};
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::models::StudyEffect;
use crate::stats;
use crate::style::HistogramStyle;

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramOptions {
    pub effect_label: String,
    pub weighting: HistogramWeighting,
    pub bins: usize,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            effect_label: String::new(),
            weighting: HistogramWeighting::None,
            bins: 10,
        }
    }
}

pub fn histogram_plot(
    studies: &[StudyEffect],
    opts: &HistogramOptions,
    loc: &dyn Localizer,
) -> Result<ChartDocument> {
    if studies.is_empty() {
        return Err(ChartError::InvalidInput("histogram needs at least one study".into()));
    }
    if opts.bins == 0 {
        return Err(ChartError::InvalidInput("histogram needs at least one bin".into()));
    }
    let values: Vec<f64> = studies.iter().map(|s| s.effect).collect();
    let weights = match opts.weighting {
        HistogramWeighting::None => None,
        HistogramWeighting::InverseVariance => Some(
            studies
                .iter()
                .enumerate()
                .map(|(i, s)| positive_variance(&format!("study {i}"), s.variance).map(|v| 1.0 / v))
                .collect::<Result<Vec<f64>>>()?,
        ),
        HistogramWeighting::SampleSize => Some(
            studies
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    s.sample_size.ok_or(ChartError::MissingField {
                        row: format!("study {i}"),
                        field: "sample_size",
                    })
                })
                .collect::<Result<Vec<f64>>>()?,
        ),
    };
    let (counts, edges) = stats::histogram(&values, weights.as_deref(), opts.bins);
    let y_key = if weights.is_some() { "Weighted Count" } else { "Count" };

    let mut doc = ChartDocument::new(opts.effect_label.clone(), loc.translate(y_key));
    doc.push(VisualElement::new(
        loc.translate("Bin Counts"),
        ElementKind::Histogram {
            edges,
            counts,
            style: HistogramStyle::default(),
        },
    ));
    doc.caption = Caption::Histogram {
        effect_label: opts.effect_label.clone(),
        weighting: opts.weighting,
    };
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::ENGLISH;

    fn studies() -> Vec<StudyEffect> {
        [(0.0, 0.5), (0.1, 0.25), (0.9, 0.5), (1.0, 1.0)]
            .iter()
            .map(|(e, v)| StudyEffect::new(*e, *v))
            .collect()
    }

    #[test]
    fn unweighted_counts() {
        let opts = HistogramOptions {
            effect_label: "d".into(),
            bins: 2,
            ..Default::default()
        };
        let doc = histogram_plot(&studies(), &opts, &ENGLISH).unwrap();
        assert_eq!(doc.y_label, "Count");
        let text = doc.export_text();
        assert!(text.contains("Histogram Data\nName\tBin Counts\ncount\tlower\tupper\n2\t0\t0.5\n2\t0.5\t1\n"));
    }

    #[test]
    fn inverse_variance_weights() {
        let opts = HistogramOptions {
            effect_label: "d".into(),
            weighting: HistogramWeighting::InverseVariance,
            bins: 2,
        };
        let doc = histogram_plot(&studies(), &opts, &ENGLISH).unwrap();
        assert_eq!(doc.y_label, "Weighted Count");
        let ElementKind::Histogram { counts, .. } = &doc.get(doc.find("Bin Counts").unwrap()).unwrap().kind else {
            panic!("not a histogram")
        };
        assert_eq!(counts, &vec![6.0, 3.0]);
    }

    #[test]
    fn sample_size_weighting_requires_sizes() {
        let opts = HistogramOptions {
            weighting: HistogramWeighting::SampleSize,
            ..Default::default()
        };
        assert!(matches!(
            histogram_plot(&studies(), &opts, &ENGLISH),
            Err(ChartError::MissingField { .. })
        ));
    }
}
