//! Encoding algorithms: analysis results in, [`ChartDocument`] out.
//!
//! Each encoder validates its input, lays out every visual element, links
//! symmetric pairs and binds the caption. Nothing here draws; the result is
//! handed to [`crate::render`] or exported as text.
//!
//! [`ChartDocument`]: crate::chart::ChartDocument

pub mod forest;
pub mod funnel;
pub mod histogram;
pub mod marc;
pub mod radial;
pub mod regression;
pub mod trim_fill;

pub use forest::{ForestOptions, forest_plot};
pub use funnel::{FunnelOptions, PrecisionMetric, funnel_plot};
pub use histogram::{HistogramOptions, histogram_plot};
pub use marc::marc_plot;
pub use radial::{RadialOptions, radial_plot};
pub use regression::{
    LinearFit, MetaRegressionOptions, StandardRegressionOptions, meta_regression_plot,
    normal_quantile_plot, normal_quantile_points, scatter_plot, standard_regression_plot,
};
pub use trim_fill::{TrimFillInput, trim_fill_plot};

use crate::chart::{ChartDocument, ElementId, VisualElement};
use crate::error::{ChartError, Result};
use crate::models::ForestRow;

/// `(min, max)` of a sequence, `None` when empty.
pub(crate) fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Push two elements and make the second mirror the first.
pub(crate) fn push_linked(
    doc: &mut ChartDocument,
    primary: VisualElement,
    secondary: VisualElement,
) -> Result<(ElementId, ElementId)> {
    let a = doc.push(primary);
    let b = doc.push(secondary);
    doc.link(a, b)?;
    Ok((a, b))
}

/// Variance of a row, which every weighted chart needs and must be positive.
pub(crate) fn require_variance(row: &ForestRow) -> Result<f64> {
    let v = row.variance.ok_or_else(|| ChartError::MissingField {
        row: row.name.clone(),
        field: "variance",
    })?;
    positive_variance(&row.name, v)
}

pub(crate) fn positive_variance(row: &str, v: f64) -> Result<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(ChartError::InvalidInput(format!(
            "row {row:?} has non-positive variance {v}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_of_empty_is_none() {
        assert_eq!(min_max(Vec::<f64>::new()), None);
        assert_eq!(min_max([3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
    }

    #[test]
    fn missing_variance_names_the_row() {
        let mut row = ForestRow::new("Smith 2004", 0, 0.3, 0.1, (0.0, 0.6));
        row.variance = None;
        assert_eq!(
            require_variance(&row),
            Err(ChartError::MissingField {
                row: "Smith 2004".into(),
                field: "variance"
            })
        );
        row.variance = Some(0.0);
        assert!(matches!(require_variance(&row), Err(ChartError::InvalidInput(_))));
    }
}
