use serde::{Deserialize, Serialize};

/// Which analysis produced a set of forest rows.
///
/// Only the caption wording depends on this, plus whether the first row is
/// the aggregate mean of a basic analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AnalysisKind {
    /// Individual studies only.
    #[default]
    Studies,
    /// Aggregate mean in row 0, followed by the studies.
    Basic,
    Grouped {
        by: String,
    },
    Nested,
    Cumulative {
        order: String,
    },
    Jackknife,
}

impl AnalysisKind {
    /// True when row 0 is the aggregate mean rather than a study.
    pub fn has_aggregate_row(&self) -> bool {
        matches!(self, AnalysisKind::Basic)
    }
}

/// Visual treatment of forest-plot rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForestStyle {
    #[default]
    Plain,
    /// Marker area proportional to weight.
    Scaled,
    /// Interval line thickness proportional to weight.
    Thick,
    /// Density raindrops around each estimate.
    Rainforest,
}

/// MARC layout: studies only, mean on the shared axis, or mean in a panel above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarcStyle {
    #[default]
    StudiesOnly,
    MeanIncluded,
    MeanPanel,
}

impl MarcStyle {
    pub fn includes_mean(&self) -> bool {
        !matches!(self, MarcStyle::StudiesOnly)
    }
}

/// One row of a forest plot, as produced by the upstream analysis.
///
/// Numeric fields accept JSON numbers or numeric strings; empty strings and
/// `NA` read as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ForestRow {
    pub name: String,
    pub order: usize,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub sample_size: Option<f64>,
    pub mean: f64,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub median: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub variance: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub lower_ci: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub upper_ci: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub lower_bs_ci: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub upper_bs_ci: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub lower_bias_ci: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub upper_bias_ci: Option<f64>,
    /// Bootstrap replicate means; empty when no bootstrap was run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bootstrap_means: Vec<f64>,
}

impl ForestRow {
    /// Row with the fields every chart needs.
    pub fn new(name: impl Into<String>, order: usize, mean: f64, variance: f64, ci: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            order,
            mean,
            variance: Some(variance),
            lower_ci: Some(ci.0),
            upper_ci: Some(ci.1),
            ..Default::default()
        }
    }

    pub fn with_median(mut self, median: f64) -> Self {
        self.median = Some(median);
        self
    }

    /// Attach bootstrap limits `(lower, upper)`, bias-corrected limits and replicates.
    pub fn with_bootstrap(mut self, limits: (f64, f64), bias: (f64, f64), means: Vec<f64>) -> Self {
        self.lower_bs_ci = Some(limits.0);
        self.upper_bs_ci = Some(limits.1);
        self.lower_bias_ci = Some(bias.0);
        self.upper_bias_ci = Some(bias.1);
        self.bootstrap_means = means;
        self
    }
}

/// An effect size with its sampling variance (trim-and-fill, radial, histograms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StudyEffect {
    pub effect: f64,
    pub variance: f64,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub sample_size: Option<f64>,
}

impl StudyEffect {
    pub fn new(effect: f64, variance: f64) -> Self {
        Self {
            effect,
            variance,
            sample_size: None,
        }
    }
}

/// Serde helper: optional `f64` from a number, a numeric string, or a blank/`NA` marker.
fn de_opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct OptF64Visitor;

    impl<'de> Visitor<'de> for OptF64Visitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number, a numeric string, or a missing-value marker")
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v as f64))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("na") || t == "." {
                return Ok(None);
            }
            t.parse::<f64>().map(Some).map_err(E::custom)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D2>(self, d: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            d.deserialize_any(OptF64Visitor)
        }
    }

    deserializer.deserialize_any(OptF64Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forest_row_reads_numbers_strings_and_blanks() {
        let row: ForestRow = serde_json::from_str(
            r#"{"name":"A","order":1,"mean":0.4,"variance":"0.04","lower_ci":0.1,"upper_ci":null,"median":"NA"}"#,
        )
        .unwrap();
        assert_eq!(row.variance, Some(0.04));
        assert_eq!(row.lower_ci, Some(0.1));
        assert_eq!(row.upper_ci, None);
        assert_eq!(row.median, None);
        assert!(row.bootstrap_means.is_empty());
    }

    #[test]
    fn analysis_kind_tagging() {
        let k: AnalysisKind = serde_json::from_str(r#"{"kind":"grouped","by":"habitat"}"#).unwrap();
        assert_eq!(k, AnalysisKind::Grouped { by: "habitat".into() });
        assert!(AnalysisKind::Basic.has_aggregate_row());
        assert!(!AnalysisKind::Nested.has_aggregate_row());
    }

    #[test]
    fn builder_sets_bootstrap_fields() {
        let r = ForestRow::new("S", 0, 1.0, 0.5, (0.0, 2.0)).with_bootstrap((0.1, 1.9), (0.2, 1.8), vec![1.0]);
        assert_eq!(r.upper_bias_ci, Some(1.8));
        assert_eq!(r.bootstrap_means, vec![1.0]);
    }
}
