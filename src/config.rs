//! Chart configuration and the synthesis context threaded into captions.
//!
//! Every key has a default, so an empty JSON object is a valid config:
//!
//! ```rust
//! use metaplot::config::ChartConfig;
//!
//! let cfg: ChartConfig = serde_json::from_str(r#"{"alpha": 0.01}"#).unwrap();
//! assert_eq!(cfg.alpha, 0.01);
//! assert_eq!(cfg.forest_step, 10.0);
//! cfg.validate().unwrap();
//! ```

use crate::color_names::ColorNameSpace;
use crate::error::{ChartError, Result};
use crate::locale::{ENGLISH, Localizer};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Distribution behind the confidence intervals around means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CiDistribution {
    #[default]
    Normal,
    StudentsT,
}

/// Weight shown for the aggregate row of a basic analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregateWeight {
    /// Mean of the study weights.
    #[default]
    StudyAverage,
    /// Largest study weight.
    StudyMaximum,
    /// The aggregate's own inverse variance.
    Own,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub alpha: f64,
    pub ci_distribution: CiDistribution,
    pub color_name_space: ColorNameSpace,
    pub forest_step: f64,
    pub aggregate_weight: AggregateWeight,
    pub marc_weight_floor: f64,
    pub marc_cloud_points: usize,
    pub funnel_curve_points: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            ci_distribution: CiDistribution::Normal,
            color_name_space: ColorNameSpace::Xkcd,
            forest_step: 10.0,
            aggregate_weight: AggregateWeight::StudyAverage,
            marc_weight_floor: 0.1,
            marc_cloud_points: 250,
            funnel_curve_points: 50,
        }
    }
}

impl ChartConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: ChartConfig = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ChartError::InvalidInput(format!(
                "alpha must lie strictly between 0 and 1, got {}",
                self.alpha
            )));
        }
        if !(self.forest_step.is_finite() && self.forest_step > 0.0) {
            return Err(ChartError::InvalidInput(format!(
                "forest_step must be positive, got {}",
                self.forest_step
            )));
        }
        if !(self.marc_weight_floor.is_finite() && self.marc_weight_floor > 0.0) {
            return Err(ChartError::InvalidInput(format!(
                "marc_weight_floor must be positive, got {}",
                self.marc_weight_floor
            )));
        }
        if self.marc_cloud_points == 0 {
            return Err(ChartError::InvalidInput(
                "marc_cloud_points must be at least 1".into(),
            ));
        }
        if self.funnel_curve_points < 2 {
            return Err(ChartError::InvalidInput(
                "funnel_curve_points must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Context for caption synthesis using the built-in English catalog.
    pub fn synthesis_context(&self) -> SynthesisContext<'static> {
        SynthesisContext::new(&ENGLISH, self.color_name_space)
    }
}

/// What caption synthesis and style descriptions need beyond the document:
/// a text catalog and the color name space used to name colors.
#[derive(Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub localizer: &'a dyn Localizer,
    pub names: ColorNameSpace,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(localizer: &'a dyn Localizer, names: ColorNameSpace) -> Self {
        Self { localizer, names }
    }

    pub fn text(&self, key: &str) -> String {
        self.localizer.translate(key)
    }
}

impl Default for SynthesisContext<'static> {
    fn default() -> Self {
        Self::new(&ENGLISH, ColorNameSpace::default())
    }
}

impl std::fmt::Debug for SynthesisContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisContext")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_validate() {
        ChartConfig::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cfg = ChartConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ChartError::InvalidInput(_))));
        let cfg = ChartConfig {
            funnel_curve_points: 1,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_partial_json() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"color_name_space": "css4", "ci_distribution": "students_t"}}"#).unwrap();
        let cfg = ChartConfig::load(f.path()).unwrap();
        assert_eq!(cfg.color_name_space, ColorNameSpace::Css4);
        assert_eq!(cfg.ci_distribution, CiDistribution::StudentsT);
        assert_eq!(cfg.marc_cloud_points, 250);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"alpha": 0}}"#).unwrap();
        assert!(ChartConfig::load(f.path()).is_err());
    }
}
