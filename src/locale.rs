//! Localized text lookup and bibliographic citations.
//!
//! Captions and element names are looked up by key through a [`Localizer`].
//! The built-in [`English`] catalog covers every key the encoders and
//! captions use; unknown keys come back unchanged (with a warning) so a
//! missing translation degrades to readable text instead of failing.

use log::warn;

/// A reference: the full bibliographic entry and the short in-text form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citation {
    pub text: String,
    pub short: String,
}

/// Text lookup service consumed by caption synthesis and the encoders.
pub trait Localizer {
    /// Text for `key`, or `key` itself when the catalog has no entry.
    fn translate(&self, key: &str) -> String;

    /// Citation for a reference key such as `"Adams_et_1997"`.
    fn cite(&self, key: &str) -> Citation;
}

/// The built-in English catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct English;

/// Shared instance, handy for `&'static dyn Localizer` defaults.
pub static ENGLISH: English = English;

impl Localizer for English {
    fn translate(&self, key: &str) -> String {
        match english_text(key) {
            Some(t) => t.to_string(),
            None => {
                warn!("English catalog is missing text for key {key:?}");
                key.to_string()
            }
        }
    }

    fn cite(&self, key: &str) -> Citation {
        match REFERENCES.iter().find(|(k, _, _)| *k == key) {
            Some((_, text, short)) => Citation {
                text: (*text).to_string(),
                short: (*short).to_string(),
            },
            None => {
                warn!("no reference registered under {key:?}");
                Citation {
                    text: key.to_string(),
                    short: key.to_string(),
                }
            }
        }
    }
}

/// `"\n\nReferences\n"` followed by one full reference per line, or an empty
/// string when `keys` is empty.
pub fn reference_list(loc: &dyn Localizer, keys: &[&str]) -> String {
    if keys.is_empty() {
        return String::new();
    }
    let mut out = format!("\n\n{}\n", loc.translate("References"));
    let entries: Vec<String> = keys.iter().map(|k| loc.cite(k).text).collect();
    out.push_str(&entries.join("\n"));
    out
}

fn english_text(key: &str) -> Option<&'static str> {
    Some(match key {
        // element names
        "Line of No Effect" => "Line of No Effect",
        "Lines of No Effect and Weight" => "Lines of No Effect and Weight",
        "Confidence Intervals" => "Confidence Intervals",
        "Means" => "Means",
        "Medians" => "Medians",
        "PDF Raindrops" => "PDF Raindrops",
        "Vertical Axis Tick Labels" => "Vertical Axis Tick Labels",
        "Bootstrap Confidence Limits" => "Bootstrap Confidence Limits",
        "Bias-corrected Bootstrap Confidence Limits" => "Bias-corrected Bootstrap Confidence Limits",
        "Bootstrap Distribution" => "Bootstrap Distribution",
        "Point Data" => "Point Data",
        "Regression Line" => "Regression Line",
        "Prediction Limits" => "Prediction Limits",
        "Axes Means" => "Axes' Means",
        "Radial Arc" => "Radial Arc",
        "Radial Arc Labels" => "Radial Arc Labels",
        "Vertical Axis Zero Line" => "Vertical Axis Zero Line",
        "Original Data" => "Original Data",
        "Inferred Data" => "Inferred Data",
        "Original Mean" => "Original Mean",
        "Inferred Mean" => "Inferred Mean",
        "Mean Effect Size" => "Mean Effect Size",
        "Pseudo-Confidence Limits" => "Pseudo-Confidence Limits",
        "Power Color Scheme" => "Power Color Scheme",
        "Negative Background" => "Negative Background",
        "Positive Background" => "Positive Background",
        "Bin Counts" => "Bin Counts",
        "Simulated Effects" => "Simulated Effects",
        "Summary Banner" => "Summary Banner",
        "Weight Legend" => "Weight Legend",
        "Effect Direction Labels" => "Effect Direction Labels",
        "Cloud Annotation" => "Cloud Annotation",
        "p < 0.01 Zone" => "p < 0.01 Zone",
        "0.01 < p < 0.05 Zone" => "0.01 < p < 0.05 Zone",
        "0.05 < p < 0.10 Zone" => "0.05 < p < 0.10 Zone",
        "Branches" => "Branches",
        "Tip Labels" => "Tip Labels",
        // axis and legend labels
        "Relative Weight" => "Relative Weight",
        "Precision" => "Precision",
        "Standardized" => "Standardized",
        "Count" => "Count",
        "Weighted Count" => "Weighted Count",
        "Power" => "Power",
        "Effect Size" => "Effect Size",
        "Normal Quantile" => "Normal Quantile",
        "Standardized Effect Size" => "Standardized Effect Size",
        "Precision (1/SE)" => "Precision (1/SE)",
        "forest_means_label" => "mean and {} CI",
        "More certain" => "More certain",
        "Less certain" => "Less certain",
        "Negative Effect" => "Negative Effect",
        "Positive Effect" => "Positive Effect",
        "standard error" => "standard error",
        "variance" => "variance",
        "precision" => "precision",
        "sample size" => "sample size",
        "References" => "References",
        // style phrases
        "nothing (marker is invisible)" => "nothing (marker is invisible)",
        "marker_style_text" => "{} {} with a {} border",
        "marker_style_open_text" => "open {} with a {} border",
        "line_style_text" => "{} {} line",
        // forest captions
        "study_forest_caption" => "Forest plot of individual effect sizes for each study.",
        "basic_forest_caption" => {
            "Forest plot of individual effect sizes for each study, as well as the overall mean."
        }
        "group_forest_plot" => {
            "Forest plot of effect sizes for the mean of all studies, as well as subgroups of studies \
             designated by {}."
        }
        "nest_caption" => {
            "Forest plot of effect sizes for the mean of all studies as well as nested subgroups. \
             Arrows in front of labels along the y-axis indicate the degree of nesting."
        }
        "cumulative_forest_plot" => {
            "Forest plot of effect sizes from a cumulative meta-analysis, ranging from the fewest \
             studies at the top to the most at the bottom, ordered by {}."
        }
        "jackknife_forest_plot" => {
            "Forest plot of mean effect sizes from a jackknife meta-analysis, with the summary \
             repeated with each study removed, one by one."
        }
        "forest_plot_common_caption1" => {
            " Effect size measured as {}. The vertical {} represents no effect."
        }
        "study_forest_plot_extra" => {
            " Study effect sizes are indicated by {}, with the corresponding line the {} \
             confidence interval based on a Normal distribution."
        }
        "basic_analysis_forest_plot_extra" => {
            " Study and mean effect sizes are indicated by {}, with the corresponding line the {} \
             confidence interval based on {}."
        }
        "mid_forest_plot_caption" => {
            " Mean effect sizes are indicated by {}, with the corresponding line the {} confidence \
             interval based on {}."
        }
        "forest_plot_median_caption" => " Medians are represented by {}.",
        "forest plot scaled means" => " The size of the marker is proportional to the study weight.",
        "forest plot thick" => {
            " The height (thickness) of the line indicating the confidence interval is proportional \
             to the study weight, after {}."
        }
        "rainforest plot" => {
            " The oblong shapes illustrate the probability density around the effect size, \
             represented by both the shape and color of the raindrop, after {}."
        }
        "forest mean scale" => {
            " The mean effect size is scaled as the average weight across the studies."
        }
        "forest mean scale maximum" => {
            " The mean effect size is scaled as the largest weight across the studies."
        }
        "forest mean scale own" => " The mean effect size is scaled by its own weight.",
        "normal_ci_dist" => "the Normal distribution",
        "t_ci_dist" => "Student's t distribution",
        "mixed_ci_dist" => {
            "Student's t distribution for the mean and the Normal distribution for the individual \
             studies"
        }
        "bootstrap_caption" => {
            " Confidence intervals from a boostrap ({} iterations) procedure, following {}, are \
             indicated by {}; the bias-corrected bootstrap interval is indicated by {}; and the \
             full distribution of the bootstrapped values are indicated by the {} raindrop."
        }
        // funnel captions
        "funnel_plot_caption" => "Funnel plot of {} vs. {}. The {} represents the mean effect size.",
        "funnel_pseudo_ci_style" => {
            " The {} represents the 95% pseudo-confidence interval of the funnel, after {}."
        }
        "funnel_contour_style" => {
            " The {} zone represents the area where effect sizes would have a probability of less \
             than 1%, the {} zone a probability between 1 and 5%, and the {} zone a probability \
             between 5 and 10%, after {}."
        }
        "funnel_sunset_style" => {
            " The background colors indicate the power of an individual study to detect an \
             underlying true effect equal to the mean, after {}."
        }
        // other chart kinds
        "normal_quantile_caption" => {
            "Normal Quantile plot following {}. The standardized effect size is the effect size \
             divided by the square-root of its variance. "
        }
        "normal_quantile_style" => {
            "The {} represents the regression and the {}s the 95% prediction envelope."
        }
        "scatter_caption" => "Scatter plot of {} vs. {}.",
        "histogram_caption" => "Histogram of {} from individual studies.",
        "histogram_inverse_variance" => {
            " Counts were weighted by the inverse of the variance of each effect size."
        }
        "histogram_sample_size" => {
            " Counts were weighted by a sample size associated with each effect size."
        }
        "Radial_chart_caption" => {
            "Radial chart (Galbraith 1988, 1994) of standardized {} vs. precision. A line from the \
             origin through any point intersects the curve at the effect size for that point. The \
             regression line intersects the curve at the mean effect size."
        }
        "metaregression_caption" => {
            "Plot of {} vs. {}, with a {} meta-analytic linear regression following the methods of {}."
        }
        "stndregression_caption" => "Plot of {} vs. {}, under a {} model.",
        "trim_fill_caption" => {
            "Funnel plot of {} vs. precision, showing the results of a Trim and Fill Analysis ({}). \
             Original data are represented by {}, inferred \"missing\" data by {}. The {} represents \
             the mean effect size of the original data, the {} the mean effect size including the \
             inferred data."
        }
        // MARC
        "SUMMARY OF THE EVIDENCE:" => "SUMMARY OF THE EVIDENCE:",
        "MARC_summary_label" => "Average effect = {}\nWeight 1.0",
        "MARC_point_annotation" => {
            "One out of 10,000+ possible values of the true effect size,\nbased on the existing \
             evidence.\n{} of the values fall between {} and {},\nwith an average value of {}."
        }
        "marc_mean_phrase" => " and the mean",
        "marc_caption1" => {
            "Meta-analytic rain cloud plot of effect sizes for each study{}. Effect size is \
             indicated by position on the horizontal axis and the relative weight of the study is \
             indicated by both the position on the vertical axis and the size of the marker."
        }
        "marc_caption2" => {
            " Other plausible values of the true effect size are simulated based on the existing \
             evidence and uncertainty and displayed as a cloud of small points around the marker \
             of the mean."
        }
        _ => return None,
    })
}

/// Reference key, full entry, short in-text form.
static REFERENCES: &[(&str, &str, &str)] = &[
    (
        "Adams_et_1997",
        "Adams, D.C., J. Gurevitch, and M.S. Rosenberg (1997) Resampling tests for meta-analysis \
         of ecological data. Ecology 78:1277\u{2013}1283.",
        "Adams et al. (1997)",
    ),
    (
        "Schild_Voracek_2014",
        "Schild, A.H.E., and M. Voracek (2014) Finding your way out of the forest without a trail \
         of bread crumbs: Development and evaluation of two novel displays of forest plots. \
         Research Synthesis Methods 6:74\u{2013}86.",
        "Schild and Voracek (2014)",
    ),
    (
        "Duval_Tweedie_2000a",
        "Duval, S. and R. Tweedie (2000a) A nonparametric \"trim and fill\" method of accounting \
         for publication bias in meta-analysis. Journal of the American Statistical Association \
         95(449):89\u{2013}98.",
        "Duval and Tweedie (2000a)",
    ),
    (
        "Duval_Tweedie_2000b",
        "Duval, S. and R. Tweedie (2000b) Trim and fill: A simple funnel-plot-based method of \
         testing and adjusting for publication bias in meta-analysis. Biometrics \
         56:455\u{2013}463.",
        "Duval and Tweedie (2000b)",
    ),
    (
        "Wang_and_Bushman_1998",
        "Wang, M.C., and B.J. Bushman (1998) Using the normal quantile plot to explore \
         meta-analytic data sets. Psychological Methods 3:46\u{2013}54.",
        "Wang and Bushman (1998)",
    ),
    (
        "Light_Pillemer_1984",
        "Light, R.J., and D.B. Pillemer (1984) Summing Up: The Science of Reviewing Research. \
         Harvard University Press, Cambridge, MA.",
        "Light and Pillemer (1984)",
    ),
    (
        "Sterne_Egger_2001",
        "Sterne, J.A.C., and M. Egger (2001) Funnel plots for detecting bias in meta-analysis: \
         Guidelines on choice of axis. Journal of Clinical Epidemiology 54:1046\u{2013}1055.",
        "Sterne and Egger (2001)",
    ),
    (
        "Peters_et_2008",
        "Peters, J.L., A.J. Sutton, D.R. Jones, K.R. Abrams, and L. Rushton (2008) \
         Contour-enhanced meta-analysis funnel plots help distinguish publication bias from other \
         causes of asymmetry. Journal of Clinical Epidemiology 61:991\u{2013}996.",
        "Peters et al. (2008)",
    ),
    (
        "Kossmeier_et_2020",
        "Kossmeier, M., U.S. Tran, and M. Voracek (2020) Power-enhanced funnel plots for \
         meta-analysis: The sunset funnel plot. Zeitschrift f\u{fc}r Psychologie \
         228:43\u{2013}49.",
        "Kossmeier et al. (2020)",
    ),
    (
        "Fitzgerald_Tipton_2022",
        "Fitzgerald, K.G., and E. Tipton (2022) The meta-analytic rain cloud plot: A new approach \
         to visualizing clearinghouse data. Journal of Research on Educational Effectiveness \
         15:848\u{2013}875.",
        "Fitzgerald and Tipton (2022)",
    ),
    (
        "Fitzgerald_et_2025",
        "Fitzgerald, K.G., D. Khella, A. Charles, and E. Tipton (2025) Meta-analytic rain cloud \
         plots: Improving evidence communication through data visualization design science. \
         Research Synthesis Methods.",
        "Fitzgerald et al. (2025)",
    ),
    (
        "Hedges_Olkin_1985",
        "Hedges, L.V. and I. Olkin (1985) Statistical Methods for Meta-analysis. Academic Press, \
         Orlando, FL.",
        "Hedges and Olkin (1985)",
    ),
    (
        "Galbraith_1988",
        "Galbraith, R.F. (1988) A note on graphical presentation of estimated odds ratios from \
         several clinical trials. Statistics in Medicine 7:889\u{2013}894.",
        "Galbraith (1988)",
    ),
    (
        "Galbraith_1994",
        "Galbraith, R.F. (1994) Some applications of radial plots. Journal of the American \
         Statistical Association 89:1232\u{2013}1242.",
        "Galbraith (1994)",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_translate() {
        assert_eq!(English.translate("Axes Means"), "Axes' Means");
        assert_eq!(English.translate("t_ci_dist"), "Student's t distribution");
    }

    #[test]
    fn unknown_keys_fall_back_to_the_key() {
        assert_eq!(English.translate("no such key"), "no such key");
        let c = English.cite("Nobody_2099");
        assert_eq!(c.short, "Nobody_2099");
    }

    #[test]
    fn citations_have_short_forms() {
        let c = English.cite("Adams_et_1997");
        assert_eq!(c.short, "Adams et al. (1997)");
        assert!(c.text.starts_with("Adams, D.C."));
    }

    #[test]
    fn reference_list_layout() {
        assert_eq!(reference_list(&English, &[]), "");
        let refs = reference_list(&English, &["Light_Pillemer_1984", "Sterne_Egger_2001"]);
        assert!(refs.starts_with("\n\nReferences\nLight, R.J."));
        assert_eq!(refs.lines().count(), 5);
    }
}
