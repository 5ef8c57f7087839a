//! Captions bound to a chart document.
//!
//! A [`Caption`] stores element ids and scalar parameters only. The text is
//! rebuilt on every call to [`Caption::synthesize`] from the elements'
//! current styles, so restyling an element is reflected immediately.

use crate::chart::{ChartDocument, ElementId};
use crate::config::{AggregateWeight, CiDistribution, SynthesisContext};
use crate::locale::reference_list;
use crate::models::{AnalysisKind, ForestStyle};
use crate::text::{fill_template, format_count, format_percent};

/// Elements drawn for a bootstrap analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapRefs {
    pub iterations: u64,
    pub limits: ElementId,
    pub bias_corrected: ElementId,
    pub distribution: ElementId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForestCaption {
    pub analysis: AnalysisKind,
    pub style: ForestStyle,
    pub effect_label: String,
    pub alpha: f64,
    pub ci_distribution: CiDistribution,
    pub aggregate_weight: AggregateWeight,
    pub no_effect: ElementId,
    pub means: ElementId,
    pub medians: Option<ElementId>,
    pub bootstrap: Option<BootstrapRefs>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunnelCaption {
    pub mean_line: ElementId,
    pub pseudo_ci: Option<ElementId>,
    /// Outermost (p < 0.01) zone first.
    pub contours: Option<[ElementId; 3]>,
    pub power: bool,
}

/// How histogram counts were weighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HistogramWeighting {
    #[default]
    None,
    InverseVariance,
    SampleSize,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Caption {
    #[default]
    Empty,
    Forest(ForestCaption),
    Marc {
        includes_mean: bool,
    },
    Funnel(FunnelCaption),
    NormalQuantile {
        regression: ElementId,
        prediction: ElementId,
    },
    /// Uses the document's axis labels.
    Scatter,
    Histogram {
        effect_label: String,
        weighting: HistogramWeighting,
    },
    Radial {
        effect_label: String,
    },
    MetaRegression {
        effect_label: String,
        independent_label: String,
        model: String,
        /// Reference keys of the fitting method.
        citations: Vec<String>,
    },
    StandardRegression {
        model: String,
    },
    TrimFill {
        effect_label: String,
        original: ElementId,
        inferred: ElementId,
        original_mean: ElementId,
        inferred_mean: ElementId,
    },
}

impl Caption {
    pub fn synthesize(&self, doc: &ChartDocument, ctx: &SynthesisContext<'_>) -> String {
        let loc = ctx.localizer;
        let desc = |id: ElementId| doc.describe(id, ctx);
        match self {
            Caption::Empty => String::new(),
            Caption::Forest(c) => forest_text(c, doc, ctx),
            Caption::Marc { includes_mean } => {
                let phrase = if *includes_mean {
                    ctx.text("marc_mean_phrase")
                } else {
                    String::new()
                };
                let mut out = fill_template(&ctx.text("marc_caption1"), &[&phrase]);
                if *includes_mean {
                    out.push_str(&ctx.text("marc_caption2"));
                }
                out + &reference_list(loc, &["Fitzgerald_Tipton_2022", "Fitzgerald_et_2025"])
            }
            Caption::Funnel(c) => {
                let mut refs = vec!["Light_Pillemer_1984"];
                let mut out = fill_template(
                    &ctx.text("funnel_plot_caption"),
                    &[&doc.x_label, &doc.y_label, &desc(c.mean_line)],
                );
                if let Some(id) = c.pseudo_ci {
                    let cite = loc.cite("Sterne_Egger_2001").short;
                    out += &fill_template(&ctx.text("funnel_pseudo_ci_style"), &[&desc(id), &cite]);
                    refs.push("Sterne_Egger_2001");
                }
                if let Some([outer, mid, inner]) = c.contours {
                    let cite = loc.cite("Peters_et_2008").short;
                    out += &fill_template(
                        &ctx.text("funnel_contour_style"),
                        &[&desc(outer), &desc(mid), &desc(inner), &cite],
                    );
                    refs.push("Peters_et_2008");
                }
                if c.power {
                    let cite = loc.cite("Kossmeier_et_2020").short;
                    out += &fill_template(&ctx.text("funnel_sunset_style"), &[&cite]);
                    refs.push("Kossmeier_et_2020");
                }
                out + &reference_list(loc, &refs)
            }
            Caption::NormalQuantile {
                regression,
                prediction,
            } => {
                let cite = loc.cite("Wang_and_Bushman_1998").short;
                fill_template(&ctx.text("normal_quantile_caption"), &[&cite])
                    + &fill_template(
                        &ctx.text("normal_quantile_style"),
                        &[&desc(*regression), &desc(*prediction)],
                    )
                    + &reference_list(loc, &["Wang_and_Bushman_1998"])
            }
            Caption::Scatter => {
                fill_template(&ctx.text("scatter_caption"), &[&doc.y_label, &doc.x_label])
            }
            Caption::Histogram {
                effect_label,
                weighting,
            } => {
                let mut out = fill_template(&ctx.text("histogram_caption"), &[effect_label]);
                match weighting {
                    HistogramWeighting::None => {}
                    HistogramWeighting::InverseVariance => {
                        out.push_str(&ctx.text("histogram_inverse_variance"))
                    }
                    HistogramWeighting::SampleSize => out.push_str(&ctx.text("histogram_sample_size")),
                }
                out
            }
            Caption::Radial { effect_label } => {
                fill_template(&ctx.text("Radial_chart_caption"), &[effect_label])
                    + &reference_list(loc, &["Galbraith_1988", "Galbraith_1994"])
            }
            Caption::MetaRegression {
                effect_label,
                independent_label,
                model,
                citations,
            } => {
                let shorts: Vec<String> = citations.iter().map(|k| loc.cite(k).short).collect();
                let keys: Vec<&str> = citations.iter().map(String::as_str).collect();
                fill_template(
                    &ctx.text("metaregression_caption"),
                    &[effect_label, independent_label, model, &shorts.join(", ")],
                ) + &reference_list(loc, &keys)
            }
            Caption::StandardRegression { model } => fill_template(
                &ctx.text("stndregression_caption"),
                &[&doc.y_label, &doc.x_label, model],
            ),
            Caption::TrimFill {
                effect_label,
                original,
                inferred,
                original_mean,
                inferred_mean,
            } => {
                fill_template(
                    &ctx.text("trim_fill_caption"),
                    &[
                        effect_label,
                        "Duval and Tweedie 2000a, b",
                        &desc(*original),
                        &desc(*inferred),
                        &desc(*original_mean),
                        &desc(*inferred_mean),
                    ],
                ) + &reference_list(loc, &["Duval_Tweedie_2000a", "Duval_Tweedie_2000b"])
            }
        }
    }
}

fn forest_text(c: &ForestCaption, doc: &ChartDocument, ctx: &SynthesisContext<'_>) -> String {
    let loc = ctx.localizer;
    let pct = format_percent(1.0 - c.alpha, 0);
    let means = doc.describe(c.means, ctx);
    let mut refs: Vec<&str> = Vec::new();

    let heading = match &c.analysis {
        AnalysisKind::Studies => ctx.text("study_forest_caption"),
        AnalysisKind::Basic => ctx.text("basic_forest_caption"),
        AnalysisKind::Grouped { by } => fill_template(&ctx.text("group_forest_plot"), &[by]),
        AnalysisKind::Nested => ctx.text("nest_caption"),
        AnalysisKind::Cumulative { order } => {
            fill_template(&ctx.text("cumulative_forest_plot"), &[order])
        }
        AnalysisKind::Jackknife => ctx.text("jackknife_forest_plot"),
    };
    let mut out = heading;
    out += &fill_template(
        &ctx.text("forest_plot_common_caption1"),
        &[&c.effect_label, &doc.describe(c.no_effect, ctx)],
    );

    let dist = |studies_differ: bool| match (c.ci_distribution, studies_differ) {
        (CiDistribution::Normal, _) => ctx.text("normal_ci_dist"),
        (CiDistribution::StudentsT, true) => ctx.text("mixed_ci_dist"),
        (CiDistribution::StudentsT, false) => ctx.text("t_ci_dist"),
    };
    match &c.analysis {
        AnalysisKind::Studies => {
            out += &fill_template(&ctx.text("study_forest_plot_extra"), &[&means, &pct]);
        }
        AnalysisKind::Basic => {
            out += &fill_template(
                &ctx.text("basic_analysis_forest_plot_extra"),
                &[&means, &pct, &dist(true)],
            );
        }
        _ => {
            out += &fill_template(&ctx.text("mid_forest_plot_caption"), &[&means, &pct, &dist(false)]);
        }
    }

    match c.style {
        ForestStyle::Plain => {}
        ForestStyle::Scaled => out += &ctx.text("forest plot scaled means"),
        ForestStyle::Thick | ForestStyle::Rainforest => {
            let key = if c.style == ForestStyle::Thick {
                "forest plot thick"
            } else {
                "rainforest plot"
            };
            let cite = loc.cite("Schild_Voracek_2014").short;
            out += &fill_template(&ctx.text(key), &[&cite]);
            refs.push("Schild_Voracek_2014");
        }
    }
    if c.analysis.has_aggregate_row() && c.style != ForestStyle::Plain {
        out += &ctx.text(match c.aggregate_weight {
            AggregateWeight::StudyAverage => "forest mean scale",
            AggregateWeight::StudyMaximum => "forest mean scale maximum",
            AggregateWeight::Own => "forest mean scale own",
        });
    }

    if let Some(id) = c.medians {
        out += &fill_template(
            &ctx.text("forest_plot_median_caption"),
            &[&doc.describe(id, ctx)],
        );
    }
    if let Some(b) = &c.bootstrap {
        let cite = loc.cite("Adams_et_1997").short;
        out += &fill_template(
            &ctx.text("bootstrap_caption"),
            &[
                &format_count(b.iterations),
                &cite,
                &doc.describe(b.limits, ctx),
                &doc.describe(b.bias_corrected, ctx),
                &doc.describe(b.distribution, ctx),
            ],
        );
        refs.push("Adams_et_1997");
    }
    out + &reference_list(loc, &refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::VisualElement;
    use crate::style::{LineDash, LineStyle, SILVER, StyleEdit};

    #[test]
    fn scatter_caption_reads_axis_labels() {
        let mut doc = ChartDocument::new("Temperature", "Effect");
        doc.caption = Caption::Scatter;
        assert_eq!(
            doc.caption_text(&SynthesisContext::default()),
            "Scatter plot of Effect vs. Temperature."
        );
    }

    #[test]
    fn histogram_weighting_sentence() {
        let doc = ChartDocument::new("x", "y");
        let cap = Caption::Histogram {
            effect_label: "Hedges' d".into(),
            weighting: HistogramWeighting::InverseVariance,
        };
        let text = cap.synthesize(&doc, &SynthesisContext::default());
        assert!(text.starts_with("Histogram of Hedges' d from individual studies. Counts were weighted"));
    }

    #[test]
    fn funnel_caption_follows_restyled_mean_line() {
        let mut doc = ChartDocument::new("Effect", "standard error");
        let mean = doc.push(VisualElement::line(
            "Mean",
            vec![(0.2, 0.0), (0.2, 1.0)],
            LineStyle {
                color: SILVER,
                width: 1.0,
                dash: LineDash::Dotted,
            },
        ));
        doc.caption = Caption::Funnel(FunnelCaption {
            mean_line: mean,
            pseudo_ci: None,
            contours: None,
            power: true,
        });
        let ctx = SynthesisContext::default();
        let before = doc.caption_text(&ctx);
        assert!(before.contains("The dotted silver line represents the mean effect size."));
        assert!(before.contains("Kossmeier et al. (2020)"));
        assert!(before.contains("\n\nReferences\nLight, R.J."));

        doc.apply_style(mean, &StyleEdit::new().dash(LineDash::Dashed)).unwrap();
        assert!(doc.caption_text(&ctx).contains("The dashed silver line"));
    }

    #[test]
    fn marc_caption_mentions_mean_only_when_drawn() {
        let doc = ChartDocument::new("x", "y");
        let ctx = SynthesisContext::default();
        let without = Caption::Marc { includes_mean: false }.synthesize(&doc, &ctx);
        let with = Caption::Marc { includes_mean: true }.synthesize(&doc, &ctx);
        assert!(without.starts_with("Meta-analytic rain cloud plot of effect sizes for each study. "));
        assert!(with.starts_with("Meta-analytic rain cloud plot of effect sizes for each study and the mean."));
        assert!(with.contains("cloud of small points"));
        assert!(without.contains("Journal of Research on Educational Effectiveness 15:848\u{2013}875.\n"));
        assert!(without.ends_with("data visualization design science. Research Synthesis Methods."));
    }

    #[test]
    fn meta_regression_cites_given_methods() {
        let doc = ChartDocument::new("x", "y");
        let cap = Caption::MetaRegression {
            effect_label: "lnRR".into(),
            independent_label: "Latitude".into(),
            model: "random effects".into(),
            citations: vec!["Hedges_Olkin_1985".into()],
        };
        let text = cap.synthesize(&doc, &SynthesisContext::default());
        assert!(text.starts_with(
            "Plot of lnRR vs. Latitude, with a random effects meta-analytic linear regression \
             following the methods of Hedges and Olkin (1985)."
        ));
        assert!(text.ends_with("Academic Press, Orlando, FL."));
    }
}
