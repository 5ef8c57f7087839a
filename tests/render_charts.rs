use metaplot::caption::HistogramWeighting;
use metaplot::encode::regression::{LinearFit, MetaRegressionOptions, meta_regression_plot};
use metaplot::encode::{
    ForestOptions, FunnelOptions, HistogramOptions, PrecisionMetric, RadialOptions, TrimFillInput,
    forest_plot, funnel_plot, histogram_plot, marc_plot, normal_quantile_plot,
    normal_quantile_points, radial_plot, trim_fill_plot,
};
use metaplot::locale::ENGLISH;
use metaplot::models::{ForestRow, ForestStyle, MarcStyle, StudyEffect};
use metaplot::{ChartConfig, ChartDocument, phylogeny, render};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use tempfile::tempdir;

fn rows() -> Vec<ForestRow> {
    vec![
        ForestRow::new("Mean", 0, 0.31, 0.004, (0.19, 0.43)),
        ForestRow::new("Smith 2001", 1, 0.42, 0.010, (0.22, 0.62)),
        ForestRow::new("Jones 2004", 2, 0.15, 0.030, (-0.19, 0.49)),
        ForestRow::new("Lee 2011", 3, 0.28, 0.020, (0.00, 0.56)),
    ]
}

fn studies() -> Vec<StudyEffect> {
    [(0.42, 0.010), (0.15, 0.030), (0.28, 0.020), (0.61, 0.050), (-0.05, 0.040)]
        .into_iter()
        .map(|(e, v)| StudyEffect::new(e, v))
        .collect()
}

fn render_svg(doc: &ChartDocument, name: &str) -> String {
    let dir = tempdir().unwrap();
    let path = dir.path().join(format!("{name}.svg"));
    render::save_document(doc, &path, 800, 500).unwrap();
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"), "{name} is not an svg");
    svg
}

#[test]
fn forest_styles_render() {
    let cfg = ChartConfig::default();
    for style in [
        ForestStyle::Plain,
        ForestStyle::Scaled,
        ForestStyle::Thick,
        ForestStyle::Rainforest,
    ] {
        let opts = ForestOptions {
            style,
            effect_label: "Hedges' g".into(),
            ..Default::default()
        };
        let doc = forest_plot(&rows(), &opts, &cfg, &ENGLISH).unwrap();
        render_svg(&doc, &format!("forest_{style:?}"));
    }
}

#[test]
fn marc_panel_renders() {
    let cfg = ChartConfig::default();
    let mut rng = StdRng::seed_from_u64(7);
    let doc = marc_plot(&rows(), MarcStyle::MeanPanel, "Hedges' g", &cfg, &ENGLISH, &mut rng).unwrap();
    render_svg(&doc, "marc");
}

#[test]
fn funnel_with_every_overlay_renders() {
    let opts = FunnelOptions {
        metric: PrecisionMetric::StandardError,
        effect_label: "Fisher's z".into(),
        pseudo_ci: true,
        contours: true,
        power: true,
        curve_points: 30,
        ..Default::default()
    };
    let doc = funnel_plot(&studies(), &opts, &ENGLISH).unwrap();
    render_svg(&doc, "funnel");
}

#[test]
fn study_level_charts_render() {
    let cfg = ChartConfig::default();
    let radial = radial_plot(
        &studies(),
        &RadialOptions {
            effect_label: "lnRR".into(),
            log_scale: true,
            slope: 0.31,
            min_effect: -0.05,
            max_effect: 0.61,
        },
        &ENGLISH,
    )
    .unwrap();
    render_svg(&radial, "radial");

    let hist = histogram_plot(
        &studies(),
        &HistogramOptions {
            effect_label: "lnRR".into(),
            weighting: HistogramWeighting::InverseVariance,
            bins: 4,
        },
        &ENGLISH,
    )
    .unwrap();
    render_svg(&hist, "histogram");

    let points = normal_quantile_points(&studies()).unwrap();
    let fit = LinearFit::least_squares(&points).unwrap();
    let quantile = normal_quantile_plot(&points, fit, &cfg, &ENGLISH).unwrap();
    render_svg(&quantile, "quantile");
}

#[test]
fn trim_fill_and_regression_render() {
    let input = TrimFillInput {
        original: studies(),
        inferred: vec![StudyEffect::new(0.02, 0.05), StudyEffect::new(-0.12, 0.04)],
        original_mean: 0.3,
        inferred_mean: 0.24,
        effect_label: "Fisher's z".into(),
    };
    render_svg(&trim_fill_plot(&input, &ENGLISH).unwrap(), "trim_fill");

    let points = [(10.0, 0.2), (20.0, 0.35), (30.0, 0.3), (40.0, 0.5)];
    let fit = LinearFit::least_squares(&points).unwrap();
    let opts = MetaRegressionOptions {
        effect_label: "lnRR".into(),
        independent_label: "Latitude".into(),
        model: "random effects".into(),
        citations: vec![],
    };
    render_svg(&meta_regression_plot(&points, fit, &opts, &ENGLISH).unwrap(), "regression");
}

#[test]
fn tree_renders_tip_labels() {
    let tree = phylogeny::Tree::parse_newick("((Homo_sapiens:1,Pan:1):2,Mus:3);").unwrap();
    let layout = phylogeny::layout(&tree, 800.0, 500.0, 100.0).unwrap();
    let doc = phylogeny::tree_document(&layout, &ENGLISH);
    let svg = render_svg(&doc, "tree");
    assert!(svg.contains("Homo sapiens"));
}

#[test]
fn png_output_is_written() {
    let opts = FunnelOptions {
        curve_points: 10,
        ..Default::default()
    };
    let doc = funnel_plot(&studies(), &opts, &ENGLISH).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("funnel.png");
    render::save_document(&doc, &path, 400, 300).unwrap();
    assert!(fs::metadata(&path).unwrap().len() > 0);
}
