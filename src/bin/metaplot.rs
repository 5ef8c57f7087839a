use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use metaplot::caption::HistogramWeighting;
use metaplot::encode::funnel::weighted_mean;
use metaplot::encode::{
    ForestOptions, FunnelOptions, HistogramOptions, LinearFit, PrecisionMetric, RadialOptions,
    forest_plot, funnel_plot, histogram_plot, marc_plot, normal_quantile_plot,
    normal_quantile_points, radial_plot,
};
use metaplot::locale::ENGLISH;
use metaplot::models::{AnalysisKind, ForestStyle, MarcStyle};
use metaplot::{ChartConfig, ChartDocument, phylogeny, render, storage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "metaplot",
    version,
    about = "Draw meta-analysis charts from analysis output, with data export and figure captions"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forest plot from per-study (and aggregate) rows.
    Forest(ForestArgs),
    /// MARC rain-cloud plot of study weights.
    Marc(MarcArgs),
    /// Funnel plot of effect size against a precision metric.
    Funnel(FunnelArgs),
    /// Radial (Galbraith) plot.
    Radial(RadialArgs),
    /// Weighted histogram of effect sizes.
    Histogram(HistogramArgs),
    /// Normal quantile plot of standardized effects.
    Quantile(QuantileArgs),
    /// Phylogenetic tree from a Newick file.
    Tree(TreeArgs),
}

#[derive(Args, Debug)]
struct Common {
    /// Input records (.csv or .json).
    #[arg(short, long)]
    input: PathBuf,
    /// Chart image path (.svg or .png).
    #[arg(short, long)]
    out: PathBuf,
    /// Width of the plot (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plot (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// JSON chart config; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the flat-text data export here.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Write the caption here instead of printing it.
    #[arg(long)]
    caption: Option<PathBuf>,
    /// Effect size label used on the axis and in the caption.
    #[arg(long, default_value = "Effect Size")]
    effect_label: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AnalysisArg {
    Studies,
    Basic,
    Grouped,
    Nested,
    Cumulative,
    Jackknife,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ForestStyleArg {
    Plain,
    Scaled,
    Thick,
    Rainforest,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MarcStyleArg {
    Studies,
    Included,
    Panel,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    Se,
    Variance,
    Precision,
    N,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WeightingArg {
    None,
    InverseVariance,
    SampleSize,
}

#[derive(Args, Debug)]
struct ForestArgs {
    #[command(flatten)]
    common: Common,
    /// Analysis that produced the rows.
    #[arg(long, value_enum, default_value_t = AnalysisArg::Studies)]
    analysis: AnalysisArg,
    /// Grouping or ordering variable for grouped and cumulative analyses.
    #[arg(long)]
    by: Option<String>,
    #[arg(long, value_enum, default_value_t = ForestStyleArg::Plain)]
    style: ForestStyleArg,
    /// Bootstrap iterations named in the caption.
    #[arg(long)]
    iterations: Option<u64>,
}

#[derive(Args, Debug)]
struct MarcArgs {
    #[command(flatten)]
    common: Common,
    #[arg(long, value_enum, default_value_t = MarcStyleArg::Studies)]
    style: MarcStyleArg,
    /// Seed for the simulated mean-effect cloud.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args, Debug)]
struct FunnelArgs {
    #[command(flatten)]
    common: Common,
    #[arg(long, value_enum, default_value_t = MetricArg::Se)]
    metric: MetricArg,
    /// Mean effect; the inverse-variance weighted mean when omitted.
    #[arg(long)]
    mean: Option<f64>,
    /// Draw pseudo-confidence limits.
    #[arg(long, default_value_t = false)]
    pseudo_ci: bool,
    /// Shade significance contour zones.
    #[arg(long, default_value_t = false)]
    contours: bool,
    /// Shade power regions.
    #[arg(long, default_value_t = false)]
    power: bool,
}

#[derive(Args, Debug)]
struct RadialArgs {
    #[command(flatten)]
    common: Common,
    /// Effects are logarithms; label the arc in the original scale.
    #[arg(long, default_value_t = false)]
    log_scale: bool,
    /// Slope of the line through the origin; the inverse-variance weighted mean when omitted.
    #[arg(long, allow_hyphen_values = true)]
    slope: Option<f64>,
    /// Lower end of the arc's effect range; the smallest effect when omitted.
    #[arg(long, allow_hyphen_values = true)]
    min_effect: Option<f64>,
    /// Upper end of the arc's effect range; the largest effect when omitted.
    #[arg(long, allow_hyphen_values = true)]
    max_effect: Option<f64>,
}

#[derive(Args, Debug)]
struct HistogramArgs {
    #[command(flatten)]
    common: Common,
    #[arg(long, value_enum, default_value_t = WeightingArg::None)]
    weighting: WeightingArg,
    #[arg(long, default_value_t = 10)]
    bins: usize,
}

#[derive(Args, Debug)]
struct QuantileArgs {
    #[command(flatten)]
    common: Common,
    /// Slope of the reference line; fitted by least squares unless both
    /// --slope and --intercept are given.
    #[arg(long, allow_hyphen_values = true, requires = "intercept")]
    slope: Option<f64>,
    #[arg(long, allow_hyphen_values = true, requires = "slope")]
    intercept: Option<f64>,
}

#[derive(Args, Debug)]
struct TreeArgs {
    #[command(flatten)]
    common: Common,
    /// Horizontal space kept free for tip labels, in layout units.
    #[arg(long, default_value_t = 100.0)]
    margin: f64,
}

impl AnalysisArg {
    fn to_kind(self, by: Option<String>) -> Result<AnalysisKind> {
        let need_by = |what: &str| {
            by.clone()
                .with_context(|| format!("--by is required for {what} analyses"))
        };
        Ok(match self {
            AnalysisArg::Studies => AnalysisKind::Studies,
            AnalysisArg::Basic => AnalysisKind::Basic,
            AnalysisArg::Grouped => AnalysisKind::Grouped {
                by: need_by("grouped")?,
            },
            AnalysisArg::Nested => AnalysisKind::Nested,
            AnalysisArg::Cumulative => AnalysisKind::Cumulative {
                order: need_by("cumulative")?,
            },
            AnalysisArg::Jackknife => AnalysisKind::Jackknife,
        })
    }
}

impl From<ForestStyleArg> for ForestStyle {
    fn from(s: ForestStyleArg) -> Self {
        match s {
            ForestStyleArg::Plain => ForestStyle::Plain,
            ForestStyleArg::Scaled => ForestStyle::Scaled,
            ForestStyleArg::Thick => ForestStyle::Thick,
            ForestStyleArg::Rainforest => ForestStyle::Rainforest,
        }
    }
}

impl From<MarcStyleArg> for MarcStyle {
    fn from(s: MarcStyleArg) -> Self {
        match s {
            MarcStyleArg::Studies => MarcStyle::StudiesOnly,
            MarcStyleArg::Included => MarcStyle::MeanIncluded,
            MarcStyleArg::Panel => MarcStyle::MeanPanel,
        }
    }
}

impl From<MetricArg> for PrecisionMetric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Se => PrecisionMetric::StandardError,
            MetricArg::Variance => PrecisionMetric::Variance,
            MetricArg::Precision => PrecisionMetric::Precision,
            MetricArg::N => PrecisionMetric::SampleSize,
        }
    }
}

impl From<WeightingArg> for HistogramWeighting {
    fn from(w: WeightingArg) -> Self {
        match w {
            WeightingArg::None => HistogramWeighting::None,
            WeightingArg::InverseVariance => HistogramWeighting::InverseVariance,
            WeightingArg::SampleSize => HistogramWeighting::SampleSize,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Forest(args) => cmd_forest(args),
        Command::Marc(args) => cmd_marc(args),
        Command::Funnel(args) => cmd_funnel(args),
        Command::Radial(args) => cmd_radial(args),
        Command::Histogram(args) => cmd_histogram(args),
        Command::Quantile(args) => cmd_quantile(args),
        Command::Tree(args) => cmd_tree(args),
    }
}

fn load_config(common: &Common) -> Result<ChartConfig> {
    match common.config.as_ref() {
        Some(path) => ChartConfig::load(path),
        None => Ok(ChartConfig::default()),
    }
}

/// Render the chart and write the side files every subcommand shares.
fn finish(doc: &ChartDocument, common: &Common, cfg: &ChartConfig) -> Result<()> {
    render::save_document(doc, &common.out, common.width, common.height)?;
    eprintln!("Wrote plot to {}", common.out.display());

    if let Some(path) = common.data.as_ref() {
        storage::save_export(doc, path)?;
        eprintln!("Wrote data to {}", path.display());
    }

    let ctx = cfg.synthesis_context();
    match common.caption.as_ref() {
        Some(path) => {
            storage::save_caption(doc, &ctx, path)?;
            eprintln!("Wrote caption to {}", path.display());
        }
        None => {
            let text = doc.caption_text(&ctx);
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }
    Ok(())
}

fn cmd_forest(args: ForestArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let rows = storage::load_forest_rows(&args.common.input)?;
    info!("loaded {} forest rows", rows.len());
    let opts = ForestOptions {
        analysis: args.analysis.to_kind(args.by)?,
        style: args.style.into(),
        effect_label: args.common.effect_label.clone(),
        bootstrap_iterations: args.iterations,
    };
    let doc = forest_plot(&rows, &opts, &cfg, &ENGLISH)?;
    finish(&doc, &args.common, &cfg)
}

fn cmd_marc(args: MarcArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let rows = storage::load_forest_rows(&args.common.input)?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let doc = marc_plot(
        &rows,
        args.style.into(),
        &args.common.effect_label,
        &cfg,
        &ENGLISH,
        &mut rng,
    )?;
    finish(&doc, &args.common, &cfg)
}

fn cmd_funnel(args: FunnelArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let studies = storage::load_study_effects(&args.common.input)?;
    let opts = FunnelOptions {
        metric: args.metric.into(),
        effect_label: args.common.effect_label.clone(),
        mean: args.mean,
        pseudo_ci: args.pseudo_ci,
        contours: args.contours,
        power: args.power,
        curve_points: cfg.funnel_curve_points,
    };
    let doc = funnel_plot(&studies, &opts, &ENGLISH)?;
    finish(&doc, &args.common, &cfg)
}

fn cmd_radial(args: RadialArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let studies = storage::load_study_effects(&args.common.input)?;
    let slope = match args.slope {
        Some(s) => s,
        None => weighted_mean(&studies)?,
    };
    let lowest = studies.iter().map(|s| s.effect).fold(f64::INFINITY, f64::min);
    let highest = studies.iter().map(|s| s.effect).fold(f64::NEG_INFINITY, f64::max);
    let opts = RadialOptions {
        effect_label: args.common.effect_label.clone(),
        log_scale: args.log_scale,
        slope,
        min_effect: args.min_effect.unwrap_or(lowest),
        max_effect: args.max_effect.unwrap_or(highest),
    };
    info!(
        "radial slope {} over effects {}..{}",
        opts.slope, opts.min_effect, opts.max_effect
    );
    let doc = radial_plot(&studies, &opts, &ENGLISH)?;
    finish(&doc, &args.common, &cfg)
}

fn cmd_histogram(args: HistogramArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let studies = storage::load_study_effects(&args.common.input)?;
    let opts = HistogramOptions {
        effect_label: args.common.effect_label.clone(),
        weighting: args.weighting.into(),
        bins: args.bins,
    };
    let doc = histogram_plot(&studies, &opts, &ENGLISH)?;
    finish(&doc, &args.common, &cfg)
}

fn cmd_quantile(args: QuantileArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let studies = storage::load_study_effects(&args.common.input)?;
    let points = normal_quantile_points(&studies)?;
    let fit = match (args.slope, args.intercept) {
        (Some(slope), Some(intercept)) => LinearFit { slope, intercept },
        _ => LinearFit::least_squares(&points).context("normal quantiles do not vary")?,
    };
    info!("quantile line: slope {}, intercept {}", fit.slope, fit.intercept);
    let doc = normal_quantile_plot(&points, fit, &cfg, &ENGLISH)?;
    finish(&doc, &args.common, &cfg)
}

fn cmd_tree(args: TreeArgs) -> Result<()> {
    let cfg = load_config(&args.common)?;
    let tree = storage::load_newick(&args.common.input)?;
    info!("tree has {} tips", tree.tip_count());
    let layout = phylogeny::layout(
        &tree,
        f64::from(args.common.width),
        f64::from(args.common.height),
        args.margin,
    )?;
    let doc = phylogeny::tree_document(&layout, &ENGLISH);
    finish(&doc, &args.common, &cfg)
}
