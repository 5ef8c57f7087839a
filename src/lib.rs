//! metaplot
//!
//! Chart documents for meta-analysis results. Statistical output goes in,
//! an editable [`chart::ChartDocument`] comes out: visual elements with
//! their styles, style links between paired elements, a flat-text export
//! and a caption that is synthesized from the current styles on demand.
//! Pairs with the `metaplot` CLI.
//!
//! ### Features
//! - Forest plots (plain, weight-scaled, thick, rainforest) with medians and bootstrap violins
//! - MARC rain-cloud plots with simulated mean effects
//! - Funnel plots with pseudo-confidence limits, contour zones and power shading
//! - Radial (Galbraith), normal-quantile, trim-and-fill, histogram and regression charts
//! - Phylogenetic tree layout from Newick
//! - SVG/PNG rendering through plotters
//!
//! ### Example
//! ```no_run
//! use metaplot::config::ChartConfig;
//! use metaplot::encode::{ForestOptions, forest_plot};
//! use metaplot::locale::ENGLISH;
//! use metaplot::models::{ForestRow, ForestStyle};
//!
//! let rows = vec![
//!     ForestRow::new("Smith 2001", 0, 0.42, 0.010, (0.22, 0.62)),
//!     ForestRow::new("Jones 2004", 1, 0.15, 0.030, (-0.19, 0.49)),
//! ];
//! let cfg = ChartConfig::default();
//! let opts = ForestOptions {
//!     style: ForestStyle::Scaled,
//!     effect_label: "Hedges' g".into(),
//!     ..Default::default()
//! };
//! let doc = forest_plot(&rows, &opts, &cfg, &ENGLISH)?;
//! metaplot::render::save_document(&doc, "forest.svg", 1000, 600)?;
//! println!("{}", doc.caption_text(&cfg.synthesis_context()));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod caption;
pub mod chart;
pub mod color_names;
pub mod colormap;
pub mod config;
pub mod encode;
pub mod error;
pub mod locale;
pub mod models;
pub mod phylogeny;
pub mod render;
pub mod stats;
pub mod storage;
pub mod style;
pub mod text;

pub use chart::{ChartDocument, ElementId, VisualElement};
pub use config::ChartConfig;
pub use error::{ChartError, Result};
