//! Visual elements: geometry plus style for one drawable layer of a chart.
//!
//! [`ElementKind`] is a closed sum type; the renderer matches on it
//! exhaustively, so a new kind only compiles once every dispatch site
//! handles it.

use crate::color_names::nearest_name;
use crate::colormap::Colormap;
use crate::config::SynthesisContext;
use crate::error::{ChartError, Result};
use crate::stats::{self, GaussianKde};
use crate::style::{
    BandStyle, CiStyle, Fill, HistogramStyle, LineStyle, MapStyle, RectangleStyle, Rgba,
    ScatterStyle, Sizing, StyleEdit, ViolinStyle, WeightScale, check_non_negative, check_opacity,
};
use crate::text::fill_template;
use log::warn;
use std::fmt;

/// Handle to an element inside its [`ChartDocument`](super::ChartDocument).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Style-link role of an element.
///
/// A primary owns the editable style and pushes it to its mirror on every
/// commit; a mirror is read-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StyleLink {
    #[default]
    None,
    Primary(ElementId),
    Mirror(ElementId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Baseline,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TextSize {
    /// Nominal font size in pixels.
    pub fn px(&self) -> u32 {
        match self {
            TextSize::Small => 11,
            TextSize::Medium => 13,
            TextSize::Large => 16,
        }
    }
}

/// Rounded box drawn behind annotation text.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxStyle {
    pub face: Rgba,
    pub edge: Rgba,
    pub edge_width: f64,
}

/// Leader line from the annotated point to the text.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrowStyle {
    pub color: Rgba,
    /// Bend of the connector; 0 is straight, negative bends clockwise.
    pub curvature: f64,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TextStyle {
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub size: TextSize,
    pub boxed: Option<BoxStyle>,
    pub arrow: Option<ArrowStyle>,
}

/// Text anchored at a point, optionally drawn at `end` with a leader back to `anchor`.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub anchor: (f64, f64),
    pub end: Option<(f64, f64)>,
}

impl Annotation {
    pub fn at(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            anchor: (x, y),
            end: None,
        }
    }

    pub fn with_leader(text: impl Into<String>, anchor: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            text: text.into(),
            anchor,
            end: Some(end),
        }
    }
}

/// Horizontal interval at height `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CiRow {
    pub lower: f64,
    pub upper: f64,
    pub y: f64,
}

/// Region filled between `x1` and `x2` at height `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandRow {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
}

/// Inputs for one raindrop of a rainforest plot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Raindrop {
    pub mean: f64,
    pub variance: f64,
    pub y: f64,
    pub lower: f64,
    pub upper: f64,
    pub weight: f64,
}

/// Sampled half-height of a raindrop across its interval.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub xs: Vec<f64>,
    pub half_heights: Vec<f64>,
}

/// Rainforest density silhouettes, shaded on a shared amplitude scale.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityCloud {
    pub rows: Vec<Raindrop>,
    pub style: MapStyle,
    pub profiles: Vec<Profile>,
    /// Largest scaled density over all rows; shading runs from 0 to this.
    pub max_amplitude: f64,
}

impl DensityCloud {
    pub const STEPS: usize = 500;
    /// Heaviest row is drawn this many times taller than the lightest.
    pub const WEIGHT_SCALE: f64 = 2.0;

    pub fn new(rows: Vec<Raindrop>) -> Self {
        let lo = rows.iter().map(|r| r.weight).fold(f64::INFINITY, f64::min);
        let hi = rows.iter().map(|r| r.weight).fold(f64::NEG_INFINITY, f64::max);
        let range = hi - lo;
        let mut max_amplitude: f64 = 0.0;
        let profiles: Vec<Profile> = rows
            .iter()
            .map(|r| {
                let wscale = if range > 0.0 {
                    1.0 + (Self::WEIGHT_SCALE - 1.0) * (r.weight - lo) / range
                } else {
                    1.0
                };
                let sd = r.variance.sqrt();
                let xs = stats::linspace(r.lower, r.upper, Self::STEPS);
                let half_heights: Vec<f64> = xs
                    .iter()
                    .map(|x| stats::norm_pdf(*x, r.mean, sd) * wscale)
                    .collect();
                for h in &half_heights {
                    max_amplitude = max_amplitude.max(*h);
                }
                Profile { xs, half_heights }
            })
            .collect();
        Self {
            rows,
            style: MapStyle {
                colormap: "Blues".into(),
                label: String::new(),
            },
            profiles,
            max_amplitude,
        }
    }
}

/// Bootstrap replicate distributions drawn as horizontal violins.
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapDistribution {
    /// `(y, replicates)` per row.
    pub rows: Vec<(f64, Vec<f64>)>,
    pub style: ViolinStyle,
    /// Full vertical extent of the widest violin.
    pub width: f64,
    /// `None` where the replicates were too few or constant to estimate a density.
    pub profiles: Vec<Option<Profile>>,
}

impl BootstrapDistribution {
    pub const POINTS: usize = 1000;

    pub fn new(rows: Vec<(f64, Vec<f64>)>, width: f64) -> Self {
        let profiles = rows
            .iter()
            .map(|(y, samples)| {
                let Some(kde) = GaussianKde::new(samples) else {
                    if !samples.is_empty() {
                        warn!("bootstrap replicates at y = {y} have no spread; violin skipped");
                    }
                    return None;
                };
                let lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let xs = stats::linspace(lo, hi, Self::POINTS);
                let dens: Vec<f64> = xs.iter().map(|x| kde.density(*x)).collect();
                let peak = dens.iter().copied().fold(0.0_f64, f64::max);
                if !(peak > 0.0) {
                    return None;
                }
                let half = width / 2.0;
                let half_heights = dens.iter().map(|d| d / peak * half).collect();
                Some(Profile { xs, half_heights })
            })
            .collect();
        Self {
            rows,
            style: ViolinStyle::default(),
            width,
            profiles,
        }
    }
}

/// Proportional-size legend keyed to a weight-scaled scatter.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendComposite {
    pub source: ElementId,
    pub weights: [f64; 3],
    /// Top of the weight range the glyphs are sized against; the source
    /// scale's own top when `None`.
    pub max_weight: Option<f64>,
    pub labels: [String; 3],
    pub title: String,
    pub more: String,
    pub less: String,
}

/// One legend glyph: marker diameter-like size (square root of the area size).
#[derive(Clone, Debug, PartialEq)]
pub struct LegendGlyph {
    pub label: String,
    pub weight: f64,
    pub size: f64,
    pub color: Rgba,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Scatter {
        points: Vec<(f64, f64)>,
        style: ScatterStyle,
    },
    Polyline {
        vertices: Vec<(f64, f64)>,
        style: LineStyle,
    },
    Histogram {
        /// `counts.len() + 1` bin edges.
        edges: Vec<f64>,
        counts: Vec<f64>,
        style: HistogramStyle,
    },
    CategoryLabels {
        positions: Vec<(f64, String)>,
    },
    ConfidenceBars {
        rows: Vec<CiRow>,
        style: CiStyle,
    },
    Arc {
        center: (f64, f64),
        width: f64,
        height: f64,
        start_deg: f64,
        end_deg: f64,
        style: LineStyle,
    },
    Annotations {
        items: Vec<Annotation>,
        style: TextStyle,
    },
    Rectangle {
        corner: (f64, f64),
        width: f64,
        height: f64,
        style: RectangleStyle,
        clip: bool,
    },
    FilledBand {
        rows: Vec<BandRow>,
        style: BandStyle,
    },
    ColorMesh {
        xs: Vec<f64>,
        ys: Vec<f64>,
        /// `values[row][col]`, one row per entry of `ys`.
        values: Vec<Vec<f64>>,
        vmin: f64,
        vmax: f64,
        style: MapStyle,
    },
    DensityCloud(DensityCloud),
    BootstrapDistribution(BootstrapDistribution),
    Legend(LegendComposite),
}

impl ElementKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ElementKind::Scatter { .. } => "scatter",
            ElementKind::Polyline { .. } => "line",
            ElementKind::Histogram { .. } => "histogram",
            ElementKind::CategoryLabels { .. } => "labels",
            ElementKind::ConfidenceBars { .. } => "confidence bars",
            ElementKind::Arc { .. } => "arc",
            ElementKind::Annotations { .. } => "annotations",
            ElementKind::Rectangle { .. } => "rectangle",
            ElementKind::FilledBand { .. } => "filled band",
            ElementKind::ColorMesh { .. } => "color mesh",
            ElementKind::DensityCloud(_) => "density cloud",
            ElementKind::BootstrapDistribution(_) => "bootstrap distribution",
            ElementKind::Legend(_) => "legend",
        }
    }

    fn editable_fields(&self) -> &'static [&'static str] {
        match self {
            ElementKind::Scatter { style, .. } => match style.size {
                Sizing::Fixed(_) => &[
                    "color", "edge_color", "width", "size", "dash", "marker", "opacity", "label",
                ],
                Sizing::Scaled(_) => &[
                    "color", "edge_color", "width", "min", "max", "dash", "marker", "opacity",
                    "label",
                ],
            },
            ElementKind::Polyline { .. } | ElementKind::Arc { .. } => &["color", "width", "dash"],
            ElementKind::Histogram { .. } => &["color", "edge_color", "width", "dash", "opacity"],
            ElementKind::ConfidenceBars { style, .. } => match style.width {
                Sizing::Fixed(_) => &["color", "width", "dash"],
                Sizing::Scaled(_) => &["color", "min", "max", "dash"],
            },
            ElementKind::FilledBand { .. } | ElementKind::BootstrapDistribution(_) => {
                &["color", "opacity"]
            }
            ElementKind::ColorMesh { .. } => &["colormap", "label"],
            ElementKind::DensityCloud(_) => &["colormap"],
            ElementKind::CategoryLabels { .. }
            | ElementKind::Annotations { .. }
            | ElementKind::Rectangle { .. }
            | ElementKind::Legend(_) => &[],
        }
    }

    /// Apply every field of `edit` (except visibility) or fail without a
    /// partial change being observable; callers edit a clone and commit on `Ok`.
    pub(crate) fn apply_edit(&mut self, edit: &StyleEdit) -> Result<()> {
        let kind = self.kind_name();
        let allowed = self.editable_fields();
        for field in edit.fields() {
            if !allowed.contains(&field) {
                return Err(ChartError::UnsupportedField { kind, field });
            }
        }
        let color = edit.color.as_deref();
        let edge = edit.edge_color.as_deref().map(Rgba::parse).transpose()?;
        let width = edit.width.map(|w| check_non_negative("width", w)).transpose()?;
        let opacity = edit.opacity.map(check_opacity).transpose()?;
        match self {
            ElementKind::Scatter { style, .. } => {
                if let Some(c) = color {
                    style.fill = Fill::parse(c)?;
                }
                if let Some(e) = edge {
                    style.edge = e;
                }
                if let Some(w) = width {
                    style.edge_width = w;
                }
                if let Some(s) = edit.size {
                    style.size = Sizing::Fixed(check_non_negative("size", s)?);
                }
                rescale(&mut style.size, edit)?;
                if let Some(d) = edit.dash {
                    style.edge_dash = d;
                }
                if let Some(m) = edit.marker {
                    style.marker = m;
                }
                if let Some(o) = opacity {
                    style.opacity = o;
                }
                if let Some(l) = &edit.label {
                    style.label = l.clone();
                }
            }
            ElementKind::Polyline { style, .. } | ElementKind::Arc { style, .. } => {
                if let Some(c) = color {
                    style.color = Rgba::parse(c)?;
                }
                if let Some(w) = width {
                    style.width = w;
                }
                if let Some(d) = edit.dash {
                    style.dash = d;
                }
            }
            ElementKind::Histogram { style, .. } => {
                if let Some(c) = color {
                    style.fill = Rgba::parse(c)?;
                }
                if let Some(e) = edge {
                    style.edge = e;
                }
                if let Some(w) = width {
                    style.edge_width = w;
                }
                if let Some(d) = edit.dash {
                    style.edge_dash = d;
                }
                if let Some(o) = opacity {
                    style.opacity = o;
                }
            }
            ElementKind::ConfidenceBars { style, .. } => {
                if let Some(c) = color {
                    style.color = Rgba::parse(c)?;
                }
                if let Some(w) = width {
                    style.width = Sizing::Fixed(w);
                }
                rescale(&mut style.width, edit)?;
                if let Some(d) = edit.dash {
                    style.dash = d;
                }
            }
            ElementKind::FilledBand { style, .. } => {
                if let Some(c) = color {
                    style.color = Rgba::parse(c)?;
                }
                if let Some(o) = opacity {
                    style.opacity = o;
                }
            }
            ElementKind::BootstrapDistribution(v) => {
                if let Some(c) = color {
                    v.style.color = Rgba::parse(c)?;
                }
                if let Some(o) = opacity {
                    v.style.opacity = o;
                }
            }
            ElementKind::ColorMesh { style, .. } => {
                apply_map_edit(style, edit)?;
            }
            ElementKind::DensityCloud(cloud) => {
                apply_map_edit(&mut cloud.style, edit)?;
            }
            ElementKind::CategoryLabels { .. }
            | ElementKind::Annotations { .. }
            | ElementKind::Rectangle { .. }
            | ElementKind::Legend(_) => {}
        }
        Ok(())
    }
}

fn rescale(sizing: &mut Sizing, edit: &StyleEdit) -> Result<()> {
    if edit.min.is_none() && edit.max.is_none() {
        return Ok(());
    }
    if let Sizing::Scaled(scale) = sizing {
        let min = check_non_negative("min", edit.min.unwrap_or(scale.min))?;
        let max = check_non_negative("max", edit.max.unwrap_or(scale.max))?;
        *scale = WeightScale::new(
            min,
            max,
            std::mem::take(&mut scale.weights),
            scale.min_weight,
            scale.max_weight,
        )?;
    }
    Ok(())
}

fn apply_map_edit(style: &mut MapStyle, edit: &StyleEdit) -> Result<()> {
    if let Some(name) = &edit.colormap {
        Colormap::by_name(name)?;
        style.colormap = name.clone();
    }
    if let Some(l) = &edit.label {
        style.label = l.clone();
    }
    Ok(())
}

/// An element plus the attributes every kind shares.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualElement {
    pub name: String,
    pub visible: bool,
    /// `Some(0)` places the element on the auxiliary (summary) panel.
    pub axes: Option<usize>,
    pub z_order: i32,
    pub link: StyleLink,
    pub kind: ElementKind,
}

impl VisualElement {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            visible: true,
            axes: None,
            z_order: 0,
            link: StyleLink::None,
            kind,
        }
    }

    pub fn z(mut self, z: i32) -> Self {
        self.z_order = z;
        self
    }

    pub fn on_axes(mut self, axes: usize) -> Self {
        self.axes = Some(axes);
        self
    }

    pub fn scatter(name: impl Into<String>, points: Vec<(f64, f64)>, style: ScatterStyle) -> Self {
        Self::new(name, ElementKind::Scatter { points, style })
    }

    pub fn line(name: impl Into<String>, vertices: Vec<(f64, f64)>, style: LineStyle) -> Self {
        Self::new(name, ElementKind::Polyline { vertices, style })
    }

    pub fn band(name: impl Into<String>, rows: Vec<BandRow>, style: BandStyle) -> Self {
        Self::new(name, ElementKind::FilledBand { rows, style })
    }

    pub fn annotations(name: impl Into<String>, items: Vec<Annotation>, style: TextStyle) -> Self {
        Self::new(name, ElementKind::Annotations { items, style })
    }

    /// Tabular dump of the geometry: kind header, name line, column header,
    /// then one tab-separated line per data point. Empty for kinds with no
    /// meaningful table.
    pub fn export_rows(&self) -> Vec<String> {
        let mut out = Vec::new();
        let head = |kind: &str, columns: &str, out: &mut Vec<String>| {
            out.push(format!("{kind}\n"));
            out.push(format!("Name\t{}\n", self.name));
            out.push(format!("{columns}\n"));
        };
        match &self.kind {
            ElementKind::Scatter { points, .. } => {
                head("Scatter Plot Data", "x\ty", &mut out);
                out.extend(points.iter().map(|(x, y)| format!("{x}\t{y}\n")));
            }
            ElementKind::Polyline { vertices, .. } => {
                head("Line Data", "x\ty", &mut out);
                out.extend(vertices.iter().map(|(x, y)| format!("{x}\t{y}\n")));
            }
            ElementKind::Histogram { edges, counts, .. } => {
                head("Histogram Data", "count\tlower\tupper", &mut out);
                for (i, c) in counts.iter().enumerate() {
                    if let (Some(lo), Some(hi)) = (edges.get(i), edges.get(i + 1)) {
                        out.push(format!("{c}\t{lo}\t{hi}\n"));
                    }
                }
            }
            ElementKind::CategoryLabels { positions } => {
                head("Data Labels", "Y-position\tLabel", &mut out);
                out.extend(positions.iter().map(|(y, l)| format!("{y}\t{l}\n")));
            }
            ElementKind::ConfidenceBars { rows, .. } => {
                head("Forest Plot CI Data", "lower\tupper\ty", &mut out);
                out.extend(
                    rows.iter()
                        .map(|r| format!("{}\t{}\t{}\n", r.lower, r.upper, r.y)),
                );
            }
            ElementKind::Arc {
                center,
                width,
                height,
                start_deg,
                end_deg,
                ..
            } => {
                head(
                    "Arc Data",
                    "x\ty\twidth\theight\tstart angle\tend angle",
                    &mut out,
                );
                out.push(format!(
                    "{}\t{}\t{width}\t{height}\t{start_deg}\t{end_deg}\n",
                    center.0, center.1
                ));
            }
            ElementKind::Annotations { items, .. } => {
                let leaders = items.iter().any(|a| a.end.is_some());
                let columns = if leaders {
                    "x\ty\tendx\tendy\tAnnotation"
                } else {
                    "x\ty\tAnnotation"
                };
                head("Annotation Data", columns, &mut out);
                for a in items {
                    let mut line = format!("{}\t{}\t", a.anchor.0, a.anchor.1);
                    if leaders {
                        let (ex, ey) = a.end.unwrap_or(a.anchor);
                        line.push_str(&format!("{ex}\t{ey}\t"));
                    }
                    line.push_str(&a.text);
                    line.push('\n');
                    out.push(line);
                }
            }
            ElementKind::Rectangle { .. }
            | ElementKind::FilledBand { .. }
            | ElementKind::ColorMesh { .. }
            | ElementKind::DensityCloud(_)
            | ElementKind::BootstrapDistribution(_)
            | ElementKind::Legend(_) => {}
        }
        out
    }

    /// Phrase naming how the element currently looks ("blue circles",
    /// "dotted silver line"). Empty for kinds captions never refer to.
    pub fn describe(&self, ctx: &SynthesisContext<'_>) -> String {
        let name = |c: Rgba| nearest_name(c, ctx.names);
        match &self.kind {
            ElementKind::Scatter { style, .. } => {
                let plural = style.marker.plural();
                match (style.marker.is_unfilled(), style.fill) {
                    (true, Fill::None) => ctx.text("nothing (marker is invisible)"),
                    (true, Fill::Solid(c)) => format!("{} {plural}", name(c)),
                    (false, Fill::Solid(c)) if c == style.edge => format!("{} {plural}", name(c)),
                    (false, Fill::None) => fill_template(
                        &ctx.text("marker_style_open_text"),
                        &[plural.as_str(), name(style.edge)],
                    ),
                    (false, Fill::Solid(c)) => fill_template(
                        &ctx.text("marker_style_text"),
                        &[name(c), plural.as_str(), name(style.edge)],
                    ),
                }
            }
            ElementKind::Polyline { style, .. } | ElementKind::Arc { style, .. } => fill_template(
                &ctx.text("line_style_text"),
                &[style.dash.name(), name(style.color)],
            ),
            ElementKind::ConfidenceBars { style, .. } => fill_template(
                &ctx.text("line_style_text"),
                &[style.dash.name(), name(style.color)],
            ),
            ElementKind::FilledBand { style, .. } => name(style.color).to_string(),
            ElementKind::BootstrapDistribution(v) => name(v.style.color).to_string(),
            ElementKind::Histogram { style, .. } => name(style.fill).to_string(),
            _ => String::new(),
        }
    }
}
