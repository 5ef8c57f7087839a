//! Style records for chart elements, plus the validated edit patches applied to them.
//!
//! Colors are parsed from `#rgb`, `#rrggbb`, `#rrggbbaa`, CSS4 names (`silver`,
//! `darkgray`) or `xkcd:`-prefixed names. Marker and line names follow the
//! vocabulary that shows up in captions ("upward caret", "dotted").
//!
//! # Example
//!
//! ```rust
//! use metaplot::style::{Fill, Rgba};
//!
//! let red = Rgba::parse("#e50000").unwrap();
//! assert_eq!(red, Rgba::rgb(229, 0, 0));
//! assert_eq!(Fill::parse("none").unwrap(), Fill::None);
//! ```

use crate::color_names;
use crate::error::{ChartError, Result};
use std::fmt;
use std::str::FromStr;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new RGBA color.
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Opaque color from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
            a: 255,
        }
    }

    /// Parse a color specification. `"none"` is not a color; use [`Fill::parse`] for that.
    pub fn parse(spec: &str) -> Result<Self> {
        let s = spec.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ChartError::InvalidColor(spec.to_string()));
        }
        let lower = s.to_ascii_lowercase();
        let found = match lower.strip_prefix("xkcd:") {
            Some(name) => color_names::xkcd_lookup(name),
            None => color_names::css4_lookup(&lower),
        };
        found.ok_or_else(|| ChartError::InvalidColor(spec.to_string()))
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    match hex.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Rgba::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

impl FromStr for Rgba {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        Rgba::parse(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Marker face: a color, or no fill at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    None,
    Solid(Rgba),
}

impl Fill {
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.trim().eq_ignore_ascii_case("none") {
            Ok(Fill::None)
        } else {
            Rgba::parse(spec).map(Fill::Solid)
        }
    }

    pub fn color(&self) -> Option<Rgba> {
        match self {
            Fill::None => None,
            Fill::Solid(c) => Some(*c),
        }
    }
}

/// Marker glyphs available to scatter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerShape {
    Point,
    Circle,
    TriangleDown,
    TriangleUp,
    TriangleLeft,
    TriangleRight,
    Octagon,
    Square,
    Pentagon,
    PlusFilled,
    Star,
    HexagonUp,
    HexagonSide,
    Plus,
    X,
    XFilled,
    Diamond,
    ThinDiamond,
    VerticalLine,
    HorizontalLine,
    TickLeft,
    TickRight,
    TickUp,
    TickDown,
    CaretUp,
    CaretDown,
    CaretLeft,
    CaretRight,
    CenteredCaretUp,
    CenteredCaretDown,
    CenteredCaretLeft,
    CenteredCaretRight,
}

impl MarkerShape {
    pub const ALL: [MarkerShape; 32] = [
        MarkerShape::Point,
        MarkerShape::Circle,
        MarkerShape::TriangleDown,
        MarkerShape::TriangleUp,
        MarkerShape::TriangleLeft,
        MarkerShape::TriangleRight,
        MarkerShape::Octagon,
        MarkerShape::Square,
        MarkerShape::Pentagon,
        MarkerShape::PlusFilled,
        MarkerShape::Star,
        MarkerShape::HexagonUp,
        MarkerShape::HexagonSide,
        MarkerShape::Plus,
        MarkerShape::X,
        MarkerShape::XFilled,
        MarkerShape::Diamond,
        MarkerShape::ThinDiamond,
        MarkerShape::VerticalLine,
        MarkerShape::HorizontalLine,
        MarkerShape::TickLeft,
        MarkerShape::TickRight,
        MarkerShape::TickUp,
        MarkerShape::TickDown,
        MarkerShape::CaretUp,
        MarkerShape::CaretDown,
        MarkerShape::CaretLeft,
        MarkerShape::CaretRight,
        MarkerShape::CenteredCaretUp,
        MarkerShape::CenteredCaretDown,
        MarkerShape::CenteredCaretLeft,
        MarkerShape::CenteredCaretRight,
    ];

    /// Name used in style descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            MarkerShape::Point => "point",
            MarkerShape::Circle => "circle",
            MarkerShape::TriangleDown => "downward triangle",
            MarkerShape::TriangleUp => "upward triangle",
            MarkerShape::TriangleLeft => "left triangle",
            MarkerShape::TriangleRight => "right triangle",
            MarkerShape::Octagon => "octagon",
            MarkerShape::Square => "square",
            MarkerShape::Pentagon => "pentagon",
            MarkerShape::PlusFilled => "filled plus",
            MarkerShape::Star => "star",
            MarkerShape::HexagonUp => "upward hexagon",
            MarkerShape::HexagonSide => "sideways hexagon",
            MarkerShape::Plus => "plus",
            MarkerShape::X => "X",
            MarkerShape::XFilled => "filled X",
            MarkerShape::Diamond => "diamond",
            MarkerShape::ThinDiamond => "thin diamond",
            MarkerShape::VerticalLine => "vertical line",
            MarkerShape::HorizontalLine => "horizontal line",
            MarkerShape::TickLeft => "tick left",
            MarkerShape::TickRight => "tick right",
            MarkerShape::TickUp => "tick up",
            MarkerShape::TickDown => "tick down",
            MarkerShape::CaretUp => "upward caret",
            MarkerShape::CaretDown => "downward caret",
            MarkerShape::CaretLeft => "left caret",
            MarkerShape::CaretRight => "right caret",
            MarkerShape::CenteredCaretUp => "centered upward caret",
            MarkerShape::CenteredCaretDown => "centered downward caret",
            MarkerShape::CenteredCaretLeft => "centered left caret",
            MarkerShape::CenteredCaretRight => "centered right caret",
        }
    }

    /// Plural form used in captions ("circles", "Xs", "pluses").
    pub fn plural(&self) -> String {
        let name = self.name();
        if name.ends_with('s') {
            format!("{name}es")
        } else {
            format!("{name}s")
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    /// Line-only glyphs have no face, so only the face color shows.
    pub fn is_unfilled(&self) -> bool {
        matches!(
            self,
            MarkerShape::Point
                | MarkerShape::Plus
                | MarkerShape::X
                | MarkerShape::VerticalLine
                | MarkerShape::HorizontalLine
                | MarkerShape::TickLeft
                | MarkerShape::TickRight
                | MarkerShape::TickUp
                | MarkerShape::TickDown
                | MarkerShape::CaretUp
                | MarkerShape::CaretDown
                | MarkerShape::CaretLeft
                | MarkerShape::CaretRight
                | MarkerShape::CenteredCaretUp
                | MarkerShape::CenteredCaretDown
                | MarkerShape::CenteredCaretLeft
                | MarkerShape::CenteredCaretRight
        )
    }
}

/// Line dash pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineDash {
    pub fn name(&self) -> &'static str {
        match self {
            LineDash::Solid => "solid",
            LineDash::Dashed => "dashed",
            LineDash::Dotted => "dotted",
            LineDash::DashDot => "dashdot",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "solid" => Some(LineDash::Solid),
            "dashed" => Some(LineDash::Dashed),
            "dotted" => Some(LineDash::Dotted),
            "dashdot" => Some(LineDash::DashDot),
            _ => None,
        }
    }
}

/// Linear map from a per-row weight onto a size or width range.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightScale {
    pub min: f64,
    pub max: f64,
    pub weights: Vec<f64>,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl WeightScale {
    /// Fails with [`ChartError::DegenerateWeights`] unless `max_weight > min_weight`.
    pub fn new(
        min: f64,
        max: f64,
        weights: Vec<f64>,
        min_weight: f64,
        max_weight: f64,
    ) -> Result<Self> {
        if !(max_weight > min_weight) {
            return Err(ChartError::DegenerateWeights(min_weight));
        }
        check_non_negative("min", min)?;
        check_non_negative("max", max)?;
        Ok(Self {
            min,
            max,
            weights,
            min_weight,
            max_weight,
        })
    }

    /// Scale over the observed weight range.
    pub fn from_weights(min: f64, max: f64, weights: Vec<f64>) -> Result<Self> {
        let lo = weights.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self::new(min, max, weights, lo, hi)
    }

    pub fn value_at(&self, w: f64) -> f64 {
        self.value_against(w, self.max_weight)
    }

    /// Value at `w` with `max_weight` standing in for the top of the weight range.
    pub fn value_against(&self, w: f64, max_weight: f64) -> f64 {
        self.min + (self.max - self.min) * (w - self.min_weight) / (max_weight - self.min_weight)
    }

    pub fn values(&self) -> Vec<f64> {
        self.weights.iter().map(|w| self.value_at(*w)).collect()
    }
}

/// Marker size (scatter) or line width (confidence bars).
#[derive(Clone, Debug, PartialEq)]
pub enum Sizing {
    Fixed(f64),
    Scaled(WeightScale),
}

impl Sizing {
    /// Value for row `i`; fixed sizing ignores the index.
    pub fn at(&self, i: usize) -> f64 {
        match self {
            Sizing::Fixed(v) => *v,
            Sizing::Scaled(s) => s.weights.get(i).map(|w| s.value_at(*w)).unwrap_or(s.min),
        }
    }

    pub fn resolve(&self, n: usize) -> Vec<f64> {
        (0..n).map(|i| self.at(i)).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterStyle {
    pub marker: MarkerShape,
    pub fill: Fill,
    pub edge: Rgba,
    pub size: Sizing,
    pub edge_width: f64,
    pub edge_dash: LineDash,
    pub opacity: f64,
    pub label: String,
}

impl Default for ScatterStyle {
    fn default() -> Self {
        Self {
            marker: MarkerShape::Circle,
            fill: Fill::Solid(ACCENT_BLUE),
            edge: ACCENT_BLUE,
            size: Sizing::Fixed(36.0),
            edge_width: 1.5,
            edge_dash: LineDash::Solid,
            opacity: 1.0,
            label: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineStyle {
    pub color: Rgba,
    pub width: f64,
    pub dash: LineDash,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: SILVER,
            width: 1.5,
            dash: LineDash::Solid,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramStyle {
    pub fill: Rgba,
    pub edge: Rgba,
    pub edge_width: f64,
    pub edge_dash: LineDash,
    pub opacity: f64,
}

impl Default for HistogramStyle {
    fn default() -> Self {
        Self {
            fill: ACCENT_BLUE,
            edge: BLACK,
            edge_width: 1.0,
            edge_dash: LineDash::Solid,
            opacity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CiStyle {
    pub color: Rgba,
    pub width: Sizing,
    pub dash: LineDash,
}

impl Default for CiStyle {
    fn default() -> Self {
        Self {
            color: ACCENT_BLUE,
            width: Sizing::Fixed(1.5),
            dash: LineDash::Solid,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BandStyle {
    pub color: Rgba,
    pub opacity: f64,
}

impl Default for BandStyle {
    fn default() -> Self {
        Self {
            color: SILVER,
            opacity: 0.5,
        }
    }
}

/// Colormap-driven elements (meshes, raindrop clouds).
#[derive(Clone, Debug, PartialEq)]
pub struct MapStyle {
    pub colormap: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViolinStyle {
    pub color: Rgba,
    pub opacity: f64,
}

impl Default for ViolinStyle {
    fn default() -> Self {
        Self {
            color: Rgba::from_hex(0xffdf00),
            opacity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectangleStyle {
    pub face: Rgba,
    pub edge: Rgba,
}

impl Default for RectangleStyle {
    fn default() -> Self {
        Self {
            face: WHITE,
            edge: BLACK,
        }
    }
}

pub const ACCENT_BLUE: Rgba = Rgba::from_hex(0x1f77b4);
pub const ACCENT_ORANGE: Rgba = Rgba::from_hex(0xff7f0e);
pub const ACCENT_GREEN: Rgba = Rgba::from_hex(0x2ca02c);
pub const ACCENT_RED: Rgba = Rgba::from_hex(0xd62728);
pub const SILVER: Rgba = Rgba::from_hex(0xc0c0c0);
pub const DARK_GRAY: Rgba = Rgba::from_hex(0xa9a9a9);
pub const DARK_BLUE: Rgba = Rgba::from_hex(0x00008b);
pub const BLACK: Rgba = Rgba::from_hex(0x000000);
pub const WHITE: Rgba = Rgba::from_hex(0xffffff);
pub const RED: Rgba = Rgba::from_hex(0xff0000);
pub const BLUE: Rgba = Rgba::from_hex(0x0000ff);

/// A partial style change. Unset fields are left alone.
///
/// Which fields apply depends on the element kind; setting a field the kind
/// does not have is rejected rather than ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleEdit {
    pub color: Option<String>,
    pub edge_color: Option<String>,
    pub width: Option<f64>,
    pub size: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub dash: Option<LineDash>,
    pub marker: Option<MarkerShape>,
    pub opacity: Option<f64>,
    pub colormap: Option<String>,
    pub label: Option<String>,
    pub visible: Option<bool>,
}

impl StyleEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, spec: impl Into<String>) -> Self {
        self.color = Some(spec.into());
        self
    }

    pub fn edge_color(mut self, spec: impl Into<String>) -> Self {
        self.edge_color = Some(spec.into());
        self
    }

    pub fn width(mut self, w: f64) -> Self {
        self.width = Some(w);
        self
    }

    pub fn size(mut self, s: f64) -> Self {
        self.size = Some(s);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn dash(mut self, dash: LineDash) -> Self {
        self.dash = Some(dash);
        self
    }

    pub fn marker(mut self, marker: MarkerShape) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn opacity(mut self, o: f64) -> Self {
        self.opacity = Some(o);
        self
    }

    pub fn colormap(mut self, name: impl Into<String>) -> Self {
        self.colormap = Some(name.into());
        self
    }

    pub fn label(mut self, text: impl Into<String>) -> Self {
        self.label = Some(text.into());
        self
    }

    pub fn visible(mut self, v: bool) -> Self {
        self.visible = Some(v);
        self
    }

    /// Names of the fields this edit sets, in declaration order.
    pub(crate) fn fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut push = |set: bool, name: &'static str| {
            if set {
                out.push(name)
            }
        };
        push(self.color.is_some(), "color");
        push(self.edge_color.is_some(), "edge_color");
        push(self.width.is_some(), "width");
        push(self.size.is_some(), "size");
        push(self.min.is_some(), "min");
        push(self.max.is_some(), "max");
        push(self.dash.is_some(), "dash");
        push(self.marker.is_some(), "marker");
        push(self.opacity.is_some(), "opacity");
        push(self.colormap.is_some(), "colormap");
        push(self.label.is_some(), "label");
        out
    }
}

/// Non-negative and finite.
pub fn check_non_negative(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ChartError::NegativeValue { field, value })
    }
}

pub fn check_opacity(value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ChartError::OpacityOutOfRange(value))
    }
}
