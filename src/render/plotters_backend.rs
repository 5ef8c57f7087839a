//! Plotters implementation of [`DrawPrimitive`]: renders a chart document to
//! **SVG** or **PNG** (picked from the file extension).
//!
//! Primitives are collected while the document is walked and drawn in
//! [`DrawPrimitive::finish`], once the panel layout is known. Everything is
//! drawn in pixel space on the root area after mapping through the panel's
//! coordinate spec, so dash patterns, marker glyphs and text boxes stay the
//! same size regardless of axis scale.

use super::{Colorbar, DrawPrimitive, Frame, MeshCell, Panel, render_document};
use crate::chart::{
    Annotation, ChartDocument, CiRow, HAlign, LegendComposite, LegendGlyph,
    TextStyle as AnnotationStyle, VAlign,
};
use crate::style::{
    CiStyle, HistogramStyle, LineDash, LineStyle, MarkerShape, RectangleStyle, Rgba, ScatterStyle,
};
use crate::text::{estimate_text_width_px, format_general};
use anyhow::{Result, anyhow};
use log::debug;

use plotters::backend::DrawingBackend;
use plotters::coord::CoordTranslate;
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::{Path, PathBuf};

type Coord = Cartesian2d<RangedCoordf64, RangedCoordf64>;

const MARGIN: i32 = 16;
/// Marker sizes and line widths are in points; canvases are 100 px per inch.
const PT_TO_PX: f64 = 100.0 / 72.0;
const FONT_PX: u32 = 12;

/// Render `doc` to `path` (`.svg` for vector output, anything else as PNG).
pub fn save_document<P: AsRef<Path>>(doc: &ChartDocument, path: P, width: u32, height: u32) -> Result<()> {
    let mut canvas = PlottersCanvas::new(path, width, height);
    render_document(doc, &mut canvas)
}

#[derive(Clone, Debug)]
enum Op {
    Scatter {
        points: Vec<(f64, f64)>,
        sizes: Vec<f64>,
        style: ScatterStyle,
    },
    Polyline {
        vertices: Vec<(f64, f64)>,
        style: LineStyle,
    },
    Fill {
        a: Vec<(f64, f64)>,
        b: Vec<(f64, f64)>,
        color: Rgba,
    },
    Bars {
        edges: Vec<f64>,
        counts: Vec<f64>,
        style: HistogramStyle,
    },
    Intervals {
        rows: Vec<CiRow>,
        widths: Vec<f64>,
        style: CiStyle,
    },
    Annotation {
        item: Annotation,
        style: AnnotationStyle,
    },
    Rectangle {
        corner: (f64, f64),
        size: (f64, f64),
        style: RectangleStyle,
        clip: bool,
    },
    Mesh(Vec<MeshCell>),
    CategoryLabels(Vec<(f64, String)>),
}

/// Collects primitives and writes the image file on `finish`.
#[derive(Debug)]
pub struct PlottersCanvas {
    path: PathBuf,
    width: u32,
    height: u32,
    frame: Option<Frame>,
    ops: Vec<(Panel, Op)>,
    legend: Option<(LegendComposite, Vec<LegendGlyph>)>,
    colorbar: Option<Colorbar>,
}

impl PlottersCanvas {
    pub fn new<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            width,
            height,
            frame: None,
            ops: Vec::new(),
            legend: None,
            colorbar: None,
        }
    }
}

impl DrawPrimitive for PlottersCanvas {
    fn begin(&mut self, frame: &Frame) -> Result<()> {
        self.frame = Some(frame.clone());
        self.ops.clear();
        self.legend = None;
        self.colorbar = None;
        Ok(())
    }

    fn scatter(
        &mut self,
        panel: Panel,
        points: &[(f64, f64)],
        sizes: &[f64],
        style: &ScatterStyle,
    ) -> Result<()> {
        self.ops.push((
            panel,
            Op::Scatter {
                points: points.to_vec(),
                sizes: sizes.to_vec(),
                style: style.clone(),
            },
        ));
        Ok(())
    }

    fn polyline(&mut self, panel: Panel, vertices: &[(f64, f64)], style: &LineStyle) -> Result<()> {
        self.ops.push((
            panel,
            Op::Polyline {
                vertices: vertices.to_vec(),
                style: style.clone(),
            },
        ));
        Ok(())
    }

    fn fill_between(
        &mut self,
        panel: Panel,
        a: &[(f64, f64)],
        b: &[(f64, f64)],
        color: Rgba,
    ) -> Result<()> {
        self.ops.push((
            panel,
            Op::Fill {
                a: a.to_vec(),
                b: b.to_vec(),
                color,
            },
        ));
        Ok(())
    }

    fn bars(
        &mut self,
        panel: Panel,
        edges: &[f64],
        counts: &[f64],
        style: &HistogramStyle,
    ) -> Result<()> {
        self.ops.push((
            panel,
            Op::Bars {
                edges: edges.to_vec(),
                counts: counts.to_vec(),
                style: style.clone(),
            },
        ));
        Ok(())
    }

    fn intervals(
        &mut self,
        panel: Panel,
        rows: &[CiRow],
        widths: &[f64],
        style: &CiStyle,
    ) -> Result<()> {
        self.ops.push((
            panel,
            Op::Intervals {
                rows: rows.to_vec(),
                widths: widths.to_vec(),
                style: style.clone(),
            },
        ));
        Ok(())
    }

    fn arc(
        &mut self,
        panel: Panel,
        center: (f64, f64),
        radii: (f64, f64),
        degrees: (f64, f64),
        style: &LineStyle,
    ) -> Result<()> {
        let vertices = super::arc_points(center, radii, degrees, 180);
        self.polyline(panel, &vertices, style)
    }

    fn annotation(&mut self, panel: Panel, item: &Annotation, style: &AnnotationStyle) -> Result<()> {
        self.ops.push((
            panel,
            Op::Annotation {
                item: item.clone(),
                style: style.clone(),
            },
        ));
        Ok(())
    }

    fn rectangle(
        &mut self,
        panel: Panel,
        corner: (f64, f64),
        size: (f64, f64),
        style: &RectangleStyle,
        clip: bool,
    ) -> Result<()> {
        self.ops.push((
            panel,
            Op::Rectangle {
                corner,
                size,
                style: style.clone(),
                clip,
            },
        ));
        Ok(())
    }

    fn mesh(&mut self, panel: Panel, cells: &[MeshCell], colorbar: &Colorbar) -> Result<()> {
        self.ops.push((panel, Op::Mesh(cells.to_vec())));
        self.colorbar = Some(colorbar.clone());
        Ok(())
    }

    fn category_labels(&mut self, panel: Panel, positions: &[(f64, String)]) -> Result<()> {
        self.ops.push((panel, Op::CategoryLabels(positions.to_vec())));
        Ok(())
    }

    fn legend(&mut self, legend: &LegendComposite, glyphs: &[LegendGlyph]) -> Result<()> {
        self.legend = Some((legend.clone(), glyphs.to_vec()));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| anyhow!("finish called before begin"))?;
        let path_string = self.path.to_string_lossy().into_owned();
        debug!("writing {} primitives to {path_string}", self.ops.len());
        if self.path.extension().and_then(|s| s.to_str()) == Some("svg") {
            let root = SVGBackend::new(path_string.as_str(), (self.width, self.height)).into_drawing_area();
            draw_all(root, frame, &self.ops, self.legend.as_ref(), self.colorbar.as_ref())
        } else {
            let root = BitMapBackend::new(path_string.as_str(), (self.width, self.height)).into_drawing_area();
            draw_all(root, frame, &self.ops, self.legend.as_ref(), self.colorbar.as_ref())
        }
    }
}

fn draw_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow!("{:?}", e)
}

fn color(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a as f64 / 255.0)
}

fn faded(c: Rgba, opacity: f64) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a as f64 / 255.0 * opacity.clamp(0.0, 1.0))
}

/// Tick labels: integers plain, everything else with three significant digits.
fn tick_label(v: f64) -> String {
    if v.abs() < 1e-12 {
        "0".to_string()
    } else if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format_general(v, 3)
    }
}

/// Left label area wide enough for the widest category label.
fn left_label_area_px(ops: &[(Panel, Op)], suppress_y: bool) -> u32 {
    let widest = ops
        .iter()
        .filter_map(|(_, op)| match op {
            Op::CategoryLabels(positions) => positions
                .iter()
                .map(|(_, s)| estimate_text_width_px(s, FONT_PX))
                .max(),
            _ => None,
        })
        .max();
    match widest {
        Some(w) => w.saturating_add(18).clamp(48, 320),
        None if suppress_y => 24,
        None => 72,
    }
}

/// Pixel mapping for the panels of one chart.
struct Canvas<'a, DB: DrawingBackend> {
    root: &'a DrawingArea<DB, Shift>,
    main: Coord,
    summary: Option<Coord>,
    invert_y: bool,
}

impl<DB: DrawingBackend> Canvas<'_, DB> {
    fn coord(&self, panel: Panel) -> &Coord {
        match (panel, &self.summary) {
            (Panel::Summary, Some(c)) => c,
            _ => &self.main,
        }
    }

    fn px(&self, panel: Panel, (x, y): (f64, f64)) -> (i32, i32) {
        let y = if self.invert_y { -y } else { y };
        self.coord(panel).translate(&(x, y))
    }

    /// Plot area in pixels: `(left, top, right, bottom)`.
    fn plot_rect(&self, panel: Panel) -> (i32, i32, i32, i32) {
        let c = self.coord(panel);
        let (xr, yr) = (c.get_x_range(), c.get_y_range());
        let a = c.translate(&(xr.start, yr.start));
        let b = c.translate(&(xr.end, yr.end));
        (a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
    }

    fn stroke(&self, pts: &[(i32, i32)], c: RGBAColor, width: f64, dash: LineDash) -> Result<()> {
        let w = width.max(0.0) * PT_TO_PX;
        if w <= 0.0 || pts.len() < 2 {
            return Ok(());
        }
        let style = ShapeStyle {
            color: c,
            filled: false,
            stroke_width: (w.round() as u32).max(1),
        };
        for piece in dash_pieces(pts, dash, w) {
            self.root
                .draw(&PathElement::new(piece, style))
                .map_err(draw_err)?;
        }
        Ok(())
    }

    fn text(&self, text: &str, at: (i32, i32), pos: Pos, size: u32, c: RGBAColor) -> Result<()> {
        let line_h = size as i32 + 2;
        let lines: Vec<&str> = text.lines().collect();
        let first_y = match pos.v_pos {
            VPos::Top => at.1,
            VPos::Center => at.1 - (lines.len() as i32 - 1) * line_h / 2,
            VPos::Bottom => at.1 - (lines.len() as i32 - 1) * line_h,
        };
        let style = plotters::style::TextStyle::from((FontFamily::SansSerif, size))
            .pos(pos)
            .color(&c);
        for (i, line) in lines.iter().enumerate() {
            self.root
                .draw(&Text::new(line.to_string(), (at.0, first_y + i as i32 * line_h), style.clone()))
                .map_err(draw_err)?;
        }
        Ok(())
    }

    fn draw(&self, panel: Panel, op: &Op) -> Result<()> {
        match op {
            Op::Scatter {
                points,
                sizes,
                style,
            } => {
                let face = style.fill.color().map(|c| faded(c, style.opacity));
                let edge = faded(style.edge, style.opacity);
                for (p, size) in points.iter().zip(sizes) {
                    let r = (size.max(0.0).sqrt() / 2.0 * PT_TO_PX).max(1.0);
                    self.marker(self.px(panel, *p), r, style.marker, face, edge, style.edge_width)?;
                }
            }
            Op::Polyline { vertices, style } => {
                let pts: Vec<(i32, i32)> = vertices.iter().map(|p| self.px(panel, *p)).collect();
                self.stroke(&pts, color(style.color), style.width, style.dash)?;
            }
            Op::Fill { a, b, color: c } => {
                let outline: Vec<(i32, i32)> = a
                    .iter()
                    .chain(b.iter().rev())
                    .map(|p| self.px(panel, *p))
                    .collect();
                if outline.len() >= 3 {
                    self.root
                        .draw(&Polygon::new(outline, color(*c).filled()))
                        .map_err(draw_err)?;
                }
            }
            Op::Bars {
                edges,
                counts,
                style,
            } => {
                for (i, count) in counts.iter().enumerate() {
                    let (Some(x0), Some(x1)) = (edges.get(i), edges.get(i + 1)) else {
                        break;
                    };
                    let a = self.px(panel, (*x0, 0.0));
                    let b = self.px(panel, (*x1, *count));
                    self.root
                        .draw(&Rectangle::new([a, b], faded(style.fill, style.opacity).filled()))
                        .map_err(draw_err)?;
                    let outline = [a, (b.0, a.1), b, (a.0, b.1), a];
                    self.stroke(&outline, faded(style.edge, style.opacity), style.edge_width, style.edge_dash)?;
                }
            }
            Op::Intervals {
                rows,
                widths,
                style,
            } => {
                for (row, w) in rows.iter().zip(widths) {
                    let pts = [self.px(panel, (row.lower, row.y)), self.px(panel, (row.upper, row.y))];
                    self.stroke(&pts, color(style.color), *w, style.dash)?;
                }
            }
            Op::Annotation { item, style } => self.annotation(panel, item, style)?,
            Op::Rectangle {
                corner,
                size,
                style,
                clip,
            } => {
                let a = self.px(panel, *corner);
                let b = self.px(panel, (corner.0 + size.0, corner.1 + size.1));
                let (mut l, mut t, mut r, mut btm) = (a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1));
                if *clip {
                    let (pl, pt, pr, pb) = self.plot_rect(panel);
                    (l, t, r, btm) = (l.max(pl), t.max(pt), r.min(pr), btm.min(pb));
                }
                if l < r && t < btm {
                    self.root
                        .draw(&Rectangle::new([(l, t), (r, btm)], color(style.face).filled()))
                        .map_err(draw_err)?;
                    self.root
                        .draw(&Rectangle::new([(l, t), (r, btm)], color(style.edge).stroke_width(1)))
                        .map_err(draw_err)?;
                }
            }
            Op::Mesh(cells) => {
                for cell in cells {
                    let a = self.px(panel, (cell.x.0, cell.y.0));
                    let b = self.px(panel, (cell.x.1, cell.y.1));
                    self.root
                        .draw(&Rectangle::new([a, b], color(cell.color).filled()))
                        .map_err(draw_err)?;
                }
            }
            Op::CategoryLabels(positions) => {
                let x_min = self.coord(panel).get_x_range().start;
                for (y, label) in positions {
                    let (px, py) = self.px(panel, (x_min, *y));
                    self.text(
                        label,
                        (px - 8, py),
                        Pos::new(HPos::Right, VPos::Center),
                        FONT_PX,
                        BLACK.to_rgba(),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn annotation(&self, panel: Panel, item: &Annotation, style: &AnnotationStyle) -> Result<()> {
        let at = self.px(panel, item.end.unwrap_or(item.anchor));
        let size = style.size.px();
        if let (Some(arrow), Some(_)) = (&style.arrow, item.end) {
            let tip = self.px(panel, item.anchor);
            let path = leader_path(at, tip, arrow.curvature);
            self.stroke(&path, color(arrow.color), 1.0, LineDash::Solid)?;
            if let Some(head) = arrow_head(&path) {
                self.root
                    .draw(&Polygon::new(head, color(arrow.color).filled()))
                    .map_err(draw_err)?;
            }
        }
        let pos = Pos::new(
            match style.h_align {
                HAlign::Left => HPos::Left,
                HAlign::Center => HPos::Center,
                HAlign::Right => HPos::Right,
            },
            match style.v_align {
                VAlign::Top => VPos::Top,
                VAlign::Center => VPos::Center,
                VAlign::Baseline | VAlign::Bottom => VPos::Bottom,
            },
        );
        if let Some(boxed) = &style.boxed {
            let n_lines = item.text.lines().count().max(1) as i32;
            let w = item
                .text
                .lines()
                .map(|l| estimate_text_width_px(l, size))
                .max()
                .unwrap_or(0) as i32;
            let h = n_lines * (size as i32 + 2);
            let left = match pos.h_pos {
                HPos::Left => at.0,
                HPos::Center => at.0 - w / 2,
                HPos::Right => at.0 - w,
            };
            let top = match pos.v_pos {
                VPos::Top => at.1,
                VPos::Center => at.1 - h / 2,
                VPos::Bottom => at.1 - h,
            };
            let rect = [(left - 4, top - 3), (left + w + 4, top + h + 3)];
            self.root
                .draw(&Rectangle::new(rect, color(boxed.face).filled()))
                .map_err(draw_err)?;
            self.root
                .draw(&Rectangle::new(
                    rect,
                    color(boxed.edge).stroke_width((boxed.edge_width * PT_TO_PX).round().max(1.0) as u32),
                ))
                .map_err(draw_err)?;
        }
        self.text(&item.text, at, pos, size, BLACK.to_rgba())
    }

    fn marker(
        &self,
        c: (i32, i32),
        r: f64,
        shape: MarkerShape,
        face: Option<RGBAColor>,
        edge: RGBAColor,
        edge_width: f64,
    ) -> Result<()> {
        let stroke_w = ((edge_width * PT_TO_PX).round() as u32).max(1);
        match marker_glyph(shape, r) {
            Glyph::Circle(radius) => {
                let radius = radius.round().max(1.0) as i32;
                if let Some(f) = face {
                    self.root
                        .draw(&Circle::new(c, radius, f.filled()))
                        .map_err(draw_err)?;
                }
                self.root
                    .draw(&Circle::new(c, radius, edge.stroke_width(stroke_w)))
                    .map_err(draw_err)?;
            }
            Glyph::Polygon(pts) => {
                let pts: Vec<(i32, i32)> = pts
                    .iter()
                    .map(|(x, y)| (c.0 + x.round() as i32, c.1 + y.round() as i32))
                    .collect();
                if let Some(f) = face {
                    self.root
                        .draw(&Polygon::new(pts.clone(), f.filled()))
                        .map_err(draw_err)?;
                }
                let mut closed = pts;
                if let Some(first) = closed.first().copied() {
                    closed.push(first);
                }
                self.root
                    .draw(&PathElement::new(closed, edge.stroke_width(stroke_w)))
                    .map_err(draw_err)?;
            }
            Glyph::Strokes(lines) => {
                // line-only glyphs take the face color when there is one
                let ink = face.unwrap_or(edge);
                for [(x0, y0), (x1, y1)] in lines {
                    let seg = vec![
                        (c.0 + x0.round() as i32, c.1 + y0.round() as i32),
                        (c.0 + x1.round() as i32, c.1 + y1.round() as i32),
                    ];
                    self.root
                        .draw(&PathElement::new(seg, ink.stroke_width(stroke_w)))
                        .map_err(draw_err)?;
                }
            }
        }
        Ok(())
    }
}

/// Marker outline relative to its center, in pixels with y pointing down.
enum Glyph {
    Circle(f64),
    Polygon(Vec<(f64, f64)>),
    Strokes(Vec<[(f64, f64); 2]>),
}

fn regular(n: usize, r: f64, rotation_deg: f64) -> Vec<(f64, f64)> {
    (0..n)
        .map(|k| {
            let t = (rotation_deg + 360.0 * k as f64 / n as f64 - 90.0).to_radians();
            (r * t.cos(), r * t.sin())
        })
        .collect()
}

fn marker_glyph(shape: MarkerShape, r: f64) -> Glyph {
    use crate::style::MarkerShape as M;
    let h = r / 2.0;
    match shape {
        M::Point => Glyph::Circle(r / 2.0),
        M::Circle => Glyph::Circle(r),
        M::TriangleUp => Glyph::Polygon(regular(3, r, 0.0)),
        M::TriangleDown => Glyph::Polygon(regular(3, r, 180.0)),
        M::TriangleLeft => Glyph::Polygon(regular(3, r, 270.0)),
        M::TriangleRight => Glyph::Polygon(regular(3, r, 90.0)),
        M::Octagon => Glyph::Polygon(regular(8, r, 22.5)),
        M::Square => Glyph::Polygon(regular(4, r, 45.0)),
        M::Pentagon => Glyph::Polygon(regular(5, r, 0.0)),
        M::HexagonUp => Glyph::Polygon(regular(6, r, 0.0)),
        M::HexagonSide => Glyph::Polygon(regular(6, r, 30.0)),
        M::Diamond => Glyph::Polygon(regular(4, r, 0.0)),
        M::ThinDiamond => Glyph::Polygon(vec![(0.0, -r), (0.6 * r, 0.0), (0.0, r), (-0.6 * r, 0.0)]),
        M::Star => Glyph::Polygon(
            (0..10)
                .map(|k| {
                    let rr = if k % 2 == 0 { r } else { r * 0.4 };
                    let t = (36.0 * k as f64 - 90.0).to_radians();
                    (rr * t.cos(), rr * t.sin())
                })
                .collect(),
        ),
        M::PlusFilled => Glyph::Polygon(vec![
            (-h, -r),
            (h, -r),
            (h, -h),
            (r, -h),
            (r, h),
            (h, h),
            (h, r),
            (-h, r),
            (-h, h),
            (-r, h),
            (-r, -h),
            (-h, -h),
        ]),
        M::XFilled => Glyph::Polygon(
            [
                (-h, -r),
                (h, -r),
                (h, -h),
                (r, -h),
                (r, h),
                (h, h),
                (h, r),
                (-h, r),
                (-h, h),
                (-r, h),
                (-r, -h),
                (-h, -h),
            ]
            .iter()
            .map(|(x, y)| {
                let s = std::f64::consts::FRAC_1_SQRT_2;
                (s * (x - y), s * (x + y))
            })
            .collect(),
        ),
        M::Plus => Glyph::Strokes(vec![[(-r, 0.0), (r, 0.0)], [(0.0, -r), (0.0, r)]]),
        M::X => Glyph::Strokes(vec![[(-r, -r), (r, r)], [(-r, r), (r, -r)]]),
        M::VerticalLine => Glyph::Strokes(vec![[(0.0, -r), (0.0, r)]]),
        M::HorizontalLine => Glyph::Strokes(vec![[(-r, 0.0), (r, 0.0)]]),
        M::TickLeft => Glyph::Strokes(vec![[(-r, 0.0), (0.0, 0.0)]]),
        M::TickRight => Glyph::Strokes(vec![[(0.0, 0.0), (r, 0.0)]]),
        M::TickUp => Glyph::Strokes(vec![[(0.0, -r), (0.0, 0.0)]]),
        M::TickDown => Glyph::Strokes(vec![[(0.0, 0.0), (0.0, r)]]),
        // carets have their base on the data point
        M::CaretUp => Glyph::Polygon(vec![(0.0, -r), (-0.75 * r, 0.0), (0.75 * r, 0.0)]),
        M::CaretDown => Glyph::Polygon(vec![(0.0, r), (-0.75 * r, 0.0), (0.75 * r, 0.0)]),
        M::CaretLeft => Glyph::Polygon(vec![(-r, 0.0), (0.0, -0.75 * r), (0.0, 0.75 * r)]),
        M::CaretRight => Glyph::Polygon(vec![(r, 0.0), (0.0, -0.75 * r), (0.0, 0.75 * r)]),
        M::CenteredCaretUp => Glyph::Polygon(vec![(0.0, -h), (-0.75 * r, h), (0.75 * r, h)]),
        M::CenteredCaretDown => Glyph::Polygon(vec![(0.0, h), (-0.75 * r, -h), (0.75 * r, -h)]),
        M::CenteredCaretLeft => Glyph::Polygon(vec![(-h, 0.0), (h, -0.75 * r), (h, 0.75 * r)]),
        M::CenteredCaretRight => Glyph::Polygon(vec![(h, 0.0), (-h, -0.75 * r), (-h, 0.75 * r)]),
    }
}

/// On/off lengths of a dash pattern, scaled by the stroke width.
fn dash_pattern(dash: LineDash, width: f64) -> Option<Vec<f64>> {
    let w = width.max(1.0);
    let unit: &[f64] = match dash {
        LineDash::Solid => return None,
        LineDash::Dashed => &[3.7, 1.6],
        LineDash::Dotted => &[1.0, 1.65],
        LineDash::DashDot => &[6.4, 1.6, 1.0, 1.6],
    };
    Some(unit.iter().map(|u| u * w).collect())
}

/// Split a pixel path into the visible pieces of its dash pattern.
fn dash_pieces(pts: &[(i32, i32)], dash: LineDash, width: f64) -> Vec<Vec<(i32, i32)>> {
    let Some(pattern) = dash_pattern(dash, width) else {
        return vec![pts.to_vec()];
    };
    let mut pieces = Vec::new();
    let mut current: Vec<(i32, i32)> = Vec::new();
    let (mut k, mut left, mut on) = (0usize, pattern[0], true);
    for seg in pts.windows(2) {
        let (x0, y0) = (seg[0].0 as f64, seg[0].1 as f64);
        let (x1, y1) = (seg[1].0 as f64, seg[1].1 as f64);
        let len = (x1 - x0).hypot(y1 - y0);
        let mut t = 0.0;
        if on && current.last() != Some(&seg[0]) {
            current.push(seg[0]);
        }
        while len - t > left {
            t += left;
            let p = (
                (x0 + (x1 - x0) * t / len).round() as i32,
                (y0 + (y1 - y0) * t / len).round() as i32,
            );
            if on {
                current.push(p);
                pieces.push(std::mem::take(&mut current));
            } else {
                current.push(p);
            }
            on = !on;
            k = (k + 1) % pattern.len();
            left = pattern[k];
        }
        left -= len - t;
        if on && current.last() != Some(&seg[1]) {
            current.push(seg[1]);
        }
    }
    if on && current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

/// Leader from the text at `from` to the annotated point `to`, bowed by
/// `curvature` (fraction of its length, negative bends clockwise).
fn leader_path(from: (i32, i32), to: (i32, i32), curvature: f64) -> Vec<(i32, i32)> {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (x1, y1) = (to.0 as f64, to.1 as f64);
    let (mx, my) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    let (dx, dy) = (x1 - x0, y1 - y0);
    // control point off the chord midpoint, along its normal
    let (cx, cy) = (mx - dy * curvature, my + dx * curvature);
    (0..=24)
        .map(|i| {
            let t = i as f64 / 24.0;
            let u = 1.0 - t;
            (
                (u * u * x0 + 2.0 * u * t * cx + t * t * x1).round() as i32,
                (u * u * y0 + 2.0 * u * t * cy + t * t * y1).round() as i32,
            )
        })
        .collect()
}

fn arrow_head(path: &[(i32, i32)]) -> Option<Vec<(i32, i32)>> {
    let tip = *path.last()?;
    let from = path.iter().rev().find(|p| **p != tip)?;
    let (dx, dy) = ((tip.0 - from.0) as f64, (tip.1 - from.1) as f64);
    let len = dx.hypot(dy);
    let (ux, uy) = (dx / len, dy / len);
    let (l, w) = (8.0, 3.5);
    let base = (tip.0 as f64 - ux * l, tip.1 as f64 - uy * l);
    Some(vec![
        tip,
        ((base.0 - uy * w).round() as i32, (base.1 + ux * w).round() as i32),
        ((base.0 + uy * w).round() as i32, (base.1 - ux * w).round() as i32),
    ])
}

fn build_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &Frame,
    y_range: (f64, f64),
    with_x_desc: bool,
    left_px: u32,
) -> Result<Coord> {
    let (x0, x1) = frame.x_range;
    let (y0, y1) = if frame.invert_y {
        (-y_range.1, -y_range.0)
    } else {
        y_range
    };
    let invert = frame.invert_y;
    let x_fmt = |v: &f64| tick_label(*v);
    let y_fmt = |v: &f64| tick_label(if invert { -*v } else { *v });

    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN as u32)
        .set_label_area_size(LabelAreaPosition::Left, left_px)
        .set_label_area_size(LabelAreaPosition::Bottom, if with_x_desc { 56 } else { 28 })
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(draw_err)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .x_labels(8)
        .y_labels(if frame.suppress_y { 0 } else { 8 })
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .label_style((FontFamily::SansSerif, FONT_PX))
        .axis_desc_style((FontFamily::SansSerif, 16));
    if with_x_desc && !frame.x_label.is_empty() {
        mesh.x_desc(frame.x_label.as_str());
    }
    if !frame.y_label.is_empty() && with_x_desc {
        mesh.y_desc(frame.y_label.as_str());
    }
    if frame.suppress_y {
        mesh.disable_y_axis();
    }
    mesh.draw().map_err(draw_err)?;
    Ok(chart.as_coord_spec().clone())
}

fn draw_all<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    frame: &Frame,
    ops: &[(Panel, Op)],
    legend: Option<&(LegendComposite, Vec<LegendGlyph>)>,
    colorbar: Option<&Colorbar>,
) -> Result<()> {
    root.fill(&WHITE).map_err(draw_err)?;

    // Same 85/15 split as a right-hand legend panel.
    let side = legend.is_some() || colorbar.is_some();
    let (plot_area, side_area) = if side {
        let (plot, panel) = root.split_horizontally((85).percent_width());
        (plot, Some(panel))
    } else {
        (root.clone(), None)
    };

    let left_px = left_label_area_px(ops, frame.suppress_y);
    let (main, summary) = match frame.summary_y_range {
        Some(range) => {
            // summary on top, 2:3 with the main panel
            let (top, bottom) = plot_area.split_vertically((40).percent_height());
            let summary = build_panel(&top, frame, range, false, left_px)?;
            (build_panel(&bottom, frame, frame.y_range, true, left_px)?, Some(summary))
        }
        None => (build_panel(&plot_area, frame, frame.y_range, true, left_px)?, None),
    };

    let canvas = Canvas {
        root: &root,
        main,
        summary,
        invert_y: frame.invert_y,
    };
    for (panel, op) in ops {
        canvas.draw(*panel, op)?;
    }

    if let Some(area) = &side_area {
        let mut y = MARGIN;
        if let Some((legend, glyphs)) = legend {
            y = draw_size_legend(area, legend, glyphs, y)?;
        }
        if let Some(bar) = colorbar {
            draw_colorbar(area, bar, y + 12)?;
        }
    }
    root.present().map_err(draw_err)?;
    Ok(())
}

/// Proportional-size legend; returns the y just below it.
fn draw_size_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    legend: &LegendComposite,
    glyphs: &[LegendGlyph],
    top: i32,
) -> Result<i32> {
    let left: plotters::style::TextStyle =
        plotters::style::TextStyle::from((FontFamily::SansSerif, FONT_PX)).pos(Pos::new(HPos::Left, VPos::Center));
    let pad_x = 6;
    let mut y = top;
    if !legend.title.is_empty() {
        area.draw(&Text::new(legend.title.clone(), (pad_x, y + 7), left.clone()))
            .map_err(draw_err)?;
        y += FONT_PX as i32 + 8;
    }
    let radii: Vec<i32> = glyphs
        .iter()
        .map(|g| ((g.size / 2.0) * PT_TO_PX).round().max(1.0) as i32)
        .collect();
    let widest = radii.iter().copied().max().unwrap_or(4);
    let cx = pad_x + widest;
    if !legend.more.is_empty() {
        area.draw(&Text::new(legend.more.clone(), (pad_x, y + 7), left.clone()))
            .map_err(draw_err)?;
        y += FONT_PX as i32 + 6;
    }
    for (g, r) in glyphs.iter().zip(&radii) {
        let cy = y + r;
        area.draw(&Circle::new((cx, cy), *r, color(g.color).filled()))
            .map_err(draw_err)?;
        area.draw(&Text::new(g.label.clone(), (cx + widest + 10, cy), left.clone()))
            .map_err(draw_err)?;
        y += 2 * r + 8;
    }
    if !legend.less.is_empty() {
        area.draw(&Text::new(legend.less.clone(), (pad_x, y + 7), left.clone()))
            .map_err(draw_err)?;
        y += FONT_PX as i32 + 6;
    }
    Ok(y)
}

fn draw_colorbar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, bar: &Colorbar, top: i32) -> Result<()> {
    let (_, h) = area.dim_in_pixel();
    let bottom = (h as i32 - 3 * MARGIN).max(top + 40);
    let (x0, x1) = (8, 28);
    let steps = 64;
    let span = (bottom - top) as f64;
    for i in 0..steps {
        // top of the bar is vmax
        let t = 1.0 - (i as f64 + 0.5) / steps as f64;
        let ya = top + (span * i as f64 / steps as f64).round() as i32;
        let yb = top + (span * (i + 1) as f64 / steps as f64).round() as i32;
        area.draw(&Rectangle::new([(x0, ya), (x1, yb)], color(bar.colormap.at(t)).filled()))
            .map_err(draw_err)?;
    }
    area.draw(&Rectangle::new([(x0, top), (x1, bottom)], BLACK.stroke_width(1)))
        .map_err(draw_err)?;
    let tick = plotters::style::TextStyle::from((FontFamily::SansSerif, FONT_PX)).pos(Pos::new(HPos::Left, VPos::Center));
    for (v, y) in [(bar.vmax, top), ((bar.vmin + bar.vmax) / 2.0, (top + bottom) / 2), (bar.vmin, bottom)] {
        area.draw(&Text::new(tick_label(v), (x1 + 6, y), tick.clone()))
            .map_err(draw_err)?;
    }
    if !bar.label.is_empty() {
        area.draw(&Text::new(
            bar.label.clone(),
            (x0, bottom + 16),
            tick.clone(),
        ))
        .map_err(draw_err)?;
    }
    Ok(())
}
