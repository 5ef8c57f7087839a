//! Rendering: the drawing contract a backend implements, and the dispatch
//! that walks a [`ChartDocument`] onto it.
//!
//! [`render_document`] resolves everything that depends on the document as
//! a whole (axis ranges, panel routing, z-order, weight-scaled sizes,
//! colormap shading) so a backend only has to draw primitives in data
//! coordinates.

pub mod plotters_backend;

pub use plotters_backend::{PlottersCanvas, save_document};

use crate::chart::{
    Annotation, BootstrapDistribution, ChartDocument, CiRow, DensityCloud, ElementKind,
    LegendComposite, LegendGlyph, PanelLayout, TextStyle, VisualElement,
};
use crate::colormap::Colormap;
use crate::style::{CiStyle, HistogramStyle, LineStyle, RectangleStyle, Rgba, ScatterStyle};
use anyhow::Result;
use log::debug;

/// Coordinate panel an element is drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Main,
    /// Upper panel of a stacked layout; shares the x axis with `Main`.
    Summary,
}

/// Axis setup handed to the backend before any primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub summary_y_range: Option<(f64, f64)>,
    pub invert_y: bool,
    pub suppress_y: bool,
}

/// One filled cell of a pseudocolor mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshCell {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub color: Rgba,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Colorbar {
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub label: String,
}

/// Drawing capability a rendering backend provides. All positions are in
/// data coordinates of the given panel.
pub trait DrawPrimitive {
    fn begin(&mut self, frame: &Frame) -> Result<()>;

    /// `sizes` holds one marker area (points squared) per point.
    fn scatter(
        &mut self,
        panel: Panel,
        points: &[(f64, f64)],
        sizes: &[f64],
        style: &ScatterStyle,
    ) -> Result<()>;

    fn polyline(&mut self, panel: Panel, vertices: &[(f64, f64)], style: &LineStyle) -> Result<()>;

    /// Region enclosed by `a`, then `b` walked backwards.
    fn fill_between(
        &mut self,
        panel: Panel,
        a: &[(f64, f64)],
        b: &[(f64, f64)],
        color: Rgba,
    ) -> Result<()>;

    fn bars(
        &mut self,
        panel: Panel,
        edges: &[f64],
        counts: &[f64],
        style: &HistogramStyle,
    ) -> Result<()>;

    /// Horizontal segments, `widths[i]` being the stroke width of row `i`.
    fn intervals(
        &mut self,
        panel: Panel,
        rows: &[CiRow],
        widths: &[f64],
        style: &CiStyle,
    ) -> Result<()>;

    /// Elliptical arc; angles in degrees counter-clockwise from +x.
    fn arc(
        &mut self,
        panel: Panel,
        center: (f64, f64),
        radii: (f64, f64),
        degrees: (f64, f64),
        style: &LineStyle,
    ) -> Result<()>;

    fn annotation(&mut self, panel: Panel, item: &Annotation, style: &TextStyle) -> Result<()>;

    /// Axis-aligned rectangle; `clip` confines it to the plot area.
    fn rectangle(
        &mut self,
        panel: Panel,
        corner: (f64, f64),
        size: (f64, f64),
        style: &RectangleStyle,
        clip: bool,
    ) -> Result<()>;

    fn mesh(&mut self, panel: Panel, cells: &[MeshCell], colorbar: &Colorbar) -> Result<()>;

    /// Text ticks on the y axis, `(y, label)`.
    fn category_labels(&mut self, panel: Panel, positions: &[(f64, String)]) -> Result<()>;

    fn legend(&mut self, legend: &LegendComposite, glyphs: &[LegendGlyph]) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Draw every visible element of `doc`, lowest z-order first.
pub fn render_document<B: DrawPrimitive + ?Sized>(doc: &ChartDocument, backend: &mut B) -> Result<()> {
    let frame = frame_for(doc);
    debug!(
        "render frame: x {:?}, y {:?}, summary {:?}",
        frame.x_range, frame.y_range, frame.summary_y_range
    );
    backend.begin(&frame)?;
    let mut order: Vec<_> = doc.iter().filter(|(_, e)| e.visible).collect();
    // stable, so equal z keeps insertion order
    order.sort_by_key(|(_, e)| e.z_order);
    for (id, element) in order {
        let panel = panel_of(doc, element);
        match &element.kind {
            ElementKind::Scatter { points, style } => {
                let sizes = style.size.resolve(points.len());
                backend.scatter(panel, points, &sizes, style)?;
            }
            ElementKind::Polyline { vertices, style } => backend.polyline(panel, vertices, style)?,
            ElementKind::Histogram {
                edges,
                counts,
                style,
            } => backend.bars(panel, edges, counts, style)?,
            ElementKind::CategoryLabels { positions } => backend.category_labels(panel, positions)?,
            ElementKind::ConfidenceBars { rows, style } => {
                let widths = style.width.resolve(rows.len());
                backend.intervals(panel, rows, &widths, style)?;
            }
            ElementKind::Arc {
                center,
                width,
                height,
                start_deg,
                end_deg,
                style,
            } => backend.arc(
                panel,
                *center,
                (width / 2.0, height / 2.0),
                (*start_deg, *end_deg),
                style,
            )?,
            ElementKind::Annotations { items, style } => {
                for item in items {
                    backend.annotation(panel, item, style)?;
                }
            }
            ElementKind::Rectangle {
                corner,
                width,
                height,
                style,
                clip,
            } => backend.rectangle(panel, *corner, (*width, *height), style, *clip)?,
            ElementKind::FilledBand { rows, style } => {
                let a: Vec<(f64, f64)> = rows.iter().map(|r| (r.x1, r.y)).collect();
                let b: Vec<(f64, f64)> = rows.iter().map(|r| (r.x2, r.y)).collect();
                backend.fill_between(panel, &a, &b, with_opacity(style.color, style.opacity))?;
            }
            ElementKind::ColorMesh {
                xs,
                ys,
                values,
                vmin,
                vmax,
                style,
            } => {
                let colormap = Colormap::by_name(&style.colormap)?;
                let cells = mesh_cells(xs, ys, values, &colormap, *vmin, *vmax);
                let colorbar = Colorbar {
                    colormap,
                    vmin: *vmin,
                    vmax: *vmax,
                    label: style.label.clone(),
                };
                backend.mesh(panel, &cells, &colorbar)?;
            }
            ElementKind::DensityCloud(cloud) => {
                let spacing = row_spacing(cloud.rows.iter().map(|r| r.y), &frame);
                for (a, b, color) in density_strips(cloud, spacing)? {
                    backend.fill_between(panel, &a, &b, color)?;
                }
            }
            ElementKind::BootstrapDistribution(dist) => {
                for (a, b) in violin_outlines(dist) {
                    backend.fill_between(
                        panel,
                        &a,
                        &b,
                        with_opacity(dist.style.color, dist.style.opacity),
                    )?;
                }
            }
            ElementKind::Legend(legend) => {
                let glyphs = doc.legend_glyphs(id)?;
                backend.legend(legend, &glyphs)?;
            }
        }
    }
    backend.finish()
}

fn panel_of(doc: &ChartDocument, element: &VisualElement) -> Panel {
    match (doc.layout, element.axes) {
        (PanelLayout::StackedSummary, Some(0)) => Panel::Summary,
        _ => Panel::Main,
    }
}

pub(crate) fn with_opacity(color: Rgba, opacity: f64) -> Rgba {
    let a = (color.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
    Rgba::new(color.r, color.g, color.b, a)
}

/// Axis ranges: explicit rescale bounds win, otherwise the padded extent of
/// the visible geometry.
pub fn frame_for(doc: &ChartDocument) -> Frame {
    let stacked = doc.layout == PanelLayout::StackedSummary;
    let mut all = Vec::new();
    let mut main = Vec::new();
    let mut summary = Vec::new();
    for (_, e) in doc.iter().filter(|(_, e)| e.visible) {
        let pts = extent_points(&e.kind);
        if stacked && e.axes == Some(0) {
            summary.extend_from_slice(&pts);
        } else {
            main.extend_from_slice(&pts);
        }
        all.extend(pts);
    }
    let xs = padded(all.iter().map(|p| p.0));
    Frame {
        x_label: doc.x_label.clone(),
        y_label: doc.y_label.clone(),
        x_range: doc.rescale_x.unwrap_or(xs),
        y_range: doc.rescale_y.unwrap_or_else(|| padded(main.iter().map(|p| p.1))),
        summary_y_range: stacked
            .then(|| doc.aux_rescale_y.unwrap_or_else(|| padded(summary.iter().map(|p| p.1)))),
        invert_y: doc.invert_y,
        suppress_y: doc.suppress_y,
    }
}

fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 1.0;
        hi += 1.0;
    } else {
        let pad = (hi - lo) * 0.05;
        lo -= pad;
        hi += pad;
    }
    (lo, hi)
}

/// Points whose bounding box covers the element's geometry.
fn extent_points(kind: &ElementKind) -> Vec<(f64, f64)> {
    match kind {
        ElementKind::Scatter { points, .. } => points.clone(),
        ElementKind::Polyline { vertices, .. } => vertices.clone(),
        ElementKind::Histogram { edges, counts, .. } => {
            let top = counts.iter().copied().fold(0.0, f64::max);
            edges.iter().flat_map(|x| [(*x, 0.0), (*x, top)]).collect()
        }
        ElementKind::ConfidenceBars { rows, .. } => rows
            .iter()
            .flat_map(|r| [(r.lower, r.y), (r.upper, r.y)])
            .collect(),
        ElementKind::Arc {
            center,
            width,
            height,
            start_deg,
            end_deg,
            ..
        } => arc_points(*center, (width / 2.0, height / 2.0), (*start_deg, *end_deg), 32),
        ElementKind::Annotations { items, .. } => items
            .iter()
            .flat_map(|a| std::iter::once(a.anchor).chain(a.end))
            .collect(),
        ElementKind::Rectangle {
            corner,
            width,
            height,
            ..
        } => vec![*corner, (corner.0 + width, corner.1 + height)],
        ElementKind::FilledBand { rows, .. } => {
            rows.iter().flat_map(|r| [(r.x1, r.y), (r.x2, r.y)]).collect()
        }
        ElementKind::ColorMesh { xs, ys, .. } => xs
            .iter()
            .flat_map(|x| ys.iter().map(move |y| (*x, *y)))
            .collect(),
        ElementKind::DensityCloud(cloud) => cloud
            .rows
            .iter()
            .flat_map(|r| [(r.lower, r.y), (r.upper, r.y)])
            .collect(),
        ElementKind::BootstrapDistribution(dist) => dist
            .rows
            .iter()
            .flat_map(|(y, samples)| samples.iter().map(move |x| (*x, *y)))
            .collect(),
        ElementKind::CategoryLabels { .. } | ElementKind::Legend(_) => Vec::new(),
    }
}

/// Sample an elliptical arc from `degrees.0` to `degrees.1`.
pub fn arc_points(center: (f64, f64), radii: (f64, f64), degrees: (f64, f64), n: usize) -> Vec<(f64, f64)> {
    crate::stats::linspace(degrees.0, degrees.1, n.max(2))
        .into_iter()
        .map(|d| {
            let t = d.to_radians();
            (center.0 + radii.0 * t.cos(), center.1 + radii.1 * t.sin())
        })
        .collect()
}

/// Cells for a mesh whose `xs`/`ys` are grid points: each value covers the
/// span halfway to its neighbours, clamped to the outermost grid points.
pub fn mesh_cells(
    xs: &[f64],
    ys: &[f64],
    values: &[Vec<f64>],
    colormap: &Colormap,
    vmin: f64,
    vmax: f64,
) -> Vec<MeshCell> {
    let spans = |grid: &[f64]| -> Vec<(f64, f64)> {
        (0..grid.len())
            .map(|i| {
                let lo = if i == 0 { grid[0] } else { (grid[i - 1] + grid[i]) / 2.0 };
                let hi = if i + 1 == grid.len() {
                    grid[i]
                } else {
                    (grid[i] + grid[i + 1]) / 2.0
                };
                (lo, hi)
            })
            .collect()
    };
    let (xspans, yspans) = (spans(xs), spans(ys));
    let mut cells = Vec::with_capacity(xs.len() * ys.len());
    for (row, y) in values.iter().zip(&yspans) {
        for (v, x) in row.iter().zip(&xspans) {
            cells.push(MeshCell {
                x: *x,
                y: *y,
                color: colormap.scaled(*v, vmin, vmax),
            });
        }
    }
    cells
}

/// Smallest gap between distinct row heights; half the y span for a single row.
fn row_spacing(ys: impl Iterator<Item = f64>, frame: &Frame) -> f64 {
    let mut ys: Vec<f64> = ys.collect();
    ys.sort_by(f64::total_cmp);
    ys.windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or((frame.y_range.1 - frame.y_range.0).abs() / 2.0)
}

type Strip = (Vec<(f64, f64)>, Vec<(f64, f64)>, Rgba);

/// Samples per shaded strip of a raindrop.
const STRIP_SAMPLES: usize = 10;

/// Vertical strips of every raindrop, shaded by their mean density on the
/// cloud-wide scale. The tallest drop fills 90% of a row slot.
fn density_strips(cloud: &DensityCloud, spacing: f64) -> Result<Vec<Strip>> {
    let colormap = Colormap::by_name(&cloud.style.colormap)?;
    let amp = cloud.max_amplitude;
    if !(amp > 0.0) {
        return Ok(Vec::new());
    }
    let scale = 0.45 * spacing / amp;
    let mut strips = Vec::new();
    for (row, profile) in cloud.rows.iter().zip(&cloud.profiles) {
        let n = profile.xs.len();
        let mut start = 0;
        while start + 1 < n {
            let end = (start + STRIP_SAMPLES).min(n - 1);
            let slice = start..=end;
            let a = slice
                .clone()
                .map(|i| (profile.xs[i], row.y + profile.half_heights[i] * scale))
                .collect();
            let b = slice
                .clone()
                .map(|i| (profile.xs[i], row.y - profile.half_heights[i] * scale))
                .collect();
            let mean_h = slice.clone().map(|i| profile.half_heights[i]).sum::<f64>()
                / (end - start + 1) as f64;
            strips.push((a, b, colormap.scaled(mean_h, 0.0, amp)));
            start = end;
        }
    }
    Ok(strips)
}

fn violin_outlines(dist: &BootstrapDistribution) -> Vec<(Vec<(f64, f64)>, Vec<(f64, f64)>)> {
    dist.rows
        .iter()
        .zip(&dist.profiles)
        .filter_map(|((y, _), profile)| {
            let p = profile.as_ref()?;
            let upper = p.xs.iter().zip(&p.half_heights).map(|(x, h)| (*x, y + h)).collect();
            let lower = p.xs.iter().zip(&p.half_heights).map(|(x, h)| (*x, y - h)).collect();
            Some((upper, lower))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BandRow, Raindrop};
    use crate::style::{BandStyle, LineDash, MapStyle, Sizing, WeightScale};

    /// Backend that records calls as short strings.
    #[derive(Default)]
    struct Recorder {
        frame: Option<Frame>,
        calls: Vec<String>,
        finished: bool,
    }

    impl DrawPrimitive for Recorder {
        fn begin(&mut self, frame: &Frame) -> Result<()> {
            self.frame = Some(frame.clone());
            Ok(())
        }
        fn scatter(&mut self, panel: Panel, points: &[(f64, f64)], sizes: &[f64], _: &ScatterStyle) -> Result<()> {
            self.calls.push(format!("scatter {panel:?} {} {sizes:?}", points.len()));
            Ok(())
        }
        fn polyline(&mut self, panel: Panel, vertices: &[(f64, f64)], style: &LineStyle) -> Result<()> {
            self.calls.push(format!("polyline {panel:?} {} {}", vertices.len(), style.dash.name()));
            Ok(())
        }
        fn fill_between(&mut self, panel: Panel, a: &[(f64, f64)], _: &[(f64, f64)], color: Rgba) -> Result<()> {
            self.calls.push(format!("fill {panel:?} {} {}", a.len(), color.to_hex()));
            Ok(())
        }
        fn bars(&mut self, panel: Panel, _: &[f64], counts: &[f64], _: &HistogramStyle) -> Result<()> {
            self.calls.push(format!("bars {panel:?} {counts:?}"));
            Ok(())
        }
        fn intervals(&mut self, panel: Panel, rows: &[CiRow], widths: &[f64], _: &CiStyle) -> Result<()> {
            self.calls.push(format!("intervals {panel:?} {} {widths:?}", rows.len()));
            Ok(())
        }
        fn arc(&mut self, panel: Panel, _: (f64, f64), radii: (f64, f64), _: (f64, f64), _: &LineStyle) -> Result<()> {
            self.calls.push(format!("arc {panel:?} {radii:?}"));
            Ok(())
        }
        fn annotation(&mut self, panel: Panel, item: &Annotation, _: &TextStyle) -> Result<()> {
            self.calls.push(format!("text {panel:?} {}", item.text));
            Ok(())
        }
        fn rectangle(&mut self, panel: Panel, _: (f64, f64), _: (f64, f64), _: &RectangleStyle, clip: bool) -> Result<()> {
            self.calls.push(format!("rect {panel:?} {clip}"));
            Ok(())
        }
        fn mesh(&mut self, panel: Panel, cells: &[MeshCell], colorbar: &Colorbar) -> Result<()> {
            self.calls.push(format!("mesh {panel:?} {} {}", cells.len(), colorbar.label));
            Ok(())
        }
        fn category_labels(&mut self, panel: Panel, positions: &[(f64, String)]) -> Result<()> {
            self.calls.push(format!("labels {panel:?} {}", positions.len()));
            Ok(())
        }
        fn legend(&mut self, legend: &LegendComposite, glyphs: &[LegendGlyph]) -> Result<()> {
            self.calls.push(format!("legend {} {}", legend.title, glyphs.len()));
            Ok(())
        }
        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn dotted() -> LineStyle {
        LineStyle {
            dash: LineDash::Dotted,
            ..Default::default()
        }
    }

    #[test]
    fn draws_in_z_order_and_skips_hidden() {
        let mut doc = ChartDocument::new("x", "y");
        doc.push(VisualElement::scatter("pts", vec![(0.0, 0.0), (1.0, 1.0)], ScatterStyle::default()).z(5));
        doc.push(VisualElement::line("ref", vec![(0.0, 0.0), (1.0, 0.0)], dotted()).z(1));
        let mut hidden = VisualElement::line("gone", vec![(0.0, 0.0), (1.0, 0.0)], LineStyle::default());
        hidden.visible = false;
        doc.push(hidden);
        let mut rec = Recorder::default();
        render_document(&doc, &mut rec).unwrap();
        assert_eq!(
            rec.calls,
            vec!["polyline Main 2 dotted", "scatter Main 2 [36.0, 36.0]"]
        );
        assert!(rec.finished);
    }

    #[test]
    fn frame_prefers_rescale_bounds() {
        let mut doc = ChartDocument::new("x", "y");
        doc.push(VisualElement::scatter("pts", vec![(0.0, 10.0), (2.0, 20.0)], ScatterStyle::default()));
        let frame = frame_for(&doc);
        assert!((frame.x_range.0 + 0.1).abs() < 1e-12 && (frame.x_range.1 - 2.1).abs() < 1e-12);
        assert!((frame.y_range.0 - 9.5).abs() < 1e-12 && (frame.y_range.1 - 20.5).abs() < 1e-12);
        doc.rescale_x = Some((-5.0, 5.0));
        assert_eq!(frame_for(&doc).x_range, (-5.0, 5.0));
        assert_eq!(frame_for(&ChartDocument::new("", "")).y_range, (0.0, 1.0));
    }

    #[test]
    fn summary_elements_route_to_the_upper_panel() {
        let mut doc = ChartDocument::new("x", "y");
        doc.layout = PanelLayout::StackedSummary;
        doc.aux_rescale_y = Some((0.0, 2.0));
        doc.push(VisualElement::scatter("mean", vec![(0.3, 1.0)], ScatterStyle::default()).on_axes(0));
        doc.push(VisualElement::scatter("studies", vec![(0.1, 0.5)], ScatterStyle::default()));
        let mut rec = Recorder::default();
        render_document(&doc, &mut rec).unwrap();
        assert_eq!(rec.calls[0], "scatter Summary 1 [36.0]");
        assert_eq!(rec.calls[1], "scatter Main 1 [36.0]");
        assert_eq!(rec.frame.unwrap().summary_y_range, Some((0.0, 2.0)));
    }

    #[test]
    fn scaled_sizes_and_band_opacity_are_resolved() {
        let mut doc = ChartDocument::new("x", "y");
        let scale = WeightScale::from_weights(10.0, 20.0, vec![0.0, 1.0]).unwrap();
        doc.push(VisualElement::scatter(
            "pts",
            vec![(0.0, 0.0), (1.0, 1.0)],
            ScatterStyle {
                size: Sizing::Scaled(scale),
                ..Default::default()
            },
        ));
        doc.push(VisualElement::band(
            "band",
            vec![BandRow { x1: 0.0, x2: 1.0, y: 0.0 }, BandRow { x1: 0.0, x2: 2.0, y: 1.0 }],
            BandStyle {
                color: crate::style::RED,
                opacity: 0.5,
            },
        ));
        let mut rec = Recorder::default();
        render_document(&doc, &mut rec).unwrap();
        assert_eq!(rec.calls[0], "scatter Main 2 [10.0, 20.0]");
        assert_eq!(rec.calls[1], "fill Main 2 #ff000080");
    }

    #[test]
    fn mesh_cells_split_halfway_between_grid_points() {
        let cmap = Colormap::by_name("Greys").unwrap();
        let cells = mesh_cells(&[0.0, 10.0], &[1.0, 2.0, 4.0], &[vec![0.0, 0.0], vec![50.0, 50.0], vec![100.0, 100.0]], &cmap, 0.0, 100.0);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0].x, (0.0, 5.0));
        assert_eq!(cells[1].x, (5.0, 10.0));
        assert_eq!(cells[0].y, (1.0, 1.5));
        assert_eq!(cells[2].y, (1.5, 3.0));
        assert_eq!(cells[4].y, (3.0, 4.0));
        assert_eq!(cells[4].color, cmap.at(1.0));
    }

    #[test]
    fn raindrops_fit_inside_their_row_slot() {
        let drops = vec![
            Raindrop { mean: 0.0, variance: 1.0, y: 0.0, lower: -2.0, upper: 2.0, weight: 1.0 },
            Raindrop { mean: 0.5, variance: 0.25, y: -10.0, lower: -0.5, upper: 1.5, weight: 4.0 },
        ];
        let cloud = DensityCloud::new(drops);
        let frame = frame_for(&ChartDocument::new("", ""));
        let spacing = row_spacing(cloud.rows.iter().map(|r| r.y), &frame);
        assert_eq!(spacing, 10.0);
        let strips = density_strips(&cloud, spacing).unwrap();
        assert!(!strips.is_empty());
        let tallest = strips
            .iter()
            .flat_map(|(a, _, _)| a.iter().map(|p| p.1))
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(tallest <= 4.5 + 1e-9);
        // strips cover each profile end to end
        let first_row: Vec<_> = strips.iter().take_while(|(a, _, _)| a[0].1 >= 0.0).collect();
        assert_eq!(first_row.first().unwrap().0[0].0, -2.0);
        assert_eq!(first_row.last().unwrap().0.last().unwrap().0, 2.0);
    }

    #[test]
    fn mesh_with_unknown_colormap_fails() {
        let mut doc = ChartDocument::new("x", "y");
        doc.push(VisualElement::new(
            "mesh",
            ElementKind::ColorMesh {
                xs: vec![0.0, 1.0],
                ys: vec![0.0],
                values: vec![vec![1.0, 1.0]],
                vmin: 0.0,
                vmax: 1.0,
                style: MapStyle {
                    colormap: "nope".into(),
                    label: String::new(),
                },
            },
        ));
        assert!(render_document(&doc, &mut Recorder::default()).is_err());
    }

    #[test]
    fn arc_sampling_hits_both_ends() {
        let pts = arc_points((0.0, 0.0), (2.0, 1.0), (0.0, 90.0), 5);
        assert_eq!(pts.len(), 5);
        assert!((pts[0].0 - 2.0).abs() < 1e-12 && pts[0].1.abs() < 1e-12);
        assert!(pts[4].0.abs() < 1e-12 && (pts[4].1 - 1.0).abs() < 1e-12);
    }
}
