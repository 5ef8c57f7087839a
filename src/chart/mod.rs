//! The chart document: an ordered arena of visual elements, axis metadata
//! and the caption bound to the chart kind.
//!
//! Elements are addressed by [`ElementId`]. Style links are stored as ids on
//! both ends, so the document alone owns every element and a style commit on
//! a primary updates its mirror before the call returns.
//!
//! # Example
//!
//! ```rust
//! use metaplot::chart::{ChartDocument, VisualElement};
//! use metaplot::style::{LineStyle, StyleEdit};
//!
//! let mut doc = ChartDocument::new("x", "y");
//! let lower = doc.push(VisualElement::line("lower", vec![(0.0, 0.0), (1.0, 1.0)], LineStyle::default()));
//! let upper = doc.push(VisualElement::line("upper", vec![(0.0, 0.0), (1.0, -1.0)], LineStyle::default()));
//! doc.link(lower, upper).unwrap();
//! doc.apply_style(lower, &StyleEdit::new().color("red").width(3.0)).unwrap();
//! assert!(doc.apply_style(upper, &StyleEdit::new().width(1.0)).is_err());
//! ```

mod element;

pub use element::{
    Annotation, ArrowStyle, BandRow, BootstrapDistribution, BoxStyle, CiRow, DensityCloud,
    ElementId, ElementKind, HAlign, LegendComposite, LegendGlyph, Profile, Raindrop, StyleLink,
    TextSize, TextStyle, VAlign, VisualElement,
};

use crate::caption::Caption;
use crate::config::SynthesisContext;
use crate::error::{ChartError, Result};
use crate::style::{Sizing, StyleEdit};
use log::debug;

/// Panel arrangement for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PanelLayout {
    #[default]
    Single,
    /// A summary panel (axes index 0) stacked above the main panel, sharing x.
    StackedSummary,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ChartDocument {
    pub x_label: String,
    pub y_label: String,
    elements: Vec<VisualElement>,
    pub rescale_x: Option<(f64, f64)>,
    pub rescale_y: Option<(f64, f64)>,
    /// Hide the y axis line and numeric ticks (category labels still show).
    pub suppress_y: bool,
    pub invert_y: bool,
    pub caption: Caption,
    pub layout: PanelLayout,
    /// Y range of the summary panel under [`PanelLayout::StackedSummary`].
    pub aux_rescale_y: Option<(f64, f64)>,
}

impl ChartDocument {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, element: VisualElement) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn get(&self, id: ElementId) -> Result<&VisualElement> {
        self.elements
            .get(id.0)
            .ok_or(ChartError::UnknownElement(id.0))
    }

    /// Elements in insertion order with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &VisualElement)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, e)| (ElementId(i), e))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// First element with the given name.
    pub fn find(&self, name: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .map(ElementId)
    }

    /// Make `secondary` mirror `primary`'s style from now on.
    ///
    /// Both must be unlinked lines or unlinked filled bands. The mirror takes
    /// the primary's style immediately.
    pub fn link(&mut self, primary: ElementId, secondary: ElementId) -> Result<()> {
        let invalid = |reason| ChartError::InvalidLink {
            primary: primary.0,
            secondary: secondary.0,
            reason,
        };
        if primary == secondary {
            return Err(invalid("an element cannot mirror itself"));
        }
        let (p, s) = (self.get(primary)?, self.get(secondary)?);
        let linkable = matches!(
            (&p.kind, &s.kind),
            (ElementKind::Polyline { .. }, ElementKind::Polyline { .. })
                | (ElementKind::FilledBand { .. }, ElementKind::FilledBand { .. })
        );
        if !linkable {
            return Err(invalid("only line pairs or band pairs can be linked"));
        }
        if p.link != StyleLink::None || s.link != StyleLink::None {
            return Err(invalid("element is already linked"));
        }
        self.elements[primary.0].link = StyleLink::Primary(secondary);
        self.elements[secondary.0].link = StyleLink::Mirror(primary);
        self.sync_mirror(primary);
        Ok(())
    }

    /// Validate and commit a style edit.
    ///
    /// The edit is applied to a copy first, so a rejected edit leaves the
    /// element untouched. Mirrors reject every edit.
    pub fn apply_style(&mut self, id: ElementId, edit: &StyleEdit) -> Result<()> {
        let element = self.get(id)?;
        if let StyleLink::Mirror(_) = element.link {
            return Err(ChartError::LinkedReadOnly(id.0));
        }
        let mut kind = element.kind.clone();
        kind.apply_edit(edit)?;
        let element = &mut self.elements[id.0];
        element.kind = kind;
        if let Some(v) = edit.visible {
            element.visible = v;
        }
        self.sync_mirror(id);
        Ok(())
    }

    /// Show or hide an element; a primary takes its mirror along.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> Result<()> {
        self.apply_style(id, &StyleEdit::new().visible(visible))
    }

    fn sync_mirror(&mut self, primary: ElementId) {
        let StyleLink::Primary(mirror) = self.elements[primary.0].link else {
            return;
        };
        let source = self.elements[primary.0].clone();
        let Some(target) = self.elements.get_mut(mirror.0) else {
            return;
        };
        target.visible = source.visible;
        match (&source.kind, &mut target.kind) {
            (ElementKind::Polyline { style: from, .. }, ElementKind::Polyline { style: to, .. }) => {
                to.color = from.color;
                to.width = from.width;
                to.dash = from.dash;
            }
            (
                ElementKind::FilledBand { style: from, .. },
                ElementKind::FilledBand { style: to, .. },
            ) => {
                to.color = from.color;
                to.opacity = from.opacity;
            }
            _ => debug!("link {primary} -> {mirror} joins different kinds; nothing synced"),
        }
    }

    /// Current style phrase of an element, for captions.
    pub fn describe(&self, id: ElementId, ctx: &SynthesisContext<'_>) -> String {
        self.get(id).map(|e| e.describe(ctx)).unwrap_or_default()
    }

    /// Flat text dump: axis labels, then one block per visible element that
    /// has a tabular form, blocks separated by blank lines.
    pub fn export_text(&self) -> String {
        let mut out = format!(
            "X-axis label\t{}\nY-axis label\t{}\n\n",
            self.x_label, self.y_label
        );
        let blocks: Vec<String> = self
            .elements
            .iter()
            .filter(|e| e.visible)
            .map(|e| e.export_rows().concat())
            .filter(|b| !b.is_empty())
            .collect();
        out.push_str(&blocks.join("\n"));
        out
    }

    /// Caption text, synthesized from the current element styles.
    pub fn caption_text(&self, ctx: &SynthesisContext<'_>) -> String {
        self.caption.synthesize(self, ctx)
    }

    /// Glyphs for a legend composite, sized by the source scatter's weight scale.
    pub fn legend_glyphs(&self, id: ElementId) -> Result<Vec<LegendGlyph>> {
        let ElementKind::Legend(legend) = &self.get(id)?.kind else {
            return Err(ChartError::InvalidInput(format!("element {id} is not a legend")));
        };
        let source = self.get(legend.source)?;
        let ElementKind::Scatter { style, .. } = &source.kind else {
            return Err(ChartError::InvalidInput(format!(
                "legend source {} is not a scatter",
                legend.source
            )));
        };
        let color = style.fill.color().unwrap_or(style.edge);
        Ok(legend
            .weights
            .iter()
            .zip(legend.labels.iter())
            .map(|(w, label)| {
                let area = match &style.size {
                    Sizing::Fixed(s) => *s,
                    Sizing::Scaled(scale) => match legend.max_weight {
                        Some(top) => scale.value_against(*w, top),
                        None => scale.value_at(*w),
                    },
                };
                LegendGlyph {
                    label: label.clone(),
                    weight: *w,
                    size: area.max(0.0).sqrt(),
                    color,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{
        BandStyle, LineDash, LineStyle, Rgba, ScatterStyle, WeightScale,
    };

    fn two_lines() -> (ChartDocument, ElementId, ElementId) {
        let mut doc = ChartDocument::new("x", "y");
        let a = doc.push(VisualElement::line("a", vec![(0.0, 0.0), (1.0, 1.0)], LineStyle::default()));
        let b = doc.push(VisualElement::line("b", vec![(0.0, 0.0), (1.0, -1.0)], LineStyle::default()));
        (doc, a, b)
    }

    fn line_style(doc: &ChartDocument, id: ElementId) -> LineStyle {
        match &doc.get(id).unwrap().kind {
            ElementKind::Polyline { style, .. } => style.clone(),
            other => panic!("not a line: {other:?}"),
        }
    }

    #[test]
    fn linked_mirror_follows_primary() {
        let (mut doc, a, b) = two_lines();
        doc.link(a, b).unwrap();
        doc.apply_style(
            a,
            &StyleEdit::new()
                .color("#ff0000")
                .width(2.5)
                .dash(LineDash::Dashed)
                .visible(false),
        )
        .unwrap();
        let (sa, sb) = (line_style(&doc, a), line_style(&doc, b));
        assert_eq!(sa, sb);
        assert_eq!(sb.color, Rgba::rgb(255, 0, 0));
        assert!(!doc.get(b).unwrap().visible);
    }

    #[test]
    fn mirror_edits_are_rejected() {
        let (mut doc, a, b) = two_lines();
        doc.link(a, b).unwrap();
        let before = doc.get(b).unwrap().clone();
        assert_eq!(
            doc.apply_style(b, &StyleEdit::new().width(4.0)),
            Err(ChartError::LinkedReadOnly(b.index()))
        );
        assert_eq!(doc.get(b).unwrap(), &before);
    }

    #[test]
    fn invalid_edits_leave_style_intact() {
        let (mut doc, a, _) = two_lines();
        let before = line_style(&doc, a);
        assert!(doc.apply_style(a, &StyleEdit::new().color("#ff0000").width(-1.0)).is_err());
        assert!(doc.apply_style(a, &StyleEdit::new().width(2.0).color("not a color")).is_err());
        assert_eq!(line_style(&doc, a), before);
    }

    #[test]
    fn link_rules() {
        let (mut doc, a, b) = two_lines();
        let s = doc.push(VisualElement::scatter("s", vec![], ScatterStyle::default()));
        assert!(doc.link(a, a).is_err());
        assert!(doc.link(a, s).is_err());
        doc.link(a, b).unwrap();
        assert!(doc.link(b, a).is_err());
        assert_eq!(doc.get(a).unwrap().link, StyleLink::Primary(b));
        assert_eq!(doc.get(b).unwrap().link, StyleLink::Mirror(a));
    }

    #[test]
    fn linked_bands_share_color_and_opacity() {
        let mut doc = ChartDocument::new("x", "y");
        let rows = vec![BandRow { x1: 0.0, x2: 1.0, y: 0.0 }];
        let a = doc.push(VisualElement::band("a", rows.clone(), BandStyle::default()));
        let b = doc.push(VisualElement::band("b", rows, BandStyle::default()));
        doc.link(a, b).unwrap();
        doc.apply_style(a, &StyleEdit::new().color("#123456").opacity(0.25)).unwrap();
        let ElementKind::FilledBand { style, .. } = &doc.get(b).unwrap().kind else {
            unreachable!()
        };
        assert_eq!(style.color, Rgba::from_hex(0x123456));
        assert_eq!(style.opacity, 0.25);
    }

    #[test]
    fn export_skips_hidden_and_tableless_elements() {
        let mut doc = ChartDocument::new("Effect", "Weight");
        doc.push(VisualElement::scatter("P", vec![(1.0, 2.0), (3.0, 4.0)], ScatterStyle::default()));
        let hidden = doc.push(VisualElement::line("L", vec![(0.0, 0.0)], LineStyle::default()));
        doc.push(VisualElement::band(
            "B",
            vec![BandRow { x1: 0.0, x2: 1.0, y: 0.0 }],
            BandStyle::default(),
        ));
        doc.set_visible(hidden, false).unwrap();
        assert_eq!(
            doc.export_text(),
            "X-axis label\tEffect\nY-axis label\tWeight\n\n\
             Scatter Plot Data\nName\tP\nx\ty\n1\t2\n3\t4\n"
        );
    }

    #[test]
    fn export_separates_blocks_with_blank_lines() {
        let mut doc = ChartDocument::new("x", "y");
        doc.push(VisualElement::scatter("P", vec![(1.0, 2.0)], ScatterStyle::default()));
        doc.push(VisualElement::line("L", vec![(0.5, 0.0)], LineStyle::default()));
        let text = doc.export_text();
        assert!(text.contains("1\t2\n\nLine Data\nName\tL\nx\ty\n0.5\t0\n"));
    }

    #[test]
    fn legend_glyphs_follow_scatter_scale() {
        let mut doc = ChartDocument::new("x", "y");
        let scale = WeightScale::new(1.0, 401.0, vec![0.0, 0.2], 0.0, 0.1).unwrap();
        let src = doc.push(VisualElement::scatter(
            "means",
            vec![(0.0, 0.0), (1.0, 0.2)],
            ScatterStyle {
                size: Sizing::Scaled(scale),
                ..Default::default()
            },
        ));
        let legend = doc.push(VisualElement::new(
            "",
            ElementKind::Legend(LegendComposite {
                source: src,
                weights: [0.1, 0.01, 0.001],
                max_weight: None,
                labels: ["0.1".into(), "0.01".into(), "0.001".into()],
                title: "Relative Weight".into(),
                more: "More certain".into(),
                less: "Less certain".into(),
            }),
        ));
        let glyphs = doc.legend_glyphs(legend).unwrap();
        assert_eq!(glyphs.len(), 3);
        assert!((glyphs[0].size - 401.0_f64.sqrt()).abs() < 1e-9);
        assert!((glyphs[1].size - 41.0_f64.sqrt()).abs() < 1e-9);
        assert!(doc.legend_glyphs(src).is_err());

        let wider = doc.push(VisualElement::new(
            "",
            ElementKind::Legend(LegendComposite {
                source: src,
                weights: [0.1, 0.01, 0.001],
                max_weight: Some(0.2),
                labels: ["0.1".into(), "0.01".into(), "0.001".into()],
                title: "Relative Weight".into(),
                more: "More certain".into(),
                less: "Less certain".into(),
            }),
        ));
        let glyphs = doc.legend_glyphs(wider).unwrap();
        assert!((glyphs[0].size - 201.0_f64.sqrt()).abs() < 1e-9);
    }
}
