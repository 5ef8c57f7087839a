//! Phylogenetic trees: Newick parsing and a rectangular cladogram layout in
//! which every clade gets vertical room in proportion to its tip count.
//!
//! ```rust
//! use metaplot::phylogeny::{Tree, layout};
//!
//! let tree = Tree::parse_newick("((A:1,B:1):1,C:2);").unwrap();
//! assert_eq!(tree.tip_count(), 3);
//! let l = layout(&tree, 1000.0, 600.0, 100.0).unwrap();
//! assert_eq!(l.tips.len(), 3);
//! ```

use crate::chart::{Annotation, ChartDocument, HAlign, TextStyle, VAlign, VisualElement};
use crate::error::{ChartError, Result};
use crate::locale::Localizer;
use crate::style::{BLACK, LineDash, LineStyle};
use log::debug;

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Tree {
    pub name: String,
    /// Length of the branch leading to this node; 0 when absent on the root.
    pub branch_length: f64,
    pub children: Vec<Tree>,
}

impl Tree {
    pub fn tip(name: impl Into<String>, branch_length: f64) -> Self {
        Self {
            name: name.into(),
            branch_length,
            children: Vec::new(),
        }
    }

    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    pub fn tip_count(&self) -> usize {
        if self.is_tip() {
            1
        } else {
            self.children.iter().map(Tree::tip_count).sum()
        }
    }

    /// Longest summed branch length from this node (inclusive) to a tip.
    pub fn max_root_to_tip(&self) -> f64 {
        self.branch_length
            + self
                .children
                .iter()
                .map(Tree::max_root_to_tip)
                .fold(0.0, f64::max)
    }

    /// Parse a Newick string. Missing branch lengths read as 1 below the
    /// root and 0 on the root; labels may be single-quoted.
    pub fn parse_newick(src: &str) -> Result<Self> {
        let mut p = Parser {
            src: src.as_bytes(),
            pos: 0,
            explicit_length: false,
        };
        p.skip_ws();
        let mut root = p.node()?;
        if !p.explicit_length {
            root.branch_length = 0.0;
        }
        p.skip_ws();
        if p.peek() == Some(b';') {
            p.pos += 1;
            p.skip_ws();
        }
        if p.pos != p.src.len() {
            return Err(p.error("unexpected text after the tree"));
        }
        Ok(root)
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    // whether the node just parsed carried a ":length"
    explicit_length: bool,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> ChartError {
        ChartError::Newick {
            pos: self.pos,
            msg: msg.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn node(&mut self) -> Result<Tree> {
        self.skip_ws();
        let mut children = Vec::new();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            loop {
                children.push(self.node()?);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }
        let name = self.label()?;
        self.skip_ws();
        self.explicit_length = false;
        let mut branch_length = 1.0;
        if self.peek() == Some(b':') {
            self.pos += 1;
            branch_length = self.number()?;
            self.explicit_length = true;
        }
        Ok(Tree {
            children,
            ..Tree::tip(name, branch_length)
        })
    }

    fn label(&mut self) -> Result<String> {
        self.skip_ws();
        if self.peek() == Some(b'\'') {
            self.pos += 1;
            let start = self.pos;
            while let Some(c) = self.peek() {
                if c == b'\'' {
                    let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                    self.pos += 1;
                    return Ok(text);
                }
                self.pos += 1;
            }
            return Err(self.error("unterminated quoted label"));
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !matches!(c, b'(' | b')' | b',' | b':' | b';') && !c.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).replace('_', " "))
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, b'.' | b'-' | b'+' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        text.parse::<f64>().map_err(|_| ChartError::Newick {
            pos: start,
            msg: format!("invalid branch length {text:?}"),
        })
    }
}

/// Straight segment between two layout points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TipLabel {
    pub name: String,
    /// Tip position; the label is drawn a few units to its right.
    pub at: (f64, f64),
}

/// Position of a node and the vertical band it was given.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePlacement {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub band: (f64, f64),
    pub tips: usize,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TreeLayout {
    pub segments: Vec<Segment>,
    pub tips: Vec<TipLabel>,
    /// Every node in pre-order, root first.
    pub nodes: Vec<NodePlacement>,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// Horizontal gap between a tip and its label.
pub const LABEL_OFFSET: f64 = 5.0;

/// Lay out `tree` so the deepest tip lands at `width - margin`.
///
/// Y grows downwards from 0 to `height`.
pub fn layout(tree: &Tree, width: f64, height: f64, margin: f64) -> Result<TreeLayout> {
    let depth = tree.max_root_to_tip();
    if !(depth > 0.0) {
        return Err(ChartError::InvalidInput(
            "tree has no positive branch lengths to lay out".into(),
        ));
    }
    if !(width > margin && height > 0.0) {
        return Err(ChartError::InvalidInput(format!(
            "drawing area {width}x{height} with margin {margin} is empty"
        )));
    }
    let scale = (width - margin) / depth;
    debug!("tree layout: {} tips, depth {depth}, scale {scale}", tree.tip_count());
    let mut out = TreeLayout {
        width,
        height,
        scale,
        ..Default::default()
    };
    place(tree, 0.0, (0.0, height), scale, &mut out);
    Ok(out)
}

fn place(node: &Tree, min_x: f64, (min_y, max_y): (f64, f64), scale: f64, out: &mut TreeLayout) -> f64 {
    let x = min_x + node.branch_length * scale;
    let slot = out.nodes.len();
    out.nodes.push(NodePlacement {
        name: node.name.clone(),
        x,
        y: 0.0,
        band: (min_y, max_y),
        tips: node.tip_count(),
    });
    let y = if node.is_tip() {
        let y = (min_y + max_y) / 2.0;
        out.tips.push(TipLabel {
            name: node.name.clone(),
            at: (x, y),
        });
        y
    } else {
        let total = node.tip_count() as f64;
        let span = max_y - min_y;
        let mut top = min_y;
        let mut child_ys = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let h = span * child.tip_count() as f64 / total;
            child_ys.push(place(child, x, (top, top + h), scale, out));
            top += h;
        }
        let first = child_ys.first().copied().unwrap_or(min_y);
        let last = child_ys.last().copied().unwrap_or(max_y);
        out.segments.push(Segment {
            from: (x, first),
            to: (x, last),
        });
        (first + last) / 2.0
    };
    out.nodes[slot].y = y;
    out.segments.push(Segment {
        from: (min_x, y),
        to: (x, y),
    });
    y
}

/// Chart document drawing a laid-out tree: one line per branch segment and
/// the tip labels.
pub fn tree_document(layout: &TreeLayout, loc: &dyn Localizer) -> ChartDocument {
    let mut doc = ChartDocument::new("", "");
    doc.invert_y = true;
    doc.suppress_y = true;
    doc.rescale_x = Some((0.0, layout.width + 100.0));
    doc.rescale_y = Some((0.0, layout.height));
    let branch = loc.translate("Branches");
    let style = LineStyle {
        color: BLACK,
        width: 1.0,
        dash: LineDash::Solid,
    };
    for s in &layout.segments {
        doc.push(VisualElement::line(branch.clone(), vec![s.from, s.to], style.clone()).z(2));
    }
    doc.push(
        VisualElement::annotations(
            loc.translate("Tip Labels"),
            layout
                .tips
                .iter()
                .map(|t| Annotation::at(t.name.clone(), t.at.0 + LABEL_OFFSET, t.at.1))
                .collect(),
            TextStyle {
                h_align: HAlign::Left,
                v_align: VAlign::Center,
                ..Default::default()
            },
        )
        .z(3),
    );
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lengths_quotes_and_defaults() {
        let t = Tree::parse_newick("(('Homo sapiens':0.5,Pan_troglodytes:0.25)Hominini:2, Gorilla) ;").unwrap();
        assert_eq!(t.branch_length, 0.0);
        assert_eq!(t.children.len(), 2);
        let hominini = &t.children[0];
        assert_eq!(hominini.name, "Hominini");
        assert_eq!(hominini.branch_length, 2.0);
        assert_eq!(hominini.children[0].name, "Homo sapiens");
        assert_eq!(hominini.children[1].name, "Pan troglodytes");
        assert_eq!(t.children[1].branch_length, 1.0);
        assert_eq!(t.max_root_to_tip(), 2.5);
    }

    #[test]
    fn parsed_tree_matches_hand_built_one() {
        let parsed = Tree::parse_newick("((A:1,B:3)AB:1,C:2);").unwrap();
        let built = Tree {
            children: vec![
                Tree {
                    children: vec![Tree::tip("A", 1.0), Tree::tip("B", 3.0)],
                    ..Tree::tip("AB", 1.0)
                },
                Tree::tip("C", 2.0),
            ],
            ..Tree::tip("", 0.0)
        };
        assert_eq!(parsed, built);
        assert_eq!(built.tip_count(), 3);
        assert_eq!(built.max_root_to_tip(), 4.0);
    }

    #[test]
    fn parse_errors_report_position() {
        let err = Tree::parse_newick("(A:1,B:x);").unwrap_err();
        assert!(matches!(err, ChartError::Newick { pos: 7, .. }));
        assert!(Tree::parse_newick("(A,B").is_err());
        assert!(Tree::parse_newick("(A,B);C").is_err());
    }

    #[test]
    fn bands_follow_tip_counts() {
        let tree = Tree::parse_newick("(A:1,(B:1,C:1,D:1):1);").unwrap();
        for height in [400.0, 1000.0] {
            let l = layout(&tree, 1000.0, height, 100.0).unwrap();
            let band = |name: &str| {
                let n = l.nodes.iter().find(|n| n.name == name).unwrap();
                n.band.1 - n.band.0
            };
            let clade = l.nodes.iter().find(|n| n.tips == 3).unwrap();
            let ratio = (clade.band.1 - clade.band.0) / band("A");
            assert!((ratio - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn deepest_tip_reaches_width_minus_margin() {
        let tree = Tree::parse_newick("((A:1,B:3):1,C:2);").unwrap();
        let l = layout(&tree, 1000.0, 500.0, 100.0).unwrap();
        let b = l.tips.iter().find(|t| t.name == "B").unwrap();
        assert!((b.at.0 - 900.0).abs() < 1e-9);
        assert!((l.scale - 225.0).abs() < 1e-12);
    }

    #[test]
    fn internal_node_sits_between_first_and_last_child() {
        let tree = Tree::parse_newick("(A:1,B:1,C:1);").unwrap();
        let l = layout(&tree, 300.0, 300.0, 100.0).unwrap();
        let ys: Vec<f64> = l.tips.iter().map(|t| t.at.1).collect();
        assert_eq!(ys, vec![50.0, 150.0, 250.0]);
        assert_eq!(l.nodes[0].y, 150.0);
        let vertical = l.segments.iter().find(|s| s.from.0 == s.to.0 && s.from.1 != s.to.1).unwrap();
        assert_eq!((vertical.from.1, vertical.to.1), (50.0, 250.0));
    }

    #[test]
    fn flat_tree_is_rejected() {
        let tree = Tree::parse_newick("(A:0,B:0);").unwrap();
        assert!(layout(&tree, 1000.0, 500.0, 100.0).is_err());
    }
}
