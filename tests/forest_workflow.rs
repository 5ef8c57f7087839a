use metaplot::ChartConfig;
use metaplot::config::SynthesisContext;
use metaplot::encode::{ForestOptions, forest_plot};
use metaplot::locale::ENGLISH;
use metaplot::models::{AnalysisKind, ForestStyle};
use metaplot::storage;
use metaplot::style::{LineDash, StyleEdit};
use std::fs;
use tempfile::tempdir;

const ROWS: &str = "name,order,mean,variance,lower_ci,upper_ci\n\
                    Mean,0,0.31,0.004,0.19,0.43\n\
                    Smith 2001,1,0.42,0.010,0.22,0.62\n\
                    Jones 2004,2,0.15,0.030,-0.19,0.49\n\
                    Lee 2011,3,0.28,0.020,0.00,0.56\n";

fn basic_doc(style: ForestStyle) -> metaplot::ChartDocument {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rows.csv");
    fs::write(&path, ROWS).unwrap();
    let rows = storage::load_forest_rows(&path).unwrap();
    let opts = ForestOptions {
        analysis: AnalysisKind::Basic,
        style,
        effect_label: "Hedges' g".into(),
        ..Default::default()
    };
    forest_plot(&rows, &opts, &ChartConfig::default(), &ENGLISH).unwrap()
}

#[test]
fn export_lists_every_study() {
    let doc = basic_doc(ForestStyle::Scaled);
    let text = doc.export_text();
    assert!(text.starts_with("X-axis label\tHedges' g\n"));
    assert!(text.contains("Forest Plot CI Data"));
    for name in ["Smith 2001", "Jones 2004", "Lee 2011"] {
        assert!(text.contains(name), "{name} missing from export");
    }
}

#[test]
fn caption_tracks_style_edits() {
    let mut doc = basic_doc(ForestStyle::Plain);
    let ctx = SynthesisContext::default();
    let before = doc.caption_text(&ctx);
    assert!(before.contains("Effect size measured as Hedges' g."));
    assert!(before.contains("The vertical dotted"));

    let line = doc.find("Line of No Effect").unwrap();
    doc.apply_style(line, &StyleEdit::new().dash(LineDash::Dashed))
        .unwrap();
    let after = doc.caption_text(&ctx);
    assert!(after.contains("The vertical dashed"));
    assert_ne!(before, after);
}

#[test]
fn hidden_elements_leave_the_export() {
    let mut doc = basic_doc(ForestStyle::Plain);
    let ci = doc.find("Confidence Intervals").unwrap();
    doc.set_visible(ci, false).unwrap();
    assert!(!doc.export_text().contains("Forest Plot CI Data"));
}

#[test]
fn side_files_are_written() {
    let doc = basic_doc(ForestStyle::Thick);
    let dir = tempdir().unwrap();
    let data = dir.path().join("forest.txt");
    let caption = dir.path().join("caption.txt");
    storage::save_export(&doc, &data).unwrap();
    storage::save_caption(&doc, &SynthesisContext::default(), &caption).unwrap();
    assert_eq!(fs::read_to_string(&data).unwrap(), doc.export_text());
    let written = fs::read_to_string(&caption).unwrap();
    assert!(written.ends_with('\n'));
    assert!(written.contains("Hedges' g"));
}
