//! Reading analysis results and writing the text side files of a chart.
//!
//! Record files are picked by extension: `.json` is a JSON array, anything
//! else is CSV with a header row. CSV rows cannot carry bootstrap replicate
//! arrays; use JSON for those.

use crate::chart::ChartDocument;
use crate::config::SynthesisContext;
use crate::models::{ForestRow, StudyEffect};
use crate::phylogeny::Tree;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if is_json(path) {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        return serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()));
    }
    let mut rdr = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for (i, rec) in rdr.deserialize().enumerate() {
        // header is line 1
        out.push(rec.with_context(|| format!("{}: bad record on line {}", path.display(), i + 2))?);
    }
    Ok(out)
}

/// Forest rows from CSV or JSON.
pub fn load_forest_rows<P: AsRef<Path>>(path: P) -> Result<Vec<ForestRow>> {
    load_records(path.as_ref())
}

/// Effect sizes with variances (and optional sample sizes) from CSV or JSON.
pub fn load_study_effects<P: AsRef<Path>>(path: P) -> Result<Vec<StudyEffect>> {
    load_records(path.as_ref())
}

pub fn load_newick<P: AsRef<Path>>(path: P) -> Result<Tree> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Tree::parse_newick(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Save records as a pretty JSON array.
pub fn save_json<T: Serialize, P: AsRef<Path>>(records: &[T], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(records)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Write the flat-text data dump of `doc`.
pub fn save_export<P: AsRef<Path>>(doc: &ChartDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, doc.export_text()).with_context(|| format!("writing {}", path.display()))
}

/// Write the synthesized caption of `doc`, followed by a newline.
pub fn save_caption<P: AsRef<Path>>(doc: &ChartDocument, ctx: &SynthesisContext<'_>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut text = doc.caption_text(ctx);
    text.push('\n');
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn forest_rows_from_csv_with_missing_values() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("rows.csv");
        fs::write(
            &p,
            "name,order,mean,variance,lower_ci,upper_ci,median\n\
             Smith 2001, 0, 0.4, 0.01, 0.2, 0.6, NA\n\
             Jones 2003, 1, 0.1, 0.04, -0.3, 0.5, 0.12\n",
        )
        .unwrap();
        let rows = load_forest_rows(&p).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Smith 2001");
        assert_eq!(rows[0].median, None);
        assert_eq!(rows[1].median, Some(0.12));
        assert_eq!(rows[1].lower_ci, Some(-0.3));
        assert!(rows[1].bootstrap_means.is_empty());
    }

    #[test]
    fn forest_rows_round_trip_through_json() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("rows.json");
        let rows = vec![ForestRow::new("A", 0, 0.3, 0.02, (0.1, 0.5)).with_bootstrap(
            (0.15, 0.45),
            (0.14, 0.46),
            vec![0.2, 0.3, 0.4],
        )];
        save_json(&rows, &p).unwrap();
        assert_eq!(load_forest_rows(&p).unwrap(), rows);
    }

    #[test]
    fn bad_csv_record_names_the_line() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("effects.csv");
        fs::write(&p, "effect,variance\n0.1,0.01\nabc,0.02\n").unwrap();
        let err = load_study_effects(&p).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn newick_errors_carry_the_file_name() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("tree.nwk");
        fs::write(&p, "(A:1,B:1").unwrap();
        let err = load_newick(&p).unwrap_err();
        assert!(format!("{err:#}").contains("tree.nwk"));
    }
}
