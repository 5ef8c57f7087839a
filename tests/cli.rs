use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("metaplot").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("metaplot"))
        .stdout(predicate::str::contains("forest"))
        .stdout(predicate::str::contains("tree"));
}

#[test]
fn forest_writes_chart_data_and_caption() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("rows.csv");
    fs::write(
        &input,
        "name,order,mean,variance,lower_ci,upper_ci\n\
         Smith 2001,0,0.42,0.010,0.22,0.62\n\
         Jones 2004,1,0.15,0.030,-0.19,0.49\n",
    )
    .unwrap();
    let out = dir.path().join("forest.svg");
    let data = dir.path().join("forest.txt");

    let mut cmd = Command::cargo_bin("metaplot").unwrap();
    cmd.arg("forest")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--data")
        .arg(&data)
        .args(["--style", "scaled", "--effect-label", "Hedges' g"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Forest plot of individual effect sizes"))
        .stderr(predicate::str::contains("Wrote plot to"));

    assert!(fs::read_to_string(&out).unwrap().contains("<svg"));
    assert!(fs::read_to_string(&data).unwrap().contains("Jones 2004"));
}

#[test]
fn grouped_analysis_needs_a_grouping_variable() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("rows.csv");
    fs::write(&input, "name,order,mean,variance,lower_ci,upper_ci\nA,0,0.1,0.01,0,0.2\n").unwrap();
    let mut cmd = Command::cargo_bin("metaplot").unwrap();
    cmd.arg("forest")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(dir.path().join("x.svg"))
        .args(["--analysis", "grouped"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--by is required"));
}

#[test]
fn tree_caption_goes_to_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("tree.nwk");
    fs::write(&input, "((A:1,B:1):1,C:2);").unwrap();
    let out = dir.path().join("tree.svg");
    let caption = dir.path().join("caption.txt");
    let mut cmd = Command::cargo_bin("metaplot").unwrap();
    cmd.arg("tree")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--caption")
        .arg(&caption);
    cmd.assert().success();
    assert!(out.exists());
    assert!(caption.exists());
}

#[test]
fn radial_and_quantile_take_supplied_estimates() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("effects.csv");
    fs::write(
        &input,
        "effect,variance\n0.42,0.010\n0.15,0.030\n0.28,0.020\n-0.05,0.040\n",
    )
    .unwrap();

    let radial = dir.path().join("radial.svg");
    let mut cmd = Command::cargo_bin("metaplot").unwrap();
    cmd.arg("radial")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&radial)
        .args(["--slope", "-0.1", "--min-effect", "-1", "--max-effect", "1"])
        .env("RUST_LOG", "info");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("radial slope -0.1 over effects -1..1"));
    assert!(radial.exists());

    let quantile = dir.path().join("quantile.svg");
    let mut cmd = Command::cargo_bin("metaplot").unwrap();
    cmd.arg("quantile")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&quantile)
        .args(["--slope", "2"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--intercept"));
}
