use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("sortline.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("sortline_cli").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("scale"))
        .stdout(predicate::str::contains("sort"))
        .stdout(predicate::str::contains("demo"));
}

#[rstest]
#[case(40.0, "Sorting: BIN 1")]
#[case(250.0, "Sorting: BIN 2")]
#[case(650.0, "Sorting: BIN 3")]
fn demo_pushes_one_object_through_the_line(#[case] mass: f32, #[case] bin_line: &str) {
    let mut cmd = Command::cargo_bin("sortline_cli").unwrap();
    cmd.arg("demo").arg("--mass-g").arg(mass.to_string());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("demo complete"))
        .stdout(predicate::str::contains(bin_line));
}

#[test]
fn scale_runs_bounded_ticks_and_exits() {
    let mut cmd = Command::cargo_bin("sortline_cli").unwrap();
    cmd.arg("scale").arg("--ticks").arg("3");
    cmd.assert().success();
}

#[test]
fn sort_runs_bounded_ticks_and_exits() {
    let mut cmd = Command::cargo_bin("sortline_cli").unwrap();
    cmd.arg("sort").arg("--ticks").arg("3");
    cmd.assert().success();
}

#[test]
fn rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[scale]\ntrigger_g = 0.0\n");

    let mut cmd = Command::cargo_bin("sortline_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("demo");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("trigger_g"));
}

#[test]
fn config_overrides_reach_the_demo() {
    // Shrink every wait so the demo completes in very few ticks, and
    // move the bin-2 band so 250 g lands in bin 3.
    let dir = tempdir().unwrap();
    let cfg = write_config(
        &dir,
        r#"
[scale]
measure_ms = 100
banner_ms = 50
tare_banner_ms = 50
removal_settle_ms = 50
ramp_step_ms = 5

[sort]
bin2_max_g = 150
divert_dwell_ms = 100
pass_dwell_ms = 100
"#,
    );

    let mut cmd = Command::cargo_bin("sortline_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("demo").arg("--mass-g").arg("250");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Sorting: BIN 3"));
}
