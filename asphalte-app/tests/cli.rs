use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn asphalte(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("asphalte").expect("binary exists");
    cmd.current_dir(dir.path()).env_remove("ASPHALTE_CONFIG");
    cmd
}

#[test]
fn find_prints_the_definition() {
    let dir = tempfile::tempdir().unwrap();
    asphalte(&dir)
        .args(["find", "2154"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("LAMBERT93\tEPSG:2154"));
}

#[test]
fn to_geodetic_prints_longitude_latitude() {
    let dir = tempfile::tempdir().unwrap();
    asphalte(&dir)
        .args(["to-geodetic", "LAMBERT93", "700000", "6600000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3.000000000 46.500000000 exact"));
}

#[test]
fn unknown_projection_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    asphalte(&dir)
        .args(["to-projected", "ATLANTIS", "2.0", "48.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ATLANTIS"));
}

#[test]
fn detect_without_match_fails() {
    let dir = tempfile::tempdir().unwrap();
    asphalte(&dir)
        .args(["detect", "10", "10"])
        .assert()
        .failure();
}

#[test]
fn config_file_adds_user_projection() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("site.toml");
    fs::write(
        &config,
        r#"
[logging]
level = "warn"

[[catalog.entries]]
code = "CHANTIER"
name = "Repère chantier"
country = "France"
bounds = [0.0, 5000.0, 0.0, 5000.0]
area_of_use = [4.80, 4.90, 45.70, 45.80]
method = "local_grid"
"#,
    )
    .unwrap();

    asphalte(&dir)
        .args(["--config", config.to_str().unwrap(), "to-geodetic", "CHANTIER", "2500", "2500"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("approximate\n"));
}

#[test]
fn discovered_default_config_is_used() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("config")).unwrap();
    fs::write(
        dir.path().join("config").join("default.toml"),
        "[stations]\ndefault_interdistance = 50.0\n",
    )
    .unwrap();

    asphalte(&dir)
        .args(["stations", "0", "100", "--length", "100"])
        .assert()
        .success()
        .stdout("0.000000 50.000000 100.000000\n");
}

#[test]
fn malformed_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[detector]\norigin_threshold = \"far\"\n").unwrap();

    asphalte(&dir)
        .args(["--config", config.to_str().unwrap(), "utm-zone", "2.35", "48.85"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("UTM31N"));
}
