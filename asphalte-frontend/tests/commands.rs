use std::io::Write;

use asphalte_config::AppConfig;
use asphalte_engine::Session;
use asphalte_frontend::errors::{FrontendError, LoadError};
use asphalte_frontend::{Cli, run_cli};
use clap::Parser;

fn run(args: &[&str]) -> Result<String, FrontendError> {
    let session = Session::open(&AppConfig::default()).expect("open session");
    let mut argv = vec!["asphalte"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("parse arguments");
    run_cli(&cli.command, &session)
}

#[test]
fn detect_reads_points_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(file, "# levé Lausanne\n0 0\n2538000 1152000\n2538100;1152050\n").unwrap();

    let output = run(&["detect", "--file", file.path().to_str().unwrap()]).unwrap();
    assert!(output.starts_with("LV95"), "{output}");
}

#[test]
fn detect_reports_file_errors() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(file, "2538000 1152000\nnorth east\n").unwrap();

    let err = run(&["detect", "--file", file.path().to_str().unwrap()]).unwrap_err();
    assert!(matches!(err, FrontendError::Load(LoadError::Parse { line: 2, .. })));
}

#[test]
fn stations_along_polyline_file() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(file, "0 0 0\n10 0 1\n10 10 0\n0 10\n").unwrap();

    let output = run(&[
        "stations",
        "0",
        "40",
        "--interdistance",
        "20",
        "--vertices",
        "true",
        "--polyline",
        file.path().to_str().unwrap(),
    ])
    .unwrap();
    let values: Vec<f64> = output
        .split_whitespace()
        .map(|token| token.parse().unwrap())
        .collect();
    let arc = 5.0 * std::f64::consts::PI;
    let expected = [0.0, 10.0, 10.0 + arc / 2.0, 20.0, 10.0 + arc, 20.0 + arc, 40.0];
    assert_eq!(values.len(), expected.len(), "{output}");
    for (value, expected) in values.iter().zip(expected) {
        assert!((value - expected).abs() < 1e-3, "{output}");
    }
}

#[test]
fn conversion_round_trip_through_cli() {
    let geodetic = run(&["to-geodetic", "BNG", "530000", "180000"]).unwrap();
    let parts: Vec<&str> = geodetic.split_whitespace().collect();
    assert_eq!(parts.last(), Some(&"exact"));

    let projected = run(&["to-projected", "BNG", parts[0], parts[1]]).unwrap();
    let values: Vec<f64> = projected
        .split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect();
    assert!((values[0] - 530_000.0).abs() < 1e-2);
    assert!((values[1] - 180_000.0).abs() < 1e-2);
}

#[test]
fn unknown_projection_is_a_command_error() {
    let err = run(&["to-geodetic", "ATLANTIS", "1", "2"]).unwrap_err();
    assert!(matches!(err, FrontendError::Command(message) if message.contains("ATLANTIS")));
}
