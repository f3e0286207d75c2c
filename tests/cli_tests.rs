// End-to-end tests of the numrepro binary: process probe dumps into runs,
// then aggregate and follow them across runs.

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SUITE: &str = r#"{
    "make_command": "make",
    "executables": [
        {
            "executable": "bin/dot",
            "vfc_backends": [{ "name": "mca", "repetitions": 4 }]
        }
    ]
}"#;

const DUMPS: [&str; 3] = [
    "test,variable,value\ndot,result,0x1p+0\nsum,total,0x1.8p+1\n",
    "dot,result,0x1.0000000000001p+0\nsum,total,0x1.8p+1\n",
    "dot:result,0x1.ffffffffffffep-1\nsum:total,0x1.8p+1\n",
];

/// Suite config plus the dumps of executions 0..=2 (execution 3 left missing)
fn write_suite(dir: &Path) -> (PathBuf, PathBuf) {
    let config = dir.join("vfc_tests_config.json");
    fs::write(&config, SUITE).unwrap();

    let probes = dir.join("probes");
    fs::create_dir(&probes).unwrap();
    for (index, dump) in DUMPS.iter().enumerate() {
        fs::write(probes.join(format!("{index}.csv")), dump).unwrap();
    }
    (config, probes)
}

fn process_run(dir: &Path, config: &Path, probes: &Path, timestamp: i64) -> PathBuf {
    let output = dir.join(format!("{timestamp}.json"));
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("process")
        .arg("--config")
        .arg(config)
        .arg("--probes-dir")
        .arg(probes)
        .arg("--timestamp")
        .arg(timestamp.to_string())
        .arg("--output")
        .arg(&output);
    cmd.assert().success();
    output
}

#[test]
fn test_process_writes_run_and_reports_missing_execution() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let output = tmp_dir.path().join("run.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--probes-dir")
        .arg(&probes)
        .arg("--timestamp")
        .arg("1700000000")
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("- Warning 1: probes not found"))
        .stderr(predicate::str::contains("Repetition: 4"));

    let json = fs::read_to_string(&output).unwrap();
    assert!(json.contains("\"format\": \"numrepro-run-v1\""));
    assert!(json.contains("\"timestamp\": 1700000000"));
    assert!(json.contains("\"n_samples\": 3"));
    // sum:total never varies
    assert!(json.contains("\"kind\": \"maximal\""));
    assert!(json.contains("\"kind\": \"missing\""));
}

#[test]
fn test_process_csv_to_stdout() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--probes-dir")
        .arg(&probes)
        .arg("--hash")
        .arg("3c1f9a2")
        .arg("--format")
        .arg("csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("test,variable,backend,timestamp,mu,"))
        .stdout(predicate::str::contains("dot,result,mca,"))
        .stdout(predicate::str::contains("sum,total,mca,"));
}

#[test]
fn test_process_exports_raw_samples() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let raw = tmp_dir.path().join("raw.json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--probes-dir")
        .arg(&probes)
        .arg("--export-raw")
        .arg(&raw);
    cmd.assert().success();

    let json = fs::read_to_string(&raw).unwrap();
    assert!(json.contains("numrepro-raw-v1"));
    assert!(json.contains("0x1.0000000000001p+0"));
}

#[test]
fn test_process_without_data_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, _) = write_suite(tmp_dir.path());
    let empty = tmp_dir.path().join("empty");
    fs::create_dir(&empty).unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--probes-dir")
        .arg(&empty);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "No data have been generated by your tests executions",
        ));
}

#[test]
fn test_process_without_suite_config_fails() {
    let tmp_dir = TempDir::new().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("process")
        .arg("--config")
        .arg(tmp_dir.path().join("missing.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("This file is required"));
}

#[test]
fn test_invalid_analysis_config_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let analysis = tmp_dir.path().join("numrepro.toml");
    fs::write(&analysis, "normality_threshold = 2.0\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("--analysis-config")
        .arg(&analysis)
        .arg("process")
        .arg("--config")
        .arg(&config)
        .arg("--probes-dir")
        .arg(&probes);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_aggregate_latest_run_by_test() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let first = process_run(tmp_dir.path(), &config, &probes, 1_700_000_000);
    let second = process_run(tmp_dir.path(), &config, &probes, 1_700_000_100);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("aggregate")
        .arg("--runs")
        .arg(&first)
        .arg(&second)
        .arg("--filter")
        .arg("backend=mca")
        .arg("--group-by")
        .arg("test");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("numrepro-aggregate-v1"))
        .stdout(predicate::str::contains("\"run\": 1700000100"))
        .stdout(predicate::str::contains("\"key\": \"dot\""))
        .stdout(predicate::str::contains("\"key\": \"sum\""));
}

#[test]
fn test_aggregate_rejects_same_dimension() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let run = process_run(tmp_dir.path(), &config, &probes, 1_700_000_000);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("aggregate")
        .arg("--runs")
        .arg(&run)
        .arg("--filter")
        .arg("test=dot")
        .arg("--group-by")
        .arg("test");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Cannot group by 'test'"));
}

#[test]
fn test_aggregate_unknown_run() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let run = process_run(tmp_dir.path(), &config, &probes, 1_700_000_000);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("aggregate")
        .arg("--runs")
        .arg(&run)
        .arg("--run")
        .arg("42")
        .arg("--filter")
        .arg("backend=mca")
        .arg("--group-by")
        .arg("variable");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No run with timestamp 42"));
}

#[test]
fn test_series_labels_colliding_runs() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let first = process_run(tmp_dir.path(), &config, &probes, 1_700_000_000);
    let second = process_run(tmp_dir.path(), &config, &probes, 1_700_000_100);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("series")
        .arg("--runs")
        .arg(&second)
        .arg(&first)
        .arg("--test")
        .arg("dot")
        .arg("--variable")
        .arg("result")
        .arg("--backend")
        .arg("mca")
        .arg("--format")
        .arg("text");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(" ago\n"))
        .stdout(predicate::str::contains(" ago (1)\n"));
}

#[test]
fn test_series_last_run_only() {
    let tmp_dir = TempDir::new().unwrap();
    let (config, probes) = write_suite(tmp_dir.path());
    let first = process_run(tmp_dir.path(), &config, &probes, 1_700_000_000);
    let second = process_run(tmp_dir.path(), &config, &probes, 1_700_000_100);

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("numrepro");
    cmd.arg("series")
        .arg("--runs")
        .arg(&first)
        .arg(&second)
        .arg("--test")
        .arg("dot")
        .arg("--variable")
        .arg("result")
        .arg("--backend")
        .arg("mca")
        .arg("--last")
        .arg("1")
        .arg("--format")
        .arg("csv");

    let output = cmd.assert().success().get_output().stdout.clone();
    let csv = String::from_utf8(output).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.lines().nth(1).unwrap().contains("1700000100"));
}
