use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .join(name)
        .canonicalize()
        .expect("fixture present")
}

fn cli() -> Command {
    let mut cmd = cargo_bin_cmd!("starroute-cli");
    cmd.env("RUST_LOG", "error")
        .env_remove("STARROUTE_DATA")
        .arg("--data")
        .arg(fixture("systems.json"));
    cmd
}

#[test]
fn path_lists_every_jump() {
    cli()
        .args(["path", "--from", "Sol", "--to", "Delta", "--jump-range", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Route: 4 jumps, 42.00 ly"))
        .stdout(predicate::str::contains("  4. Delta (12.00 ly)"));
}

#[test]
fn path_names_only() {
    cli()
        .args(["path", "--from", "Sol", "--to", "Gamma", "--jump-range", "15"])
        .arg("--names-only")
        .assert()
        .success()
        .stdout("Sol\nAlpha\nBeta\nGamma\n");
}

#[test]
fn path_json_reports_validity() {
    cli()
        .args(["--format", "json", "path", "--from", "Sol", "--to", "Outlier"])
        .args(["--jump-range", "15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": false"));
}

#[test]
fn unreachable_path_prints_notice() {
    cli()
        .args(["path", "--from", "Sol", "--to", "Outlier", "--jump-range", "15"])
        .assert()
        .success()
        .stdout("No route found.\n");
}

#[test]
fn unknown_system_suggests_names() {
    cli()
        .args(["path", "--from", "Sol", "--to", "Gamm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean 'Gamma'?"));
}

#[test]
fn non_positive_jump_range_is_rejected() {
    cli()
        .args(["path", "--from", "Sol", "--to", "Gamma", "--jump-range", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("jump_range"));
}

#[test]
fn dataset_can_come_from_environment() {
    let mut cmd = cargo_bin_cmd!("starroute-cli");
    cmd.env("RUST_LOG", "error")
        .env("STARROUTE_DATA", fixture("systems.json"))
        .args(["path", "--from", "Sol", "--to", "Alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Route: 1 jumps, 10.00 ly"));
}

#[test]
fn missing_dataset_fails() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut cmd = cargo_bin_cmd!("starroute-cli");
    cmd.env("RUST_LOG", "error")
        .arg("--data")
        .arg(temp.path().join("absent.json"))
        .args(["path", "--from", "Sol", "--to", "Alpha"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dataset not found"));
}

#[test]
fn tour_prints_settlement_table() {
    cli()
        .arg("tour")
        .arg("--destinations")
        .arg(fixture("destinations.json"))
        .args(["--origin", "Sol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Point of Origin"))
        .stdout(predicate::str::contains("Beta 1 / Haven"))
        .stdout(predicate::str::contains("Beta 1 / Forge"))
        .stdout(predicate::str::contains("Epsilon 1"))
        .stdout(predicate::str::contains("Total distance: 77.62 ly"));
}

#[test]
fn tour_json_reports_completion() {
    cli()
        .args(["--format", "json", "tour", "--origin", "Sol"])
        .arg("--destinations")
        .arg(fixture("destinations.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"completed\""))
        .stdout(predicate::str::contains("\"settlement\": \"Watchtower\""));
}

#[test]
fn tour_respects_max_stops() {
    cli()
        .args(["--names-only", "tour", "--origin", "Sol", "--max-stops", "1"])
        .arg("--destinations")
        .arg(fixture("destinations.json"))
        .assert()
        .success()
        .stdout("Sol\nEpsilon\nSol\n");
}

#[test]
fn unreachable_tour_reports_no_solution() {
    cli()
        .args(["tour", "--origin", "Sol", "--cost", "jumps", "--jump-range", "15"])
        .arg("--destinations")
        .arg(fixture("remote_destinations.json"))
        .assert()
        .success()
        .stdout("No feasible tour found.\n");
}

#[test]
fn matrix_json_lists_locations_in_index_order() {
    cli()
        .args(["--format", "json", "matrix", "--origin", "Sol"])
        .arg("--destinations")
        .arg(fixture("destinations.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"locations\""))
        .stdout(predicate::str::contains("\"Sol\""))
        .stdout(predicate::str::contains("\"state\": \"value\""));
}

#[test]
fn matrix_marks_unreachable_pairs() {
    cli()
        .args(["matrix", "--origin", "Sol", "--cost", "jumps", "--jump-range", "15"])
        .arg("--destinations")
        .arg(fixture("remote_destinations.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Outlier"))
        .stdout(predicate::str::contains(" -"));
}

#[test]
fn no_solution_json_still_carries_an_empty_tour() {
    cli()
        .args(["--format", "json", "tour", "--origin", "Sol", "--cost", "jumps"])
        .args(["--jump-range", "15"])
        .arg("--destinations")
        .arg(fixture("remote_destinations.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"no_solution\""))
        .stdout(predicate::str::contains("\"rows\": []"))
        .stdout(predicate::str::contains("\"total_distance\": 0.0"));
}
