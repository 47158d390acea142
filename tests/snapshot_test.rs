use std::path::Path;

use tcx_stats_wasm::converter::to_feature_collection;
use tcx_stats_wasm::{ActivityExtractor, ActivitySummary, ConvertOptions};

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn summarize(tcx: &str) -> serde_json::Value {
    let ex = ActivityExtractor::parse_str(tcx).unwrap();
    let summary = ActivitySummary::from_extractor(&ex).unwrap();
    serde_json::to_value(&summary).unwrap()
}

fn convert(tcx: &str) -> serde_json::Value {
    let ex = ActivityExtractor::parse_str(tcx).unwrap();
    let fc = to_feature_collection(&ex, &ConvertOptions::default()).unwrap();
    serde_json::to_value(&fc).unwrap()
}

/// Compare actual JSON output against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_snapshot(actual: &serde_json::Value, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1")) {
        let dir = Path::new(&path).parent().unwrap();
        std::fs::create_dir_all(dir).unwrap();
        let pretty = serde_json::to_string_pretty(actual).unwrap();
        std::fs::write(&path, pretty.as_bytes()).unwrap();
        eprintln!("Updated snapshot: {path}");
        return;
    }

    let expected_str = std::fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate."));
    let expected: serde_json::Value = serde_json::from_str(&expected_str)
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"));

    assert_eq!(
        *actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

// ---- basic/ ----

#[test]
fn snapshot_01_outdoor_run_summary() {
    let actual = summarize(&load_fixture("basic/01_outdoor_run.tcx"));
    assert_snapshot(&actual, "basic/01_outdoor_run.summary.json");
}

#[test]
fn snapshot_01_outdoor_run_geojson() {
    let actual = convert(&load_fixture("basic/01_outdoor_run.tcx"));
    assert_snapshot(&actual, "basic/01_outdoor_run.geojson");
}

#[test]
fn snapshot_02_indoor_ride_summary() {
    let actual = summarize(&load_fixture("basic/02_indoor_ride.tcx"));
    assert_snapshot(&actual, "basic/02_indoor_ride.summary.json");
}
