use std::io::Write;

use shafer_core::{combine, CombinationEngine, ShaferError};
use shafer_sources::{load_session, SourceError};
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

const TWO_SENSORS_CSV: &str = "\
source,hypotheses,mass
sensor-a,Alice|Charlie,0.6
sensor-a,Bob,0.3
sensor-a,Alice|Bob,0.1
sensor-b,Alice|Bob,0.7
sensor-b,Alice|Charlie,0.2
sensor-b,Bob|Charlie,0.1
";

const TWO_SENSORS_JSON: &str = r#"{
    "frame": ["Alice", "Bob", "Charlie"],
    "sources": [
        { "name": "sensor-a", "masses": [
            { "hypotheses": ["Alice", "Charlie"], "mass": 0.6 },
            { "hypotheses": ["Bob"], "mass": 0.3 },
            { "hypotheses": ["Alice", "Bob"], "mass": 0.1 }
        ]},
        { "name": "sensor-b", "masses": [
            { "hypotheses": ["Alice", "Bob"], "mass": 0.7 },
            { "hypotheses": ["Alice", "Charlie"], "mass": 0.2 },
            { "hypotheses": ["Bob", "Charlie"], "mass": 0.1 }
        ]}
    ]
}"#;

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ---------------------------------------------------------------------------
// End-to-end loading
// ---------------------------------------------------------------------------

#[test]
fn csv_and_json_load_the_same_session() {
    let csv = write_temp(".csv", TWO_SENSORS_CSV);
    let json = write_temp(".json", TWO_SENSORS_JSON);

    let from_csv = load_session(csv.path()).unwrap();
    let from_json = load_session(json.path()).unwrap();

    assert_eq!(from_csv.frame, from_json.frame);
    assert_eq!(from_csv.source_names(), from_json.source_names());
    for (a, b) in from_csv.sources.iter().zip(&from_json.sources) {
        assert_eq!(a.mass, b.mass);
    }
}

#[test]
fn loaded_session_fuses_to_reference_values() {
    let csv = write_temp(".csv", TWO_SENSORS_CSV);
    let session = load_session(csv.path()).unwrap();
    let fused = session.combine(&CombinationEngine::new()).unwrap();

    let alice = session.frame.singleton("Alice").unwrap();
    assert!((fused.weight_of(&alice) - 0.44 / 0.94).abs() < 1e-9);
    assert!((fused.conflict() - 0.06).abs() < 1e-12);
    assert_eq!(fused.source_count(), 2);

    let direct = combine(&session.frame, &session.sources).unwrap();
    assert_eq!(direct.mass(), fused.mass());
}

#[test]
fn mutually_exclusive_file_is_total_conflict() {
    let csv = write_temp(
        ".csv",
        "source,hypotheses,mass\nwitness-1,Alice,1.0\nwitness-2,Bob,1.0\n",
    );
    let session = load_session(csv.path()).unwrap();
    assert!(matches!(
        session.combine(&CombinationEngine::new()),
        Err(ShaferError::TotalConflict { step: 1, .. })
    ));
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn missing_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    match load_session(&path) {
        Err(SourceError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected I/O error, got {:?}", other),
    }
}

#[test]
fn header_only_file_is_an_empty_session() {
    let csv = write_temp(".csv", "source,hypotheses,mass\n");
    assert!(matches!(load_session(csv.path()), Err(SourceError::EmptySession)));
}

#[test]
fn unnormalized_source_is_named_in_the_error() {
    let csv = write_temp(
        ".csv",
        "source,hypotheses,mass\ngood,Alice,1.0\nbad,Alice,0.4\nbad,Bob,0.5\n",
    );
    let err = load_session(csv.path()).unwrap_err();
    assert!(err.to_string().contains("'bad'"), "message: {}", err);
}

#[test]
fn json_extension_is_case_insensitive() {
    let json = write_temp(".JSON", TWO_SENSORS_JSON);
    assert_eq!(load_session(json.path()).unwrap().sources.len(), 2);
}
