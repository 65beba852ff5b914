use std::fs;
use std::path::Path;

use crate::extractor::{Observation, PresenceState};
use crate::status_log::{ChangeLogger, StatusLog};

fn logger_in(dir: &Path) -> ChangeLogger {
    ChangeLogger::new(StatusLog::create(dir).expect("log creation"))
}

/// Status column values of every data row in the log file.
fn logged_statuses(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).expect("log file readable");
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("Timestamp,Status"), "header row");
    lines
        .map(|line| {
            line.split(',')
                .nth(1)
                .unwrap_or_else(|| panic!("malformed row: {line}"))
                .to_string()
        })
        .collect()
}

fn timestamps(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).expect("log file readable");
    content
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().to_string())
        .collect()
}

#[test]
fn first_observation_always_logs() {
    let dir = tempfile::tempdir().unwrap();
    let mut logger = logger_in(dir.path());

    // Even the sentinel-adjacent states log on first observation.
    let wrote = logger
        .record_if_changed(&Observation::unknown())
        .unwrap();

    assert!(wrote);
    assert_eq!(logger.last_state(), Some(PresenceState::Unknown));
    let path = logger.path().to_path_buf();
    logger.close().unwrap();
    assert_eq!(logged_statuses(&path), vec!["unknown"]);
}

#[test]
fn unchanged_state_appends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut logger = logger_in(dir.path());

    let online = Observation::new(PresenceState::Online, "online");
    assert!(logger.record_if_changed(&online).unwrap());
    assert!(!logger.record_if_changed(&online).unwrap());
    assert!(!logger.record_if_changed(&online).unwrap());

    let path = logger.path().to_path_buf();
    logger.close().unwrap();
    assert_eq!(logged_statuses(&path), vec!["online"]);
}

#[test]
fn transitions_append_exactly_one_row_each() {
    let dir = tempfile::tempdir().unwrap();
    let mut logger = logger_in(dir.path());

    let sequence = [
        PresenceState::Unknown,
        PresenceState::Online,
        PresenceState::Online,
        PresenceState::Typing,
        PresenceState::Offline,
        PresenceState::Offline,
    ];
    for state in sequence {
        logger
            .record_if_changed(&Observation::new(state, ""))
            .unwrap();
    }

    let path = logger.path().to_path_buf();
    logger.close().unwrap();
    assert_eq!(
        logged_statuses(&path),
        vec!["unknown", "online", "typing", "offline"]
    );

    // Second-precision local timestamps, non-decreasing.
    let stamps = timestamps(&path);
    for stamp in &stamps {
        assert!(
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok(),
            "unparsable timestamp: {stamp}"
        );
    }
    for pair in stamps.windows(2) {
        assert!(pair[0] <= pair[1], "timestamps went backwards: {pair:?}");
    }
}

#[test]
fn zero_ticks_leaves_header_only_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = StatusLog::create(dir.path()).unwrap();
    let path = log.path().to_path_buf();
    log.close().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "Timestamp,Status\n");
}

#[test]
fn each_run_gets_a_fresh_file() {
    let dir = tempfile::tempdir().unwrap();

    // Two runs inside the same second must not share or truncate a file.
    let first = StatusLog::create(dir.path()).unwrap();
    let second = StatusLog::create(dir.path()).unwrap();

    assert_ne!(first.path(), second.path());
    let first_path = first.path().to_path_buf();
    let second_path = second.path().to_path_buf();
    first.close().unwrap();
    second.close().unwrap();
    assert!(first_path.exists());
    assert!(second_path.exists());
}

#[test]
fn log_directory_is_created_if_absent() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("logs").join("deep");

    let log = StatusLog::create(&nested).unwrap();
    assert!(log.path().starts_with(&nested));
    log.close().unwrap();
}

#[test]
fn error_state_is_a_transition_like_any_other() {
    let dir = tempfile::tempdir().unwrap();
    let mut logger = logger_in(dir.path());

    for observation in [
        Observation::new(PresenceState::Online, "online"),
        Observation::error("lookup timed out: scripted"),
        Observation::new(PresenceState::Online, "online"),
    ] {
        assert!(logger.record_if_changed(&observation).unwrap());
    }

    let path = logger.path().to_path_buf();
    logger.close().unwrap();
    assert_eq!(logged_statuses(&path), vec!["online", "error", "online"]);
}
