use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::errors::WatchError;
use crate::extractor::{Observation, PresenceState};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One persisted transition. Appended once per observed state change, never
/// rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub timestamp: DateTime<Local>,
    pub state: PresenceState,
    /// Raw matched text (or failure description), for diagnostics. Emitted
    /// to the tracing log; the CSV schema stays `Timestamp,Status`.
    pub raw: String,
}

/// Append-only CSV destination for one monitoring run.
///
/// Every run opens a fresh `status_log_<stamp>.csv` so historical data is
/// never overwritten. The header row is written and flushed immediately, and
/// every record is flushed before the write returns, so an interrupted run
/// still leaves a well-formed file.
pub struct StatusLog {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl StatusLog {
    /// Create the log directory if absent and open a new, uniquely named
    /// log file with its header row.
    pub fn create(dir: &Path) -> Result<Self, WatchError> {
        fs::create_dir_all(dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let (file, path) = open_fresh(dir, &stamp)?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(["Timestamp", "Status"])?;
        writer.flush()?;
        info!(path = %path.display(), "status log created");
        Ok(Self { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, flushing before returning so an interrupt never
    /// leaves a truncated row behind.
    pub fn append(&mut self, record: &StatusRecord) -> Result<(), WatchError> {
        self.writer.write_record([
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.state.to_string(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn close(mut self) -> Result<(), WatchError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Second-precision stamps can collide when two runs start within the same
/// second; a numeric suffix keeps each run's file unique without ever
/// truncating an existing one.
fn open_fresh(dir: &Path, stamp: &str) -> Result<(File, PathBuf), WatchError> {
    for attempt in 0..1000u32 {
        let name = if attempt == 0 {
            format!("status_log_{stamp}.csv")
        } else {
            format!("status_log_{stamp}_{attempt}.csv")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(WatchError::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "no free status log file name",
    )))
}

/// Tracks the last observed state and appends a record only on change.
pub struct ChangeLogger {
    log: StatusLog,
    /// `None` until the first observation, so the first poll always logs.
    last: Option<PresenceState>,
}

impl ChangeLogger {
    pub fn new(log: StatusLog) -> Self {
        Self { log, last: None }
    }

    pub fn last_state(&self) -> Option<PresenceState> {
        self.last
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }

    /// Append a record iff `observation` differs from the last recorded
    /// state (value equality). Returns whether a record was written.
    pub fn record_if_changed(&mut self, observation: &Observation) -> Result<bool, WatchError> {
        if self.last == Some(observation.state) {
            return Ok(false);
        }
        let record = StatusRecord {
            timestamp: Local::now(),
            state: observation.state,
            raw: observation.raw.clone(),
        };
        self.log.append(&record)?;
        info!(state = %record.state, raw = %record.raw, "status transition");
        self.last = Some(observation.state);
        Ok(true)
    }

    /// Flush and close the underlying log.
    pub fn close(self) -> Result<(), WatchError> {
        self.log.close()
    }
}
