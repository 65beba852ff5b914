use thiserror::Error;

/// Errors produced while driving the page or maintaining the status log.
///
/// Only `Startup` and the log-file variants can abort a run; everything else
/// is absorbed into an `error` observation by the extractor so one bad tick
/// never stops monitoring.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("lookup timed out: {0}")]
    Timeout(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser session error: {0}")]
    Session(String),

    #[error("startup failed: {0}")]
    Startup(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("log write failed: {0}")]
    Csv(#[from] csv::Error),
}
