//! Mock adapter error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MockError {
    #[error("Mock jar not found at {path}")]
    JarNotFound { path: PathBuf },

    #[error("Mock jar download from {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Mock process failed to start: {message}")]
    SpawnFailed { message: String },

    #[error("Mock process did not report readiness within {timeout:?}")]
    StartupTimeout { timeout: Duration },

    #[error("Mock process exited during startup: {status}")]
    ExitedDuringStartup { status: String },

    #[error("Mock handshake failed: {message}")]
    HandshakeFailed { message: String },

    #[error("Mock command {command} failed: {status}")]
    CommandFailed { command: String, status: String },

    #[error("Mock control connection is closed")]
    ConnectionClosed,

    #[error("Mock protocol error: {message}")]
    ProtocolError { message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type MockResult<T> = Result<T, MockError>;
