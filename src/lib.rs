// Allow uppercase acronyms for industry-standard terms like SMART, SCSI
#![allow(clippy::upper_case_acronyms)]

pub mod config;
pub mod crypto;
pub mod operations;
pub mod parsers;
pub mod poller;
pub mod record;
pub mod station;
pub mod tools;
pub mod ui;

// Re-export the pieces every front end needs
pub use config::StationConfig;
pub use poller::HardwarePoller;
pub use record::{Activity, CaseId, DriveRecord, HealthState, Presence, WipeState};
pub use station::{BaySelector, Station};
pub use tools::{CommandRunner, SystemRunner, ToolCommand, ToolError, ToolOutput, Tooling};

use parsers::ParseError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

// Global flag for handling Ctrl+C interrupts
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Set the interrupt flag (called by signal handler)
pub fn set_interrupted() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Check if an interrupt has been received
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Reset the interrupt flag (after an interrupted console command, and in tests)
pub fn reset_interrupted() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

#[derive(Error, Debug)]
pub enum BayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No drive detected on port {port}")]
    NoDriveDetected { port: u32 },

    #[error("'{0}' is not a valid case ID")]
    InvalidCaseId(String),

    #[error("Bay {position} is busy: {activity}")]
    Busy { position: String, activity: Activity },

    #[error("Bay {position} is locked by another process ({path})")]
    Locked { position: String, path: PathBuf },

    #[error("Bay {position} already finished: {state}. Reset the bay first")]
    AlreadySettled { position: String, state: String },

    #[error("Unknown bay: {0}")]
    UnknownBay(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Certificate error: {0}")]
    Certificate(String),
}

impl From<::config::ConfigError> for BayError {
    fn from(err: ::config::ConfigError) -> Self {
        BayError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BayError {
    fn from(err: serde_json::Error) -> Self {
        BayError::Certificate(err.to_string())
    }
}

pub type BayResult<T> = Result<T, BayError>;

#[cfg(test)]
mod lib_tests;
