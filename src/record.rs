use crate::{BayError, BayResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Placeholder shown for any drive fact that has not been (or could not be) read
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Unknown,
    Testing,
    Healthy,
    Unhealthy,
    /// The self-test could not be run or its result could not be read
    ToolError,
    TimedOut,
}

impl HealthState {
    /// A drive verdict was reached; only a reset clears it
    pub fn is_settled(&self) -> bool {
        matches!(self, HealthState::Healthy | HealthState::Unhealthy)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, HealthState::Unknown | HealthState::Testing)
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthState::Unknown => "Unknown",
            HealthState::Testing => "Testing",
            HealthState::Healthy => "Healthy",
            HealthState::Unhealthy => "Unhealthy",
            HealthState::ToolError => "Tool Error",
            HealthState::TimedOut => "Timed Out",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WipeState {
    Unknown,
    Wiping,
    Wiped,
    Failed,
    /// The erase tool could not be run or gave no report
    ToolError,
    TimedOut,
}

impl WipeState {
    pub fn is_settled(&self) -> bool {
        matches!(self, WipeState::Wiped | WipeState::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WipeState::Unknown | WipeState::Wiping)
    }
}

impl fmt::Display for WipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WipeState::Unknown => "Unknown",
            WipeState::Wiping => "Wiping",
            WipeState::Wiped => "Wiped",
            WipeState::Failed => "Failed",
            WipeState::ToolError => "Tool Error",
            WipeState::TimedOut => "Timed Out",
        };
        f.write_str(label)
    }
}

/// Outcome of the last hardware poll of a bay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Unpolled,
    Detected,
    NoDrive,
    ToolError,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Presence::Unpolled => "Not polled",
            Presence::Detected => "Drive detected",
            Presence::NoDrive => "No drive detected",
            Presence::ToolError => "Tool Error",
        };
        f.write_str(label)
    }
}

/// Operation currently running against a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    Idle,
    CheckingHealth,
    Wiping,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Activity::Idle => "idle",
            Activity::CheckingHealth => "health check in progress",
            Activity::Wiping => "wipe in progress",
        };
        f.write_str(label)
    }
}

/// Operator-supplied ticket number a wipe is recorded against.
///
/// Only ASCII digits are accepted. The digits are kept as entered so that
/// leading zeros on ticket numbers survive onto the certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CaseId {
    type Err = BayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(CaseId(s.to_string()))
        } else {
            Err(BayError::InvalidCaseId(s.to_string()))
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything known about the drive in one physical bay.
///
/// `position` and `bay_port_number` describe the slot, not the disk, and are
/// fixed at construction. Every other field describes whatever disk is
/// currently seated and goes back to its default on [`DriveRecord::reset`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveRecord {
    position: String,
    bay_port_number: u32,
    device_path: Option<String>,
    size: String,
    make: String,
    model: String,
    serial: String,
    health: HealthState,
    case_id: Option<CaseId>,
    wipe_status: WipeState,
    certificate_path: Option<PathBuf>,
    presence: Presence,
    self_test_minutes: Option<u32>,
    #[serde(skip)]
    activity: Activity,
}

impl DriveRecord {
    pub fn new(position: impl Into<String>, bay_port_number: u32) -> Self {
        Self {
            position: position.into(),
            bay_port_number,
            device_path: None,
            size: UNKNOWN.to_string(),
            make: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            serial: UNKNOWN.to_string(),
            health: HealthState::Unknown,
            case_id: None,
            wipe_status: WipeState::Unknown,
            certificate_path: None,
            presence: Presence::Unpolled,
            self_test_minutes: None,
            activity: Activity::Idle,
        }
    }

    /// Restore every disk-specific field to its default, keeping the slot identity
    pub fn reset(&mut self) {
        let position = std::mem::take(&mut self.position);
        *self = DriveRecord::new(position, self.bay_port_number);
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn bay_port_number(&self) -> u32 {
        self.bay_port_number
    }

    pub fn device_path(&self) -> Option<&str> {
        self.device_path.as_deref()
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn health(&self) -> HealthState {
        self.health
    }

    pub fn case_id(&self) -> Option<&CaseId> {
        self.case_id.as_ref()
    }

    pub fn wipe_status(&self) -> WipeState {
        self.wipe_status
    }

    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn self_test_minutes(&self) -> Option<u32> {
        self.self_test_minutes
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    /// Lower-case, dash separated position ("top-left"), used to address bays
    pub fn slug(&self) -> String {
        slugify(&self.position)
    }

    // ----- poll results -----

    pub(crate) fn apply_poll(&mut self, facts: PolledFacts) {
        self.device_path = Some(facts.device_path);
        self.make = facts.make;
        self.model = facts.model;
        self.size = facts.size;
        self.serial = facts.serial;
        self.presence = Presence::Detected;
    }

    /// The bay is empty: nothing known about the previous disk applies any more
    pub(crate) fn mark_absent(&mut self) {
        self.reset();
        self.presence = Presence::NoDrive;
    }

    /// Enumeration failed; keep the last facts for display but block operations
    pub(crate) fn mark_poll_failed(&mut self) {
        self.presence = Presence::ToolError;
    }

    /// Whether freshly polled facts describe the disk this record already tracks
    pub(crate) fn holds_same_drive(&self, facts: &PolledFacts) -> bool {
        if self.device_path.is_none() {
            return false;
        }
        if self.serial != UNKNOWN && facts.serial != UNKNOWN {
            return self.serial == facts.serial;
        }
        self.model == facts.model && self.size == facts.size
    }

    // ----- operation gating -----

    pub(crate) fn begin(&mut self, activity: Activity) -> BayResult<()> {
        if self.activity != Activity::Idle {
            return Err(BayError::Busy {
                position: self.position.clone(),
                activity: self.activity,
            });
        }
        self.activity = activity;
        Ok(())
    }

    pub(crate) fn finish(&mut self) {
        self.activity = Activity::Idle;
    }

    pub(crate) fn ensure_idle(&self) -> BayResult<()> {
        if self.is_busy() {
            return Err(BayError::Busy {
                position: self.position.clone(),
                activity: self.activity,
            });
        }
        Ok(())
    }

    pub(crate) fn require_device(&self) -> BayResult<String> {
        match (&self.device_path, self.presence) {
            (Some(path), Presence::Detected) => Ok(path.clone()),
            _ => Err(BayError::NoDriveDetected {
                port: self.bay_port_number,
            }),
        }
    }

    // ----- health lifecycle -----

    pub(crate) fn mark_testing(&mut self) {
        self.self_test_minutes = None;
        self.health = HealthState::Testing;
    }

    pub(crate) fn note_self_test_minutes(&mut self, minutes: u32) {
        self.self_test_minutes = Some(minutes);
    }

    pub(crate) fn settle_health(&mut self, outcome: HealthState) {
        debug_assert!(outcome.is_terminal(), "health cannot settle on {outcome}");
        self.health = outcome;
    }

    // ----- wipe lifecycle -----

    pub(crate) fn mark_wiping(&mut self, case_id: CaseId) {
        self.case_id = Some(case_id);
        self.certificate_path = None;
        self.wipe_status = WipeState::Wiping;
    }

    pub(crate) fn settle_wipe(&mut self, outcome: WipeState) {
        debug_assert!(outcome.is_terminal(), "wipe cannot settle on {outcome}");
        self.wipe_status = outcome;
    }

    pub(crate) fn attach_certificate(&mut self, path: PathBuf) {
        self.certificate_path = Some(path);
    }
}

/// Facts gathered by one successful poll of an occupied bay
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PolledFacts {
    pub device_path: String,
    pub make: String,
    pub model: String,
    pub size: String,
    pub serial: String,
}

pub(crate) fn slugify(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
