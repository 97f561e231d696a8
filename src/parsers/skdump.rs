//! skdump (libatasmart) output.
//!
//! ```text
//! Serial: [ZFL1ABCD]
//! SMART Disk Health Good: yes
//! Self-Test Execution Status: [Self-test routine in progress]
//! Percent Self-Test Remaining: 90%
//! Short Self-Test Polling Time: 2 min
//! Overall Status: GOOD
//! ```

use super::{ParseError, ParseResult};
use lazy_static::lazy_static;
use regex::Regex;

const TOOL: &str = "skdump";

lazy_static! {
    static ref SERIAL: Regex = Regex::new(r"Serial:\s\[(.+)\]").expect("valid serial regex");
    static ref SHORT_POLLING: Regex =
        Regex::new(r"Short Self-Test Polling Time: ([0-9]+)").expect("valid polling regex");
    static ref EXECUTION: Regex =
        Regex::new(r"Self-Test Execution Status: \[(.*)\]").expect("valid execution regex");
    static ref REMAINING: Regex =
        Regex::new(r"Percent Self-Test Remaining: ([0-9]+)%").expect("valid remaining regex");
    static ref OVERALL: Regex = Regex::new(r"Overall Status: (\S+)").expect("valid overall regex");
    static ref DISK_HEALTH: Regex =
        Regex::new(r"SMART Disk Health Good: (yes|no)").expect("valid disk health regex");
}

pub fn serial(output: &str) -> ParseResult<String> {
    SERIAL
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| not_found("Serial"))
}

/// Expected duration of a short self-test in minutes
pub fn short_self_test_minutes(output: &str) -> ParseResult<u32> {
    let raw = SHORT_POLLING
        .captures(output)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| not_found("Short Self-Test Polling Time"))?
        .as_str();

    raw.parse().map_err(|_| ParseError::Malformed {
        tool: TOOL,
        marker: "Short Self-Test Polling Time",
        value: raw.to_string(),
    })
}

/// What the drive says about its most recent self-test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfTestExecution {
    InProgress,
    CompletedWithoutError,
    /// Aborted or interrupted by the host; says nothing about the drive
    AbortedByHost(String),
    Failed(String),
    Unrecognized(String),
}

impl SelfTestExecution {
    fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("in progress") {
            SelfTestExecution::InProgress
        } else if lower.contains("completed without error") {
            SelfTestExecution::CompletedWithoutError
        } else if lower.contains("aborted by the host") || lower.contains("interrupted by the host")
        {
            SelfTestExecution::AbortedByHost(text.to_string())
        } else if lower.contains("failed") || lower.contains("fatal error") {
            SelfTestExecution::Failed(text.to_string())
        } else {
            SelfTestExecution::Unrecognized(text.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestReport {
    pub execution: SelfTestExecution,
    pub percent_remaining: Option<u8>,
    pub overall_status: Option<String>,
    pub disk_health_good: Option<bool>,
}

/// Classification of a finished (or still running) self-test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfTestVerdict {
    Running,
    Passed,
    Failed(String),
    /// The test did not produce a drive verdict
    Inconclusive(String),
}

impl SelfTestReport {
    /// A drive keeps the remaining percentage after a failed or aborted
    /// test, so only a clean status with work left counts as a test that
    /// has not been picked up yet.
    pub fn is_running(&self) -> bool {
        match self.execution {
            SelfTestExecution::InProgress => true,
            SelfTestExecution::CompletedWithoutError => {
                self.percent_remaining.is_some_and(|p| p > 0)
            }
            _ => false,
        }
    }

    pub fn verdict(&self) -> SelfTestVerdict {
        if self.is_running() {
            return SelfTestVerdict::Running;
        }

        match &self.execution {
            SelfTestExecution::CompletedWithoutError => {
                if self.disk_health_good == Some(false) {
                    return SelfTestVerdict::Failed("SMART disk health reported bad".to_string());
                }
                match self.overall_status.as_deref() {
                    Some(status) if status != "GOOD" => {
                        SelfTestVerdict::Failed(format!("overall status {}", status))
                    }
                    _ => SelfTestVerdict::Passed,
                }
            }
            SelfTestExecution::Failed(text) => SelfTestVerdict::Failed(text.clone()),
            SelfTestExecution::AbortedByHost(text) | SelfTestExecution::Unrecognized(text) => {
                SelfTestVerdict::Inconclusive(text.clone())
            }
            SelfTestExecution::InProgress => SelfTestVerdict::Running,
        }
    }
}

pub fn self_test_report(output: &str) -> ParseResult<SelfTestReport> {
    let execution = EXECUTION
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| SelfTestExecution::classify(m.as_str()))
        .ok_or_else(|| not_found("Self-Test Execution Status"))?;

    let percent_remaining = REMAINING
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let overall_status = OVERALL
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let disk_health_good = DISK_HEALTH
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str() == "yes");

    Ok(SelfTestReport {
        execution,
        percent_remaining,
        overall_status,
        disk_health_good,
    })
}

fn not_found(marker: &'static str) -> ParseError {
    ParseError::NotFound {
        tool: TOOL,
        marker,
        subject: "device".to_string(),
    }
}
