//! nwipe run classification.
//!
//! nwipe ends a non-interactive run with a summary table; a drive that did
//! not complete is listed as `FAILURE` and the run closes with "Nwipe exited
//! with errors". A clean run reports `Erased` and exits 0.

use crate::tools::ToolOutput;

const FAILURE_MARKERS: [&str; 2] = ["FAILURE", "exited with errors"];
const REPORT_MARKERS: [&str; 2] = ["Erased", "successfully completed"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EraseVerdict {
    Erased,
    /// nwipe ran and reported that the erase did not complete
    Failed(String),
    /// nwipe exited unsuccessfully without reporting on the drive
    NoReport,
}

pub fn classify(output: &ToolOutput) -> EraseVerdict {
    let lines = output.stdout.lines().chain(output.stderr.lines());

    let mut reported = false;
    for line in lines {
        if FAILURE_MARKERS.iter().any(|m| line.contains(m)) {
            return EraseVerdict::Failed(line.trim().to_string());
        }
        if REPORT_MARKERS.iter().any(|m| line.contains(m)) {
            reported = true;
        }
    }

    if output.success() {
        EraseVerdict::Erased
    } else if reported {
        EraseVerdict::Failed(match output.exit_code {
            Some(code) => format!("nwipe exited with status {}", code),
            None => "nwipe was terminated by a signal".to_string(),
        })
    } else {
        EraseVerdict::NoReport
    }
}
