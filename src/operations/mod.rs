// Per-bay operations
//
// - health.rs: short SMART self-test (skdump + sktest) and its verdict
// - wipe.rs: case-ID gated, confirmed nwipe run plus certificate
//
// Both take exactly one &mut DriveRecord, so an operation can never touch
// another bay's state.

pub mod health;
pub mod wipe;

pub use health::check_health;
pub use wipe::{wipe_drive, WipeOutcome};

use crate::record::{CaseId, DriveRecord};
use crate::tools::ToolError;
use crate::BayResult;
use std::thread;
use std::time::{Duration, Instant};

/// Receives record updates while an operation runs (front ends redraw from these)
pub trait BayObserver: Send {
    fn record_changed(&mut self, _record: &DriveRecord) {}

    /// `expected` is the drive's advisory duration for a short test
    fn self_test_started(&mut self, _record: &DriveRecord, _expected: Duration) {}

    fn self_test_progress(&mut self, _record: &DriveRecord, _percent_remaining: u8) {}

    fn wipe_started(&mut self, _record: &DriveRecord) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl BayObserver for NoopObserver {}

/// Yes/no gate in front of every wipe
pub trait Confirmer {
    fn confirm_wipe(&mut self, record: &DriveRecord, case_id: &CaseId) -> BayResult<bool>;
}

/// Confirms every wipe (`--yes`)
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm_wipe(&mut self, _record: &DriveRecord, _case_id: &CaseId) -> BayResult<bool> {
        Ok(true)
    }
}

/// Sleep that wakes early on Ctrl+C
pub(crate) fn pause(duration: Duration, tool: &str) -> Result<(), ToolError> {
    const STEP: Duration = Duration::from_millis(100);
    let deadline = Instant::now() + duration;

    loop {
        if crate::is_interrupted() {
            return Err(ToolError::Interrupted {
                tool: tool.to_string(),
            });
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        thread::sleep(STEP.min(deadline - now));
    }
}
