use super::{BayObserver, Confirmer};
use crate::crypto::{CertificateIssuer, WipeDetails};
use crate::parsers::nwipe::{self, EraseVerdict};
use crate::record::{Activity, CaseId, DriveRecord, WipeState};
use crate::tools::Tooling;
use crate::{BayError, BayResult};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeOutcome {
    /// The operator answered no; nothing changed
    Declined,
    Finished(WipeState),
}

/// Securely erase the bay's drive under a case ID.
///
/// Rejections (busy bay, settled status, no drive, declined confirmation) leave
/// the record untouched. Once confirmed the status goes to Wiping and then
/// to exactly one terminal state.
pub fn wipe_drive(
    tooling: &Tooling,
    issuer: &CertificateIssuer,
    record: &mut DriveRecord,
    case_id: &CaseId,
    confirmer: &mut dyn Confirmer,
    observer: &mut dyn BayObserver,
) -> BayResult<WipeOutcome> {
    record.ensure_idle()?;

    let status = record.wipe_status();
    if status.is_settled() {
        return Err(BayError::AlreadySettled {
            position: record.position().to_string(),
            state: format!("wipe {}", status),
        });
    }
    let device = record.require_device()?;

    if !confirmer.confirm_wipe(record, case_id)? {
        info!(bay = record.position(), case_id = %case_id, "wipe declined");
        return Ok(WipeOutcome::Declined);
    }

    record.begin(Activity::Wiping)?;
    record.mark_wiping(case_id.clone());
    observer.record_changed(record);
    observer.wipe_started(record);
    info!(bay = record.position(), device = %device, case_id = %case_id, "wipe started");

    let started_at = Utc::now();
    let clock = Instant::now();
    let outcome = match tooling.run(&tooling.toolbox().nwipe(&device)) {
        Ok(output) => match nwipe::classify(&output) {
            EraseVerdict::Erased => WipeState::Wiped,
            EraseVerdict::Failed(reason) => {
                warn!(bay = record.position(), reason = %reason, "nwipe reported failure");
                WipeState::Failed
            }
            EraseVerdict::NoReport => {
                warn!(
                    bay = record.position(),
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr.trim(),
                    "nwipe exited without a report"
                );
                WipeState::ToolError
            }
        },
        Err(e) if e.is_timeout() => {
            warn!(bay = record.position(), error = %e, "wipe timed out");
            WipeState::TimedOut
        }
        Err(e) => {
            warn!(bay = record.position(), error = %e, "nwipe could not be run");
            WipeState::ToolError
        }
    };
    record.settle_wipe(outcome);

    if outcome == WipeState::Wiped {
        let details = WipeDetails {
            method: tooling.toolbox().erase_method(),
            started_at,
            finished_at: Utc::now(),
            duration_seconds: clock.elapsed().as_secs(),
            host: crate::crypto::certificates::host_name(),
        };
        match issuer.issue(record, case_id, details) {
            Ok(path) => {
                info!(bay = record.position(), certificate = %path.display(), "certificate written");
                record.attach_certificate(path);
            }
            Err(e) => warn!(bay = record.position(), error = %e, "certificate could not be written"),
        }
    }

    record.finish();
    info!(bay = record.position(), wipe_status = %outcome, "wipe finished");
    observer.record_changed(record);
    Ok(WipeOutcome::Finished(outcome))
}
