use super::{pause, BayObserver};
use crate::parsers::skdump::{self, SelfTestVerdict};
use crate::record::{Activity, DriveRecord, HealthState};
use crate::tools::{ToolError, Tooling};
use crate::{BayError, BayResult};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Run a short SMART self-test against the bay's drive.
///
/// Health goes to Testing as soon as the check starts and always settles on
/// a terminal state before this returns: Healthy or Unhealthy for a drive
/// verdict, ToolError or TimedOut when the test could not be run or read.
pub fn check_health(
    tooling: &Tooling,
    record: &mut DriveRecord,
    observer: &mut dyn BayObserver,
) -> BayResult<HealthState> {
    record.ensure_idle()?;
    if record.health().is_settled() {
        return Err(BayError::AlreadySettled {
            position: record.position().to_string(),
            state: format!("health {}", record.health()),
        });
    }
    let device = record.require_device()?;

    record.begin(Activity::CheckingHealth)?;
    record.mark_testing();
    observer.record_changed(record);
    info!(bay = record.position(), device = %device, "health check started");

    let outcome = match run_short_self_test(tooling, record, &device, observer) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(bay = record.position(), device = %device, error = %e, "self-test could not be completed");
            match e {
                BayError::Tool(ref tool_err) if tool_err.is_timeout() => HealthState::TimedOut,
                _ => HealthState::ToolError,
            }
        }
    };

    record.settle_health(outcome);
    record.finish();
    info!(bay = record.position(), health = %outcome, "health check finished");
    observer.record_changed(record);
    Ok(outcome)
}

fn run_short_self_test(
    tooling: &Tooling,
    record: &mut DriveRecord,
    device: &str,
    observer: &mut dyn BayObserver,
) -> BayResult<HealthState> {
    let toolbox = tooling.toolbox();

    let dump = tooling.run(&toolbox.skdump(device))?;
    let minutes = skdump::short_self_test_minutes(&dump.stdout).unwrap_or_else(|e| {
        debug!(device, error = %e, "no polling time, assuming zero");
        0
    });
    record.note_self_test_minutes(minutes);
    observer.self_test_started(record, Duration::from_secs(u64::from(minutes) * 60));

    tooling.run_checked(&toolbox.sktest_short(device))?;

    let bound = toolbox.timeouts().self_test();
    let started = Instant::now();
    loop {
        pause(toolbox.self_test_poll_interval(), "sktest")?;

        let dump = tooling.run(&toolbox.skdump(device))?;
        let report = skdump::self_test_report(&dump.stdout)?;

        match report.verdict() {
            SelfTestVerdict::Running => {
                if let Some(remaining) = report.percent_remaining {
                    observer.self_test_progress(record, remaining);
                }
                if started.elapsed() >= bound {
                    return Err(ToolError::TimedOut {
                        tool: "sktest".to_string(),
                        after: bound,
                    }
                    .into());
                }
            }
            SelfTestVerdict::Passed => return Ok(HealthState::Healthy),
            SelfTestVerdict::Failed(reason) => {
                info!(device, reason = %reason, "self-test failed");
                return Ok(HealthState::Unhealthy);
            }
            SelfTestVerdict::Inconclusive(reason) => {
                warn!(device, reason = %reason, "self-test gave no verdict");
                return Ok(HealthState::ToolError);
            }
        }
    }
}
