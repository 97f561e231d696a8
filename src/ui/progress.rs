use crate::operations::BayObserver;
use crate::record::DriveRecord;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(120);

/// Progress bars for one bay's operation
///
/// Bars are attached to a shared [`MultiProgress`] so concurrent health
/// checks draw one line per bay.
pub struct ProgressObserver {
    multi: MultiProgress,
    bar: Option<ProgressBar>,
}

impl ProgressObserver {
    pub fn new(multi: &MultiProgress) -> Self {
        Self {
            multi: multi.clone(),
            bar: None,
        }
    }

    fn replace_bar(&mut self, bar: ProgressBar) -> &ProgressBar {
        if let Some(old) = self.bar.take() {
            old.finish_and_clear();
        }
        bar.enable_steady_tick(TICK);
        self.bar.insert(self.multi.add(bar))
    }
}

fn self_test_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:>14.bold} [{bar:30.green/white}] {pos:>3}% {msg} ({elapsed})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

fn wipe_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>14.bold} {spinner:.red} {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl BayObserver for ProgressObserver {
    fn self_test_started(&mut self, record: &DriveRecord, expected: Duration) {
        let bar = ProgressBar::new(100)
            .with_style(self_test_style())
            .with_prefix(record.position().to_string())
            .with_message(format!(
                "short self-test, about {}",
                humantime::format_duration(expected)
            ));
        self.replace_bar(bar);
    }

    fn self_test_progress(&mut self, _record: &DriveRecord, percent_remaining: u8) {
        if let Some(bar) = &self.bar {
            bar.set_position(100u64.saturating_sub(u64::from(percent_remaining)));
        }
    }

    fn wipe_started(&mut self, record: &DriveRecord) {
        let case = record.case_id().map(|c| c.to_string()).unwrap_or_default();
        let bar = ProgressBar::new_spinner()
            .with_style(wipe_style())
            .with_prefix(record.position().to_string())
            .with_message(format!(
                "wiping {} for case {}",
                record.device_path().unwrap_or(crate::record::UNKNOWN),
                case
            ));
        self.replace_bar(bar);
    }

    fn record_changed(&mut self, record: &DriveRecord) {
        if record.is_busy() {
            return;
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!(
                "health {}, wipe {}",
                record.health(),
                record.wipe_status()
            ));
        }
    }
}
