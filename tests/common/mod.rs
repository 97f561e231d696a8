//! Common test utilities for the integration tests
//!
//! - mock_commands: scripted CommandRunner
//! - fixtures: captured lsscsi / skdump / nwipe output
//! - station builders wired to a scripted runner and a temp directory
#![allow(dead_code)]

pub mod fixtures;
pub mod mock_commands;

use baywipe::operations::BayObserver;
use baywipe::{DriveRecord, HealthState, Station, StationConfig, WipeState};
use mock_commands::{Scripted, ScriptedRunner};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Bays of the default layout with the device node the full fixture gives them
pub const BAY_DEVICES: [(u32, &str); 6] = [
    (8, "/dev/sdf"),
    (6, "/dev/sdd"),
    (4, "/dev/sdb"),
    (7, "/dev/sde"),
    (5, "/dev/sdc"),
    (9, "/dev/sdg"),
];

pub fn skdump_cmd(device: &str) -> String {
    format!("sudo -n skdump {}", device)
}

pub fn sktest_cmd(device: &str) -> String {
    format!("sudo -n sktest {} short", device)
}

pub fn nwipe_cmd(device: &str) -> String {
    format!(
        "sudo -n nwipe --autonuke --nogui --nowait --method=dodshort --verify=last --rounds=1 {}",
        device
    )
}

/// Serial the scripted skdump reports for a device ("SER-sdf")
pub fn serial_for(device: &str) -> String {
    format!("SER-{}", device.trim_start_matches("/dev/"))
}

/// Defaults with every file under `dir` and no wait between self-test polls
pub fn test_config(dir: &Path) -> StationConfig {
    let mut config = StationConfig::default();
    config.lock_dir = dir.join("locks");
    config.certificates.dir = dir.join("certificates");
    config.certificates.key_file = dir.join("signing.key");
    config.timeouts.self_test_poll_secs = 0;
    config
}

/// lsscsi scripted with all six bays occupied, skdump idle with a distinct
/// serial per drive
pub fn populated_runner() -> Arc<ScriptedRunner> {
    let runner = ScriptedRunner::new();
    runner.respond("lsscsi -b", Scripted::ok(fixtures::LSSCSI_BRIEF));
    runner.respond("lsscsi -c", Scripted::ok(fixtures::LSSCSI_CLASSIC));
    runner.respond("lsscsi -bs", Scripted::ok(fixtures::LSSCSI_SIZES));
    for (_, device) in BAY_DEVICES {
        runner.respond(&skdump_cmd(device), idle_dump(device));
        runner.respond(&sktest_cmd(device), Scripted::ok(""));
    }
    runner
}

pub fn idle_dump(device: &str) -> Scripted {
    Scripted::ok(&fixtures::with_serial(fixtures::SKDUMP_IDLE, &serial_for(device)))
}

pub fn running_dump(device: &str) -> Scripted {
    Scripted::ok(&fixtures::with_serial(fixtures::SKDUMP_RUNNING, &serial_for(device)))
}

pub fn failing_dump(device: &str) -> Scripted {
    Scripted::ok(&fixtures::with_serial(
        fixtures::SKDUMP_READ_FAILURE,
        &serial_for(device),
    ))
}

pub struct TestStation {
    pub station: Station,
    pub runner: Arc<ScriptedRunner>,
    pub dir: TempDir,
}

impl TestStation {
    pub fn build(runner: Arc<ScriptedRunner>) -> Self {
        Self::build_with(runner, |_| {})
    }

    pub fn build_with(runner: Arc<ScriptedRunner>, tweak: impl FnOnce(&mut StationConfig)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        tweak(&mut config);
        let station = Station::new(config, runner.clone()).unwrap();
        Self {
            station,
            runner,
            dir,
        }
    }

    /// Built and polled once
    pub fn polled(runner: Arc<ScriptedRunner>) -> Self {
        let mut test = Self::build(runner);
        test.station.refresh_all().unwrap();
        test
    }

    pub fn record(&self, port: u32) -> &DriveRecord {
        self.station
            .records()
            .iter()
            .find(|r| r.bay_port_number() == port)
            .unwrap()
    }
}

/// What an observer saw, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Changed(HealthState, WipeState),
    SelfTestStarted(Duration),
    Progress(u8),
    WipeStarted,
}

/// Observer that logs every callback into a shared list
#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingObserver {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn health_states(&self) -> Vec<HealthState> {
        self.seen()
            .into_iter()
            .filter_map(|s| match s {
                Seen::Changed(health, _) => Some(health),
                _ => None,
            })
            .collect()
    }

    pub fn wipe_states(&self) -> Vec<WipeState> {
        self.seen()
            .into_iter()
            .filter_map(|s| match s {
                Seen::Changed(_, wipe) => Some(wipe),
                _ => None,
            })
            .collect()
    }
}

impl BayObserver for RecordingObserver {
    fn record_changed(&mut self, record: &DriveRecord) {
        self.seen
            .lock()
            .unwrap()
            .push(Seen::Changed(record.health(), record.wipe_status()));
    }

    fn self_test_started(&mut self, _record: &DriveRecord, expected: Duration) {
        self.seen.lock().unwrap().push(Seen::SelfTestStarted(expected));
    }

    fn self_test_progress(&mut self, _record: &DriveRecord, percent_remaining: u8) {
        self.seen.lock().unwrap().push(Seen::Progress(percent_remaining));
    }

    fn wipe_started(&mut self, _record: &DriveRecord) {
        self.seen.lock().unwrap().push(Seen::WipeStarted);
    }
}
