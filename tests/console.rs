// Interactive console driven from a scripted stdin

mod common;

use baywipe::ui::Console;
use baywipe::{HealthState, WipeState};
use common::fixtures;
use common::mock_commands::Scripted;
use common::{nwipe_cmd, populated_runner, TestStation};
use indicatif::{MultiProgress, ProgressDrawTarget};
use serial_test::serial;

async fn run_console(test: &mut TestStation, script: &str) -> String {
    let mut output = Vec::new();
    let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
    Console::new(&mut test.station, script.as_bytes(), &mut output, multi)
        .run()
        .await
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[tokio::test]
#[serial]
async fn test_ctrl_c_at_the_prompt_does_not_abort_the_next_check() {
    let mut test = TestStation::build(populated_runner());
    baywipe::set_interrupted();

    run_console(&mut test, "check 8\nquit\n").await;

    assert_eq!(test.record(8).health(), HealthState::Healthy);
    assert!(!baywipe::is_interrupted());
}

#[tokio::test]
#[serial]
async fn test_ctrl_c_at_the_prompt_does_not_abort_the_next_wipe() {
    let runner = populated_runner();
    runner.respond(&nwipe_cmd("/dev/sdg"), Scripted::ok(fixtures::NWIPE_SUCCESS));
    let mut test = TestStation::build(runner);
    baywipe::set_interrupted();

    let output = run_console(&mut test, "wipe 9 4512\nyes\nquit\n").await;

    assert!(output.contains("4512"));
    assert_eq!(test.record(9).wipe_status(), WipeState::Wiped);
    baywipe::reset_interrupted();
}

#[tokio::test]
#[serial]
async fn test_invalid_case_id_is_reported_and_console_continues() {
    let mut test = TestStation::build(populated_runner());
    baywipe::reset_interrupted();

    let output = run_console(&mut test, "wipe 9 12a\nshow\nquit\n").await;

    assert!(output.contains("error:"));
    assert_eq!(test.record(9).wipe_status(), WipeState::Unknown);
    assert_eq!(test.runner.count("sudo -n nwipe"), 0);
}
