// Tests for lib.rs: the interrupt flag and the crate-wide error type
//
// Every test touching the interrupt flag is #[serial] and leaves it cleared,
// because tool runs anywhere in the test binary watch it.

use super::*;
use serial_test::serial;
use std::time::Duration;

// ==================== INTERRUPT HANDLING TESTS ====================

#[test]
#[serial]
fn test_interrupt_initially_not_set() {
    reset_interrupted();
    assert!(!is_interrupted(), "Interrupt flag should start cleared");
}

#[test]
#[serial]
fn test_set_and_reset_interrupt_flag() {
    reset_interrupted();
    set_interrupted();
    assert!(is_interrupted());
    assert!(is_interrupted(), "Flag should remain set until reset");

    reset_interrupted();
    assert!(!is_interrupted());
}

#[test]
#[serial]
fn test_pause_wakes_on_interrupt() {
    reset_interrupted();
    set_interrupted();

    let started = std::time::Instant::now();
    let result = operations::pause(Duration::from_secs(30), "sktest");
    reset_interrupted();

    assert!(matches!(result, Err(ToolError::Interrupted { ref tool }) if tool == "sktest"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
#[serial]
fn test_pause_completes_without_interrupt() {
    reset_interrupted();
    assert!(operations::pause(Duration::from_millis(150), "sktest").is_ok());
}

// ==================== BAY ERROR TESTS ====================

#[test]
fn test_no_drive_error_names_port() {
    let err = BayError::NoDriveDetected { port: 7 };
    assert_eq!(err.to_string(), "No drive detected on port 7");
}

#[test]
fn test_invalid_case_id_quotes_input() {
    let err = BayError::InvalidCaseId("12a".to_string());
    assert!(err.to_string().contains("'12a'"));
}

#[test]
fn test_busy_error_names_activity() {
    let err = BayError::Busy {
        position: "Top Left".to_string(),
        activity: Activity::Wiping,
    };
    let message = err.to_string();
    assert!(message.contains("Top Left"));
    assert!(message.contains(&Activity::Wiping.to_string()));
}

#[test]
fn test_locked_error_shows_lock_path() {
    let err = BayError::Locked {
        position: "Bottom Right".to_string(),
        path: PathBuf::from("/run/baywipe/bay-9.lock"),
    };
    assert!(err.to_string().contains("/run/baywipe/bay-9.lock"));
}

#[test]
fn test_tool_error_is_transparent() {
    let err: BayError = ToolError::Missing {
        tool: "nwipe".to_string(),
    }
    .into();
    assert_eq!(
        err.to_string(),
        ToolError::Missing {
            tool: "nwipe".to_string()
        }
        .to_string()
    );
}

#[test]
fn test_io_error_conversion() {
    let err: BayError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
    assert!(matches!(err, BayError::Io(_)));
    assert!(err.to_string().contains("I/O error"));
}

#[test]
fn test_json_error_becomes_certificate_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: BayError = json_err.into();
    assert!(matches!(err, BayError::Certificate(_)));
}

#[test]
fn test_config_error_conversion() {
    let err: BayError = ::config::ConfigError::Message("bad value".to_string()).into();
    match err {
        BayError::Config(message) => assert!(message.contains("bad value")),
        other => panic!("expected Config, got {:?}", other),
    }
}
