// Tests for station configuration defaults, validation and layered loading

use super::*;
use serial_test::serial;
use std::io::Write;

#[test]
fn test_default_layout_matches_station() {
    let config = StationConfig::default();
    let ports: Vec<u32> = config.bays.iter().map(|b| b.port).collect();
    assert_eq!(ports, vec![8, 6, 4, 7, 5, 9]);
    assert_eq!(config.bays[0].position, "Top Left");
    assert_eq!(config.bays[5].position, "Bottom Right");
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_tools() {
    let tools = ToolConfig::default();
    assert_eq!(tools.lsscsi, "lsscsi");
    assert_eq!(tools.privilege_prefix, vec!["sudo", "-n"]);
    assert_eq!(tools.nwipe_method, "dodshort");
}

#[test]
fn test_rejects_wrong_bay_count() {
    let mut config = StationConfig::default();
    config.bays.pop();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("expected 6 bays, found 5"));
}

#[test]
fn test_rejects_duplicate_port() {
    let mut config = StationConfig::default();
    config.bays[1].port = 8;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate bay port 8"));
}

#[test]
fn test_rejects_duplicate_position() {
    let mut config = StationConfig::default();
    config.bays[1].position = "top  left".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_empty_position() {
    let mut config = StationConfig::default();
    config.bays[2].position = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_zero_timeout() {
    let mut config = StationConfig::default();
    config.timeouts.wipe_secs = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeouts.wipe_secs"));
}

#[test]
fn test_zero_poll_interval_is_allowed() {
    let mut config = StationConfig::default();
    config.timeouts.self_test_poll_secs = 0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_timeout_durations() {
    let timeouts = TimeoutConfig::default();
    assert_eq!(timeouts.enumerate(), Duration::from_secs(15));
    assert_eq!(timeouts.self_test(), Duration::from_secs(900));
}

#[test]
#[serial]
fn test_load_from_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
lock_dir = "/tmp/baywipe-test-locks"

[tools]
nwipe_method = "zero"

[timeouts]
wipe_secs = 3600
"#
    )
    .unwrap();

    let config = StationConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.tools.nwipe_method, "zero");
    assert_eq!(config.timeouts.wipe_secs, 3600);
    assert_eq!(config.timeouts.dump_secs, 30);
    assert_eq!(config.lock_dir, PathBuf::from("/tmp/baywipe-test-locks"));
    assert_eq!(config.bays, default_bays());
}

#[test]
#[serial]
fn test_load_missing_explicit_file_fails() {
    let err = StationConfig::load(Some(Path::new("/nonexistent/baywipe.toml"))).unwrap_err();
    assert!(matches!(err, BayError::Config(_)));
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    std::env::set_var("BAYWIPE_TIMEOUTS__DUMP_SECS", "45");
    let result = StationConfig::load(None);
    std::env::remove_var("BAYWIPE_TIMEOUTS__DUMP_SECS");

    let config = result.unwrap();
    assert_eq!(config.timeouts.dump_secs, 45);
}
