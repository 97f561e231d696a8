// Bay addressing, per-bay locking and station construction

use super::*;
use crate::record::Activity;
use crate::tools::{ToolCommand, ToolError, ToolOutput};
use tempfile::TempDir;

struct NothingInstalled;

impl CommandRunner for NothingInstalled {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Missing {
            tool: command.tool_name().to_string(),
        })
    }
}

fn station_in(dir: &TempDir) -> Station {
    let mut config = StationConfig::default();
    config.lock_dir = dir.path().join("locks");
    config.certificates.dir = dir.path().join("certs");
    config.certificates.key_file = dir.path().join("signing.key");
    Station::new(config, Arc::new(NothingInstalled)).unwrap()
}

#[test]
fn test_selector_parses_port_numbers() {
    assert_eq!("8".parse::<BaySelector>().unwrap(), BaySelector::Port(8));
    assert_eq!(" 9 ".parse::<BaySelector>().unwrap(), BaySelector::Port(9));
}

#[test]
fn test_selector_normalizes_positions() {
    let expected = BaySelector::Slug("top-left".to_string());
    assert_eq!("top-left".parse::<BaySelector>().unwrap(), expected);
    assert_eq!("Top Left".parse::<BaySelector>().unwrap(), expected);
    assert_eq!("TOP-left".parse::<BaySelector>().unwrap(), expected);
}

#[test]
fn test_selector_rejects_blank() {
    assert!(matches!(
        "   ".parse::<BaySelector>(),
        Err(BayError::UnknownBay(_))
    ));
}

#[test]
fn test_find_by_port_and_slug() {
    let dir = TempDir::new().unwrap();
    let station = station_in(&dir);

    let by_port = station.find(&BaySelector::Port(7)).unwrap();
    assert_eq!(by_port.position(), "Middle Right");

    let by_slug = station.find(&"bottom-left".parse().unwrap()).unwrap();
    assert_eq!(by_slug.bay_port_number(), 5);
}

#[test]
fn test_find_unknown_bay() {
    let dir = TempDir::new().unwrap();
    let station = station_in(&dir);

    assert!(matches!(
        station.find(&BaySelector::Port(3)),
        Err(BayError::UnknownBay(_))
    ));
    assert!(matches!(
        station.find(&"attic".parse().unwrap()),
        Err(BayError::UnknownBay(_))
    ));
}

#[test]
fn test_station_keeps_configured_order() {
    let dir = TempDir::new().unwrap();
    let station = station_in(&dir);

    let ports: Vec<u32> = station.records().iter().map(|r| r.bay_port_number()).collect();
    assert_eq!(ports, vec![8, 6, 4, 7, 5, 9]);
}

#[test]
fn test_station_rejects_invalid_config() {
    let mut config = StationConfig::default();
    config.bays.pop();

    assert!(matches!(
        Station::new(config, Arc::new(NothingInstalled)),
        Err(BayError::Config(_))
    ));
}

#[test]
fn test_second_lock_on_same_bay_is_refused() {
    let dir = TempDir::new().unwrap();
    let record = DriveRecord::new("Top Left", 8);

    let held = BayLock::acquire(dir.path(), &record).unwrap();
    assert!(held.path().ends_with("bay-8.lock"));

    match BayLock::acquire(dir.path(), &record) {
        Err(BayError::Locked { position, .. }) => assert_eq!(position, "Top Left"),
        other => panic!("expected Locked, got {:?}", other),
    }

    // Other bays are unaffected
    let other = DriveRecord::new("Top Right", 6);
    assert!(BayLock::acquire(dir.path(), &other).is_ok());

    drop(held);
    assert!(BayLock::acquire(dir.path(), &record).is_ok());
}

#[test]
fn test_reset_refused_while_busy() {
    let dir = TempDir::new().unwrap();
    let mut station = station_in(&dir);
    station.records[0].begin(Activity::Wiping).unwrap();

    assert!(matches!(
        station.reset(&BaySelector::Port(8)),
        Err(BayError::Busy { .. })
    ));

    station.records[0].finish();
    assert!(station.reset(&BaySelector::Port(8)).is_ok());
}

#[test]
fn test_refresh_all_without_lsscsi_marks_every_bay() {
    let dir = TempDir::new().unwrap();
    let mut station = station_in(&dir);

    assert!(matches!(
        station.refresh_all(),
        Err(BayError::Tool(ToolError::Missing { .. }))
    ));
    assert!(station
        .records()
        .iter()
        .all(|r| r.presence() == Presence::ToolError));
}
