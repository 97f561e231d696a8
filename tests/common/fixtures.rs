//! Captured tool output used across the integration tests

pub const LSSCSI_BRIEF: &str = include_str!("../fixtures/lsscsi_brief.txt");
pub const LSSCSI_BRIEF_PARTIAL: &str = include_str!("../fixtures/lsscsi_brief_partial.txt");
pub const LSSCSI_CLASSIC: &str = include_str!("../fixtures/lsscsi_classic.txt");
pub const LSSCSI_SIZES: &str = include_str!("../fixtures/lsscsi_sizes.txt");

pub const SKDUMP_IDLE: &str = include_str!("../fixtures/skdump_idle.txt");
pub const SKDUMP_RUNNING: &str = include_str!("../fixtures/skdump_running.txt");
pub const SKDUMP_READ_FAILURE: &str = include_str!("../fixtures/skdump_read_failure.txt");
pub const SKDUMP_NO_SMART: &str = include_str!("../fixtures/skdump_no_smart.txt");

const FIXTURE_SERIAL: &str = "ZFL1ABCD";

/// Same dump with a different serial, so each bay holds a distinct drive
pub fn with_serial(dump: &str, serial: &str) -> String {
    dump.replace(FIXTURE_SERIAL, serial)
}

pub const NWIPE_SUCCESS: &str = "\
[2024/03/01 11:30:02] nwipe: notice: Nwipe successfully completed. See summary table for details.
******************************** Error Summary *********************************
!   Device | Pass Errors | Verifications Errors | Fdatasync I\\O Errors
--------------------------------------------------------------------------------
       sdf |           0 |                    0 |           0
********************************************************************************
********************************* Drive Status *********************************
!   Device | Status | Thru-put | HH:MM:SS | Model/Serial Number
--------------------------------------------------------------------------------
       sdf | Erased |  158 MB/s| 02:30:00 | ST2000DM008-2FR1/ZFL1ABCD
********************************************************************************
";

pub const NWIPE_FAILURE: &str = "\
********************************* Drive Status *********************************
!   Device | Status | Thru-put | HH:MM:SS | Model/Serial Number
--------------------------------------------------------------------------------
       sdf | FAILURE! |   0 MB/s | 00:00:12 | ST2000DM008-2FR1/ZFL1ABCD
********************************************************************************
[2024/03/01 11:30:02] nwipe: error: Nwipe exited with errors on device = /dev/sdf, see log for specific error
";

/// Only the drive status table, without nwipe's closing error line
pub fn nwipe_failure_table() -> String {
    NWIPE_FAILURE
        .lines()
        .filter(|line| !line.contains("exited with errors"))
        .map(|line| format!("{}\n", line))
        .collect()
}
