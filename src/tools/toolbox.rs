use super::ToolCommand;
use crate::config::{TimeoutConfig, ToolConfig};
use std::time::Duration;

/// Builds the command lines for every external tool the station drives
#[derive(Debug, Clone)]
pub struct Toolbox {
    tools: ToolConfig,
    timeouts: TimeoutConfig,
}

impl Toolbox {
    pub fn new(tools: ToolConfig, timeouts: TimeoutConfig) -> Self {
        Self { tools, timeouts }
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Erase method name recorded on certificates
    pub fn erase_method(&self) -> String {
        format!(
            "nwipe {} (verify: {}, rounds: {})",
            self.tools.nwipe_method, self.tools.nwipe_verify, self.tools.nwipe_rounds
        )
    }

    /// `lsscsi -b`: bay index and device node
    pub fn lsscsi_brief(&self) -> ToolCommand {
        self.lsscsi(["-b"])
    }

    /// `lsscsi -c`: classic /proc/scsi/scsi style vendor/model blocks
    pub fn lsscsi_classic(&self) -> ToolCommand {
        self.lsscsi(["-c"])
    }

    /// `lsscsi -bs`: device node plus human-readable size
    pub fn lsscsi_sizes(&self) -> ToolCommand {
        self.lsscsi(["-bs"])
    }

    pub fn skdump(&self, device_path: &str) -> ToolCommand {
        ToolCommand::new(&self.tools.skdump, [device_path], self.timeouts.dump())
            .elevated(&self.tools.privilege_prefix)
    }

    /// Starts a short self-test; sktest returns as soon as the drive accepts it
    pub fn sktest_short(&self, device_path: &str) -> ToolCommand {
        ToolCommand::new(
            &self.tools.sktest,
            [device_path, "short"],
            self.timeouts.dump(),
        )
        .elevated(&self.tools.privilege_prefix)
    }

    pub fn nwipe(&self, device_path: &str) -> ToolCommand {
        let args = vec![
            "--autonuke".to_string(),
            "--nogui".to_string(),
            "--nowait".to_string(),
            format!("--method={}", self.tools.nwipe_method),
            format!("--verify={}", self.tools.nwipe_verify),
            format!("--rounds={}", self.tools.nwipe_rounds),
            device_path.to_string(),
        ];
        ToolCommand::new(&self.tools.nwipe, args, self.timeouts.wipe())
            .elevated(&self.tools.privilege_prefix)
    }

    fn lsscsi<const N: usize>(&self, args: [&str; N]) -> ToolCommand {
        ToolCommand::new(&self.tools.lsscsi, args, self.timeouts.enumerate())
    }

    pub fn self_test_poll_interval(&self) -> Duration {
        self.timeouts.self_test_poll()
    }
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::new(ToolConfig::default(), TimeoutConfig::default())
    }
}
