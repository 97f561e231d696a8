//! Station configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional file,
//! then `BAYWIPE_*` environment variables (`__` separates nested keys, e.g.
//! `BAYWIPE_TIMEOUTS__WIPE_SECS=7200`).

use crate::{BayError, BayResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of physical bays in a station
pub const BAY_COUNT: usize = 6;

const ENV_PREFIX: &str = "BAYWIPE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub bays: Vec<BaySlot>,
    pub tools: ToolConfig,
    pub timeouts: TimeoutConfig,
    pub certificates: CertificateConfig,
    pub lock_dir: PathBuf,
    pub logging: LoggingConfig,
}

/// One physical slot: a label and the SCSI host number lsscsi reports for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaySlot {
    pub position: String,
    pub port: u32,
}

impl BaySlot {
    pub fn new(position: &str, port: u32) -> Self {
        Self {
            position: position.to_string(),
            port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub lsscsi: String,
    pub skdump: String,
    pub sktest: String,
    pub nwipe: String,
    /// Wrapper for tools that need root (skdump, sktest, nwipe); empty runs them directly
    pub privilege_prefix: Vec<String>,
    pub nwipe_method: String,
    pub nwipe_verify: String,
    pub nwipe_rounds: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            lsscsi: "lsscsi".to_string(),
            skdump: "skdump".to_string(),
            sktest: "sktest".to_string(),
            nwipe: "nwipe".to_string(),
            privilege_prefix: vec!["sudo".to_string(), "-n".to_string()],
            nwipe_method: "dodshort".to_string(),
            nwipe_verify: "last".to_string(),
            nwipe_rounds: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub enumerate_secs: u64,
    pub dump_secs: u64,
    /// Upper bound on waiting for a short self-test to report completion
    pub self_test_secs: u64,
    pub self_test_poll_secs: u64,
    pub wipe_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enumerate_secs: 15,
            dump_secs: 30,
            self_test_secs: 15 * 60,
            self_test_poll_secs: 10,
            wipe_secs: 72 * 60 * 60,
        }
    }
}

impl TimeoutConfig {
    pub fn enumerate(&self) -> Duration {
        Duration::from_secs(self.enumerate_secs)
    }

    pub fn dump(&self) -> Duration {
        Duration::from_secs(self.dump_secs)
    }

    pub fn self_test(&self) -> Duration {
        Duration::from_secs(self.self_test_secs)
    }

    pub fn self_test_poll(&self) -> Duration {
        Duration::from_secs(self.self_test_poll_secs)
    }

    pub fn wipe(&self) -> Duration {
        Duration::from_secs(self.wipe_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateConfig {
    pub dir: PathBuf,
    pub key_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// When set, a daily-rolling log file is written here as well
    pub file_dir: Option<PathBuf>,
}

impl Default for StationConfig {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/var/lib/baywipe"));
        let lock_dir = project_dirs()
            .and_then(|dirs| dirs.runtime_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| std::env::temp_dir().join("baywipe"));

        Self {
            bays: default_bays(),
            tools: ToolConfig::default(),
            timeouts: TimeoutConfig::default(),
            certificates: CertificateConfig {
                dir: data_dir.join("certificates"),
                key_file: data_dir.join("signing.key"),
            },
            lock_dir,
            logging: LoggingConfig::default(),
        }
    }
}

/// Physical layout of the station, as seen from the front:
///
/// ```text
/// ---------
/// | 8 | 6 |
/// ---------
/// | 4 | 7 |
/// ---------
/// | 5 | 9 |
/// ---------
/// ```
pub fn default_bays() -> Vec<BaySlot> {
    vec![
        BaySlot::new("Top Left", 8),
        BaySlot::new("Top Right", 6),
        BaySlot::new("Middle Left", 4),
        BaySlot::new("Middle Right", 7),
        BaySlot::new("Bottom Left", 5),
        BaySlot::new("Bottom Right", 9),
    ]
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "baywipe")
}

/// Default location of the config file (`~/.config/baywipe/baywipe.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("baywipe.toml"))
}

impl StationConfig {
    /// Load configuration. An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> BayResult<Self> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(::config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder =
                        builder.add_source(::config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StationConfig = settings.try_deserialize()?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> BayResult<()> {
        if self.bays.len() != BAY_COUNT {
            return Err(BayError::Config(format!(
                "expected {} bays, found {}",
                BAY_COUNT,
                self.bays.len()
            )));
        }

        let mut ports = HashSet::new();
        let mut positions = HashSet::new();
        for bay in &self.bays {
            if bay.position.trim().is_empty() {
                return Err(BayError::Config("bay position must not be empty".to_string()));
            }
            if !ports.insert(bay.port) {
                return Err(BayError::Config(format!("duplicate bay port {}", bay.port)));
            }
            if !positions.insert(crate::record::slugify(&bay.position)) {
                return Err(BayError::Config(format!(
                    "duplicate bay position '{}'",
                    bay.position
                )));
            }
        }

        let t = &self.timeouts;
        let timeouts = [
            ("enumerate_secs", t.enumerate_secs),
            ("dump_secs", t.dump_secs),
            ("self_test_secs", t.self_test_secs),
            ("wipe_secs", t.wipe_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(BayError::Config(format!("timeouts.{} must be non-zero", name)));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
