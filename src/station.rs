use crate::config::{CertificateConfig, StationConfig};
use crate::crypto::CertificateIssuer;
use crate::operations::{self, BayObserver, Confirmer, WipeOutcome};
use crate::poller::HardwarePoller;
use crate::record::{slugify, CaseId, DriveRecord, HealthState, Presence};
use crate::tools::{CommandRunner, Toolbox, Tooling};
use crate::{BayError, BayResult};
use futures::future::join_all;
use nix::errno::Errno;
use nix::fcntl::{flock, FlockArg};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// How an operator names a bay: its port number or its position ("top-left")
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaySelector {
    Port(u32),
    Slug(String),
}

impl BaySelector {
    pub fn matches(&self, record: &DriveRecord) -> bool {
        match self {
            BaySelector::Port(port) => record.bay_port_number() == *port,
            BaySelector::Slug(slug) => record.slug() == *slug,
        }
    }
}

impl FromStr for BaySelector {
    type Err = BayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(port) = s.parse::<u32>() {
            return Ok(BaySelector::Port(port));
        }
        let slug = slugify(&s.replace('-', " "));
        if slug.is_empty() {
            return Err(BayError::UnknownBay(s.to_string()));
        }
        Ok(BaySelector::Slug(slug))
    }
}

impl fmt::Display for BaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaySelector::Port(port) => write!(f, "port {}", port),
            BaySelector::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Exclusive advisory lock on one bay, held for the length of an operation.
///
/// Keeps two baywipe processes from driving the same disk. Released on drop.
#[derive(Debug)]
pub struct BayLock {
    _file: File,
    path: PathBuf,
}

impl BayLock {
    pub fn acquire(lock_dir: &Path, record: &DriveRecord) -> BayResult<Self> {
        fs::create_dir_all(lock_dir)?;
        let path = lock_dir.join(format!("bay-{}.lock", record.bay_port_number()));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => Ok(Self { _file: file, path }),
            Err(errno) if errno == Errno::EWOULDBLOCK => Err(BayError::Locked {
                position: record.position().to_string(),
                path,
            }),
            Err(errno) => Err(std::io::Error::from(errno).into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Owns the six drive records and runs every operation against them
pub struct Station {
    records: Vec<DriveRecord>,
    tooling: Tooling,
    certificates: CertificateConfig,
    issuer: Option<CertificateIssuer>,
    lock_dir: PathBuf,
}

impl Station {
    pub fn new(config: StationConfig, runner: Arc<dyn CommandRunner>) -> BayResult<Self> {
        config.validate()?;

        let records = config
            .bays
            .iter()
            .map(|bay| DriveRecord::new(bay.position.clone(), bay.port))
            .collect();

        Ok(Self {
            records,
            tooling: Tooling::new(runner, Toolbox::new(config.tools, config.timeouts)),
            certificates: config.certificates,
            issuer: None,
            lock_dir: config.lock_dir,
        })
    }

    pub fn records(&self) -> &[DriveRecord] {
        &self.records
    }

    pub fn find(&self, selector: &BaySelector) -> BayResult<&DriveRecord> {
        Ok(&self.records[self.index_of(selector)?])
    }

    fn index_of(&self, selector: &BaySelector) -> BayResult<usize> {
        self.records
            .iter()
            .position(|record| selector.matches(record))
            .ok_or_else(|| BayError::UnknownBay(selector.to_string()))
    }

    /// Re-poll every idle bay from a single lsscsi snapshot.
    ///
    /// A failed enumeration marks every idle bay ToolError and is returned;
    /// a failure on one bay is logged and does not touch the others.
    pub fn refresh_all(&mut self) -> BayResult<()> {
        let poller = HardwarePoller::new(&self.tooling);
        let snapshot = match poller.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "drive enumeration failed");
                for record in self.records.iter_mut().filter(|r| !r.is_busy()) {
                    record.mark_poll_failed();
                }
                return Err(e);
            }
        };

        for record in self.records.iter_mut() {
            if record.is_busy() {
                continue;
            }
            if let Err(e) = poller.refresh_from(&snapshot, record) {
                warn!(bay = record.position(), error = %e, "bay refresh failed");
            }
        }
        Ok(())
    }

    pub fn refresh(&mut self, selector: &BaySelector) -> BayResult<Presence> {
        let index = self.index_of(selector)?;
        HardwarePoller::new(&self.tooling).refresh(&mut self.records[index])
    }

    /// Clear everything known about the bay's disk (e.g. before seating a new one)
    pub fn reset(&mut self, selector: &BaySelector) -> BayResult<()> {
        let index = self.index_of(selector)?;
        let record = &mut self.records[index];
        record.ensure_idle()?;
        record.reset();
        info!(bay = record.position(), "bay reset");
        Ok(())
    }

    pub fn check_health(
        &mut self,
        selector: &BaySelector,
        observer: &mut dyn BayObserver,
    ) -> BayResult<HealthState> {
        let index = self.index_of(selector)?;
        let record = &mut self.records[index];
        let _lock = BayLock::acquire(&self.lock_dir, record)?;
        operations::check_health(&self.tooling, record, observer)
    }

    /// Health-check every bay holding a detected, not yet settled drive, one
    /// blocking worker per bay.
    ///
    /// Each worker owns its record for the duration and hands it back, so
    /// results come back per bay in station order.
    pub async fn check_all<F>(
        &mut self,
        mut observer_for: F,
    ) -> Vec<(String, BayResult<HealthState>)>
    where
        F: FnMut(&DriveRecord) -> Box<dyn BayObserver>,
    {
        let records = std::mem::take(&mut self.records);
        let mut slots: Vec<Option<DriveRecord>> = Vec::with_capacity(records.len());
        let mut workers = Vec::new();

        for (index, mut record) in records.into_iter().enumerate() {
            let eligible = record.presence() == Presence::Detected
                && !record.health().is_settled()
                && !record.is_busy();
            if !eligible {
                slots.push(Some(record));
                continue;
            }
            slots.push(None);

            let tooling = self.tooling.clone();
            let lock_dir = self.lock_dir.clone();
            let mut observer = observer_for(&record);
            let bay = (record.position().to_string(), record.bay_port_number());

            workers.push(async move {
                let joined = tokio::task::spawn_blocking(move || {
                    let result = match BayLock::acquire(&lock_dir, &record) {
                        Ok(_lock) => {
                            operations::check_health(&tooling, &mut record, observer.as_mut())
                        }
                        Err(e) => Err(e),
                    };
                    (record, result)
                })
                .await;
                (index, bay, joined)
            });
        }

        let mut results = Vec::new();
        for (index, (position, port), joined) in join_all(workers).await {
            let (record, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(bay = %position, error = %e, "health worker died, bay record rebuilt");
                    let lost = std::io::Error::new(
                        std::io::ErrorKind::Other,
                        format!("health worker failed: {}", e),
                    );
                    (DriveRecord::new(position.clone(), port), Err(lost.into()))
                }
            };
            slots[index] = Some(record);
            results.push((position, result));
        }

        self.records = slots.into_iter().flatten().collect();
        results
    }

    /// Wipe one bay. The case ID is checked first, before the signing key or
    /// the bay lock file is touched; the key is loaded before anything is
    /// asked or run.
    pub fn wipe(
        &mut self,
        selector: &BaySelector,
        case_id: &str,
        confirmer: &mut dyn Confirmer,
        observer: &mut dyn BayObserver,
    ) -> BayResult<WipeOutcome> {
        let index = self.index_of(selector)?;
        let case_id: CaseId = case_id.parse().inspect_err(|_| {
            warn!(bay = self.records[index].position(), input = case_id, "rejected case ID");
        })?;
        self.load_issuer()?;
        let issuer = self.issuer.as_ref().ok_or_else(key_not_loaded)?;

        let record = &mut self.records[index];
        let _lock = BayLock::acquire(&self.lock_dir, record)?;
        operations::wipe_drive(&self.tooling, issuer, record, &case_id, confirmer, observer)
    }

    /// Issuer for checking certificates against this station's key
    pub fn certificate_issuer(&mut self) -> BayResult<&CertificateIssuer> {
        self.load_issuer()?;
        self.issuer.as_ref().ok_or_else(key_not_loaded)
    }

    fn load_issuer(&mut self) -> BayResult<()> {
        if self.issuer.is_none() {
            self.issuer = Some(CertificateIssuer::load(&self.certificates)?);
        }
        Ok(())
    }
}

fn key_not_loaded() -> BayError {
    BayError::Certificate("signing key not loaded".to_string())
}

#[cfg(test)]
#[path = "station_tests.rs"]
mod station_tests;
