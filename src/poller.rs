use crate::parsers::{lsscsi, skdump, ParseError};
use crate::record::{DriveRecord, PolledFacts, Presence, UNKNOWN};
use crate::tools::Tooling;
use crate::{BayError, BayResult};
use tracing::{debug, info, warn};

/// Output of the three lsscsi modes, captured once and shared by every bay
#[derive(Debug, Clone, Default)]
pub struct EnumerationSnapshot {
    pub brief: String,
    pub classic: String,
    pub sizes: String,
}

/// Reads drive facts for a bay out of lsscsi and skdump
pub struct HardwarePoller<'a> {
    tooling: &'a Tooling,
}

impl<'a> HardwarePoller<'a> {
    pub fn new(tooling: &'a Tooling) -> Self {
        Self { tooling }
    }

    /// Run lsscsi in brief, classic and size modes
    pub fn snapshot(&self) -> BayResult<EnumerationSnapshot> {
        let toolbox = self.tooling.toolbox();
        Ok(EnumerationSnapshot {
            brief: self.tooling.run_checked(&toolbox.lsscsi_brief())?.stdout,
            classic: self.tooling.run_checked(&toolbox.lsscsi_classic())?.stdout,
            sizes: self.tooling.run_checked(&toolbox.lsscsi_sizes())?.stdout,
        })
    }

    /// Device node for a bay, or [`BayError::NoDriveDetected`] when the bay is empty
    pub fn resolve_device_path(&self, bay: u32) -> BayResult<String> {
        let output = self
            .tooling
            .run_checked(&self.tooling.toolbox().lsscsi_brief())?;
        device_path_in(&output.stdout, bay)
    }

    pub fn resolve_vendor(&self, bay: u32) -> BayResult<String> {
        let output = self
            .tooling
            .run_checked(&self.tooling.toolbox().lsscsi_classic())?;
        Ok(lsscsi::vendor(&output.stdout, bay)?)
    }

    pub fn resolve_model(&self, bay: u32) -> BayResult<String> {
        let output = self
            .tooling
            .run_checked(&self.tooling.toolbox().lsscsi_classic())?;
        Ok(lsscsi::model(&output.stdout, bay)?)
    }

    pub fn resolve_size(&self, bay: u32) -> BayResult<String> {
        let output = self
            .tooling
            .run_checked(&self.tooling.toolbox().lsscsi_sizes())?;
        Ok(lsscsi::size(&output.stdout, bay)?)
    }

    /// Serial from skdump; a dump without a serial gives [`UNKNOWN`]
    pub fn resolve_serial(&self, device_path: &str) -> BayResult<String> {
        // skdump exits non-zero for drives without SMART but still prints what it knows
        let output = self.tooling.run(&self.tooling.toolbox().skdump(device_path))?;
        Ok(or_unknown(skdump::serial(&output.stdout)))
    }

    /// Full re-poll of one bay
    pub fn refresh(&self, record: &mut DriveRecord) -> BayResult<Presence> {
        record.ensure_idle()?;
        match self.snapshot() {
            Ok(snapshot) => self.refresh_from(&snapshot, record),
            Err(e) => {
                warn!(bay = record.position(), error = %e, "drive enumeration failed");
                record.mark_poll_failed();
                Err(e)
            }
        }
    }

    /// Re-poll one bay using already captured lsscsi output
    pub fn refresh_from(
        &self,
        snapshot: &EnumerationSnapshot,
        record: &mut DriveRecord,
    ) -> BayResult<Presence> {
        record.ensure_idle()?;
        let bay = record.bay_port_number();

        let device_path = match device_path_in(&snapshot.brief, bay) {
            Ok(path) => path,
            Err(BayError::NoDriveDetected { .. }) => {
                if record.presence() == Presence::Detected {
                    info!(bay = record.position(), "drive removed");
                }
                record.mark_absent();
                return Ok(Presence::NoDrive);
            }
            Err(e) => return Err(e),
        };

        let serial = match self.resolve_serial(&device_path) {
            Ok(serial) => serial,
            Err(e) => {
                warn!(bay = record.position(), device = %device_path, error = %e, "serial lookup failed");
                record.mark_poll_failed();
                return Err(e);
            }
        };

        let facts = PolledFacts {
            make: or_unknown(lsscsi::vendor(&snapshot.classic, bay)),
            model: or_unknown(lsscsi::model(&snapshot.classic, bay)),
            size: or_unknown(lsscsi::size(&snapshot.sizes, bay)),
            device_path,
            serial,
        };

        if record.device_path().is_some() && !record.holds_same_drive(&facts) {
            info!(
                bay = record.position(),
                old_serial = record.serial(),
                new_serial = %facts.serial,
                "different drive seated, resetting bay"
            );
            record.reset();
        }

        debug!(
            bay = record.position(),
            device = %facts.device_path,
            make = %facts.make,
            model = %facts.model,
            size = %facts.size,
            serial = %facts.serial,
            "bay polled"
        );
        record.apply_poll(facts);
        Ok(Presence::Detected)
    }
}

fn device_path_in(brief: &str, bay: u32) -> BayResult<String> {
    lsscsi::device_path(brief, bay).map_err(|e| {
        debug!(bay, error = %e, "no device node for bay");
        BayError::NoDriveDetected { port: bay }
    })
}

/// Missing markers degrade to the placeholder instead of failing the poll
fn or_unknown(result: Result<String, ParseError>) -> String {
    result.unwrap_or_else(|e| {
        debug!(error = %e, "fact not found, using placeholder");
        UNKNOWN.to_string()
    })
}
