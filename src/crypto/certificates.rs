use crate::config::CertificateConfig;
use crate::record::{CaseId, DriveRecord};
use crate::{BayError, BayResult};
use chrono::{DateTime, Utc};
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

const KEY_LEN: usize = 32;
const MIN_KEY_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WipeCertificate {
    pub certificate_id: String,
    pub case_id: CaseId,
    pub bay: BayInfo,
    pub device_info: DeviceCertInfo,
    pub wipe_details: WipeDetails,
    pub timestamp: DateTime<Utc>,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayInfo {
    pub position: String,
    pub port: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCertInfo {
    pub device_path: String,
    pub make: String,
    pub model: String,
    pub size: String,
    pub serial: String,
    pub device_hash: String, // Hash of the drive's identifying facts
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WipeDetails {
    pub method: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub host: String,
}

/// Signs, writes and checks wipe-completion certificates
pub struct CertificateIssuer {
    key: hmac::Key,
    dir: PathBuf,
}

impl CertificateIssuer {
    /// Load the signing key, creating it on first use
    pub fn load(config: &CertificateConfig) -> BayResult<Self> {
        let key = load_or_create_key(&config.key_file)?;
        Self::with_key(&key, &config.dir)
    }

    pub fn with_key(key: &[u8], dir: impl Into<PathBuf>) -> BayResult<Self> {
        if key.len() < MIN_KEY_LEN {
            return Err(BayError::Certificate(format!(
                "signing key is {} bytes, need at least {}",
                key.len(),
                MIN_KEY_LEN
            )));
        }
        Ok(Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, key),
            dir: dir.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn generate_certificate(
        &self,
        record: &DriveRecord,
        case_id: &CaseId,
        wipe_details: WipeDetails,
    ) -> BayResult<WipeCertificate> {
        let device_path = record
            .device_path()
            .ok_or(BayError::NoDriveDetected {
                port: record.bay_port_number(),
            })?
            .to_string();

        let device_info = DeviceCertInfo {
            device_path,
            make: record.make().to_string(),
            model: record.model().to_string(),
            size: record.size().to_string(),
            serial: record.serial().to_string(),
            device_hash: device_hash(record),
        };

        let mut certificate = WipeCertificate {
            certificate_id: Uuid::new_v4().to_string(),
            case_id: case_id.clone(),
            bay: BayInfo {
                position: record.position().to_string(),
                port: record.bay_port_number(),
            },
            device_info,
            wipe_details,
            timestamp: Utc::now(),
            signature: String::new(),
        };

        certificate.signature = hex::encode(self.sign_certificate(&certificate)?);
        Ok(certificate)
    }

    fn sign_certificate(&self, certificate: &WipeCertificate) -> BayResult<hmac::Tag> {
        Ok(hmac::sign(&self.key, &signing_payload(certificate)?))
    }

    pub fn verify_certificate(&self, certificate: &WipeCertificate) -> BayResult<bool> {
        let Ok(signature) = hex::decode(&certificate.signature) else {
            return Ok(false);
        };
        let payload = signing_payload(certificate)?;
        Ok(hmac::verify(&self.key, &payload, &signature).is_ok())
    }

    pub fn save_certificate(&self, certificate: &WipeCertificate) -> BayResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name(certificate));
        let json_data = serde_json::to_string_pretty(certificate)?;
        fs::write(&path, json_data)?;
        Ok(path)
    }

    /// Generate, sign and write the certificate for a finished wipe
    pub fn issue(
        &self,
        record: &DriveRecord,
        case_id: &CaseId,
        wipe_details: WipeDetails,
    ) -> BayResult<PathBuf> {
        let certificate = self.generate_certificate(record, case_id, wipe_details)?;
        self.save_certificate(&certificate)
    }
}

pub fn load_certificate(path: &Path) -> BayResult<WipeCertificate> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Host name recorded as the operator station, "unknown" if unavailable
pub fn host_name() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

fn device_hash(record: &DriveRecord) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.make().as_bytes());
    hasher.update(record.model().as_bytes());
    hasher.update(record.serial().as_bytes());
    hasher.update(record.size().as_bytes());

    format!("{:x}", hasher.finalize())
}

// Serialized certificate with the signature field blanked
fn signing_payload(certificate: &WipeCertificate) -> BayResult<Vec<u8>> {
    let mut unsigned = certificate.clone();
    unsigned.signature = String::new();
    Ok(serde_json::to_vec(&unsigned)?)
}

fn file_name(certificate: &WipeCertificate) -> String {
    let serial: String = certificate
        .device_info
        .serial
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(
        "{}-{}-{}.json",
        certificate.case_id,
        serial,
        certificate.timestamp.format("%Y%m%dT%H%M%SZ")
    )
}

fn load_or_create_key(path: &Path) -> BayResult<Vec<u8>> {
    match fs::read(path) {
        Ok(key) => return Ok(key),
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        Err(_) => {}
    }

    let mut key = vec![0u8; KEY_LEN];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| BayError::Certificate("system RNG unavailable".to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(&key)?;
    file.sync_all()?;

    info!(path = %path.display(), "created certificate signing key");
    Ok(key)
}
