//! lsscsi output, keyed by bay (SCSI host) number.
//!
//! `lsscsi -b`:
//! ```text
//! [8:0:0:0]    /dev/sde
//! ```
//! `lsscsi -c`:
//! ```text
//! Host: scsi8 Channel: 00 Target: 00 Lun: 00
//!   Vendor: ATA      Model: ST2000DM008-2FR1 Rev: 0001
//! ```
//! `lsscsi -bs`:
//! ```text
//! [8:0:0:0]    /dev/sde   2.00TB
//! ```

use super::{ParseError, ParseResult};
use lazy_static::lazy_static;
use regex::Regex;

const TOOL: &str = "lsscsi";

lazy_static! {
    static ref DEVICE_NODE: Regex = Regex::new(r"/dev/[a-z]{3}\b").expect("valid device node regex");
    static ref VENDOR: Regex = Regex::new(r"Vendor:(.*?)Model:").expect("valid vendor regex");
    static ref MODEL: Regex = Regex::new(r"Model:(.*?)Rev:").expect("valid model regex");
}

/// Device node (`/dev/sdX`) attached to the bay, from `lsscsi -b`
pub fn device_path(output: &str, bay: u32) -> ParseResult<String> {
    let line = bay_line(output, bay)?;
    DEVICE_NODE
        .find(line)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| not_found("device node", bay))
}

/// Vendor string of the bay's drive, from `lsscsi -c`
pub fn vendor(output: &str, bay: u32) -> ParseResult<String> {
    between_markers(output, bay, &VENDOR, "Vendor:")
}

/// Model string of the bay's drive, from `lsscsi -c`
pub fn model(output: &str, bay: u32) -> ParseResult<String> {
    between_markers(output, bay, &MODEL, "Model:")
}

/// Human-readable size token (e.g. `2.00TB`) from `lsscsi -bs`
pub fn size(output: &str, bay: u32) -> ParseResult<String> {
    let line = bay_line(output, bay)?;
    let node = DEVICE_NODE
        .find(line)
        .ok_or_else(|| not_found("device node", bay))?;

    match line[node.end()..].split_whitespace().next() {
        Some(token) if token != "-" => Ok(token.to_string()),
        _ => Err(not_found("size", bay)),
    }
}

/// The `[<bay>:c:t:l]` line for a bay
fn bay_line(output: &str, bay: u32) -> ParseResult<&str> {
    let prefix = format!("[{}:", bay);
    output
        .lines()
        .find(|line| line.trim_start().starts_with(&prefix))
        .ok_or_else(|| not_found("bay line", bay))
}

/// Second line of the `Host: scsi<bay>` block in classic output
fn classic_detail_line(output: &str, bay: u32) -> ParseResult<&str> {
    let mut lines = output.lines();
    while let Some(line) = lines.next() {
        if names_host(line, bay) {
            return lines.next().ok_or_else(|| not_found("Vendor line", bay));
        }
    }
    Err(not_found("scsi host block", bay))
}

/// True when the line mentions `scsi<bay>` not followed by another digit
/// (so bay 1 does not match `scsi10`)
fn names_host(line: &str, bay: u32) -> bool {
    let needle = format!("scsi{}", bay);
    line.match_indices(&needle).any(|(idx, _)| {
        !line[idx + needle.len()..].starts_with(|c: char| c.is_ascii_digit())
    })
}

fn between_markers(
    output: &str,
    bay: u32,
    pattern: &Regex,
    marker: &'static str,
) -> ParseResult<String> {
    let line = classic_detail_line(output, bay)?;
    let value = pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();

    if value.is_empty() {
        return Err(not_found(marker, bay));
    }
    Ok(value.to_string())
}

fn not_found(marker: &'static str, bay: u32) -> ParseError {
    ParseError::NotFound {
        tool: TOOL,
        marker,
        subject: format!("bay {}", bay),
    }
}
