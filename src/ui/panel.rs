use crate::record::{DriveRecord, HealthState, Presence, WipeState};
use colored::{ColoredString, Colorize};

/// One bay as a block of text, the terminal counterpart of a drive panel
pub fn render_panel(record: &DriveRecord) -> String {
    let mut out = format!(
        "{} {}",
        record.position().bold(),
        format!("(port {})", record.bay_port_number()).dimmed()
    );

    match record.presence() {
        Presence::Detected => {}
        Presence::Unpolled => {
            out.push_str(&format!("\n  {}", "not polled yet".dimmed()));
            return out;
        }
        Presence::NoDrive => {
            out.push_str(&format!("\n  {}", "No drive detected".dimmed()));
            return out;
        }
        Presence::ToolError => {
            out.push_str(&format!("\n  {}", "Enumeration failed".magenta()));
        }
    }

    let device = record.device_path().unwrap_or(crate::record::UNKNOWN);
    out.push_str(&format!("\n  Device:  {}", device));
    out.push_str(&format!("\n  Make:    {}", record.make()));
    out.push_str(&format!("\n  Model:   {}", record.model()));
    out.push_str(&format!("\n  Size:    {}", record.size()));
    out.push_str(&format!("\n  Serial:  {}", record.serial()));
    out.push_str(&format!("\n  Health:  {}", health_label(record.health())));
    if let Some(minutes) = record.self_test_minutes() {
        out.push_str(&format!(" {}", format!("(short test ~{} min)", minutes).dimmed()));
    }
    out.push_str(&format!("\n  Wipe:    {}", wipe_label(record.wipe_status())));
    if let Some(case_id) = record.case_id() {
        out.push_str(&format!("\n  Case:    {}", case_id));
    }
    if let Some(path) = record.certificate_path() {
        out.push_str(&format!("\n  Cert:    {}", path.display()));
    }
    if record.is_busy() {
        out.push_str(&format!("\n  {}", record.activity().to_string().yellow()));
    }
    out
}

/// All bays, in station order, separated by blank lines
pub fn render_station(records: &[DriveRecord]) -> String {
    records
        .iter()
        .map(render_panel)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn health_label(state: HealthState) -> ColoredString {
    let text = state.to_string();
    match state {
        HealthState::Unknown => text.dimmed(),
        HealthState::Testing => text.yellow(),
        HealthState::Healthy => text.green().bold(),
        HealthState::Unhealthy => text.red().bold(),
        HealthState::ToolError | HealthState::TimedOut => text.magenta(),
    }
}

pub fn wipe_label(state: WipeState) -> ColoredString {
    let text = state.to_string();
    match state {
        WipeState::Unknown => text.dimmed(),
        WipeState::Wiping => text.yellow(),
        WipeState::Wiped => text.green().bold(),
        WipeState::Failed => text.red().bold(),
        WipeState::ToolError | WipeState::TimedOut => text.magenta(),
    }
}
