use crate::operations::Confirmer;
use crate::record::{CaseId, DriveRecord};
use crate::BayResult;
use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Asks on the terminal before a wipe; anything but "y"/"yes" declines,
/// as does a Ctrl+C while the question is open
pub struct TerminalConfirmer<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirmer<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirmer for TerminalConfirmer<R, W> {
    fn confirm_wipe(&mut self, record: &DriveRecord, case_id: &CaseId) -> BayResult<bool> {
        writeln!(
            self.output,
            "\n{} This will permanently erase the drive in bay {}",
            "WARNING:".red().bold(),
            record.position().bold()
        )?;
        writeln!(
            self.output,
            "  {} {} {} ({}, serial {})",
            record.device_path().unwrap_or(crate::record::UNKNOWN),
            record.make(),
            record.model(),
            record.size(),
            record.serial()
        )?;
        write!(
            self.output,
            "Wipe this drive for case {}? [y/N]: ",
            case_id.as_str().bold()
        )?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        if crate::is_interrupted() {
            crate::reset_interrupted();
            writeln!(self.output, "\nInterrupted, drive left untouched.")?;
            return Ok(false);
        }
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
