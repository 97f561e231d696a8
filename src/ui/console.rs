// Interactive console
//
// Holds the station's six records for the life of the process. Each line is
// one command against one bay (or "all" for health checks). Errors are
// printed and the loop carries on; only quit/EOF ends it.

use super::panel::{health_label, render_panel, render_station, wipe_label};
use super::progress::ProgressObserver;
use super::prompt::TerminalConfirmer;
use crate::operations::{BayObserver, WipeOutcome};
use crate::station::{BaySelector, Station};
use crate::BayResult;
use colored::Colorize;
use indicatif::MultiProgress;
use std::io::{BufRead, Write};
use tracing::debug;

const HELP: &str = "\
Commands:
  show                      show every bay
  refresh [bay]             re-poll one bay, or all of them
  check <bay|all>           run a short SMART self-test
  wipe <bay> <case-id>      securely erase a drive under a case ID
  reset <bay>               forget everything about a bay's drive
  help                      this text
  quit                      leave the console

Bays are named by port number (8) or position (top-left).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Show,
    Refresh(Option<BaySelector>),
    Check(Option<BaySelector>),
    Wipe(BaySelector, String),
    Reset(BaySelector),
    Quit,
}

impl ConsoleCommand {
    /// `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Ok(None);
        };

        let bay = |arg: &str| arg.parse::<BaySelector>().map_err(|e| e.to_string());

        let command = match (verb.to_ascii_lowercase().as_str(), args) {
            ("help" | "?", []) => ConsoleCommand::Help,
            ("show" | "list", []) => ConsoleCommand::Show,
            ("refresh", []) => ConsoleCommand::Refresh(None),
            ("refresh", [target]) => ConsoleCommand::Refresh(Some(bay(*target)?)),
            ("check", [target]) if target.eq_ignore_ascii_case("all") => {
                ConsoleCommand::Check(None)
            }
            ("check", [target]) => ConsoleCommand::Check(Some(bay(*target)?)),
            ("wipe", [target, case_id]) => ConsoleCommand::Wipe(bay(*target)?, case_id.to_string()),
            ("reset", [target]) => ConsoleCommand::Reset(bay(*target)?),
            ("quit" | "exit" | "q", []) => ConsoleCommand::Quit,
            ("check" | "reset" | "wipe" | "refresh", _) => {
                return Err(format!("wrong arguments for '{}', try 'help'", verb))
            }
            _ => return Err(format!("unknown command '{}', try 'help'", verb)),
        };
        Ok(Some(command))
    }
}

pub struct Console<'a, R, W> {
    station: &'a mut Station,
    input: R,
    output: W,
    multi: MultiProgress,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(station: &'a mut Station, input: R, output: W, multi: MultiProgress) -> Self {
        Self {
            station,
            input,
            output,
            multi,
        }
    }

    pub async fn run(&mut self) -> BayResult<()> {
        if let Err(e) = self.station.refresh_all() {
            writeln!(self.output, "{} {}", "error:".red().bold(), e)?;
        }
        writeln!(self.output, "{}\n", render_station(self.station.records()))?;
        writeln!(self.output, "Type 'help' for commands.")?;

        loop {
            write!(self.output, "baywipe> ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(());
            }

            let command = match ConsoleCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    writeln!(self.output, "{}", message.yellow())?;
                    continue;
                }
            };
            debug!(?command, "console command");

            if command == ConsoleCommand::Quit {
                return Ok(());
            }
            // A Ctrl+C at the prompt must not abort the command typed after it
            crate::reset_interrupted();
            if let Err(e) = self.execute(command).await {
                writeln!(self.output, "{} {}", "error:".red().bold(), e)?;
            }
        }
    }

    async fn execute(&mut self, command: ConsoleCommand) -> BayResult<()> {
        match command {
            ConsoleCommand::Help => writeln!(self.output, "{}", HELP)?,
            ConsoleCommand::Show => {
                writeln!(self.output, "{}", render_station(self.station.records()))?
            }
            ConsoleCommand::Refresh(None) => {
                self.station.refresh_all()?;
                writeln!(self.output, "{}", render_station(self.station.records()))?;
            }
            ConsoleCommand::Refresh(Some(bay)) => {
                self.station.refresh(&bay)?;
                writeln!(self.output, "{}", render_panel(self.station.find(&bay)?))?;
            }
            ConsoleCommand::Check(None) => {
                let multi = self.multi.clone();
                let results = self
                    .station
                    .check_all(|_| Box::new(ProgressObserver::new(&multi)) as Box<dyn BayObserver>)
                    .await;
                if results.is_empty() {
                    writeln!(self.output, "No bay holds an unchecked drive.")?;
                }
                for (position, result) in results {
                    match result {
                        Ok(state) => writeln!(self.output, "{}: {}", position, health_label(state))?,
                        Err(e) => writeln!(self.output, "{}: {} {}", position, "error:".red(), e)?,
                    }
                }
            }
            ConsoleCommand::Check(Some(bay)) => {
                let mut observer = ProgressObserver::new(&self.multi);
                let state = self.station.check_health(&bay, &mut observer)?;
                let position = self.station.find(&bay)?.position().to_string();
                writeln!(self.output, "{}: {}", position, health_label(state))?;
            }
            ConsoleCommand::Wipe(bay, case_id) => {
                let mut observer = ProgressObserver::new(&self.multi);
                let mut confirmer = TerminalConfirmer::new(&mut self.input, &mut self.output);
                let outcome = self
                    .station
                    .wipe(&bay, &case_id, &mut confirmer, &mut observer)?;
                match outcome {
                    WipeOutcome::Declined => writeln!(self.output, "Wipe cancelled.")?,
                    WipeOutcome::Finished(state) => {
                        writeln!(self.output, "Wipe finished: {}", wipe_label(state))?;
                        writeln!(self.output, "{}", render_panel(self.station.find(&bay)?))?;
                    }
                }
            }
            ConsoleCommand::Reset(bay) => {
                self.station.reset(&bay)?;
                writeln!(self.output, "{}", render_panel(self.station.find(&bay)?))?;
            }
            ConsoleCommand::Quit => {}
        }
        Ok(())
    }
}
