use anyhow::{bail, Context, Result};
use baywipe::crypto::load_certificate;
use baywipe::operations::{AssumeYes, BayObserver, Confirmer, WipeOutcome};
use baywipe::ui::panel::{health_label, wipe_label};
use baywipe::ui::{render_panel, render_station, Console, ProgressObserver, TerminalConfirmer};
use baywipe::*;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::MultiProgress;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "baywipe")]
#[command(about = "Inventory, SMART-check and securely wipe drives in a fixed-bay station")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/baywipe/baywipe.toml)
    #[arg(long, global = true, env = "BAYWIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Skip the root check
    #[arg(long, global = true)]
    unsafe_mode: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every bay and show what is seated
    List {
        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a short SMART self-test on one bay, or "all"
    Check {
        /// Port number (8) or position (top-left), or "all"
        bay: String,
    },

    /// Securely erase the drive in one bay
    Wipe {
        /// Port number (8) or position (top-left)
        bay: String,

        /// Case / ticket number the wipe is recorded against (digits only)
        #[arg(long)]
        case_id: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Interactive console holding all six bays
    Console,

    /// Check a wipe certificate's signature against this station's key
    VerifyCert {
        /// Certificate JSON file
        file: PathBuf,
    },

    /// Print the effective configuration
    ShowConfig,
}

impl Commands {
    fn needs_root(&self) -> bool {
        !matches!(self, Commands::VerifyCert { .. } | Commands::ShowConfig)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = StationConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_logging(cli.debug, config.logging.file_dir.as_deref());

    setup_signal_handlers()?;

    // Check for root privileges
    if cli.command.needs_root() && !cli.unsafe_mode && !is_root() {
        eprintln!("Error: This program requires root privileges.");
        eprintln!("Please run with sudo or as root user (or pass --unsafe-mode).");
        std::process::exit(1);
    }

    match &cli.command {
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::VerifyCert { file } => {
            verify_certificate(&config, file)?;
        }
        Commands::List { json } => {
            let station = open_station(config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(station.records())?);
            } else {
                println!("{}", render_station(station.records()));
            }
        }
        Commands::Check { bay } => {
            let mut station = open_station(config)?;
            check(&mut station, bay).await?;
        }
        Commands::Wipe { bay, case_id, yes } => {
            let mut station = open_station(config)?;
            wipe(&mut station, bay, case_id, *yes)?;
        }
        Commands::Console => {
            let mut station = Station::new(config, Arc::new(SystemRunner::new()))?;
            let stdin = io::stdin();
            let mut console = Console::new(
                &mut station,
                stdin.lock(),
                io::stdout(),
                MultiProgress::new(),
            );
            console.run().await?;
        }
    }

    Ok(())
}

/// Build the station and take one inventory pass
fn open_station(config: StationConfig) -> Result<Station> {
    let mut station = Station::new(config, Arc::new(SystemRunner::new()))?;
    if let Err(e) = station.refresh_all() {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }
    Ok(station)
}

async fn check(station: &mut Station, bay: &str) -> Result<()> {
    let multi = MultiProgress::new();

    if bay.eq_ignore_ascii_case("all") {
        let results = station
            .check_all(|_| Box::new(ProgressObserver::new(&multi)) as Box<dyn BayObserver>)
            .await;
        if results.is_empty() {
            println!("No bay holds an unchecked drive.");
        }
        let mut failures = 0;
        for (position, result) in results {
            match result {
                Ok(state) => println!("{}: {}", position, health_label(state)),
                Err(e) => {
                    failures += 1;
                    println!("{}: {} {}", position, "error:".red(), e);
                }
            }
        }
        if failures > 0 {
            bail!("{} bay(s) could not be checked", failures);
        }
        return Ok(());
    }

    let selector: BaySelector = bay.parse()?;
    let mut observer = ProgressObserver::new(&multi);
    let state = station
        .check_health(&selector, &mut observer)
        .with_context(|| format!("Health check on {} failed", selector))?;

    println!("{}", render_panel(station.find(&selector)?));
    if state != HealthState::Healthy {
        bail!("health check finished as {}", health_label(state));
    }
    Ok(())
}

fn wipe(station: &mut Station, bay: &str, case_id: &str, assume_yes: bool) -> Result<()> {
    let selector: BaySelector = bay.parse()?;
    let multi = MultiProgress::new();
    let mut observer = ProgressObserver::new(&multi);

    let mut confirmer: Box<dyn Confirmer> = if assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirmer::stdio())
    };

    let outcome = station
        .wipe(&selector, case_id, confirmer.as_mut(), &mut observer)
        .with_context(|| format!("Wipe on {} was not started", selector))?;

    match outcome {
        WipeOutcome::Declined => {
            println!("Operation cancelled");
            Ok(())
        }
        WipeOutcome::Finished(state) => {
            println!("{}", render_panel(station.find(&selector)?));
            if state != WipeState::Wiped {
                bail!("wipe finished as {}", wipe_label(state));
            }
            Ok(())
        }
    }
}

fn verify_certificate(config: &StationConfig, file: &Path) -> Result<()> {
    let certificate = load_certificate(file)
        .with_context(|| format!("Failed to read certificate {}", file.display()))?;
    let issuer = crypto::CertificateIssuer::load(&config.certificates)
        .context("Failed to load the signing key")?;

    let valid = issuer.verify_certificate(&certificate)?;
    println!("Certificate: {}", certificate.certificate_id);
    println!(
        "  Case {} / {} (port {}) / serial {}",
        certificate.case_id,
        certificate.bay.position,
        certificate.bay.port,
        certificate.device_info.serial
    );
    println!("  Finished:  {}", certificate.wipe_details.finished_at);
    if valid {
        println!("  Signature: {}", "valid".green().bold());
        Ok(())
    } else {
        println!("  Signature: {}", "INVALID".red().bold());
        bail!("certificate signature does not match this station's key")
    }
}

fn init_logging(debug: bool, file_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter());

    let Some(dir) = file_dir else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("baywipe: file logging disabled, {}: {}", dir.display(), e);
        tracing_subscriber::registry().with(stderr_layer).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, "baywipe.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Some(guard)
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

fn setup_signal_handlers() -> Result<()> {
    use signal_hook::{consts::SIGINT, iterator::Signals};

    let mut signals = Signals::new([SIGINT])?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            if sig != SIGINT {
                continue;
            }
            // Nothing picked up the first one (e.g. idle at a prompt)
            if baywipe::is_interrupted() {
                eprintln!("\nInterrupted twice, exiting");
                std::process::exit(130);
            }
            eprintln!("\nInterrupt received, stopping the running tool (Ctrl+C again to quit)...");
            baywipe::set_interrupted();
        }
    });

    Ok(())
}
