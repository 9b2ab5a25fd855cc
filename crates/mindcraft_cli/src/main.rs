//! `mindcraft-init`: one-shot database bootstrap command.
//!
//! # Responsibility
//! - Reset the MindCraft database and seed the admin account.
//! - Report the outcome on stdout and failures on stderr with exit code 1.
//!
//! # Invariants
//! - An existing database file is only wiped when `--yes` is given.

use clap::Parser;
use log::warn;
use mindcraft_core::{
    default_log_level, init_console_logging, init_logging, Argon2Hasher, BootstrapOutcome,
    BootstrapService, DbLocation,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const CONSOLE_LOG_LEVEL: &str = "warn";

#[derive(Debug, Parser)]
#[command(
    name = "mindcraft-init",
    version,
    about = "Reset the MindCraft database and seed the admin account"
)]
struct Args {
    /// SQLite database file to reset and seed.
    #[arg(long, env = "MINDCRAFT_DB", default_value = "mindcraft.db")]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logs go to stderr when unset.
    #[arg(long)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    /// Confirm wiping an existing database file.
    #[arg(long)]
    yes: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(outcome) => {
            println!("{}", outcome.notice());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<BootstrapOutcome, Box<dyn Error>> {
    match &args.log_dir {
        Some(dir) => {
            let level = args.log_level.as_deref().unwrap_or_else(|| default_log_level());
            init_logging(level, dir)?;
        }
        None => init_console_logging(args.log_level.as_deref().unwrap_or(CONSOLE_LOG_LEVEL))?,
    }

    confirm_target(args)?;

    let service = BootstrapService::new(Argon2Hasher::new());
    let outcome = service.run(DbLocation::File(args.db.clone()))?;
    Ok(outcome)
}

/// Refuses to wipe an existing database file unless `--yes` was given.
fn confirm_target(args: &Args) -> Result<(), String> {
    if !args.db.exists() {
        return Ok(());
    }
    if !args.yes {
        return Err(format!(
            "`{}` already exists and would be wiped; rerun with --yes to confirm",
            args.db.display()
        ));
    }
    warn!(
        "event=bootstrap_confirmed module=cli status=ok path={} action=wipe_existing",
        args.db.display()
    );
    Ok(())
}
