/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-OTA. Walks the OTA update chain for
    every tracked Daria device, merges curated unlisted builds
    and publishes the bilingual official ROM report.

  Security / Safety Notes:
    Operates within user privileges. Performs HTTPS GET
    requests only and writes a single report file.

  Dependencies:
    clap for CLI parsing, chrono for log session stamps.

  Operational Scope:
    Run without arguments from the repository root to refresh
    docs/official-rom.md.

  Revision History:
    2025-11-12 COD  Authored Syn-OTA runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod error;
mod logger;
mod ota;
mod prettify;
mod record;
mod render;
mod report;
mod unlisted;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::ReportConfig;
use error::Result;
use logger::Logger;
use ota::OtaClient;
use report::{assemble_report, write_report, AssemblyOptions, FailurePolicy, ReportDocument};
use unlisted::{load_unlisted, load_unlisted_optional};

/// Command-line arguments for Syn-OTA.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-OTA",
    version,
    author = "Synavera Systems",
    about = "Official ROM report builder for Daria devices"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override report output path.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Override unlisted updates dataset path.
    #[arg(long, value_name = "PATH")]
    unlisted: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Do not write the report; emit summary only.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-OTA] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = ReportConfig::load_from_optional_path(cli.config.as_deref())?;
    let output_path = cli.output.clone().unwrap_or_else(|| config.output_path.clone());
    let unlisted_path = cli
        .unlisted
        .clone()
        .unwrap_or_else(|| config.unlisted_path.clone());

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .unwrap_or_else(|| config.log_dir.join(format!("report_{session_stamp}.log")));
    let logger = Logger::new(Some(log_path), cli.verbose)?;
    logger.info(
        "INIT",
        format!("Syn-OTA awakening; {} devices tracked", config.devices.len()),
    );

    let unlisted = if config.unlisted_optional {
        load_unlisted_optional(&unlisted_path, &logger)?
    } else {
        load_unlisted(&unlisted_path)?
    };
    logger.info(
        "UNLISTED",
        format!(
            "Loaded {} unlisted builds from {}",
            unlisted.len(),
            unlisted_path.display()
        ),
    );

    let client = OtaClient::new(&config.api)?;
    let options = AssemblyOptions {
        max_chain_depth: config.api.max_chain_depth,
        policy: FailurePolicy::from_fail_fast(config.fail_fast),
    };

    let document = match assemble_report(&client, &config.devices, &unlisted, options, &logger).await
    {
        Ok(document) => document,
        Err(err) => {
            logger.error("ABORT", format!("Report left untouched: {err}"));
            logger.finalize()?;
            return Err(err);
        }
    };

    let failed = document.failed_devices();
    if !failed.is_empty() {
        logger.warn(
            "PARTIAL",
            format!("Server builds unavailable for: {}", failed.join(", ")),
        );
    }
    logger.info("DIGEST", format!("sha256={}", document.digest()));

    if cli.dry_run {
        print_summary(&document);
    } else {
        write_report(&document, &output_path)?;
        logger.progress(
            "REPORT",
            format!("Done! Output saved to {}", output_path.display()),
        );
    }

    logger.info(
        "SUMMARY",
        format!(
            "devices={} server={} unlisted={}",
            document.sections.len(),
            document.server_update_count(),
            document.unlisted_update_count()
        ),
    );
    logger.info("COMPLETE", "Report synchronised.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}

fn print_summary(document: &ReportDocument) {
    println!(
        "→ Report dry-run. Devices={} Server builds={} Unlisted builds={} sha256={}",
        document.sections.len(),
        document.server_update_count(),
        document.unlisted_update_count(),
        document.digest()
    );
}
