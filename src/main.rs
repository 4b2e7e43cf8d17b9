//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `page_recon` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Reading the target list
//! - User-facing output formatting

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;

use page_recon::initialization::{init_crypto_provider, init_logger_with};
use page_recon::{parse_targets, print_run_summary, Config, Opt, Recon, StatKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Try the current directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();
    let config = match Config::try_from(opt) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("page_recon error: {e}");
            process::exit(2);
        }
    };

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;
    init_crypto_provider();

    let input = match read_input(&config).await {
        Ok(input) => input,
        Err(e) => {
            eprintln!("page_recon error: {e:#}");
            process::exit(1);
        }
    };
    let targets = parse_targets(&input);
    if targets.is_empty() {
        eprintln!("page_recon error: no targets in input");
        process::exit(1);
    }

    match Recon::new(config).run(targets).await {
        Ok(report) => {
            print_run_summary(&report);
            let requests = report.stats.get(StatKind::RequestsAttempted);
            println!(
                "✅ Recorded {} page{} from {} request{} in {:.1}s",
                report.pages.len(),
                if report.pages.len() == 1 { "" } else { "s" },
                requests,
                if requests == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            println!("Session saved in {}", report.session_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("page_recon error: {e:#}");
            process::exit(1);
        }
    }
}

/// Reads the target list from `--input-file` or stdin.
async fn read_input(config: &Config) -> Result<String> {
    match &config.input_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read targets from stdin")?;
            Ok(input)
        }
    }
}
