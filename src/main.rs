use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use env_logger::Env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use agentsim_launcher::{LaunchParameters, Launcher, LauncherConfig};

/// Downloads the latest AgentSim build if needed and starts it.
#[derive(Parser)]
#[command(name = "agentsim-launcher", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave snapshot builds out.
    #[arg(long)]
    no_snapshots: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LauncherConfig::load(path)?,
        None => LauncherConfig::default(),
    };

    if cli.print_config {
        print!("{}", config.as_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let launcher = Launcher::new(config, LaunchParameters::new(!cli.no_snapshots));
    launcher.progress().register(|percent: u8| {
        print!("\r> downloading... {}", format!("{percent:>3}%").cyan());
        if percent == 100 {
            println!();
        }
        let _ = io::stdout().flush();
    });

    let outcome = launcher
        .spawn()
        .await
        .context("launch task ended without reporting an outcome")?;

    // Failures were already logged with their full cause by the launcher.
    match outcome {
        Ok(artifact) => {
            println!("{} {}", "> launched".green(), artifact.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => {
            println!("{}", "> launch failed".red());
            Ok(ExitCode::FAILURE)
        }
    }
}
