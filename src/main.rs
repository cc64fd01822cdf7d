use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use clipgrab::clipboard::ClipboardDriver;
use clipgrab::logging;
use clipgrab::storage::{self, Config, ConfigStorage, TomlConfigStorage};

#[derive(Parser)]
#[command(name = "clipgrab")]
#[command(about = "Save the clipboard image to a temporary file", long_about = None)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/clipgrab/clipgrab.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exit successfully if the clipboard holds an image
    Check,

    /// Save the clipboard image and print its path
    Save,

    /// List clipboard tools and whether they are installed
    Backends,

    /// Remove saved images older than `stale_after_secs`
    Cleanup,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => storage::default_config_path()?,
    };
    let config_storage = TomlConfigStorage::new(config_path);
    let loaded = config_storage.load_existing();
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => Config::default(),
    };

    match &config.logging.file {
        Some(file) => logging::init_file_logger(file, &config.logging.level)?,
        None => logging::init_stderr_logger(&config.logging.level),
    }

    // Reported only now that a logger is installed
    match loaded {
        Ok(Some(_)) => log::debug!("Loaded configuration from {:?}", config_storage.path()),
        Ok(None) => {
            if let Err(e) = config_storage.create_default() {
                log::warn!("Could not write default configuration: {:#}", e);
            }
        }
        Err(e) => log::warn!("Using default configuration: {:#}", e),
    }

    match cli.command {
        Commands::Check => cmd_check(&config),
        Commands::Save => cmd_save(&config),
        Commands::Backends => cmd_backends(&config),
        Commands::Cleanup => cmd_cleanup(&config),
    }
}

fn driver(config: &Config) -> Result<ClipboardDriver> {
    ClipboardDriver::for_current_platform(config.general.retrieval_settings())
        .ok_or_else(|| anyhow!("Clipboard images are only supported on Linux and Windows"))
}

/// Report whether an image is on the clipboard via the exit code
fn cmd_check(config: &Config) -> Result<ExitCode> {
    if driver(config)?.has_clipboard_image() {
        println!("Clipboard holds an image.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("No image found in clipboard.");
        Ok(ExitCode::FAILURE)
    }
}

/// Save the clipboard image and print where it went
fn cmd_save(config: &Config) -> Result<ExitCode> {
    match driver(config)?.save_clipboard_image() {
        Ok(path) => {
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log::debug!("Save failed: {:?}", e);
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Show which clipboard tools are installed, in the order they are tried
fn cmd_backends(config: &Config) -> Result<ExitCode> {
    let driver = driver(config)?;

    println!("Clipboard backends ({:?}):", driver.platform());
    for (i, status) in driver.backend_report().iter().enumerate() {
        let caps = status.backend.capabilities();
        println!(
            "{:2}. {:<11} {:<13} list types: {:<3}  read images: {}",
            i + 1,
            status.backend.name(),
            if status.available { "installed" } else { "not installed" },
            if caps.can_enumerate_types { "yes" } else { "no" },
            if caps.can_read_image_bytes { "yes" } else { "no" },
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Delete old saved images from the output directory
fn cmd_cleanup(config: &Config) -> Result<ExitCode> {
    let dir = storage::ensure_clipboard_dir(config.general.output_dir.as_deref())
        .context("Failed to prepare clipboard directory")?;

    let removed = storage::cleanup_stale(&dir, config.general.stale_after())
        .with_context(|| format!("Failed to clean up {:?}", dir))?;

    println!("Removed {} stale clipboard images from {}", removed, dir.display());
    Ok(ExitCode::SUCCESS)
}
