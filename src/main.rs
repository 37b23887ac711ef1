use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::PathBuf;

use espterm_syscfg::boot::{apply_settings, factory_reset};
use espterm_syscfg::logging;
use espterm_syscfg::persist::{ConfigStore, Persist};
use espterm_syscfg::serial::LogSerial;
use espterm_syscfg::storage::DirBackend;
use espterm_syscfg::syscfg::{SystemConfig, UartSettings};
use espterm_syscfg::version;

#[derive(Parser)]
#[command(name = "espterm-syscfg")]
#[command(about = "ESPTerm system settings tool (host build)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory standing in for the settings flash sector
    #[arg(short, long, default_value = "espterm-state")]
    state_dir: PathBuf,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the boot-time settings sequence (default)
    Boot,
    /// Overwrite the live settings with factory defaults and save
    FactoryReset,
    /// Save the live settings as the user defaults
    SaveDefault,
    /// Replace the live settings with the saved user defaults
    RestoreDefault,
    /// Print the stored settings as JSON
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logger(LevelFilter::Info).context("Failed to initialize logger")?;
    if !logging::set_max_level_from_str(&cli.log_level) {
        return Err(anyhow!("Unknown log level '{}'", cli.log_level));
    }

    info!("ESPTerm settings {}", version::full_version());

    let mut store = Persist::load(DirBackend::new(&cli.state_dir));
    info!("Settings store at {}", store.backend().root().display());

    match cli.command.unwrap_or(Commands::Boot) {
        Commands::Boot => {
            let mut serial = LogSerial::default();
            let report = apply_settings(&mut store, &mut serial)
                .context("Settings applied but not persisted")?;
            info!(
                "Boot complete: syscfg v{} -> v{}",
                report.from_version, report.to_version
            );
        }
        Commands::FactoryReset => {
            factory_reset(&mut store).context("Factory reset not persisted")?;
        }
        Commands::SaveDefault => {
            store
                .set_as_default()
                .context("Failed to save user defaults")?;
        }
        Commands::RestoreDefault => {
            let report = store.restore_default();
            if report.needs_commit() {
                info!("Saved defaults upgraded from syscfg v{}", report.from_version);
            }
            store.commit().context("Failed to save restored settings")?;
        }
        Commands::Show => {
            let view = serde_json::json!({
                "current": describe(store.current()),
                "defaults": describe(store.defaults()),
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn describe(config: &SystemConfig) -> serde_json::Value {
    serde_json::json!({
        "config_version": config.config_version,
        "access_pw": if config.access_pw.is_empty() { "<empty>" } else { "<set>" },
        "pwlock": config.pwlock().map(|l| format!("{:?}", l)),
        "uart": UartSettings::from_config(config).to_string(),
    })
}
