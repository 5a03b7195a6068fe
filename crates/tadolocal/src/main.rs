mod cli;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tadolocal_core::{Coordinator, CoreError, EntityId, SyncConfig, ZoneSetting};

use crate::cli::{Cli, Command, GlobalOpts, HotWaterArgs, SetArgs};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = build_config(&cli.global)?;

    tracing::debug!(command = ?cli.command, "dispatching command");

    match cli.command {
        Command::Probe => probe(config).await,
        Command::Zones => {
            Coordinator::oneshot(config, |coordinator| async move {
                println!("{}", output::zones_table(&coordinator.state()));
                Ok(())
            })
            .await?;
            Ok(())
        }
        Command::Devices => {
            Coordinator::oneshot(config, |coordinator| async move {
                println!("{}", output::devices_table(&coordinator.state()));
                Ok(())
            })
            .await?;
            Ok(())
        }
        Command::Watch => watch(config).await,
        Command::Set(args) => set_zone(config, args).await,
        Command::HotWater(args) => hot_water(config, args).await,
    }
}

fn build_config(global: &GlobalOpts) -> Result<SyncConfig, CliError> {
    let host = global.host.as_deref().ok_or(CliError::MissingHost)?;
    let mut config = SyncConfig::for_host(host, global.port)?;
    config.poll_interval = Duration::from_secs(global.interval);
    Ok(config)
}

// ── Probe ────────────────────────────────────────────────────────────

async fn probe(config: SyncConfig) -> Result<(), CliError> {
    let base_url = config.base_url.clone();
    let coordinator = Coordinator::new(config)?;
    coordinator.probe().await?;
    println!("bridge at {base_url} is reachable");
    Ok(())
}

// ── Watch ────────────────────────────────────────────────────────────

async fn watch(config: SyncConfig) -> Result<(), CliError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.connect().await?;
    println!("{}", output::zones_table(&coordinator.state()));

    let mut updates = coordinator.subscribe();
    let mut refresh_errors = coordinator.refresh_errors();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                let Some(state) = changed else { break };
                let stamp = chrono::Local::now().format("%H:%M:%S");
                println!(
                    "[{stamp}] state updated ({} zones, {} devices)",
                    state.zones.len(),
                    state.devices.len()
                );
                println!("{}", output::zones_table(&state));
            }
            result = refresh_errors.changed() => {
                if result.is_err() {
                    break;
                }
                if let Some(reason) = refresh_errors.borrow_and_update().clone() {
                    eprintln!("refresh failed: {reason}");
                }
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}

// ── Zone commands ────────────────────────────────────────────────────

/// A parsed `set` argument. `heat` without a temperature resumes the
/// zone's last target, which is only known once connected.
enum ParsedSetting {
    Fixed(ZoneSetting),
    ResumeHeating,
}

fn parse_setting(raw: &str) -> Result<ParsedSetting, CliError> {
    match raw.to_ascii_lowercase().as_str() {
        "off" => Ok(ParsedSetting::Fixed(ZoneSetting::Off)),
        "auto" => Ok(ParsedSetting::Fixed(ZoneSetting::Auto)),
        "heat" => Ok(ParsedSetting::ResumeHeating),
        other => other
            .parse::<f64>()
            .map(|t| ParsedSetting::Fixed(ZoneSetting::Heat(t)))
            .map_err(|_| CliError::InvalidSetting {
                setting: raw.to_owned(),
            }),
    }
}

/// Resuming heat without an explicit target reuses the zone's previous
/// setpoint when it is sane, falling back to 21°C.
fn heat_target(current: Option<f64>) -> f64 {
    match current {
        Some(target) if target >= 5.0 => target,
        _ => 21.0,
    }
}

async fn set_zone(config: SyncConfig, args: SetArgs) -> Result<(), CliError> {
    let parsed = parse_setting(&args.setting)?;
    let id = EntityId::from(args.zone.as_str());

    Coordinator::oneshot(config, |coordinator| async move {
        let state = coordinator.state();
        let zone_state = state
            .zone_state(&id)
            .ok_or_else(|| CoreError::ZoneNotFound { id: id.to_string() })?;

        let setting = match parsed {
            ParsedSetting::Fixed(setting) => setting,
            ParsedSetting::ResumeHeating => {
                ZoneSetting::Heat(heat_target(zone_state.target_temp_c))
            }
        };

        coordinator
            .execute(tadolocal_core::Command::SetZone {
                id: id.clone(),
                setting,
            })
            .await?;

        println!("zone {id} updated");
        Ok(())
    })
    .await?;
    Ok(())
}

async fn hot_water(config: SyncConfig, args: HotWaterArgs) -> Result<(), CliError> {
    if args.mode.is_none() && args.temperature.is_none() {
        return Err(CliError::EmptyHotWaterCommand);
    }
    let id = EntityId::from(args.zone.as_str());
    let mode = args.mode.map(Into::into);
    let temperature = args.temperature;

    Coordinator::oneshot(config, |coordinator| async move {
        if coordinator.state().zone(&id).is_none() {
            return Err(CoreError::ZoneNotFound { id: id.to_string() });
        }

        coordinator
            .execute(tadolocal_core::Command::SetHotWater {
                id: id.clone(),
                mode,
                temperature,
            })
            .await?;

        println!("hot water zone {id} updated");
        Ok(())
    })
    .await?;
    Ok(())
}
