mod app;
mod effects;
mod persistence;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use panel_engine::{EngineHandle, InstanceStore, StorageDir, WebSocketConnector};
use panel_logging::{panel_info, panel_warn, LogDestination};

use crate::effects::EffectRunner;
use crate::persistence::{load_settings, save_default_settings};

/// Terminal client for the artwork panel backend.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// WebSocket endpoint of the backend; overrides panel.ron.
    #[arg(long, env = "PANEL_SERVER_URL")]
    server: Option<String>,

    /// Directory holding the instance id and panel.ron.
    #[arg(long, env = "PANEL_STORAGE_DIR", default_value = ".panel")]
    storage_dir: PathBuf,

    /// Log destination: file, terminal, both or off; overrides panel.ron.
    #[arg(long, value_parser = parse_destination)]
    log: Option<LogDestination>,

    /// Log file path, used when logging to a file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_destination(raw: &str) -> Result<LogDestination, String> {
    LogDestination::parse(raw).ok_or_else(|| format!("unknown log destination '{raw}'"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let storage = StorageDir::new(&cli.storage_dir);
    let (mut settings, settings_note) = load_settings(&storage);
    if let Some(server) = cli.server {
        settings.server_url = server;
    }

    let destination = cli.log.unwrap_or_else(|| settings.log_destination());
    panel_logging::initialize(destination, settings.log_level(), cli.log_file.as_deref());
    if let Some(note) = settings_note {
        panel_warn!("{}", note);
    }

    storage
        .ensure()
        .with_context(|| format!("preparing storage at {}", cli.storage_dir.display()))?;
    save_default_settings(&storage, &settings);

    let instance_id = InstanceStore::new(storage)
        .get_or_create()
        .context("loading instance id")?;
    panel_info!("Instance {} connecting to {}", instance_id, settings.server_url);

    let engine_settings = settings.engine_settings();
    let connector = Arc::new(WebSocketConnector::new(
        engine_settings.server_url.clone(),
        engine_settings.connect_timeout,
    ));
    let engine = EngineHandle::start(engine_settings, instance_id.clone(), connector)
        .context("starting engine")?;

    app::run_app(instance_id, EffectRunner::new(engine))
}
