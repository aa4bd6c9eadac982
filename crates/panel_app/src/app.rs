use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use chrono::Local;
use panel_core::{update, AppViewModel, ClientState, InstanceId, Msg, PanelConfig, UploadRequest};
use panel_logging::{panel_info, panel_warn};
use serde_json::Value;

use crate::effects::EffectRunner;
use crate::ui::commands::{self, ConsoleAction, HELP};
use crate::ui::render;

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Input {
    Line(String),
    Tick(Duration),
    Closed,
}

pub fn run_app(instance_id: InstanceId, runner: EffectRunner) -> anyhow::Result<()> {
    let (input_tx, input_rx) = mpsc::channel::<Input>();

    let stdin_tx = input_tx.clone();
    thread::Builder::new()
        .name("panel-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if stdin_tx.send(Input::Line(line)).is_err() {
                    return;
                }
            }
            let _ = stdin_tx.send(Input::Closed);
        })
        .context("spawning stdin reader")?;

    // Background tick so banners and the progress bar age out.
    thread::Builder::new()
        .name("panel-tick".to_string())
        .spawn(move || {
            let mut last = Instant::now();
            loop {
                thread::sleep(TICK_INTERVAL);
                let now = Instant::now();
                if input_tx.send(Input::Tick(now - last)).is_err() {
                    return;
                }
                last = now;
            }
        })
        .context("spawning tick thread")?;

    let mut app = App::new(instance_id, runner);
    app.dispatch(Msg::SessionStarted);
    println!("{HELP}");

    loop {
        match input_rx.recv_timeout(POLL_INTERVAL) {
            Ok(Input::Line(line)) => {
                if !app.handle_line(&line) {
                    break;
                }
            }
            Ok(Input::Tick(elapsed)) => app.dispatch(Msg::Tick(elapsed)),
            Ok(Input::Closed) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }
        for msg in app.runner.drain_events() {
            app.dispatch(msg);
        }
    }

    panel_info!("Shutting down");
    app.runner.shutdown();
    Ok(())
}

struct App {
    state: ClientState,
    runner: EffectRunner,
}

impl App {
    fn new(instance_id: InstanceId, runner: EffectRunner) -> Self {
        Self {
            state: ClientState::new(instance_id),
            runner,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let blank = ClientState::new(self.state.instance_id().clone());
        let state = std::mem::replace(&mut self.state, blank);
        let (mut state, effects) = update(state, msg);
        let view = state.consume_dirty().then(|| state.view());
        self.state = state;
        self.runner.enqueue(effects);

        if let Some(view) = view {
            print_view(&view);
        }
    }

    /// Returns `false` when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        let view = self.state.view();
        match commands::parse(line, &view) {
            Ok(ConsoleAction::Quit) => return false,
            Ok(ConsoleAction::Help) => println!("{HELP}"),
            Ok(ConsoleAction::Show) => print_view(&view),
            Ok(ConsoleAction::Send(msg)) => self.dispatch(msg),
            Ok(ConsoleAction::ImportFile(path)) => match read_import(&path) {
                Ok(msg) => self.dispatch(msg),
                Err(err) => report(&err),
            },
            Ok(ConsoleAction::UploadFile { path, title, year }) => {
                match read_upload(&path, title, year) {
                    Ok(msg) => self.dispatch(msg),
                    Err(err) => report(&err),
                }
            }
            Ok(ConsoleAction::EditConfig(pairs)) => {
                let current = self.state.config().cloned().unwrap_or_default();
                match apply_config_edits(current, &pairs) {
                    Ok((config, new_password)) => self.dispatch(Msg::ConfigSubmitted {
                        config,
                        new_password,
                    }),
                    Err(err) => report(&err),
                }
            }
            Err(message) => println!("{message}"),
        }
        true
    }
}

fn print_view(view: &AppViewModel) {
    for line in render::render(view, Local::now()) {
        println!("{line}");
    }
}

fn report(err: &anyhow::Error) {
    panel_warn!("{:#}", err);
    println!("error: {err:#}");
}

fn file_name_of(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("{} has no file name", path.display()))
}

fn read_import(path: &Path) -> anyhow::Result<Msg> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Msg::BulkFileImported {
        file_name: file_name_of(path)?,
        text,
    })
}

fn read_upload(path: &Path, title: String, year: String) -> anyhow::Result<Msg> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Msg::ArtworkUploadRequested(UploadRequest {
        file_name: file_name_of(path)?,
        bytes,
        options: Vec::new(),
        filters: Vec::new(),
        plex_title: title,
        plex_year: year,
    }))
}

/// Applies `key=value` edits to a copy of the config. Values are read
/// according to the type the field already has; `password` is split off.
fn apply_config_edits(
    config: PanelConfig,
    pairs: &[(String, String)],
) -> anyhow::Result<(PanelConfig, Option<String>)> {
    let mut value = serde_json::to_value(&config).context("encoding config")?;
    let Some(fields) = value.as_object_mut() else {
        bail!("config is not an object");
    };

    let mut new_password = None;
    for (key, raw) in pairs {
        if key == "password" {
            new_password = Some(raw.clone());
            continue;
        }
        let parsed = match fields.get(key) {
            Some(Value::Bool(_)) => Value::Bool(
                raw.parse()
                    .with_context(|| format!("{key} must be true or false"))?,
            ),
            Some(Value::Array(_)) => Value::Array(
                raw.split(',')
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            ),
            Some(Value::String(_)) | None => Value::String(raw.clone()),
            Some(_) => serde_json::from_str(raw)
                .with_context(|| format!("{key} has an unexpected value"))?,
        };
        fields.insert(key.clone(), parsed);
    }

    let config = serde_json::from_value(value).context("decoding edited config")?;
    Ok((config, new_password))
}
