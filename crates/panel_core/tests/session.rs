use std::time::Duration;

use panel_core::{
    update, ClientState, Command, ConnectionState, Effect, Envelope, FailureReason, InstanceId,
    Msg, PanelConfig, ScrapeForm, StatusColor, PASSWORD_SETTLE_DELAY, RELOAD_DELAY,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn fresh() -> ClientState {
    ClientState::new(InstanceId::from_persisted("client-a").expect("id"))
}

fn valid_config() -> PanelConfig {
    PanelConfig {
        base_url: "http://127.0.0.1:32400".to_string(),
        token: "secret".to_string(),
        bulk_txt: "bulk.txt".to_string(),
        ..PanelConfig::default()
    }
}

#[test]
fn session_start_logs_the_instance_id() {
    let (state, _) = update(fresh(), Msg::SessionStarted);
    assert_eq!(state.view().log, vec!["New session started with ID: client-a".to_string()]);
}

#[test]
fn backend_restart_broadcast_schedules_one_reload() {
    let (state, effects) = update(
        fresh(),
        Msg::ServerMessage(Envelope::broadcast("backend_restarting", json!({}))),
    );
    assert_eq!(effects, vec![Effect::ScheduleReload { delay: RELOAD_DELAY }]);
    assert_eq!(state.connection(), ConnectionState::Reloading);
    assert!(state.view().reloading);

    let (state, effects) = update(state, Msg::ConnectionLost);
    assert!(effects.is_empty());

    let (_, effects) = update(state, Msg::ReloadFailed);
    assert_eq!(effects, vec![Effect::ScheduleReload { delay: RELOAD_DELAY }]);
}

#[test]
fn reload_rebuilds_state_from_scratch() {
    let (state, _) = update(fresh(), Msg::BulkTextEdited("unsaved".to_string()));
    let (state, _) = update(state, Msg::ConnectionLost);
    let (state, effects) = update(state, Msg::ReloadReady);

    assert_eq!(
        effects,
        vec![
            Effect::Request(Command::LoadConfig),
            Effect::Notify(Command::CheckForUpdate),
        ]
    );
    assert_eq!(state.connection(), ConnectionState::Connected);
    assert_eq!(state.bulk().edited_text(), "");
    assert_eq!(state.instance_id().as_str(), "client-a");
}

#[test]
fn status_banner_expires_unless_sticky() {
    let state = fresh();
    let id = state.instance_id().clone();
    let msg = Msg::ServerMessage(Envelope::new(
        "status_update",
        &id,
        json!({"message": "Scraping...", "color": "warning", "icon": "bi-gear"}),
    ));
    let (state, _) = update(state, msg);
    let banner = state.status().expect("banner");
    assert_eq!(banner.color, StatusColor::Warning);
    assert_eq!(banner.icon.as_deref(), Some("bi-gear"));

    let (mut state, _) = update(state, Msg::Tick(Duration::from_secs(5)));
    assert!(state.status().is_none());
    assert!(state.consume_dirty());

    let msg = Msg::ServerMessage(Envelope::broadcast(
        "status_update",
        json!({"message": "Working", "color": "mauve", "sticky": true, "spinner": true}),
    ));
    let (state, _) = update(state, msg);
    let (state, _) = update(state, Msg::Tick(Duration::from_secs(60)));
    let banner = state.status().expect("sticky banner");
    assert_eq!(banner.color, StatusColor::Info);
    assert!(banner.spinner);
}

#[test]
fn progress_bar_is_clamped() {
    let state = fresh();
    let id = state.instance_id().clone();
    let msg = Msg::ServerMessage(Envelope::new(
        "progress_bar",
        &id,
        json!({"percent": 140.0, "message": "Downloading"}),
    ));
    let (state, _) = update(state, msg);
    let progress = state.view().progress.expect("visible");
    assert_eq!(progress.percent, 100);
    assert_eq!(progress.label, "Downloading");
}

#[test]
fn invalid_config_is_not_sent() {
    let config = PanelConfig {
        base_url: "plex.local".to_string(),
        ..PanelConfig::default()
    };
    let (state, effects) = update(
        fresh(),
        Msg::ConfigSubmitted {
            config,
            new_password: None,
        },
    );

    assert!(effects.is_empty());
    let fields: Vec<_> = state.view().validation.iter().map(|i| i.field).collect();
    assert_eq!(fields, vec!["base_url", "token"]);
}

#[test]
fn password_change_goes_out_before_the_config() {
    let config = PanelConfig {
        auth_enabled: true,
        auth_username: "admin".to_string(),
        ..valid_config()
    };
    let (state, effects) = update(
        fresh(),
        Msg::ConfigSubmitted {
            config: config.clone(),
            new_password: Some("hunter2".to_string()),
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::Notify(Command::SetPassword {
                username: "admin".to_string(),
                password: "hunter2".to_string(),
            }),
            Effect::RequestAfter {
                command: Command::SaveConfig { config },
                delay: PASSWORD_SETTLE_DELAY,
            },
        ]
    );
    assert!(state.in_flight("save_config").is_some());
}

#[test]
fn password_is_ignored_when_auth_is_off() {
    let (_, effects) = update(
        fresh(),
        Msg::ConfigSubmitted {
            config: valid_config(),
            new_password: Some("hunter2".to_string()),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Request(Command::SaveConfig {
            config: valid_config()
        })]
    );
}

#[test]
fn timed_out_request_frees_the_slot() {
    let (state, _) = update(fresh(), Msg::SessionStarted);
    assert!(state.in_flight("load_config").is_some());

    let (state, _) = update(
        state,
        Msg::RequestFailed {
            event: "load_config".to_string(),
            reason: FailureReason::TimedOut,
        },
    );
    assert!(state.in_flight("load_config").is_none());
    assert_eq!(
        state.status().map(|s| s.message.as_str()),
        Some("No reply from the server for 'load_config'")
    );
}

#[test]
fn scrape_form_is_validated_before_sending() {
    let form = ScrapeForm {
        url: "not a url".to_string(),
        year: "19".to_string(),
        ..ScrapeForm::default()
    };
    let (state, effects) = update(fresh(), Msg::ScrapeSubmitted(form));
    assert!(effects.is_empty());
    assert_eq!(state.view().validation.len(), 2);

    let form = ScrapeForm {
        url: "https://mediux.pro/sets/12".to_string(),
        year: "1979".to_string(),
        options: vec!["add_to_bulk".to_string()],
        filters: vec!["poster".to_string()],
    };
    let (_, effects) = update(state, Msg::ScrapeSubmitted(form));
    assert_eq!(
        effects,
        vec![Effect::Notify(Command::StartScrape {
            url: "https://mediux.pro/sets/12".to_string(),
            year: "1979".to_string(),
            options: vec!["add_to_bulk".to_string()],
            filters: vec!["poster".to_string()],
        })]
    );
}

#[test]
fn update_notice_is_shown_and_cleared() {
    let msg = Msg::ServerMessage(Envelope::broadcast("update_available", json!({"version": "1.4.0"})));
    let (state, _) = update(fresh(), msg);
    assert_eq!(state.view().update_notice.as_deref(), Some("1.4.0"));

    let (state, effects) = update(state, Msg::UpdateAppClicked);
    assert_eq!(effects, vec![Effect::Notify(Command::UpdateApp)]);
    assert_eq!(state.view().update_notice, None);
}

#[test]
fn bulk_import_uses_the_placeholder_name_when_nothing_is_loaded() {
    let (state, _) = update(fresh(), Msg::BulkTextEdited("https://mediux.pro/sets/1".to_string()));
    let (_, effects) = update(state, Msg::BulkImportStarted);
    assert_eq!(
        effects,
        vec![Effect::Notify(Command::StartBulkImport {
            bulk_list: "https://mediux.pro/sets/1".to_string(),
            filename: "bulk_import.txt".to_string(),
        })]
    );
}
