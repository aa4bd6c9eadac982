use panel_core::{update, ClientState, Command, Effect, Envelope, InstanceId, Msg, ScheduleIcon};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn server(state: &ClientState, event: &str, payload: Value) -> Msg {
    Msg::ServerMessage(Envelope::new(event, state.instance_id(), payload))
}

fn loaded_weekly() -> ClientState {
    let (state, _) = update(ClientState::new(InstanceId::generate()), Msg::SessionStarted);
    let msg = server(
        &state,
        "load_config",
        json!({"config": {"bulk_txt": "weekly.txt", "schedules": [{"file": "other.txt", "time": "01:00"}]}}),
    );
    let (state, _) = update(state, msg);
    let msg = server(&state, "load_bulk_filelist", json!({"bulk_files": ["weekly.txt", "other.txt"]}));
    let (state, _) = update(state, msg);
    let msg = server(
        &state,
        "load_bulk_import",
        json!({"loaded": true, "filename": "weekly.txt", "bulk_import_text": ""}),
    );
    update(state, msg).0
}

#[test]
fn config_seeds_the_registry() {
    let state = loaded_weekly();

    assert!(state.schedules().is_scheduled("other.txt"));
    assert_eq!(state.view().schedule, ScheduleIcon::Unscheduled);
}

#[test]
fn add_then_delete_keeps_the_entry_with_no_time() {
    let state = loaded_weekly();
    let (state, effects) = update(state, Msg::ScheduleRequested("03:00".to_string()));
    assert_eq!(
        effects,
        vec![Effect::Request(Command::AddSchedule {
            file: "weekly.txt".to_string(),
            time: "03:00".to_string(),
        })]
    );
    // Nothing changes until the backend confirms.
    assert!(state.schedules().find("weekly.txt").is_none());

    let msg = server(
        &state,
        "add_schedule",
        json!({"added": true, "file": "weekly.txt", "time": "03:00", "jobReference": "job-1"}),
    );
    let (state, _) = update(state, msg);
    let view = state.view();
    assert_eq!(view.schedule.icon_name(), "bi-clock-fill");
    assert_eq!(view.schedule.time_input(), "03:00");
    assert!(view.schedule.offers_cancel());

    let (state, effects) = update(state, Msg::ScheduleCancelled);
    assert_eq!(
        effects,
        vec![Effect::Request(Command::DeleteSchedule {
            file: "weekly.txt".to_string()
        })]
    );
    let msg = server(&state, "delete_schedule", json!({"deleted": true, "file": "weekly.txt"}));
    let (state, _) = update(state, msg);

    let entry = state.schedules().find("weekly.txt").expect("entry kept");
    assert_eq!(entry.time, None);
    assert_eq!(state.schedules().len(), 2);
    let view = state.view();
    assert_eq!(view.schedule.icon_name(), "bi-clock");
    assert_eq!(view.schedule.time_input(), "");
}

#[test]
fn rejected_schedule_leaves_the_registry_alone() {
    let state = loaded_weekly();
    let (state, _) = update(state, Msg::ScheduleRequested("03:00".to_string()));
    let msg = server(&state, "add_schedule", json!({"added": false}));
    let (state, _) = update(state, msg);

    assert!(state.schedules().find("weekly.txt").is_none());
    assert!(state.status().is_some());
}

#[test]
fn cancelled_schedules_serialize_with_null_time() {
    let state = loaded_weekly();
    let (state, _) = update(state, Msg::ScheduleCancelled);
    let msg = server(&state, "delete_schedule", json!({"deleted": true}));
    let (state, _) = update(state, msg);

    let entries = serde_json::to_value(state.schedules().entries()).expect("serializes");
    assert_eq!(
        entries,
        json!([
            {"file": "other.txt", "time": "01:00"},
            {"file": "weekly.txt", "time": null},
        ])
    );
}
