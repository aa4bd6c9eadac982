use url::Url;

use crate::merge::{append_entry, contains_url, merge_sorted, strip_add_to_bulk_flag};
use crate::{
    ClientState, Command, ConnectionState, DialogChoice, Effect, Envelope, FailureReason,
    FollowUp, Msg, PanelConfig, PendingDecision, ProgressBar, RequestContext, ScheduleRegistry,
    ScrapeForm, ServerEvent, StatusBanner, StatusColor, UploadRequest, ValidationIssue,
    PASSWORD_SETTLE_DELAY, PLACEHOLDER_BULK_FILE, RELOAD_DELAY,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ClientState, msg: Msg) -> (ClientState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionStarted => {
            let line = format!("New session started with ID: {}", state.instance_id());
            state.push_log(line);
            state.mark_dirty();
            startup(&mut state)
        }
        Msg::Tick(elapsed) => {
            if state.advance_clock(elapsed) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BulkTextEdited(text) => {
            if text != state.bulk.edited_text() {
                state.bulk.edit(text);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BulkFileSelected(target) => select_bulk_file(&mut state, target.trim()),
        Msg::DialogAnswered(choice) => answer_dialog(&mut state, choice),
        Msg::SaveBulkClicked => {
            let filename = current_or_placeholder(&state);
            let content = state.bulk.edited_text().to_string();
            save_bulk(&mut state, filename, content, false, None)
        }
        Msg::RenameRequested(new_name) => rename(&mut state, &new_name),
        Msg::DeleteRequested => delete(&mut state),
        Msg::CreateRequested => request(&mut state, Command::CreateBulkFile, RequestContext::Create),
        Msg::BulkFileImported { file_name, text } => import(&mut state, file_name, text),
        Msg::MakeDefaultClicked => make_default(&mut state),
        Msg::ScheduleRequested(time) => schedule(&mut state, time.trim()),
        Msg::ScheduleCancelled => unschedule(&mut state),
        Msg::BulkImportStarted => {
            let filename = state
                .bulk
                .current_filename()
                .or(state.selected_file.as_deref())
                .unwrap_or(PLACEHOLDER_BULK_FILE)
                .to_string();
            vec![Effect::Notify(Command::StartBulkImport {
                bulk_list: state.bulk.edited_text().to_string(),
                filename,
            })]
        }
        Msg::ScrapeSubmitted(form) => scrape(&mut state, form),
        Msg::ConfigSubmitted {
            config,
            new_password,
        } => submit_config(&mut state, config, new_password),
        Msg::ArtworkUploadRequested(upload) => start_upload(&mut state, upload),
        Msg::UpdateAppClicked => {
            state.update_notice = None;
            state.mark_dirty();
            vec![Effect::Notify(Command::UpdateApp)]
        }
        Msg::ServerMessage(envelope) => receive(&mut state, envelope),
        Msg::RequestFailed { event, reason } => request_failed(&mut state, &event, reason),
        Msg::UploadChunkSent { file_name, percent } => {
            state.set_status(
                StatusBanner::new(format!("Uploading '{file_name}'..."), StatusColor::Info)
                    .with_icon("cloud-upload"),
            );
            state.progress = Some(ProgressBar::new(f64::from(percent), format!("{percent}%")));
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadFinished { file_name } => {
            state.push_log(format!("Uploaded '{file_name}'"));
            state.progress = Some(ProgressBar::new(100.0, "Upload complete!"));
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadFailed { file_name, error } => {
            state.set_status(
                StatusBanner::new(
                    format!("Upload of '{file_name}' failed: {error}"),
                    StatusColor::Danger,
                )
                .with_icon("cross-circle"),
            );
            state.progress = None;
            state.mark_dirty();
            Vec::new()
        }
        Msg::ConnectionLost => begin_reload(&mut state),
        Msg::ReloadFailed => {
            if state.connection == ConnectionState::Reloading {
                vec![Effect::ScheduleReload {
                    delay: RELOAD_DELAY,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::ReloadReady => {
            state = state.reset();
            state.mark_dirty();
            startup(&mut state)
        }
    };

    (state, effects)
}

fn startup(state: &mut ClientState) -> Vec<Effect> {
    let mut effects = request(state, Command::LoadConfig, RequestContext::LoadConfig);
    effects.push(Effect::Notify(Command::CheckForUpdate));
    effects
}

/// Registers the reply context and emits the request, unless the same event is
/// already waiting for a reply; then the user is told and nothing is sent.
fn request(state: &mut ClientState, command: Command, context: RequestContext) -> Vec<Effect> {
    let event = command.event_name();
    match try_request(state, command, context) {
        Some(effect) => vec![effect],
        None => {
            busy(state, event);
            Vec::new()
        }
    }
}

fn busy(state: &mut ClientState, event: &str) {
    state.set_status(StatusBanner::new(
        format!("Still waiting for a reply to '{event}'"),
        StatusColor::Warning,
    ));
    state.mark_dirty();
}

/// Same as `request` but silent when busy; used for refreshes where a reply
/// already on its way is just as good.
fn try_request(
    state: &mut ClientState,
    command: Command,
    context: RequestContext,
) -> Option<Effect> {
    let event = command.event_name();
    if state.in_flight.contains_key(event) {
        return None;
    }
    state.in_flight.insert(event.to_string(), context);
    state.mark_dirty();
    Some(Effect::Request(command))
}

fn refresh_file_list(state: &mut ClientState) -> Vec<Effect> {
    try_request(state, Command::LoadBulkFilelist, RequestContext::FileList)
        .into_iter()
        .collect()
}

fn load_bulk(state: &mut ClientState, filename: String) -> Vec<Effect> {
    let command = Command::LoadBulkImport {
        filename: filename.clone(),
    };
    let context = RequestContext::LoadBulk {
        filename,
        edited_at_request: state.bulk.edited_text().to_string(),
    };
    try_request(state, command, context).into_iter().collect()
}

fn current_or_placeholder(state: &ClientState) -> String {
    state
        .bulk
        .current_filename()
        .unwrap_or(PLACEHOLDER_BULK_FILE)
        .to_string()
}

fn save_bulk(
    state: &mut ClientState,
    filename: String,
    content: String,
    adopting: bool,
    then: Option<FollowUp>,
) -> Vec<Effect> {
    // The backend never answers a save without content.
    if content.is_empty() {
        state.set_status(StatusBanner::new(
            format!("Nothing to save: '{filename}' is empty"),
            StatusColor::Warning,
        ));
        state.mark_dirty();
        return Vec::new();
    }
    let now_load = match &then {
        Some(FollowUp::Load { filename }) => Some(filename.clone()),
        _ => None,
    };
    let command = Command::SaveBulkImport {
        filename: filename.clone(),
        content: content.clone(),
        now_load,
    };
    request(
        state,
        command,
        RequestContext::SaveBulk {
            filename,
            content,
            adopting,
            then,
        },
    )
}

fn select_bulk_file(state: &mut ClientState, target: &str) -> Vec<Effect> {
    if target.is_empty() {
        return Vec::new();
    }
    state.selected_file = Some(target.to_string());
    state.mark_dirty();
    if state.bulk.is_current(target) {
        return Vec::new();
    }
    if state.bulk.is_dirty() {
        state.pending_decision = Some(PendingDecision::Switch {
            target: target.to_string(),
        });
        return Vec::new();
    }
    load_bulk(state, target.to_string())
}

fn answer_dialog(state: &mut ClientState, choice: DialogChoice) -> Vec<Effect> {
    let Some(decision) = state.pending_decision.take() else {
        return Vec::new();
    };
    state.mark_dirty();

    match (decision.clone(), choice) {
        (_, DialogChoice::Cancel) => {
            state.selected_file = state.bulk.current_filename().map(ToOwned::to_owned);
            Vec::new()
        }
        (PendingDecision::Switch { target }, DialogChoice::Save) => {
            let filename = current_or_placeholder(state);
            let content = state.bulk.edited_text().to_string();
            let effects = save_bulk(
                state,
                filename,
                content,
                false,
                Some(FollowUp::Load { filename: target }),
            );
            if effects.is_empty() {
                state.pending_decision = Some(decision);
            }
            effects
        }
        (PendingDecision::Switch { target }, DialogChoice::Discard) => load_bulk(state, target),
        (PendingDecision::Import { file_name, text }, DialogChoice::Save) => {
            let filename = current_or_placeholder(state);
            let content = state.bulk.edited_text().to_string();
            let effects = save_bulk(
                state,
                filename,
                content,
                false,
                Some(FollowUp::Adopt { file_name, text }),
            );
            if effects.is_empty() {
                state.pending_decision = Some(decision);
            }
            effects
        }
        (PendingDecision::Import { file_name, text }, DialogChoice::Discard) => {
            adopt(state, file_name, text)
        }
        (PendingDecision::Overwrite { file_name, text }, DialogChoice::Save) => {
            import_confirmed(state, file_name, text)
        }
        (PendingDecision::Overwrite { .. }, DialogChoice::Discard) => {
            state.selected_file = state.bulk.current_filename().map(ToOwned::to_owned);
            Vec::new()
        }
    }
}

/// Puts imported text in the editor and saves it under its own name. The
/// baseline and current file move only when the backend confirms the save.
fn adopt(state: &mut ClientState, file_name: String, text: String) -> Vec<Effect> {
    state.bulk.edit(text.clone());
    state.selected_file = Some(file_name.clone());
    state.mark_dirty();
    save_bulk(state, file_name, text, true, None)
}

fn import(state: &mut ClientState, file_name: String, text: String) -> Vec<Effect> {
    if !file_name.to_ascii_lowercase().ends_with(".txt") {
        state.set_status(
            StatusBanner::new("Only .txt files can be imported", StatusColor::Danger)
                .with_icon("cross-circle"),
        );
        state.mark_dirty();
        return Vec::new();
    }
    if text.is_empty() {
        state.set_status(
            StatusBanner::new(format!("'{file_name}' is empty"), StatusColor::Warning)
                .with_icon("cross-circle"),
        );
        state.mark_dirty();
        return Vec::new();
    }
    if state.bulk_files.contains(&file_name) {
        state.pending_decision = Some(PendingDecision::Overwrite { file_name, text });
        state.mark_dirty();
        return Vec::new();
    }
    import_confirmed(state, file_name, text)
}

fn import_confirmed(state: &mut ClientState, file_name: String, text: String) -> Vec<Effect> {
    if state.bulk.is_dirty() {
        state.pending_decision = Some(PendingDecision::Import { file_name, text });
        state.mark_dirty();
        return Vec::new();
    }
    adopt(state, file_name, text)
}

fn rename(state: &mut ClientState, new_name: &str) -> Vec<Effect> {
    let Some(old_filename) = state.bulk.current_filename().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    let mut new_filename = new_name.trim().to_string();
    if new_filename.is_empty() || new_filename == ".txt" {
        return Vec::new();
    }
    if !new_filename.ends_with(".txt") {
        new_filename.push_str(".txt");
    }
    if new_filename == old_filename {
        return Vec::new();
    }
    let command = Command::RenameBulkFile {
        old_filename: old_filename.clone(),
        new_filename: new_filename.clone(),
    };
    request(
        state,
        command,
        RequestContext::Rename {
            old_filename,
            new_filename,
        },
    )
}

fn delete(state: &mut ClientState) -> Vec<Effect> {
    let Some(filename) = state.bulk.current_filename().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    if state.default_file() == Some(filename.as_str()) {
        state.set_status(
            StatusBanner::new("You cannot delete the default bulk file.", StatusColor::Danger)
                .with_icon("cross-circle"),
        );
        state.mark_dirty();
        return Vec::new();
    }
    let command = Command::DeleteBulkFile {
        filename: filename.clone(),
    };
    request(state, command, RequestContext::Delete { filename })
}

fn make_default(state: &mut ClientState) -> Vec<Effect> {
    let Some(current) = state.bulk.current_filename().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    let Some(mut config) = state.config.clone() else {
        return Vec::new();
    };
    if config.bulk_txt == current {
        return Vec::new();
    }
    config.bulk_txt = current;
    config.schedules = state.schedules.entries().to_vec();
    save_config(state, config, None)
}

fn save_config(
    state: &mut ClientState,
    config: PanelConfig,
    new_password: Option<String>,
) -> Vec<Effect> {
    if state.in_flight.contains_key("save_config") {
        busy(state, "save_config");
        return Vec::new();
    }
    let context = RequestContext::SaveConfig(Box::new(config.clone()));
    state.in_flight.insert("save_config".to_string(), context);
    state.mark_dirty();

    let command = Command::SaveConfig {
        config: config.clone(),
    };
    match new_password {
        Some(password) => vec![
            Effect::Notify(Command::SetPassword {
                username: config.auth_username,
                password,
            }),
            Effect::RequestAfter {
                command,
                delay: PASSWORD_SETTLE_DELAY,
            },
        ],
        None => vec![Effect::Request(command)],
    }
}

fn submit_config(
    state: &mut ClientState,
    mut config: PanelConfig,
    new_password: Option<String>,
) -> Vec<Effect> {
    let issues = validate_config(&config);
    state.mark_dirty();
    if !issues.is_empty() {
        state.validation = issues;
        return Vec::new();
    }
    state.validation.clear();
    config.schedules = state.schedules.entries().to_vec();
    let new_password = new_password.filter(|password| config.auth_enabled && !password.is_empty());
    save_config(state, config, new_password)
}

fn validate_config(config: &PanelConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !is_web_url(&config.base_url) {
        issues.push(ValidationIssue {
            field: "base_url",
            message: "Enter the server address, e.g. http://127.0.0.1:32400".to_string(),
        });
    }
    if config.token.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "token",
            message: "A server token is required".to_string(),
        });
    }
    if config.auth_enabled && config.auth_username.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "auth_username",
            message: "A username is required when authentication is enabled".to_string(),
        });
    }
    issues
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn scrape(state: &mut ClientState, form: ScrapeForm) -> Vec<Effect> {
    let mut issues = Vec::new();
    if form.url.trim().is_empty() {
        issues.push(ValidationIssue {
            field: "scrape_url",
            message: "A URL is required".to_string(),
        });
    } else if !is_web_url(&form.url) {
        issues.push(ValidationIssue {
            field: "scrape_url",
            message: "Enter a valid URL".to_string(),
        });
    }
    let year = form.year.trim();
    if !year.is_empty() && (year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit())) {
        issues.push(ValidationIssue {
            field: "year",
            message: "Year must be four digits".to_string(),
        });
    }
    state.mark_dirty();
    if !issues.is_empty() {
        state.validation = issues;
        return Vec::new();
    }
    state.validation.clear();
    vec![Effect::Notify(Command::StartScrape {
        url: form.url.trim().to_string(),
        year: year.to_string(),
        options: form.options,
        filters: form.filters,
    })]
}

fn start_upload(state: &mut ClientState, upload: UploadRequest) -> Vec<Effect> {
    state.mark_dirty();
    if !upload.file_name.to_ascii_lowercase().ends_with(".zip") {
        state.validation = vec![ValidationIssue {
            field: "upload",
            message: "Please drop a valid ZIP file.".to_string(),
        }];
        return Vec::new();
    }
    state.validation.clear();
    state.set_status(
        StatusBanner::new(format!("Uploading '{}'...", upload.file_name), StatusColor::Info)
            .with_icon("cloud-upload"),
    );
    state.progress = Some(ProgressBar::new(0.0, "0%"));
    vec![Effect::UploadArtwork(upload)]
}

fn schedule(state: &mut ClientState, time: &str) -> Vec<Effect> {
    let Some(file) = state.bulk.current_filename().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    if time.is_empty() {
        state.validation = vec![ValidationIssue {
            field: "schedule_time",
            message: "Pick a time".to_string(),
        }];
        state.mark_dirty();
        return Vec::new();
    }
    let command = Command::AddSchedule {
        file: file.clone(),
        time: time.to_string(),
    };
    request(
        state,
        command,
        RequestContext::AddSchedule {
            file,
            time: time.to_string(),
        },
    )
}

fn unschedule(state: &mut ClientState) -> Vec<Effect> {
    let Some(file) = state.bulk.current_filename().map(ToOwned::to_owned) else {
        return Vec::new();
    };
    let command = Command::DeleteSchedule { file: file.clone() };
    request(state, command, RequestContext::DeleteSchedule { file })
}

fn begin_reload(state: &mut ClientState) -> Vec<Effect> {
    if state.connection == ConnectionState::Reloading {
        return Vec::new();
    }
    state.connection = ConnectionState::Reloading;
    let mut banner = StatusBanner::new("Connection to the server lost, reloading...", StatusColor::Warning);
    banner.sticky = true;
    banner.spinner = true;
    state.set_status(banner);
    state.mark_dirty();
    vec![Effect::ScheduleReload {
        delay: RELOAD_DELAY,
    }]
}

fn request_failed(state: &mut ClientState, event: &str, reason: FailureReason) -> Vec<Effect> {
    let context = state.in_flight.remove(event);
    let message = match reason {
        FailureReason::TimedOut => format!("No reply from the server for '{event}'"),
        FailureReason::Busy => format!("Still waiting for a reply to '{event}'"),
        FailureReason::Transport(error) => format!("Could not send '{event}': {error}"),
    };
    state.set_status(StatusBanner::new(message, StatusColor::Danger).with_icon("cross-circle"));
    if matches!(context, Some(RequestContext::LoadBulk { .. })) {
        state.selected_file = state.bulk.current_filename().map(ToOwned::to_owned);
    }
    state.mark_dirty();
    Vec::new()
}

fn receive(state: &mut ClientState, envelope: Envelope) -> Vec<Effect> {
    let allow_broadcast = ServerEvent::allows_broadcast(&envelope.event);
    if !envelope.is_addressed_to(state.instance_id(), allow_broadcast) {
        return Vec::new();
    }
    let Ok(event) = ServerEvent::decode(&envelope) else {
        return Vec::new();
    };
    let context = state.in_flight.remove(&envelope.event);
    state.mark_dirty();
    apply(state, event, context)
}

fn apply(state: &mut ClientState, event: ServerEvent, context: Option<RequestContext>) -> Vec<Effect> {
    match (event, context) {
        (ServerEvent::ConfigLoaded { config }, Some(RequestContext::LoadConfig)) => {
            config_loaded(state, config)
        }
        (ServerEvent::ConfigSaved { saved, config }, Some(RequestContext::SaveConfig(sent))) => {
            if saved {
                state.config = Some(config.unwrap_or(*sent));
                state.set_status(
                    StatusBanner::new("Configuration saved", StatusColor::Success)
                        .with_icon("check-circle"),
                );
            } else {
                state.set_status(
                    StatusBanner::new("Configuration could not be saved", StatusColor::Danger)
                        .with_icon("cross-circle"),
                );
            }
            Vec::new()
        }
        (ServerEvent::BulkFileList { bulk_files }, _) => file_list(state, bulk_files),
        (
            ServerEvent::BulkImportLoaded {
                loaded,
                filename,
                bulk_import_text,
            },
            Some(RequestContext::LoadBulk {
                filename: requested,
                edited_at_request,
            }),
        ) => {
            if loaded && state.bulk.edited_text() != edited_at_request {
                // Typed into the editor while the load was on its way.
                if state.pending_decision.is_none() {
                    state.pending_decision = Some(PendingDecision::Switch {
                        target: filename.unwrap_or(requested),
                    });
                }
            } else if loaded {
                let filename = filename.unwrap_or(requested);
                state.bulk.mark_loaded(filename.clone(), bulk_import_text.unwrap_or_default());
                state.selected_file = Some(filename);
                state.pending_decision = None;
            } else {
                state.selected_file = state.bulk.current_filename().map(ToOwned::to_owned);
                state.set_status(
                    StatusBanner::new("Bulk import file could not be loaded", StatusColor::Danger)
                        .with_icon("cross-circle"),
                );
            }
            Vec::new()
        }
        (
            ServerEvent::BulkImportSaved { saved, .. },
            Some(RequestContext::SaveBulk {
                filename,
                content,
                adopting,
                then,
            }),
        ) => bulk_saved(state, saved, filename, content, adopting, then),
        (
            ServerEvent::BulkFileRenamed {
                renamed,
                new_filename,
            },
            Some(RequestContext::Rename {
                old_filename,
                new_filename: requested,
            }),
        ) => {
            if !renamed {
                state.set_status(StatusBanner::new(
                    format!("{old_filename} was not renamed"),
                    StatusColor::Danger,
                ));
                return Vec::new();
            }
            let new_filename = new_filename.unwrap_or(requested);
            if state.bulk.is_current(&old_filename) {
                state.bulk.rename_current(new_filename.clone());
            }
            state.selected_file = Some(new_filename.clone());
            if let Some(config) = state.config.as_mut().filter(|c| c.bulk_txt == old_filename) {
                config.bulk_txt = new_filename;
            }
            refresh_file_list(state)
        }
        (ServerEvent::BulkFileDeleted { deleted }, Some(RequestContext::Delete { filename })) => {
            if !deleted {
                state.set_status(
                    StatusBanner::new(format!("'{filename}' could not be deleted"), StatusColor::Danger)
                        .with_icon("cross-circle"),
                );
                return Vec::new();
            }
            if state.bulk.is_current(&filename) {
                state.bulk.clear();
            }
            state.selected_file = None;
            let mut effects = refresh_file_list(state);
            if let Some(default_file) = state.default_file().map(ToOwned::to_owned) {
                effects.extend(load_bulk(state, default_file));
            }
            effects
        }
        (ServerEvent::BulkFileCreated { created, filename }, Some(RequestContext::Create)) => {
            match filename.filter(|_| created) {
                Some(filename) => {
                    state.set_status(
                        StatusBanner::new(
                            format!("New bulk file created: {filename}"),
                            StatusColor::Success,
                        )
                        .with_icon("check-circle"),
                    );
                    let mut effects = refresh_file_list(state);
                    effects.extend(select_bulk_file(state, &filename));
                    effects
                }
                None => {
                    state.set_status(
                        StatusBanner::new("Failed to create new bulk file", StatusColor::Danger)
                            .with_icon("x-circle"),
                    );
                    Vec::new()
                }
            }
        }
        (
            ServerEvent::ScheduleAdded {
                added,
                file,
                time,
                job_reference,
            },
            Some(RequestContext::AddSchedule {
                file: requested_file,
                time: requested_time,
            }),
        ) => {
            if added {
                let file = file.unwrap_or(requested_file);
                let time = time.or(Some(requested_time));
                state.schedules.upsert(&file, time, job_reference);
                state.validation.clear();
            } else {
                state.set_status(
                    StatusBanner::new("Schedule could not be added", StatusColor::Danger)
                        .with_icon("cross-circle"),
                );
            }
            Vec::new()
        }
        (
            ServerEvent::ScheduleDeleted { deleted, file },
            Some(RequestContext::DeleteSchedule {
                file: requested_file,
            }),
        ) => {
            if deleted {
                state.schedules.deactivate(&file.unwrap_or(requested_file));
            } else {
                state.set_status(
                    StatusBanner::new("Schedule could not be removed", StatusColor::Danger)
                        .with_icon("cross-circle"),
                );
            }
            Vec::new()
        }
        (ServerEvent::StatusUpdate(update), _) => {
            state.set_status(StatusBanner::from_update(update));
            Vec::new()
        }
        (ServerEvent::LogUpdate { message, .. }, _) => {
            state.push_log(message);
            Vec::new()
        }
        (ServerEvent::ProgressBar { percent, message }, _) => {
            state.progress = Some(ProgressBar::new(percent, message.unwrap_or_default()));
            Vec::new()
        }
        (ServerEvent::ElementDisable { elements, disabled }, _) => {
            for element in elements {
                if disabled {
                    state.disabled_elements.insert(element);
                } else {
                    state.disabled_elements.remove(&element);
                }
            }
            Vec::new()
        }
        (ServerEvent::AddToBulkList { url, title }, _) => {
            add_to_bulk(state, &url, &title);
            Vec::new()
        }
        (ServerEvent::BackendRestarting, _) => begin_reload(state),
        (ServerEvent::UploadProgress { progress }, _) => {
            state.progress = Some(ProgressBar::new(progress, ""));
            Vec::new()
        }
        (ServerEvent::UploadComplete, _) => {
            state.progress = Some(ProgressBar::new(100.0, "Upload complete!"));
            Vec::new()
        }
        (ServerEvent::UpdateAvailable { version }, _) => {
            state.push_log(format!("Update available: {version}"));
            state.update_notice = Some(version);
            Vec::new()
        }
        (ServerEvent::UpdateFailed { error }, _) => {
            state.set_status(
                StatusBanner::new(format!("Update failed: {error}"), StatusColor::Danger)
                    .with_icon("cross-circle"),
            );
            Vec::new()
        }
        // A reply nobody is waiting for: duplicate or stale push.
        _ => Vec::new(),
    }
}

fn config_loaded(state: &mut ClientState, config: Option<PanelConfig>) -> Vec<Effect> {
    let Some(config) = config else {
        state.set_status(
            StatusBanner::new("Configuration could not be loaded", StatusColor::Danger)
                .with_icon("cross-circle"),
        );
        return Vec::new();
    };
    state.schedules = ScheduleRegistry::from_entries(config.schedules.iter().cloned());
    state.config = Some(config);
    refresh_file_list(state)
}

fn file_list(state: &mut ClientState, bulk_files: Vec<String>) -> Vec<Effect> {
    state.bulk_files = bulk_files;
    if state.bulk_files.is_empty() {
        state.selected_file = Some(PLACEHOLDER_BULK_FILE.to_string());
        return Vec::new();
    }
    if state.pending_decision.is_some()
        || state.in_flight.contains_key("load_bulk_import")
        || state.in_flight.contains_key("save_bulk_import")
    {
        return Vec::new();
    }
    let selected = state
        .bulk
        .current_filename()
        .or(state.default_file())
        .map(ToOwned::to_owned);
    state.selected_file = selected.clone();

    let nothing_loaded =
        state.bulk.current_filename().is_none() && state.bulk.edited_text().is_empty();
    match selected {
        Some(filename) if nothing_loaded && state.bulk_files.contains(&filename) => {
            load_bulk(state, filename)
        }
        _ => Vec::new(),
    }
}

fn bulk_saved(
    state: &mut ClientState,
    saved: bool,
    filename: String,
    content: String,
    adopting: bool,
    then: Option<FollowUp>,
) -> Vec<Effect> {
    if !saved {
        state.selected_file = state.bulk.current_filename().map(ToOwned::to_owned);
        state.set_status(
            StatusBanner::new(format!("'{filename}' could not be saved"), StatusColor::Danger)
                .with_icon("cross-circle"),
        );
        return Vec::new();
    }

    // Only move the baseline of the file that was saved; a later adopt or load
    // may already have replaced it.
    if adopting || state.bulk.is_current(&filename) || state.bulk.current_filename().is_none() {
        state.bulk.mark_saved(filename, content);
    }
    let mut effects = refresh_file_list(state);
    match then {
        Some(FollowUp::Load { filename }) => effects.extend(load_bulk(state, filename)),
        Some(FollowUp::Adopt { file_name, text }) => effects.extend(adopt(state, file_name, text)),
        None => {}
    }
    effects
}

fn add_to_bulk(state: &mut ClientState, url: &str, title: &str) {
    let cleaned = strip_add_to_bulk_flag(url);
    if cleaned.is_empty() || contains_url(state.bulk.edited_text(), url) {
        return;
    }
    let auto_manage = state
        .config
        .as_ref()
        .is_some_and(|config| config.auto_manage_bulk_files);
    let merged = if auto_manage {
        merge_sorted(state.bulk.edited_text(), title, &cleaned)
    } else {
        append_entry(state.bulk.edited_text(), title, &cleaned)
    };
    state.bulk.edit(merged);
}
