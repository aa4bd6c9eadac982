use chrono::{DateTime, Local};
use panel_core::{AppViewModel, DefaultMarker, DialogChoice, ScheduleIcon};

const LOG_TAIL: usize = 5;

/// Renders the view model as plain text lines for the terminal.
pub fn render(view: &AppViewModel, now: DateTime<Local>) -> Vec<String> {
    let mut lines = vec![format!(
        "== artwork panel [{}] {} ==",
        view.instance_id,
        now.format("%H:%M:%S")
    )];

    if view.reloading {
        lines.push("(reloading...)".to_string());
    }
    if let Some(notice) = &view.update_notice {
        lines.push(format!("update available: {notice} (type 'update')"));
    }
    if let Some(status) = &view.status {
        let spinner = if status.spinner { " ..." } else { "" };
        lines.push(format!("[{}] {}{}", status.color.as_str(), status.message, spinner));
    }
    if let Some(progress) = &view.progress {
        lines.push(format!("{} {}", progress_bar(progress.percent), progress.label));
    }

    lines.push(files_line(view));
    lines.push(current_line(view));
    for line in view.editor_text.lines() {
        lines.push(format!("  | {line}"));
    }

    if let Some(dialog) = &view.dialog {
        lines.push(format!("?? {}", dialog.title));
        lines.push(format!("   {}", dialog.message));
        let choices: Vec<String> = dialog
            .buttons
            .iter()
            .map(|(choice, label)| format!("{} = {}", choice_keyword(*choice), label))
            .collect();
        lines.push(format!("   {}", choices.join(", ")));
    }

    for issue in &view.validation {
        lines.push(format!("! {}: {}", issue.field, issue.message));
    }
    if !view.disabled_elements.is_empty() {
        lines.push(format!("disabled: {}", view.disabled_elements.join(", ")));
    }
    if !view.busy.is_empty() {
        lines.push(format!("waiting for: {}", view.busy.join(", ")));
    }
    for line in view.log.iter().take(LOG_TAIL) {
        lines.push(format!("> {line}"));
    }
    lines
}

fn files_line(view: &AppViewModel) -> String {
    if let Some(placeholder) = &view.placeholder {
        return format!("files: ({placeholder})");
    }
    let names: Vec<String> = view
        .files
        .iter()
        .map(|file| {
            if file.selected {
                format!("[{}]", file.name)
            } else {
                file.name.clone()
            }
        })
        .collect();
    format!("files: {}", names.join(" "))
}

fn current_line(view: &AppViewModel) -> String {
    let name = view.current_file.as_deref().unwrap_or("(none)");
    let dirty = if view.save_enabled { " *" } else { "" };
    let default = match view.default_marker {
        DefaultMarker::IsDefault => " (default)",
        DefaultMarker::IsNotDefault => "",
    };
    let schedule = match &view.schedule {
        ScheduleIcon::Scheduled { time } => format!(" @ {time}"),
        ScheduleIcon::Unscheduled => String::new(),
    };
    format!("editing: {name}{dirty}{default}{schedule}")
}

fn choice_keyword(choice: DialogChoice) -> &'static str {
    match choice {
        DialogChoice::Save => "yes",
        DialogChoice::Discard => "no",
        DialogChoice::Cancel => "cancel",
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) / 5;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled))
}
