use crate::{
    ClientState, ConnectionState, DialogChoice, PendingDecision, ScheduleIcon, StatusBanner,
    ValidationIssue, PLACEHOLDER_BULK_FILE,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub instance_id: String,
    pub files: Vec<FileOption>,
    /// Set when the backend has no bulk files; the selector shows this name only.
    pub placeholder: Option<String>,
    pub current_file: Option<String>,
    pub selected_file: Option<String>,
    pub save_enabled: bool,
    pub editor_text: String,
    pub default_marker: DefaultMarker,
    pub schedule: ScheduleIcon,
    pub dialog: Option<DialogView>,
    pub status: Option<StatusBanner>,
    pub progress: Option<ProgressView>,
    pub log: Vec<String>,
    pub disabled_elements: Vec<String>,
    pub update_notice: Option<String>,
    pub validation: Vec<ValidationIssue>,
    pub reloading: bool,
    /// Events still waiting for their reply.
    pub busy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOption {
    pub name: String,
    pub selected: bool,
}

/// Whether the loaded file is the configured default bulk file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultMarker {
    IsDefault,
    #[default]
    IsNotDefault,
}

impl DefaultMarker {
    pub fn icon_name(&self) -> &'static str {
        match self {
            DefaultMarker::IsDefault => "bi-check-circle-fill",
            DefaultMarker::IsNotDefault => "bi-check-circle",
        }
    }

    pub fn can_set_default(&self) -> bool {
        matches!(self, DefaultMarker::IsNotDefault)
    }
}

/// A prompt shown before a held-back action: the three-way "save changes
/// first?" question, or a yes/cancel overwrite confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub title: String,
    pub message: String,
    pub buttons: Vec<(DialogChoice, &'static str)>,
}

impl DialogView {
    fn for_decision(current: &str, decision: &PendingDecision) -> Self {
        match decision {
            PendingDecision::Overwrite { file_name, .. } => Self {
                title: format!("File '{file_name}' already exists"),
                message: "Would you like to overwrite it?".to_string(),
                buttons: vec![
                    (DialogChoice::Save, "Yes, overwrite"),
                    (DialogChoice::Cancel, "Cancel"),
                ],
            },
            PendingDecision::Switch { .. } | PendingDecision::Import { .. } => Self {
                title: format!("Before you load {}", decision.target_name()),
                message: format!("Do you want to save changes to {current} first?"),
                buttons: vec![
                    (DialogChoice::Save, "Yes, save changes"),
                    (DialogChoice::Discard, "No, lose changes"),
                    (DialogChoice::Cancel, "Cancel"),
                ],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub percent: u8,
    pub label: String,
}

impl AppViewModel {
    pub fn from_state(state: &ClientState) -> Self {
        let current_file = state.bulk.current_filename().map(ToOwned::to_owned);
        let selected = state.selected_file.clone();

        let placeholder = state
            .bulk_files
            .is_empty()
            .then(|| PLACEHOLDER_BULK_FILE.to_string());
        let files = state
            .bulk_files
            .iter()
            .map(|name| FileOption {
                name: name.clone(),
                selected: selected.as_deref() == Some(name.as_str()),
            })
            .collect();

        let default_marker = match (&current_file, state.default_file()) {
            (Some(current), Some(default)) if current == default => DefaultMarker::IsDefault,
            _ => DefaultMarker::IsNotDefault,
        };

        let dialog = state.pending_decision.as_ref().map(|decision| {
            let current = current_file.as_deref().unwrap_or(PLACEHOLDER_BULK_FILE);
            DialogView::for_decision(current, decision)
        });

        let progress = state.progress.as_ref().map(|bar| ProgressView {
            percent: bar.percent,
            label: if bar.message.is_empty() {
                format!("{}%", bar.percent)
            } else {
                bar.message.clone()
            },
        });

        Self {
            instance_id: state.instance_id().to_string(),
            files,
            placeholder,
            schedule: ScheduleIcon::for_file(&state.schedules, current_file.as_deref()),
            current_file,
            selected_file: selected,
            save_enabled: state.bulk.is_dirty(),
            editor_text: state.bulk.edited_text().to_string(),
            default_marker,
            dialog,
            status: state.status.clone(),
            progress,
            log: state.log.clone(),
            disabled_elements: state.disabled_elements.iter().cloned().collect(),
            update_notice: state.update_notice.clone(),
            validation: state.validation.clone(),
            reloading: state.connection == ConnectionState::Reloading,
            busy: state.in_flight.keys().cloned().collect(),
        }
    }
}
