use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::view_model::AppViewModel;
use crate::{
    BulkFileState, InstanceId, PanelConfig, PendingDecision, ScheduleRegistry, StatusUpdate,
};

const MAX_LOG_LINES: usize = 500;
const BANNER_LIFETIME: Duration = Duration::from_secs(5);
const PROGRESS_LINGER: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusColor {
    Primary,
    Secondary,
    Success,
    Danger,
    Warning,
    #[default]
    Info,
    Light,
    Dark,
}

impl StatusColor {
    /// Unknown names fall back to `Info`.
    pub fn parse(name: &str) -> Self {
        match name {
            "primary" => StatusColor::Primary,
            "secondary" => StatusColor::Secondary,
            "success" => StatusColor::Success,
            "danger" => StatusColor::Danger,
            "warning" => StatusColor::Warning,
            "light" => StatusColor::Light,
            "dark" => StatusColor::Dark,
            _ => StatusColor::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Primary => "primary",
            StatusColor::Secondary => "secondary",
            StatusColor::Success => "success",
            StatusColor::Danger => "danger",
            StatusColor::Warning => "warning",
            StatusColor::Info => "info",
            StatusColor::Light => "light",
            StatusColor::Dark => "dark",
        }
    }
}

/// Transient status line. Non-sticky banners expire after a few seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub message: String,
    pub color: StatusColor,
    pub sticky: bool,
    pub spinner: bool,
    pub icon: Option<String>,
    pub(crate) remaining: Duration,
}

impl StatusBanner {
    pub fn new(message: impl Into<String>, color: StatusColor) -> Self {
        Self {
            message: message.into(),
            color,
            sticky: false,
            spinner: false,
            icon: None,
            remaining: BANNER_LIFETIME,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub(crate) fn from_update(update: StatusUpdate) -> Self {
        Self {
            message: update.message,
            color: update.color.as_deref().map(StatusColor::parse).unwrap_or_default(),
            sticky: update.sticky,
            spinner: update.spinner,
            icon: update.icon.filter(|icon| !icon.is_empty()),
            remaining: BANNER_LIFETIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressBar {
    pub percent: u8,
    pub message: String,
    pub(crate) linger: Option<Duration>,
}

impl ProgressBar {
    pub(crate) fn new(percent: f64, message: impl Into<String>) -> Self {
        let percent = percent.clamp(0.0, 100.0).round() as u8;
        Self {
            percent,
            message: message.into(),
            linger: (percent == 100).then_some(PROGRESS_LINGER),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connected,
    /// A full reload has been scheduled; all state will be rebuilt.
    Reloading,
}

/// A field that blocked a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

/// What to do once a save has been confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    Load { filename: String },
    Adopt { file_name: String, text: String },
}

/// Local context kept for each command awaiting its reply, keyed by event name.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestContext {
    LoadConfig,
    /// The config that was sent; adopted if the reply does not echo one.
    SaveConfig(Box<PanelConfig>),
    FileList,
    LoadBulk {
        filename: String,
        /// Editor text when the load was issued; typing since then is kept.
        edited_at_request: String,
    },
    SaveBulk {
        filename: String,
        content: String,
        /// Imported content saved under a new name; the file becomes current
        /// only once the save is confirmed.
        adopting: bool,
        then: Option<FollowUp>,
    },
    Rename {
        old_filename: String,
        new_filename: String,
    },
    Delete {
        filename: String,
    },
    Create,
    AddSchedule {
        file: String,
        time: String,
    },
    DeleteSchedule {
        file: String,
    },
}

/// Everything the client knows. Owned by one controller and only changed by `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    instance_id: InstanceId,
    pub(crate) config: Option<PanelConfig>,
    pub(crate) bulk: BulkFileState,
    pub(crate) bulk_files: Vec<String>,
    pub(crate) selected_file: Option<String>,
    pub(crate) schedules: ScheduleRegistry,
    pub(crate) pending_decision: Option<PendingDecision>,
    pub(crate) in_flight: BTreeMap<String, RequestContext>,
    pub(crate) status: Option<StatusBanner>,
    pub(crate) progress: Option<ProgressBar>,
    pub(crate) log: Vec<String>,
    pub(crate) disabled_elements: BTreeSet<String>,
    pub(crate) update_notice: Option<String>,
    pub(crate) validation: Vec<ValidationIssue>,
    pub(crate) connection: ConnectionState,
    dirty: bool,
}

impl ClientState {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            config: None,
            bulk: BulkFileState::new(),
            bulk_files: Vec::new(),
            selected_file: None,
            schedules: ScheduleRegistry::new(),
            pending_decision: None,
            in_flight: BTreeMap::new(),
            status: None,
            progress: None,
            log: Vec::new(),
            disabled_elements: BTreeSet::new(),
            update_notice: None,
            validation: Vec::new(),
            connection: ConnectionState::Connected,
            dirty: false,
        }
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn config(&self) -> Option<&PanelConfig> {
        self.config.as_ref()
    }

    pub fn bulk(&self) -> &BulkFileState {
        &self.bulk
    }

    pub fn schedules(&self) -> &ScheduleRegistry {
        &self.schedules
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        self.pending_decision.as_ref()
    }

    pub fn in_flight(&self, event: &str) -> Option<&RequestContext> {
        self.in_flight.get(event)
    }

    pub fn status(&self) -> Option<&StatusBanner> {
        self.status.as_ref()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn default_file(&self) -> Option<&str> {
        self.config
            .as_ref()
            .map(|config| config.bulk_txt.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::from_state(self)
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_status(&mut self, banner: StatusBanner) {
        self.status = Some(banner);
    }

    pub(crate) fn push_log(&mut self, line: impl Into<String>) {
        self.log.insert(0, line.into());
        self.log.truncate(MAX_LOG_LINES);
    }

    /// Ages the banner and a completed progress bar; returns whether either disappeared.
    pub(crate) fn advance_clock(&mut self, elapsed: Duration) -> bool {
        let mut changed = false;
        if let Some(banner) = self.status.as_mut().filter(|banner| !banner.sticky) {
            banner.remaining = banner.remaining.saturating_sub(elapsed);
            if banner.remaining.is_zero() {
                self.status = None;
                changed = true;
            }
        }
        if let Some(linger) = self.progress.as_mut().and_then(|bar| bar.linger.as_mut()) {
            *linger = linger.saturating_sub(elapsed);
            if linger.is_zero() {
                self.progress = None;
                changed = true;
            }
        }
        changed
    }

    /// Fresh state for a full reload; only the instance id survives.
    pub(crate) fn reset(&self) -> Self {
        Self::new(self.instance_id.clone())
    }
}
