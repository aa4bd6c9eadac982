use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scheduled bulk import for one file. A `None` time means the schedule was cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub file: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(
        rename = "jobReference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub job_reference: Option<Value>,
}

/// In-memory schedules keyed by file name.
///
/// Entries are never removed; cancelling a schedule only clears its time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleRegistry {
    entries: Vec<ScheduleEntry>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from config entries; a later entry for the same file wins.
    pub fn from_entries(entries: impl IntoIterator<Item = ScheduleEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            registry.upsert(&entry.file, entry.time, entry.job_reference);
        }
        registry
    }

    pub fn upsert(&mut self, file: &str, time: Option<String>, job_reference: Option<Value>) {
        match self.entries.iter_mut().find(|entry| entry.file == file) {
            Some(entry) => {
                entry.time = time;
                entry.job_reference = job_reference;
            }
            None => self.entries.push(ScheduleEntry {
                file: file.to_string(),
                time,
                job_reference,
            }),
        }
    }

    pub fn find(&self, file: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.file == file)
    }

    pub fn deactivate(&mut self, file: &str) {
        self.upsert(file, None, None);
    }

    pub fn is_scheduled(&self, file: &str) -> bool {
        self.find(file).is_some_and(|entry| entry.time.is_some())
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two-state projection of the registry for the currently loaded file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScheduleIcon {
    Scheduled {
        time: String,
    },
    #[default]
    Unscheduled,
}

impl ScheduleIcon {
    pub fn for_file(registry: &ScheduleRegistry, file: Option<&str>) -> Self {
        file.and_then(|file| registry.find(file))
            .and_then(|entry| entry.time.clone())
            .map(|time| ScheduleIcon::Scheduled { time })
            .unwrap_or(ScheduleIcon::Unscheduled)
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            ScheduleIcon::Scheduled { .. } => "bi-clock-fill",
            ScheduleIcon::Unscheduled => "bi-clock",
        }
    }

    /// Content of the time input. Unscheduled clears it.
    pub fn time_input(&self) -> &str {
        match self {
            ScheduleIcon::Scheduled { time } => time,
            ScheduleIcon::Unscheduled => "",
        }
    }

    /// Scheduled shows "cancel" and a read-only time; unscheduled shows "set".
    pub fn offers_cancel(&self) -> bool {
        matches!(self, ScheduleIcon::Scheduled { .. })
    }
}
