use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{InstanceId, ScheduleEntry};

/// Literal instance id carried by messages meant for every connected client.
pub const BROADCAST: &str = "broadcast";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Frame(#[from] serde_json::Error),
    #[error("payload for '{event}' is invalid: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One message on the socket, in either direction.
///
/// On the wire this is `{"event": <name>, "data": {"instance_id": .., ..payload}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: String,
    pub instance_id: Option<String>,
    /// Some backends mark broadcasts with a flag instead of the literal marker.
    pub broadcast: bool,
    pub payload: Value,
}

#[derive(Serialize, Deserialize)]
struct WireFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, instance_id: &InstanceId, payload: Value) -> Self {
        Self {
            event: event.into(),
            instance_id: Some(instance_id.as_str().to_string()),
            broadcast: false,
            payload,
        }
    }

    pub fn broadcast(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            instance_id: Some(BROADCAST.to_string()),
            broadcast: false,
            payload,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.broadcast || self.instance_id.as_deref() == Some(BROADCAST)
    }

    /// Addressing check every inbound handler applies before touching state.
    pub fn is_addressed_to(&self, me: &InstanceId, allow_broadcast: bool) -> bool {
        self.instance_id.as_deref() == Some(me.as_str()) || (allow_broadcast && self.is_broadcast())
    }

    pub fn from_wire(text: &str) -> Result<Self, ProtocolError> {
        let frame: WireFrame = serde_json::from_str(text)?;
        let mut data = match frame.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let instance_id = match data.remove("instance_id") {
            Some(Value::String(id)) => Some(id),
            _ => None,
        };
        let broadcast = matches!(data.remove("broadcast"), Some(Value::Bool(true)));
        Ok(Self {
            event: frame.event,
            instance_id,
            broadcast,
            payload: Value::Object(data),
        })
    }

    pub fn to_wire(&self) -> Result<String, ProtocolError> {
        let mut data = match &self.payload {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Some(id) = &self.instance_id {
            data.insert("instance_id".to_string(), Value::String(id.clone()));
        }
        if self.broadcast {
            data.insert("broadcast".to_string(), Value::Bool(true));
        }
        let frame = WireFrame {
            event: self.event.clone(),
            data: Value::Object(data),
        };
        Ok(serde_json::to_string(&frame)?)
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| ProtocolError::Payload {
            event: self.event.clone(),
            source,
        })
    }
}

/// Backend configuration as exchanged by `load_config` / `save_config`.
///
/// Unknown keys are kept in `extra` so a save never drops settings this client
/// does not know about.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub base_url: String,
    pub token: String,
    pub bulk_txt: String,
    pub tv_library: Vec<String>,
    pub movie_library: Vec<String>,
    pub mediux_filters: Vec<String>,
    pub tpdb_filters: Vec<String>,
    pub schedules: Vec<ScheduleEntry>,
    pub kometa_base: String,
    pub temp_dir: String,
    pub auto_manage_bulk_files: bool,
    pub track_artwork_ids: bool,
    pub save_to_kometa: bool,
    pub stage_assets: bool,
    pub stage_specials: bool,
    pub stage_collections: bool,
    pub reset_overlay: bool,
    pub auth_enabled: bool,
    pub auth_username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client to server commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Command {
    LoadConfig,
    SaveConfig {
        config: PanelConfig,
    },
    SetPassword {
        username: String,
        password: String,
    },
    LoadBulkFilelist,
    LoadBulkImport {
        filename: String,
    },
    SaveBulkImport {
        filename: String,
        content: String,
        now_load: Option<String>,
    },
    RenameBulkFile {
        old_filename: String,
        new_filename: String,
    },
    DeleteBulkFile {
        filename: String,
    },
    CreateBulkFile,
    AddSchedule {
        file: String,
        time: String,
    },
    DeleteSchedule {
        file: String,
    },
    StartScrape {
        url: String,
        year: String,
        options: Vec<String>,
        filters: Vec<String>,
    },
    StartBulkImport {
        bulk_list: String,
        filename: String,
    },
    UploadArtworkChunk {
        #[serde(rename = "fileName")]
        file_name: String,
        #[serde(rename = "chunkData")]
        chunk_data: String,
        #[serde(rename = "chunkIndex")]
        chunk_index: usize,
        #[serde(rename = "totalChunks")]
        total_chunks: usize,
    },
    UploadComplete {
        #[serde(rename = "fileName")]
        file_name: String,
        options: Vec<String>,
        filters: Vec<String>,
        plex_title: String,
        plex_year: String,
        #[serde(rename = "totalBytes")]
        total_bytes: usize,
        sha256: String,
    },
    DisplayMessage {
        message: String,
        title: String,
    },
    CheckForUpdate,
    UpdateApp,
}

impl Command {
    pub fn event_name(&self) -> &'static str {
        match self {
            Command::LoadConfig => "load_config",
            Command::SaveConfig { .. } => "save_config",
            Command::SetPassword { .. } => "set_password",
            Command::LoadBulkFilelist => "load_bulk_filelist",
            Command::LoadBulkImport { .. } => "load_bulk_import",
            Command::SaveBulkImport { .. } => "save_bulk_import",
            Command::RenameBulkFile { .. } => "rename_bulk_file",
            Command::DeleteBulkFile { .. } => "delete_bulk_file",
            Command::CreateBulkFile => "create_bulk_file",
            Command::AddSchedule { .. } => "add_schedule",
            Command::DeleteSchedule { .. } => "delete_schedule",
            Command::StartScrape { .. } => "start_scrape",
            Command::StartBulkImport { .. } => "start_bulk_import",
            Command::UploadArtworkChunk { .. } => "upload_artwork_chunk",
            Command::UploadComplete { .. } => "upload_complete",
            Command::DisplayMessage { .. } => "display_message",
            Command::CheckForUpdate => "check_for_update",
            Command::UpdateApp => "update_app",
        }
    }

    /// Commands the backend answers with an event of the same name.
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Command::LoadConfig
                | Command::SaveConfig { .. }
                | Command::LoadBulkFilelist
                | Command::LoadBulkImport { .. }
                | Command::SaveBulkImport { .. }
                | Command::RenameBulkFile { .. }
                | Command::DeleteBulkFile { .. }
                | Command::CreateBulkFile
                | Command::AddSchedule { .. }
                | Command::DeleteSchedule { .. }
        )
    }

    pub fn into_envelope(self, instance_id: &InstanceId) -> Result<Envelope, ProtocolError> {
        let event = self.event_name();
        let payload = match serde_json::to_value(&self)? {
            Value::Object(mut tagged) => match tagged.remove("data") {
                Some(Value::Object(data)) => Value::Object(data),
                _ => Value::Object(Map::new()),
            },
            _ => Value::Object(Map::new()),
        };
        Ok(Envelope::new(event, instance_id, payload))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    pub message: String,
    pub color: Option<String>,
    pub sticky: bool,
    pub spinner: bool,
    pub icon: Option<String>,
}

/// `element_disable` accepts a single id or a list of ids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ElementIds {
    One(String),
    Many(Vec<String>),
}

impl ElementIds {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ElementIds::One(id) => vec![id],
            ElementIds::Many(ids) => ids,
        }
    }
}

/// Server to client messages, decoded after the addressing check.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    ConfigLoaded {
        config: Option<PanelConfig>,
    },
    ConfigSaved {
        saved: bool,
        config: Option<PanelConfig>,
    },
    BulkFileList {
        bulk_files: Vec<String>,
    },
    BulkImportLoaded {
        loaded: bool,
        filename: Option<String>,
        bulk_import_text: Option<String>,
    },
    BulkImportSaved {
        saved: bool,
        now_load: Option<String>,
    },
    BulkFileRenamed {
        renamed: bool,
        new_filename: Option<String>,
    },
    BulkFileDeleted {
        deleted: bool,
    },
    BulkFileCreated {
        created: bool,
        filename: Option<String>,
    },
    ScheduleAdded {
        added: bool,
        file: Option<String>,
        time: Option<String>,
        job_reference: Option<Value>,
    },
    ScheduleDeleted {
        deleted: bool,
        file: Option<String>,
    },
    StatusUpdate(StatusUpdate),
    LogUpdate {
        message: String,
        artwork_title: Option<String>,
    },
    ProgressBar {
        percent: f64,
        message: Option<String>,
    },
    ElementDisable {
        elements: Vec<String>,
        disabled: bool,
    },
    AddToBulkList {
        url: String,
        title: String,
    },
    BackendRestarting,
    UploadProgress {
        progress: f64,
    },
    UploadComplete,
    UpdateAvailable {
        version: String,
    },
    UpdateFailed {
        error: String,
    },
    Unknown {
        event: String,
    },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ConfigPayload {
    saved: bool,
    config: Option<PanelConfig>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct FileListPayload {
    bulk_files: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LoadPayload {
    loaded: bool,
    filename: Option<String>,
    bulk_import_text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SavePayload {
    saved: bool,
    now_load: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RenamePayload {
    renamed: bool,
    new_filename: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DeletePayload {
    deleted: bool,
    file: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CreatePayload {
    created: bool,
    filename: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AddSchedulePayload {
    added: bool,
    file: Option<String>,
    time: Option<String>,
    #[serde(rename = "jobReference")]
    job_reference: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LogPayload {
    message: String,
    artwork_title: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProgressPayload {
    percent: Option<f64>,
    progress: Option<f64>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct DisablePayload {
    element: Option<ElementIds>,
    #[serde(default = "default_true")]
    mode: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct BulkListPayload {
    url: String,
    title: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VersionPayload {
    version: String,
    error: String,
}

fn default_true() -> bool {
    true
}

impl ServerEvent {
    pub fn decode(envelope: &Envelope) -> Result<Self, ProtocolError> {
        let event = match envelope.event.as_str() {
            "load_config" => {
                let p: ConfigPayload = envelope.decode()?;
                ServerEvent::ConfigLoaded { config: p.config }
            }
            "save_config" => {
                let p: ConfigPayload = envelope.decode()?;
                ServerEvent::ConfigSaved {
                    saved: p.saved,
                    config: p.config,
                }
            }
            "load_bulk_filelist" => {
                let p: FileListPayload = envelope.decode()?;
                ServerEvent::BulkFileList {
                    bulk_files: p.bulk_files.unwrap_or_default(),
                }
            }
            "load_bulk_import" => {
                let p: LoadPayload = envelope.decode()?;
                ServerEvent::BulkImportLoaded {
                    loaded: p.loaded,
                    filename: p.filename,
                    bulk_import_text: p.bulk_import_text,
                }
            }
            "save_bulk_import" => {
                let p: SavePayload = envelope.decode()?;
                ServerEvent::BulkImportSaved {
                    saved: p.saved,
                    now_load: p.now_load,
                }
            }
            "rename_bulk_file" => {
                let p: RenamePayload = envelope.decode()?;
                ServerEvent::BulkFileRenamed {
                    renamed: p.renamed,
                    new_filename: p.new_filename,
                }
            }
            "delete_bulk_file" => {
                let p: DeletePayload = envelope.decode()?;
                ServerEvent::BulkFileDeleted { deleted: p.deleted }
            }
            "create_bulk_file" => {
                let p: CreatePayload = envelope.decode()?;
                ServerEvent::BulkFileCreated {
                    created: p.created,
                    filename: p.filename,
                }
            }
            "add_schedule" => {
                let p: AddSchedulePayload = envelope.decode()?;
                ServerEvent::ScheduleAdded {
                    added: p.added,
                    file: p.file,
                    time: p.time,
                    job_reference: p.job_reference,
                }
            }
            "delete_schedule" => {
                let p: DeletePayload = envelope.decode()?;
                ServerEvent::ScheduleDeleted {
                    deleted: p.deleted,
                    file: p.file,
                }
            }
            "status_update" => ServerEvent::StatusUpdate(envelope.decode()?),
            "log_update" => {
                let p: LogPayload = envelope.decode()?;
                ServerEvent::LogUpdate {
                    message: p.message,
                    artwork_title: p.artwork_title,
                }
            }
            "progress_bar" => {
                let p: ProgressPayload = envelope.decode()?;
                ServerEvent::ProgressBar {
                    percent: p.percent.unwrap_or_default(),
                    message: p.message,
                }
            }
            "element_disable" => {
                let p: DisablePayload = envelope.decode()?;
                ServerEvent::ElementDisable {
                    elements: p.element.map(ElementIds::into_vec).unwrap_or_default(),
                    disabled: p.mode,
                }
            }
            "add_to_bulk_list" => {
                let p: BulkListPayload = envelope.decode()?;
                ServerEvent::AddToBulkList {
                    url: p.url,
                    title: p.title,
                }
            }
            "backend_restarting" => ServerEvent::BackendRestarting,
            "upload_progress" => {
                let p: ProgressPayload = envelope.decode()?;
                ServerEvent::UploadProgress {
                    progress: p.progress.unwrap_or_default(),
                }
            }
            "upload_complete" => ServerEvent::UploadComplete,
            "update_available" => {
                let p: VersionPayload = envelope.decode()?;
                ServerEvent::UpdateAvailable { version: p.version }
            }
            "update_failed" => {
                let p: VersionPayload = envelope.decode()?;
                ServerEvent::UpdateFailed { error: p.error }
            }
            other => ServerEvent::Unknown {
                event: other.to_string(),
            },
        };
        Ok(event)
    }

    /// Whether the handler for this event accepts broadcast deliveries.
    pub fn allows_broadcast(event: &str) -> bool {
        matches!(
            event,
            "status_update"
                | "log_update"
                | "backend_restarting"
                | "update_available"
                | "update_failed"
        )
    }
}
