use std::time::Duration;

use panel_core::{Envelope, FailureReason, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:4567/ws";

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Inbound frame nobody in the engine was waiting for, or a reply that
    /// completed a request. Addressing is checked again by `update`.
    Message(Envelope),
    RequestFailed {
        event: String,
        reason: FailureReason,
    },
    UploadProgress {
        file_name: String,
        percent: u8,
    },
    UploadFinished {
        file_name: String,
    },
    UploadFailed {
        file_name: String,
        error: String,
    },
    Disconnected {
        reason: String,
    },
    ReloadFailed {
        error: String,
    },
    ReloadReady,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub server_url: String,
    pub connect_timeout: Duration,
    pub reply_timeout: Duration,
    pub chunk_size: usize,
    /// Pause after each upload chunk so the runtime can serve other work.
    pub chunk_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            reply_timeout: Duration::from_secs(30),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: Duration::from_millis(10),
        }
    }
}
