use std::time::Duration;

use crate::{DialogChoice, Envelope, PanelConfig, UploadRequest};

/// Why a command never produced a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No reply arrived within the reply timeout.
    TimedOut,
    /// Another request for the same event was still waiting.
    Busy,
    /// The command could not be written to the socket.
    Transport(String),
}

/// Fields of the scrape form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrapeForm {
    pub url: String,
    pub year: String,
    pub options: Vec<String>,
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Client came up (or was reloaded); fetch config and check for updates.
    SessionStarted,
    /// Time passed; ages banners and the progress bar.
    Tick(Duration),
    /// User edited the bulk text.
    BulkTextEdited(String),
    /// User picked another file in the bulk file selector.
    BulkFileSelected(String),
    /// User answered the unsaved-changes dialog.
    DialogAnswered(DialogChoice),
    /// User clicked save on the bulk editor.
    SaveBulkClicked,
    /// User confirmed a new name for the current bulk file.
    RenameRequested(String),
    /// User confirmed deletion of the current bulk file.
    DeleteRequested,
    /// User asked for a new empty bulk file.
    CreateRequested,
    /// A local text file was read for import into the bulk editor.
    BulkFileImported { file_name: String, text: String },
    /// User marked the current file as the default bulk file.
    MakeDefaultClicked,
    /// User submitted a schedule time for the current file.
    ScheduleRequested(String),
    /// User cancelled the current file's schedule.
    ScheduleCancelled,
    /// User started a bulk import run of the editor contents.
    BulkImportStarted,
    /// User submitted the scrape form.
    ScrapeSubmitted(ScrapeForm),
    /// User submitted the configuration form.
    ConfigSubmitted {
        config: PanelConfig,
        new_password: Option<String>,
    },
    /// User dropped an artwork archive for upload.
    ArtworkUploadRequested(UploadRequest),
    /// User accepted the available update.
    UpdateAppClicked,
    /// Message received from the backend, not yet checked for addressing.
    ServerMessage(Envelope),
    /// A command issued by this client got no reply.
    RequestFailed { event: String, reason: FailureReason },
    /// Local progress while chunks are being sent.
    UploadChunkSent { file_name: String, percent: u8 },
    /// All chunks and the completion message were sent.
    UploadFinished { file_name: String },
    UploadFailed { file_name: String, error: String },
    /// The socket dropped.
    ConnectionLost,
    /// Reconnection attempt during a reload failed.
    ReloadFailed,
    /// Reconnected after a scheduled reload.
    ReloadReady,
}
