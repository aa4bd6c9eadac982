//! Panel core: pure client state machine, message contract and view-model helpers.
mod bulk;
mod effect;
mod instance;
mod merge;
mod msg;
mod protocol;
mod schedule;
mod state;
mod update;
mod upload;
mod view_model;

pub use bulk::{BulkFileState, DialogChoice, PendingDecision, PLACEHOLDER_BULK_FILE};
pub use effect::{Effect, PASSWORD_SETTLE_DELAY, RELOAD_DELAY};
pub use instance::{fallback_uuid, InstanceId};
pub use merge::{
    append_entry, bare_url, contains_url, merge_sorted, strip_add_to_bulk_flag, title_sort_key,
    MEDIUX_GROUP, TPDB_GROUP,
};
pub use msg::{FailureReason, Msg, ScrapeForm};
pub use protocol::{
    Command, ElementIds, Envelope, PanelConfig, ProtocolError, ServerEvent, StatusUpdate,
    BROADCAST,
};
pub use schedule::{ScheduleEntry, ScheduleIcon, ScheduleRegistry};
pub use state::{
    ClientState, ConnectionState, FollowUp, ProgressBar, RequestContext, StatusBanner,
    StatusColor, ValidationIssue,
};
pub use update::update;
pub use upload::{ChunkSpec, UploadPlan, UploadRequest, UploadSession, DEFAULT_CHUNK_SIZE};
pub use view_model::{AppViewModel, DefaultMarker, DialogView, FileOption, ProgressView};
