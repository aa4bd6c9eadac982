use std::time::Duration;

use crate::{Command, UploadRequest};

/// Delay before a full reload after the backend restarts or the socket drops.
pub const RELOAD_DELAY: Duration = Duration::from_secs(3);
/// Gap between `set_password` and the `save_config` that follows it.
pub const PASSWORD_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send and wait for exactly one reply of the same event name.
    Request(Command),
    /// Like `Request`, after a delay.
    RequestAfter { command: Command, delay: Duration },
    /// Fire and forget.
    Notify(Command),
    UploadArtwork(UploadRequest),
    /// Drop the connection, wait, reconnect and report `ReloadReady`.
    ScheduleReload { delay: Duration },
}
