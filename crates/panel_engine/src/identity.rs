use panel_core::InstanceId;
use panel_logging::{panel_info, panel_warn};

use crate::{StorageDir, StorageError};

const INSTANCE_FILE: &str = "instance_id";

/// Persists the client's instance id so every run against the same storage
/// directory speaks as the same client.
pub struct InstanceStore {
    storage: StorageDir,
}

impl InstanceStore {
    pub fn new(storage: StorageDir) -> Self {
        Self { storage }
    }

    /// Returns the stored id, or generates, stores and returns a new one.
    pub fn get_or_create(&self) -> Result<InstanceId, StorageError> {
        if let Some(raw) = self.storage.read_string(INSTANCE_FILE)? {
            match InstanceId::from_persisted(&raw) {
                Some(id) => return Ok(id),
                None => panel_warn!("Stored instance id is blank; generating a new one"),
            }
        }

        let id = InstanceId::generate();
        self.storage.write_atomic(INSTANCE_FILE, id.as_str())?;
        panel_info!("Generated instance id {id}");
        Ok(id)
    }
}
