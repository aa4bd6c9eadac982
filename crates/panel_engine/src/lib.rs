//! Panel engine: socket transport, reply correlation and effect execution.
mod correlator;
mod engine;
mod identity;
mod persist;
mod transport;
mod types;
mod upload;

pub use correlator::{Correlator, CorrelatorError, Delivery, Waiter};
pub use engine::EngineHandle;
pub use identity::InstanceStore;
pub use persist::{StorageDir, StorageError};
pub use transport::{
    ChannelBackend, ChannelConnector, Connection, Connector, Transport, TransportError,
    WebSocketConnector,
};
pub use types::{EngineEvent, EngineSettings, DEFAULT_SERVER_URL};
pub use upload::{upload_digest, ChannelProgressSink, ChunkedUploader, ProgressSink, UploadError};
