use std::fmt::Write as _;
use std::sync::mpsc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use panel_core::{Command, InstanceId, ProtocolError, UploadRequest, UploadSession};
use panel_logging::{panel_debug, panel_info};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{EngineEvent, EngineSettings, Transport, TransportError};

const UPLOAD_TITLE: &str = "Artwork upload";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not send chunk {index} of '{file_name}': {source}")]
    Chunk {
        file_name: String,
        index: usize,
        #[source]
        source: TransportError,
    },
    #[error("could not send '{event}' for '{file_name}': {source}")]
    Message {
        file_name: String,
        event: &'static str,
        #[source]
        source: TransportError,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Hex SHA-256 of the whole payload, sent with the completion message.
pub fn upload_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Sends an archive as base64 chunks in index order, then one completion message.
#[derive(Debug, Clone)]
pub struct ChunkedUploader {
    chunk_size: usize,
    chunk_delay: Duration,
}

impl ChunkedUploader {
    pub fn new(chunk_size: usize, chunk_delay: Duration) -> Self {
        Self {
            chunk_size,
            chunk_delay,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_delay)
    }

    pub async fn upload(
        &self,
        transport: &dyn Transport,
        instance_id: &InstanceId,
        request: UploadRequest,
        sink: &dyn ProgressSink,
    ) -> Result<(), UploadError> {
        let UploadRequest {
            file_name,
            bytes,
            options,
            filters,
            plex_title,
            plex_year,
        } = request;
        let mut session = UploadSession::new(file_name.clone(), bytes.len(), self.chunk_size);
        let total_chunks = session.plan().total_chunks();
        panel_info!(
            "Uploading '{file_name}': {} bytes in {total_chunks} chunks",
            bytes.len()
        );

        self.send(
            transport,
            instance_id,
            &file_name,
            Command::DisplayMessage {
                message: format!("Receiving '{file_name}' ({} bytes)", bytes.len()),
                title: UPLOAD_TITLE.to_string(),
            },
        )
        .await?;

        while let Some(chunk) = session.next_chunk() {
            let command = Command::UploadArtworkChunk {
                file_name: file_name.clone(),
                chunk_data: STANDARD.encode(&bytes[chunk.range.clone()]),
                chunk_index: chunk.index,
                total_chunks,
            };
            transport
                .send(command.into_envelope(instance_id)?)
                .await
                .map_err(|source| UploadError::Chunk {
                    file_name: file_name.clone(),
                    index: chunk.index,
                    source,
                })?;
            session.advance(&chunk);
            panel_debug!("Sent chunk {}/{total_chunks} of '{file_name}'", chunk.index + 1);
            sink.emit(EngineEvent::UploadProgress {
                file_name: file_name.clone(),
                percent: session.percent(),
            });
            tokio::time::sleep(self.chunk_delay).await;
        }

        self.send(
            transport,
            instance_id,
            &file_name,
            Command::DisplayMessage {
                message: format!("All chunks of '{file_name}' sent"),
                title: UPLOAD_TITLE.to_string(),
            },
        )
        .await?;
        self.send(
            transport,
            instance_id,
            &file_name,
            Command::UploadComplete {
                file_name: file_name.clone(),
                options,
                filters,
                plex_title,
                plex_year,
                total_bytes: bytes.len(),
                sha256: upload_digest(&bytes),
            },
        )
        .await?;

        sink.emit(EngineEvent::UploadFinished { file_name });
        Ok(())
    }

    async fn send(
        &self,
        transport: &dyn Transport,
        instance_id: &InstanceId,
        file_name: &str,
        command: Command,
    ) -> Result<(), UploadError> {
        let event = command.event_name();
        transport
            .send(command.into_envelope(instance_id)?)
            .await
            .map_err(|source| UploadError::Message {
                file_name: file_name.to_string(),
                event,
                source,
            })
    }
}
