use panel_core::{Effect, Msg};
use panel_engine::{EngineEvent, EngineHandle};
use panel_logging::{panel_debug, panel_info, panel_warn};

/// Hands effects from `update` to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Request(command) => {
                    panel_debug!("Request {}", command.event_name());
                    self.engine.request(command);
                }
                Effect::RequestAfter { command, delay } => {
                    panel_debug!("Request {} in {:?}", command.event_name(), delay);
                    self.engine.request_after(command, delay);
                }
                Effect::Notify(command) => {
                    panel_debug!("Notify {}", command.event_name());
                    self.engine.notify(command);
                }
                Effect::UploadArtwork(request) => {
                    panel_info!(
                        "Upload {} bytes={}",
                        request.file_name,
                        request.bytes.len()
                    );
                    self.engine.upload(request);
                }
                Effect::ScheduleReload { delay } => {
                    panel_info!("Reloading in {:?}", delay);
                    self.engine.reload(delay);
                }
            }
        }
    }

    /// Drains whatever the engine reported since the last call.
    pub fn drain_events(&self) -> Vec<Msg> {
        std::iter::from_fn(|| self.engine.try_recv())
            .map(map_event)
            .collect()
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Message(envelope) => Msg::ServerMessage(envelope),
        EngineEvent::RequestFailed { event, reason } => {
            panel_warn!("Request {} failed: {:?}", event, reason);
            Msg::RequestFailed { event, reason }
        }
        EngineEvent::UploadProgress { file_name, percent } => {
            Msg::UploadChunkSent { file_name, percent }
        }
        EngineEvent::UploadFinished { file_name } => Msg::UploadFinished { file_name },
        EngineEvent::UploadFailed { file_name, error } => {
            panel_warn!("Upload of {} failed: {}", file_name, error);
            Msg::UploadFailed { file_name, error }
        }
        EngineEvent::Disconnected { reason } => {
            panel_warn!("Disconnected: {}", reason);
            Msg::ConnectionLost
        }
        EngineEvent::ReloadFailed { error } => {
            panel_warn!("Reload failed: {}", error);
            Msg::ReloadFailed
        }
        EngineEvent::ReloadReady => Msg::ReloadReady,
    }
}
