use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use panel_core::{Command, Envelope, FailureReason, InstanceId, UploadRequest};
use panel_logging::{panel_debug, panel_error, panel_info, panel_warn};
use tokio::sync::mpsc as async_mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    ChannelProgressSink, ChunkedUploader, Connector, Correlator, CorrelatorError, Delivery, EngineEvent,
    EngineSettings, Transport, TransportError,
};

enum EngineCommand {
    Request {
        command: Command,
        delay: Option<Duration>,
    },
    Notify(Command),
    Upload(UploadRequest),
    Reload {
        delay: Duration,
    },
}

/// Runs the connection on a background tokio runtime and reports back over a
/// std channel, so the caller's thread never blocks on IO.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn start(
        settings: EngineSettings,
        instance_id: InstanceId,
        connector: Arc<dyn Connector>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown = CancellationToken::new();

        let engine = Engine {
            uploader: Arc::new(ChunkedUploader::from_settings(&settings)),
            correlator: Arc::new(Correlator::new(instance_id.clone())),
            settings,
            instance_id,
            connector,
            events: event_tx,
            link: None,
            shutdown: shutdown.clone(),
        };
        let thread = thread::Builder::new()
            .name("panel-engine".to_string())
            .spawn(move || runtime.block_on(engine.run(cmd_rx)))?;

        Ok(Self {
            cmd_tx,
            event_rx,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Sends a command that expects a same-named reply.
    pub fn request(&self, command: Command) {
        let _ = self.cmd_tx.send(EngineCommand::Request {
            command,
            delay: None,
        });
    }

    pub fn request_after(&self, command: Command, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::Request {
            command,
            delay: Some(delay),
        });
    }

    pub fn notify(&self, command: Command) {
        let _ = self.cmd_tx.send(EngineCommand::Notify(command));
    }

    pub fn upload(&self, request: UploadRequest) {
        let _ = self.cmd_tx.send(EngineCommand::Upload(request));
    }

    /// Drops the connection, waits `delay`, then reconnects.
    pub fn reload(&self, delay: Duration) {
        let _ = self.cmd_tx.send(EngineCommand::Reload { delay });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                panel_error!("Engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Engine {
    settings: EngineSettings,
    instance_id: InstanceId,
    connector: Arc<dyn Connector>,
    correlator: Arc<Correlator>,
    uploader: Arc<ChunkedUploader>,
    events: mpsc::Sender<EngineEvent>,
    link: Option<Arc<dyn Transport>>,
    shutdown: CancellationToken,
}

impl Engine {
    async fn run(mut self, mut commands: async_mpsc::UnboundedReceiver<EngineCommand>) {
        let mut inbound = match self.connector.connect().await {
            Ok(connection) => {
                self.link = Some(connection.sender);
                Some(connection.inbound)
            }
            Err(err) => {
                self.disconnected(err.to_string());
                None
            }
        };

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(EngineCommand::Reload { delay }) => {
                        drop(inbound.take());
                        inbound = self.reload(delay).await;
                    }
                    Some(command) => self.handle(command),
                    None => break,
                },
                frame = next_frame(&mut inbound) => match frame {
                    Some(envelope) => self.route(envelope),
                    None => {
                        inbound = None;
                        self.disconnected("connection closed".to_string());
                    }
                },
            }
        }

        self.correlator.clear();
        panel_info!("Engine stopped");
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn fail(&self, event: &str, reason: FailureReason) {
        self.emit(EngineEvent::RequestFailed {
            event: event.to_string(),
            reason,
        });
    }

    fn disconnected(&mut self, reason: String) {
        panel_warn!("Disconnected: {reason}");
        self.link = None;
        self.correlator.clear();
        self.emit(EngineEvent::Disconnected { reason });
    }

    fn route(&self, envelope: Envelope) {
        match self.correlator.deliver(envelope) {
            Delivery::Reply | Delivery::Listener => {}
            Delivery::Unclaimed(envelope) => self.emit(EngineEvent::Message(envelope)),
        }
    }

    async fn reload(&mut self, delay: Duration) -> Option<async_mpsc::UnboundedReceiver<Envelope>> {
        self.link = None;
        self.correlator.clear();
        panel_info!("Reloading in {delay:?}");

        tokio::select! {
            _ = self.shutdown.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        match self.connector.connect().await {
            Ok(connection) => {
                self.link = Some(connection.sender);
                self.emit(EngineEvent::ReloadReady);
                Some(connection.inbound)
            }
            Err(err) => {
                panel_warn!("Reconnect failed: {err}");
                self.emit(EngineEvent::ReloadFailed {
                    error: err.to_string(),
                });
                None
            }
        }
    }

    fn handle(&self, command: EngineCommand) {
        match command {
            EngineCommand::Request { command, delay } => self.request(command, delay),
            EngineCommand::Notify(command) => self.notify(command),
            EngineCommand::Upload(request) => self.upload(request),
            EngineCommand::Reload { .. } => {}
        }
    }

    fn request(&self, command: Command, delay: Option<Duration>) {
        let event = command.event_name();
        let Some(link) = self.link.clone() else {
            self.fail(event, FailureReason::Transport(TransportError::NotConnected.to_string()));
            return;
        };
        let waiter = match self.correlator.register_once(event) {
            Ok(waiter) => waiter,
            Err(err) => {
                panel_warn!("{err}");
                self.fail(event, FailureReason::Busy);
                return;
            }
        };
        let envelope = match command.into_envelope(&self.instance_id) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.correlator.cancel(event);
                self.fail(event, FailureReason::Transport(err.to_string()));
                return;
            }
        };

        let correlator = self.correlator.clone();
        let events = self.events.clone();
        let timeout = self.settings.reply_timeout;
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let exchange = async {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                panel_debug!("-> {event} ({})", envelope.instance_id.as_deref().unwrap_or(""));
                if let Err(err) = link.send(envelope).await {
                    correlator.cancel(event);
                    return Err(FailureReason::Transport(err.to_string()));
                }
                match correlator.await_reply(waiter, timeout).await {
                    Ok(reply) => Ok(reply),
                    Err(CorrelatorError::TimedOut(_)) => {
                        panel_warn!("No reply for '{event}' within {timeout:?}");
                        Err(FailureReason::TimedOut)
                    }
                    Err(err) => Err(FailureReason::Transport(err.to_string())),
                }
            };
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => return,
                outcome = exchange => outcome,
            };
            let _ = events.send(match outcome {
                Ok(reply) => EngineEvent::Message(reply),
                Err(reason) => EngineEvent::RequestFailed {
                    event: event.to_string(),
                    reason,
                },
            });
        });
    }

    fn notify(&self, command: Command) {
        let event = command.event_name();
        let Some(link) = self.link.clone() else {
            self.fail(event, FailureReason::Transport(TransportError::NotConnected.to_string()));
            return;
        };
        let envelope = match command.into_envelope(&self.instance_id) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.fail(event, FailureReason::Transport(err.to_string()));
                return;
            }
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            panel_debug!("-> {event}");
            if let Err(err) = link.send(envelope).await {
                let _ = events.send(EngineEvent::RequestFailed {
                    event: event.to_string(),
                    reason: FailureReason::Transport(err.to_string()),
                });
            }
        });
    }

    fn upload(&self, request: UploadRequest) {
        let Some(link) = self.link.clone() else {
            self.emit(EngineEvent::UploadFailed {
                file_name: request.file_name,
                error: TransportError::NotConnected.to_string(),
            });
            return;
        };
        let uploader = self.uploader.clone();
        let instance_id = self.instance_id.clone();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let file_name = request.file_name.clone();
            let sink = ChannelProgressSink::new(events.clone());
            let outcome = tokio::select! {
                _ = shutdown.cancelled() => return,
                outcome = uploader.upload(link.as_ref(), &instance_id, request, &sink) => outcome,
            };
            if let Err(err) = outcome {
                panel_warn!("{err}");
                let _ = events.send(EngineEvent::UploadFailed {
                    file_name,
                    error: err.to_string(),
                });
            }
        });
    }
}

async fn next_frame(inbound: &mut Option<async_mpsc::UnboundedReceiver<Envelope>>) -> Option<Envelope> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
