use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use panel_core::{Envelope, InstanceId};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelatorError {
    #[error("a request for '{0}' is already waiting for its reply")]
    Busy(String),
    #[error("'{0}' already has a listener")]
    AlreadyListening(String),
    #[error("no reply for '{0}' in time")]
    TimedOut(String),
    #[error("waiter for '{0}' was dropped")]
    Cancelled(String),
}

/// A registered one-shot waiter; pass it to [`Correlator::await_reply`].
#[derive(Debug)]
pub struct Waiter {
    event: String,
    id: u64,
    rx: oneshot::Receiver<Envelope>,
}

impl Waiter {
    pub fn event(&self) -> &str {
        &self.event
    }
}

/// What happened to a frame handed to [`Correlator::deliver`].
#[derive(Debug, PartialEq)]
pub enum Delivery {
    /// Completed a one-shot waiter.
    Reply,
    /// Forwarded to a persistent listener.
    Listener,
    Unclaimed(Envelope),
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    once: HashMap<String, (u64, oneshot::Sender<Envelope>)>,
    persistent: HashMap<String, mpsc::UnboundedSender<Envelope>>,
}

/// Event-name keyed registry of reply waiters.
///
/// At most one one-shot waiter and one persistent listener exist per event
/// name; a second registration is refused instead of stacking.
pub struct Correlator {
    instance_id: InstanceId,
    registry: Mutex<Registry>,
}

impl Correlator {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_once(&self, event: &str) -> Result<Waiter, CorrelatorError> {
        let mut registry = self.lock();
        if let Some((_, tx)) = registry.once.get(event) {
            if !tx.is_closed() {
                return Err(CorrelatorError::Busy(event.to_string()));
            }
        }
        registry.next_id += 1;
        let id = registry.next_id;
        let (tx, rx) = oneshot::channel();
        registry.once.insert(event.to_string(), (id, tx));
        Ok(Waiter {
            event: event.to_string(),
            id,
            rx,
        })
    }

    pub fn register_persistent(
        &self,
        event: &str,
    ) -> Result<mpsc::UnboundedReceiver<Envelope>, CorrelatorError> {
        let mut registry = self.lock();
        if let Some(tx) = registry.persistent.get(event) {
            if !tx.is_closed() {
                return Err(CorrelatorError::AlreadyListening(event.to_string()));
            }
        }
        let (tx, rx) = mpsc::unbounded_channel();
        registry.persistent.insert(event.to_string(), tx);
        Ok(rx)
    }

    /// Routes an inbound frame. Only unicast frames for this instance can
    /// complete a one-shot waiter.
    pub fn deliver(&self, envelope: Envelope) -> Delivery {
        let mut registry = self.lock();
        let mut envelope = envelope;

        if envelope.is_addressed_to(&self.instance_id, false) {
            if let Some((_, tx)) = registry.once.remove(&envelope.event) {
                match tx.send(envelope) {
                    Ok(()) => return Delivery::Reply,
                    Err(returned) => envelope = returned,
                }
            }
        }

        if let Some(tx) = registry.persistent.get(&envelope.event) {
            match tx.send(envelope) {
                Ok(()) => return Delivery::Listener,
                Err(mpsc::error::SendError(returned)) => {
                    registry.persistent.remove(&returned.event);
                    envelope = returned;
                }
            }
        }

        Delivery::Unclaimed(envelope)
    }

    /// Waits for the reply; on timeout the waiter is removed so the event can
    /// be requested again.
    pub async fn await_reply(
        &self,
        waiter: Waiter,
        timeout: Duration,
    ) -> Result<Envelope, CorrelatorError> {
        let Waiter { event, id, rx } = waiter;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => Err(CorrelatorError::Cancelled(event)),
            Err(_) => {
                let mut registry = self.lock();
                if registry.once.get(&event).is_some_and(|(current, _)| *current == id) {
                    registry.once.remove(&event);
                }
                Err(CorrelatorError::TimedOut(event))
            }
        }
    }

    /// Drops the one-shot waiter for `event`, if any.
    pub fn cancel(&self, event: &str) -> bool {
        self.lock().once.remove(event).is_some()
    }

    pub fn is_waiting(&self, event: &str) -> bool {
        self.lock()
            .once
            .get(event)
            .is_some_and(|(_, tx)| !tx.is_closed())
    }

    /// Drops every waiter and listener; used when the connection is torn down.
    pub fn clear(&self) {
        let mut registry = self.lock();
        registry.once.clear();
        registry.persistent.clear();
    }
}
