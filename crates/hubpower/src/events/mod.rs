//! Lock/unlock event bridge
//!
//! An [`EventSource`] yields screen lock and unlock events; [`run_bridge`]
//! feeds them to a [`LockHandler`]. The bridge never retries: the first
//! handler failure ends it, and the caller decides the exit policy.

pub mod source;

pub use source::{LineEventSource, NotificationNames, WatcherSource};

use common::{Error, Result};
use tracing::{debug, error, info};

/// Screen state change reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    Locked,
    Unlocked,
}

/// Source of lock/unlock events
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Wait for the next event. `None` means the source has closed.
    async fn next_event(&mut self) -> Result<Option<LockEvent>>;
}

/// Receiver of lock/unlock events
pub trait LockHandler {
    fn on_locked(&mut self) -> Result<()>;
    fn on_unlocked(&mut self) -> Result<()>;
}

/// Dispatch events from `source` to `handler` until something fails.
///
/// Only returns on error: a handler failure, a source failure, or the source
/// closing.
pub async fn run_bridge<S, H>(source: &mut S, handler: &mut H) -> Result<()>
where
    S: EventSource,
    H: LockHandler,
{
    info!("Waiting for lock/unlock events");

    loop {
        let Some(event) = source.next_event().await? else {
            return Err(Error::EventSource("event source closed".to_string()));
        };

        debug!("Received {:?}", event);
        let result = match event {
            LockEvent::Locked => handler.on_locked(),
            LockEvent::Unlocked => handler.on_unlocked(),
        };

        if let Err(e) = result {
            error!("Handling {:?} failed: {}", event, e);
            return Err(e);
        }
    }
}
