//! Outbound message delivery.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::core::PlayerId;

/// Who a payload is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// Every other participant.
    All,
    /// One participant.
    Player(PlayerId),
}

/// Errors raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport is disconnected")]
    Disconnected,

    #[error("transport error: {0}")]
    Other(String),
}

/// Sends packed payloads to other participants.
///
/// Connection setup, membership and retries are the implementor's
/// business; the session only hands over bytes.
pub trait Transport: Send {
    /// Deliver `payload` to `to`.
    fn send(&mut self, to: Recipient, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Payloads recorded by a [`MemoryTransport`], oldest first.
pub type SentPayloads = Vec<(Recipient, Vec<u8>)>;

/// Shared handle to a [`MemoryTransport`]'s outbox.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    sent: Arc<Mutex<SentPayloads>>,
}

impl Outbox {
    /// Take everything sent so far.
    pub fn drain(&self) -> SentPayloads {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of payloads waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory transport that records what it sends.
///
/// Used for loopback play and tests: hand the [`Outbox`] to whoever
/// should receive the payloads.
///
/// ```
/// use rust_tabletop::session::{MemoryTransport, Recipient, Transport};
///
/// let mut transport = MemoryTransport::new();
/// let outbox = transport.outbox();
///
/// transport.send(Recipient::All, b"hello".to_vec()).unwrap();
/// assert_eq!(outbox.drain(), vec![(Recipient::All, b"hello".to_vec())]);
/// assert!(outbox.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    outbox: Outbox,
    connected: bool,
}

impl MemoryTransport {
    /// Create a connected transport with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outbox: Outbox::default(),
            connected: true,
        }
    }

    /// A handle to the outbox.
    #[must_use]
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// A transport whose sends all fail.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            outbox: Outbox::default(),
            connected: false,
        }
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, to: Recipient, payload: Vec<u8>) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        self.outbox
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((to, payload));
        Ok(())
    }
}
