// optiga-rs/src/device/descriptor.rs

use std::sync::mpsc;

use crate::constants::{MAX_APDU_LEN, OUTCOME_TRANSPORT};
use crate::types::ErrorCode;

/// One APDU exchange owned by the caller until submission.
///
/// The transmit bytes and the receive capacity travel into the worker
/// together; the response buffer comes back through the completion
/// signal, so nothing is shared while the request is in flight.
#[derive(Debug)]
pub struct ApduRequest {
    /// Complete command APDU, header included.
    pub tx: Vec<u8>,
    /// Upper bound for the response APDU length.
    pub rx_capacity: usize,
}

impl ApduRequest {
    /// Request with the wire-format maximum receive capacity.
    pub fn new(tx: Vec<u8>) -> Self {
        Self {
            tx,
            rx_capacity: MAX_APDU_LEN,
        }
    }

    pub fn with_capacity(tx: Vec<u8>, rx_capacity: usize) -> Self {
        Self { tx, rx_capacity }
    }
}

/// Final state of a submitted descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transport succeeded and the element reported success; carries the
    /// complete response APDU, header included.
    Success(Vec<u8>),
    /// Transport succeeded but the element rejected the command; carries
    /// the code read back from the error code object.
    Device(ErrorCode),
    /// Host-side transport or internal failure. The stack was reset and
    /// any session state on the element is gone; resubmit explicitly.
    Transport,
}

impl Outcome {
    /// Signed outcome code: 0 success, positive element error byte,
    /// negative host-side failure.
    pub fn code(&self) -> i32 {
        match self {
            Outcome::Success(_) => 0,
            Outcome::Device(code) => code.as_u8() as i32,
            Outcome::Transport => OUTCOME_TRANSPORT,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Single-shot completion signal for one descriptor. The worker is the
/// only producer; waiting consumes the signal.
#[derive(Debug)]
pub struct Completion {
    pub(crate) signal: mpsc::Receiver<Outcome>,
}

impl Completion {
    /// Block until the worker publishes the outcome. A worker that went
    /// away reports as a transport failure.
    pub fn wait(self) -> Outcome {
        self.signal.recv().unwrap_or(Outcome::Transport)
    }
}

/// Queue entry: the request plus its completion signal sender.
pub(crate) struct QueuedApdu {
    pub request: ApduRequest,
    pub done: mpsc::SyncSender<Outcome>,
}

/// What travels through the dispatcher queue.
pub(crate) enum Request {
    Apdu(QueuedApdu),
    /// Stop the worker even while handles are still alive.
    Shutdown,
}

impl QueuedApdu {
    pub fn complete(self, outcome: Outcome) {
        // The caller may have dropped its Completion; nothing to do then
        let _ = self.done.send(outcome);
    }
}

/// Build the single-shot completion pair for one descriptor.
pub(crate) fn completion_pair(request: ApduRequest) -> (QueuedApdu, Completion) {
    let (done, signal) = mpsc::sync_channel(1);
    (QueuedApdu { request, done }, Completion { signal })
}
