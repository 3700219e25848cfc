// optiga-rs/src/device/worker.rs

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::constants::{GET_ERROR_CODE_APDU, MAX_RESETS, OPEN_APPLICATION_APDU};
use crate::device::descriptor::{Outcome, QueuedApdu, Request};
use crate::nettran::Nettran;
use crate::types::ErrorCode;
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

/// The serialising worker. After initialisation it is the only code that
/// touches the transport stack, which is what guarantees "exactly one
/// APDU in flight".
///
/// The worker is also the single logger: the layers below return codes
/// and never log.
pub(crate) struct Worker {
    stack: Nettran,
    queue: mpsc::Receiver<Request>,
    dead: Arc<AtomicBool>,
    resets: Arc<AtomicU32>,
    reset_counter: u32,
    stop: bool,
}

/// Reset the stack bottom-up and re-open the application on the element.
/// Shared with `Optiga::open` for the initial reset.
pub(crate) fn reset_stack(stack: &mut Nettran) -> Result<()> {
    stack.init()?;

    stack.send_apdu(&OPEN_APPLICATION_APDU)?;
    let rx = stack.recv_apdu(16)?;
    if rx != [0x00, 0x00, 0x00, 0x00] {
        return Err(Error::UnexpectedResponse(format!(
            "OpenApplication answered [{}]",
            bytes_to_hex_spaced(&rx)
        )));
    }
    Ok(())
}

impl Worker {
    pub fn new(
        stack: Nettran,
        queue: mpsc::Receiver<Request>,
        dead: Arc<AtomicBool>,
        resets: Arc<AtomicU32>,
    ) -> Self {
        Self {
            stack,
            queue,
            dead,
            resets,
            reset_counter: 0,
            stop: false,
        }
    }

    /// Dequeue and serve descriptors until a shutdown request arrives or
    /// every handle is gone.
    pub fn run(mut self) {
        info!("worker started");
        while !self.stop {
            match self.queue.recv() {
                Ok(Request::Apdu(item)) => self.serve(item),
                Ok(Request::Shutdown) | Err(_) => break,
            }
        }
        debug!("worker exiting");
    }

    fn serve(&mut self, item: QueuedApdu) {
        // Dead is sticky; it is also entered here when the previous faults
        // used up the whole reset budget without a clean round-trip in
        // between
        if self.dead.load(Ordering::Acquire) || self.reset_counter >= MAX_RESETS {
            self.dead.store(true, Ordering::Release);
            item.complete(Outcome::Transport);
            return;
        }

        debug!(
            "round-trip: {} tx bytes, rx capacity {}",
            item.request.tx.len(),
            item.request.rx_capacity
        );

        let mut result = self.round_trip(&item.request.tx, item.request.rx_capacity);
        if let Err(e @ Error::SequenceDesync { .. }) = &result {
            // The data-link layer already emitted a SYNC; both sides are
            // back at sequence zero, so the exchange gets one more try
            info!("{}, retrying round-trip after resync", e);
            result = self.round_trip(&item.request.tx, item.request.rx_capacity);
        }

        match result {
            Ok(outcome) => {
                // The transport worked even if the element said no
                self.reset_counter = 0;
                if let Outcome::Device(code) = &outcome {
                    info!("element rejected command: {}", code);
                }
                item.complete(outcome);
            }
            Err(e) => {
                warn!("transport fault: {}", e);
                item.complete(Outcome::Transport);
                self.recover();
            }
        }
    }

    /// One send/receive exchange. A clean transport with a non-zero status
    /// byte triggers the GetErrorCode sub-exchange.
    fn round_trip(&mut self, tx: &[u8], rx_capacity: usize) -> Result<Outcome> {
        self.stack.send_apdu(tx)?;
        let rx = self.stack.recv_apdu(rx_capacity)?;

        match rx.first() {
            Some(0x00) => Ok(Outcome::Success(rx)),
            Some(_) => Ok(Outcome::Device(self.fetch_error_code()?)),
            None => Err(Error::UnexpectedResponse("empty response APDU".into())),
        }
    }

    /// Read the one-byte error code object. Expected response:
    /// `00 <undef> 00 01 <code>`.
    fn fetch_error_code(&mut self) -> Result<ErrorCode> {
        self.stack.send_apdu(&GET_ERROR_CODE_APDU)?;
        let rx = self.stack.recv_apdu(16)?;

        if rx.len() != 5 || rx[0] != 0x00 || rx[2..4] != [0x00, 0x01] {
            return Err(Error::UnexpectedResponse(format!(
                "GetErrorCode answered [{}]",
                bytes_to_hex_spaced(&rx)
            )));
        }
        Ok(ErrorCode::new(rx[4]))
    }

    /// Fault recovery: reset the stack, retrying while the reset itself
    /// fails, then drain everything queued at fault entry. Descriptors
    /// submitted during the drain are served by the next loop iteration.
    fn recover(&mut self) {
        loop {
            self.reset_counter += 1;
            if self.reset_counter > MAX_RESETS {
                error!("{} consecutive resets failed, core is dead", MAX_RESETS);
                self.dead.store(true, Ordering::Release);
                break;
            }
            self.resets.fetch_add(1, Ordering::Relaxed);
            match reset_stack(&mut self.stack) {
                Ok(()) => {
                    info!("stack reset complete (attempt {})", self.reset_counter);
                    break;
                }
                Err(e) => warn!("reset attempt {} failed: {}", self.reset_counter, e),
            }
        }

        // Session state on the element did not survive the reset, so every
        // queued descriptor must be resubmitted by its caller
        let mut drained = 0usize;
        loop {
            match self.queue.try_recv() {
                Ok(Request::Apdu(item)) => {
                    item.complete(Outcome::Transport);
                    drained += 1;
                }
                Ok(Request::Shutdown) => {
                    self.stop = true;
                    break;
                }
                Err(_) => break,
            }
        }
        if drained > 0 {
            info!("drained {} queued descriptors", drained);
        }
    }
}
