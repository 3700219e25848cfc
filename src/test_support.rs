//! Test support helpers intended for use by unit and integration tests.
//!
//! The centerpiece is [`MockElement`], a protocol-aware model of the
//! secure element living behind a [`TwoWireBus`] implementation: it
//! checks frame integrity, acknowledges sequence numbers, reassembles
//! packet chains and serves scripted APDU responses, with knobs for
//! injecting NACKs, FCS corruption and command-level errors.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::bus::TwoWireBus;
use crate::config::Config;
use crate::constants::{
    FRAME_OVERHEAD, GET_ERROR_CODE_APDU, PACKET_HEADER_LEN, REG_DATA, REG_DATA_REG_LEN,
    REG_I2C_STATE, REG_SOFT_RESET,
};
use crate::device::Optiga;
use crate::protocol::packet::wrap_fragment;
use crate::protocol::{Chain, ControlKind, Frame, FrameKind};
use crate::types::BusAddress;
use crate::{Error, Result};

/// One frame queued for the host, with an optional corruption budget: the
/// frame is served that many times with a flipped FCS byte (without being
/// consumed) before the intact copy goes out.
#[derive(Debug)]
struct OutFrame {
    bytes: Vec<u8>,
    corrupt_serves: usize,
}

/// One scripted response APDU. `corrupt_serves` transfers onto the first
/// frame of the response when it is queued.
#[derive(Debug)]
struct ScriptedResponse {
    apdu: Vec<u8>,
    corrupt_serves: usize,
}

#[derive(Debug, Default)]
struct ElementState {
    data_reg_len: u16,
    selected: Option<u8>,
    /// Frames waiting for the host to read them.
    outbox: VecDeque<OutFrame>,
    /// Element-side data-link state.
    rx_expected: u8,
    last_delivered: Option<u8>,
    tx_seq: u8,
    /// Packet chain reassembly buffer.
    apdu_buf: Vec<u8>,
    chaining: bool,
    /// Scripted response APDUs, served FIFO.
    responses: VecDeque<ScriptedResponse>,
    /// Every complete command APDU received.
    apdus: Vec<Vec<u8>>,
    /// Every raw frame written into the DATA register.
    frames: Vec<Vec<u8>>,
    /// Error code served through the error code object.
    error_code: u8,
    /// Overrides the status byte of the next non-builtin response.
    force_status: Option<u8>,
    /// NACK every transaction while set.
    nack_everything: bool,
}

impl ElementState {
    fn reset(&mut self) {
        self.outbox.clear();
        self.rx_expected = 0;
        self.last_delivered = None;
        self.tx_seq = 0;
        self.apdu_buf.clear();
        self.chaining = false;
    }

    fn mtu(&self) -> usize {
        self.data_reg_len as usize - FRAME_OVERHEAD - PACKET_HEADER_LEN
    }

    fn push_frame(&mut self, frame: Frame) {
        self.push_frame_corrupt(frame, 0);
    }

    fn push_frame_corrupt(&mut self, frame: Frame, corrupt_serves: usize) {
        self.outbox.push_back(OutFrame {
            bytes: frame.encode().expect("mock frame encode"),
            corrupt_serves,
        });
    }

    fn handle_frame(&mut self, raw: &[u8]) {
        self.frames.push(raw.to_vec());

        let frame = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(_) => {
                self.push_frame(Frame::nack(self.last_delivered.unwrap_or(0)));
                return;
            }
        };

        match frame.kind {
            FrameKind::Control(ControlKind::Sync) => self.reset(),
            FrameKind::Control(_) => {}
            FrameKind::Data => self.handle_data_frame(frame),
        }
    }

    fn handle_data_frame(&mut self, frame: Frame) {
        if self.last_delivered == Some(frame.seq) {
            // Retransmission; the host lost our acknowledgement
            self.push_frame(Frame::bare_ack(frame.seq));
            return;
        }
        if frame.seq != self.rx_expected {
            self.push_frame(Frame::nack(self.last_delivered.unwrap_or(0)));
            return;
        }

        self.last_delivered = Some(frame.seq);
        self.rx_expected = (frame.seq + 1) & 3;
        self.push_frame(Frame::bare_ack(frame.seq));

        let Some((&pctr, fragment)) = frame.payload.split_first() else {
            return;
        };
        let Ok(chain) = Chain::from_pctr(pctr) else {
            return;
        };

        match chain {
            Chain::Only => {
                let apdu = fragment.to_vec();
                self.finish_apdu(apdu);
            }
            Chain::First => {
                self.chaining = true;
                self.apdu_buf = fragment.to_vec();
            }
            Chain::Middle if self.chaining => {
                self.apdu_buf.extend_from_slice(fragment);
            }
            Chain::Last if self.chaining => {
                self.apdu_buf.extend_from_slice(fragment);
                self.chaining = false;
                let apdu = std::mem::take(&mut self.apdu_buf);
                self.finish_apdu(apdu);
            }
            _ => {
                self.chaining = false;
                self.apdu_buf.clear();
            }
        }
    }

    fn finish_apdu(&mut self, apdu: Vec<u8>) {
        let response = self.response_for(&apdu);
        self.apdus.push(apdu);
        self.send_response(response);
    }

    fn response_for(&mut self, apdu: &[u8]) -> ScriptedResponse {
        // The error code read is answered from the element itself, never
        // from scripts, and is immune to status corruption
        if apdu == GET_ERROR_CODE_APDU {
            return ScriptedResponse {
                apdu: vec![0x00, 0x00, 0x00, 0x01, self.error_code],
                corrupt_serves: 0,
            };
        }

        let mut response = match self.responses.pop_front() {
            Some(canned) => canned,
            // OpenApplication and anything unscripted succeed with an
            // empty body
            None => ScriptedResponse {
                apdu: vec![0x00, 0x00, 0x00, 0x00],
                corrupt_serves: 0,
            },
        };

        if let Some(status) = self.force_status.take() {
            if !response.apdu.is_empty() {
                response.apdu[0] = status;
            }
        }
        response
    }

    fn send_response(&mut self, response: ScriptedResponse) {
        if response.apdu.is_empty() {
            return;
        }
        let mtu = self.mtu();
        let total = response.apdu.len().div_ceil(mtu);
        let ack = self.last_delivered.unwrap_or(0);
        let apdu = response.apdu.clone();
        for (index, fragment) in apdu.chunks(mtu).enumerate() {
            let packet = wrap_fragment(Chain::for_fragment(index, total), fragment);
            let seq = self.tx_seq;
            self.tx_seq = (self.tx_seq + 1) & 3;
            // The corruption budget rides on the first frame; the host
            // never gets past it while the budget lasts
            let corrupt = if index == 0 { response.corrupt_serves } else { 0 };
            self.push_frame_corrupt(Frame::data(seq, ack, packet), corrupt);
        }
    }

    fn serve_read(&mut self, buf: &mut [u8]) {
        let data = match self.selected {
            Some(REG_I2C_STATE) => {
                let len = self.outbox.front().map(|f| f.bytes.len()).unwrap_or(0) as u16;
                let flags = if len > 0 { 0x40 } else { 0x00 };
                let mut state = vec![flags, 0x00];
                state.extend_from_slice(&len.to_be_bytes());
                state
            }
            Some(REG_DATA_REG_LEN) => self.data_reg_len.to_be_bytes().to_vec(),
            Some(REG_DATA) => match self.outbox.front_mut() {
                Some(front) if front.corrupt_serves > 0 => {
                    // Serve a corrupted copy without consuming the frame so
                    // a later retry can still reach the intact bytes
                    front.corrupt_serves -= 1;
                    let mut bad = front.bytes.clone();
                    let last = bad.len() - 1;
                    bad[last] ^= 0x5A;
                    bad
                }
                Some(_) => self.outbox.pop_front().unwrap().bytes,
                None => Vec::new(),
            },
            _ => Vec::new(),
        };

        for (dst, src) in buf
            .iter_mut()
            .zip(data.iter().chain(std::iter::repeat(&0)))
        {
            *dst = *src;
        }
    }

    fn serve_write(&mut self, bytes: &[u8]) {
        if bytes.len() == 1 {
            self.selected = Some(bytes[0]);
            return;
        }
        match bytes[0] {
            REG_SOFT_RESET => self.reset(),
            REG_DATA_REG_LEN => {
                if bytes.len() >= 3 {
                    self.data_reg_len = u16::from_be_bytes([bytes[1], bytes[2]]);
                }
            }
            REG_DATA => self.handle_frame(&bytes[1..]),
            _ => {}
        }
    }
}

/// Protocol-aware model of the element. Cloning shares the state, so a
/// test keeps one clone for scripting while the driver owns the other.
#[derive(Clone)]
pub struct MockElement {
    state: Arc<Mutex<ElementState>>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MockElement {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ElementState {
                data_reg_len: crate::constants::DATA_REG_LEN_DEFAULT,
                ..ElementState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().expect("mock element poisoned")
    }

    /// Queue a response APDU (header included) for the next command that
    /// has no built-in answer.
    pub fn push_response(&self, apdu: Vec<u8>) {
        self.lock().responses.push_back(ScriptedResponse {
            apdu,
            corrupt_serves: 0,
        });
    }

    /// Queue a response whose first frame is served with a corrupted FCS
    /// the given number of times before the intact copy. Serving it four
    /// times exhausts the host's receive retry budget and forces a
    /// transport fault for exactly that exchange.
    pub fn push_response_corrupt(&self, apdu: Vec<u8>, corrupt_serves: usize) {
        self.lock().responses.push_back(ScriptedResponse {
            apdu,
            corrupt_serves,
        });
    }

    /// Error code served through the error code object.
    pub fn set_error_code(&self, code: u8) {
        self.lock().error_code = code;
    }

    /// Overwrite the status byte of the next scripted response.
    pub fn force_status(&self, status: u8) {
        self.lock().force_status = Some(status);
    }

    /// NACK every bus transaction from now on.
    pub fn nack_everything(&self, on: bool) {
        self.lock().nack_everything = on;
    }

    /// Window size the element advertises after the next reset.
    pub fn set_data_reg_len(&self, len: u16) {
        self.lock().data_reg_len = len;
    }

    /// Complete command APDUs received so far.
    pub fn apdus(&self) -> Vec<Vec<u8>> {
        self.lock().apdus.clone()
    }

    /// Decoded data frames the host wrote, in order. Panics on a frame
    /// that fails the FCS check, so a passing test implies every frame on
    /// the wire was intact.
    pub fn received_data_frames(&self) -> Vec<Frame> {
        self.lock()
            .frames
            .iter()
            .map(|raw| Frame::decode(raw).expect("host sent corrupt frame"))
            .filter(|f| !f.is_control())
            .collect()
    }

    /// Packet control bytes of the received data frames.
    pub fn received_chain_flags(&self) -> Vec<u8> {
        self.received_data_frames()
            .iter()
            .filter_map(|f| f.payload.first().copied())
            .collect()
    }
}

impl TwoWireBus for MockElement {
    fn write(&mut self, _addr: BusAddress, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.nack_everything {
            return Err(Error::Nack);
        }
        state.serve_write(bytes);
        Ok(())
    }

    fn read(&mut self, _addr: BusAddress, buf: &mut [u8]) -> Result<()> {
        let mut state = self.lock();
        if state.nack_everything {
            return Err(Error::Nack);
        }
        state.serve_read(buf);
        Ok(())
    }
}

/// Open a driver instance against a fresh mock element with test-friendly
/// timings. Returns the instance and the scripting handle.
pub fn open_mock_device() -> (Optiga, MockElement) {
    let element = MockElement::new();
    let device = Optiga::open(Box::new(element.clone()), Config::fast())
        .expect("mock element failed to open");
    (device, element)
}
