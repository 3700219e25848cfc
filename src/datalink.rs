// optiga-rs/src/datalink.rs
//! Data-link layer: reliable, in-order, single-in-flight frame delivery
//! over the register FIFO.
//!
//! Stop-and-wait with piggyback acknowledgement: sequence numbers run
//! modulo 4, exactly one data frame is outstanding per direction, and the
//! acknowledgement for the final frame of a request usually arrives
//! attached to the response data frame instead of a separate control
//! frame.

use crate::constants::{BARE_ACK_FRAME_LEN, DL_SEND_RETRIES, FRAME_OVERHEAD};
use crate::phy::Phy;
use crate::protocol::{ControlKind, Frame, FrameKind};
use crate::{Error, Result};

/// Longest control frame on the wire (one sub-type byte of payload).
const CTRL_FRAME_MAX_LEN: u16 = (BARE_ACK_FRAME_LEN + 1) as u16;

/// Control frames tolerated within one receive before giving up; a healthy
/// element sends at most one ack ahead of its response.
const CTRL_FRAME_BUDGET: u32 = 8;

pub struct DataLink {
    phy: Phy,
    /// Sequence number of the next (or in-flight) transmitted data frame.
    tx_seq: u8,
    /// Last acknowledgement number the peer sent for our frames.
    tx_acked: Option<u8>,
    /// Sequence number expected on the next delivered data frame.
    rx_expected: u8,
    /// Sequence number of the last data frame delivered upward.
    last_delivered: Option<u8>,
    /// Encoded copy of the last transmitted data frame, for retransmission.
    last_tx_frame: Option<Vec<u8>>,
}

impl DataLink {
    pub fn new(phy: Phy) -> Self {
        Self {
            phy,
            tx_seq: 0,
            tx_acked: None,
            rx_expected: 0,
            last_delivered: None,
            last_tx_frame: None,
        }
    }

    /// Initialise the physical layer, then bring both sides to sequence
    /// zero with a SYNC control frame.
    pub fn init(&mut self) -> Result<()> {
        self.phy.init()?;
        self.reset_counters();
        let sync = Frame::sync().encode()?;
        self.phy.write_data(&sync)
    }

    fn reset_counters(&mut self) {
        self.tx_seq = 0;
        self.tx_acked = None;
        self.rx_expected = 0;
        self.last_delivered = None;
        self.last_tx_frame = None;
    }

    /// Largest packet that fits one frame.
    pub fn max_packet_len(&self) -> usize {
        self.phy.data_reg_len() as usize - FRAME_OVERHEAD
    }

    fn ack_value(&self) -> u8 {
        self.last_delivered.unwrap_or(0)
    }

    /// Record the acknowledgement field of a received frame. An
    /// acknowledgement that matches neither the in-flight frame nor the
    /// previous one means both sides disagree; emit a SYNC and fail.
    fn note_ack(&mut self, frame: &Frame) -> Result<()> {
        let ack = frame.ack;
        if ack == self.tx_seq {
            self.tx_acked = Some(ack);
            self.tx_seq = (self.tx_seq + 1) & 3;
            Ok(())
        } else if self.tx_acked == Some(ack) {
            // Peer repeated its last acknowledgement
            Ok(())
        } else {
            let expected = self.tx_seq;
            self.resync()?;
            Err(Error::SequenceDesync {
                expected,
                actual: ack,
            })
        }
    }

    fn retransmit(&mut self) -> Result<()> {
        if let Some(frame) = self.last_tx_frame.clone() {
            self.phy.write_data(&frame)?;
        }
        Ok(())
    }

    fn send_bare_ack(&mut self) -> Result<()> {
        let ack = Frame::bare_ack(self.ack_value()).encode()?;
        self.phy.write_data(&ack)
    }

    /// Emit a SYNC frame and reset the sequence state.
    fn resync(&mut self) -> Result<()> {
        let sync = Frame::sync().encode()?;
        self.reset_counters();
        self.phy.write_data(&sync)
    }

    /// Send one packet as a data frame and opportunistically consume an
    /// acknowledgement the element may already have posted. The
    /// acknowledgement for the last frame of a request arrives piggybacked
    /// on the response instead.
    pub fn send(&mut self, packet: &[u8]) -> Result<()> {
        let max = self.max_packet_len();
        if packet.len() > max {
            return Err(Error::InvalidLength {
                expected: max,
                actual: packet.len(),
            });
        }

        let frame = Frame::data(self.tx_seq, self.ack_value(), packet.to_vec());
        let raw = frame.encode()?;
        self.last_tx_frame = Some(raw.clone());
        self.phy.write_data(&raw)?;

        let available = self.phy.available()?;
        if available >= BARE_ACK_FRAME_LEN as u16 && available <= CTRL_FRAME_MAX_LEN {
            let raw = self.phy.read_data()?;
            let frame = Frame::decode(&raw)?;
            match frame.kind {
                FrameKind::Control(ControlKind::Nack) => {
                    // The frame never arrived intact; its ack field is
                    // meaningless
                    self.retransmit()?;
                }
                FrameKind::Control(ControlKind::Ack) => {
                    self.note_ack(&frame)?;
                }
                FrameKind::Control(ControlKind::Sync) | FrameKind::Data => {
                    return Err(Error::FrameFormat(
                        "unexpected frame while expecting acknowledgement".into(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Receive one data frame payload. Control frames are consumed along
    /// the way; timeouts and integrity failures trigger retransmission of
    /// the last data frame before failing upward.
    pub fn recv(&mut self) -> Result<Vec<u8>> {
        let mut failures = 0u32;
        let mut ctrl_frames = 0u32;

        loop {
            let raw = match self.phy.read_data() {
                Ok(raw) => raw,
                Err(e @ Error::Timeout) => {
                    self.note_failure(&mut failures, e)?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let frame = match Frame::decode(&raw) {
                Ok(frame) => frame,
                Err(
                    e @ (Error::FcsMismatch { .. }
                    | Error::InvalidLength { .. }
                    | Error::FrameFormat(_)),
                ) => {
                    self.note_failure(&mut failures, e)?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let FrameKind::Control(ControlKind::Sync) = frame.kind {
                // The element demands a resynchronisation mid-exchange;
                // the request in flight cannot complete.
                let expected = self.rx_expected;
                self.resync()?;
                return Err(Error::SequenceDesync {
                    expected,
                    actual: frame.seq,
                });
            }

            match frame.kind {
                FrameKind::Control(ControlKind::Ack) => {
                    self.note_ack(&frame)?;
                    ctrl_frames += 1;
                    if ctrl_frames > CTRL_FRAME_BUDGET {
                        return Err(Error::FrameFormat(
                            "control frame flood while waiting for data".into(),
                        ));
                    }
                }
                FrameKind::Control(ControlKind::Nack) => {
                    self.note_failure(
                        &mut failures,
                        Error::FrameFormat("element rejected the last frame".into()),
                    )?;
                }
                FrameKind::Control(ControlKind::Sync) => unreachable!(),
                FrameKind::Data => {
                    self.note_ack(&frame)?;
                    if frame.seq == self.rx_expected {
                        self.last_delivered = Some(frame.seq);
                        self.rx_expected = (frame.seq + 1) & 3;
                        self.send_bare_ack()?;
                        return Ok(frame.payload);
                    } else if self.last_delivered == Some(frame.seq) {
                        // Retransmission of a frame we already delivered;
                        // our acknowledgement was lost
                        self.send_bare_ack()?;
                    } else {
                        let expected = self.rx_expected;
                        self.resync()?;
                        return Err(Error::SequenceDesync {
                            expected,
                            actual: frame.seq,
                        });
                    }
                }
            }
        }
    }

    /// Count a receive failure and retransmit the in-flight frame to
    /// provoke the element into resending its side.
    fn note_failure(&mut self, failures: &mut u32, cause: Error) -> Result<()> {
        *failures += 1;
        if *failures > DL_SEND_RETRIES {
            return Err(cause);
        }
        self.retransmit()
    }
}
