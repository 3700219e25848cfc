// optiga-rs/src/protocol/frame.rs

use crate::constants::{FRAME_HEADER_LEN, FRAME_OVERHEAD};
use crate::protocol::crc::crc16_ccitt;
use crate::utils::get_be16;
use crate::{Error, Result};

/// Frame control byte layout:
/// bit 7 frame type (0 = DATA, 1 = CONTROL), bits 6..5 reserved,
/// bits 4..3 acknowledgement number, bit 2 reserved, bits 1..0 sequence
/// number. Reserved bits are transmitted zero.
const FCTR_TYPE_CONTROL: u8 = 0x80;
const FCTR_ACK_MASK: u8 = 0x18;
const FCTR_ACK_SHIFT: u8 = 3;
const FCTR_SEQ_MASK: u8 = 0x03;

/// Control frame sub-type bytes, carried as the one-byte payload of a
/// CONTROL frame. A CONTROL frame with an empty payload is a bare
/// acknowledgement.
const SUBTYPE_SYNC: u8 = 0x01;
const SUBTYPE_NACK: u8 = 0x02;

/// Sub-kind of a CONTROL frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Empty payload; only the acknowledgement number in the FCTR matters.
    Ack,
    /// Request to reset sequence counters on both sides.
    Sync,
    /// The peer rejected the last frame and wants a retransmission.
    Nack,
}

/// Frame type field of the FCTR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Control(ControlKind),
}

/// One data-link frame: `| FCTR (1) | LEN (2 BE) | payload | FCS (2 BE) |`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    /// Sequence number of this frame, modulo the window (0..=3).
    pub seq: u8,
    /// Sequence number of the last peer frame being acknowledged.
    pub ack: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn data(seq: u8, ack: u8, payload: Vec<u8>) -> Self {
        Self {
            kind: FrameKind::Data,
            seq,
            ack,
            payload,
        }
    }

    pub fn bare_ack(ack: u8) -> Self {
        Self {
            kind: FrameKind::Control(ControlKind::Ack),
            seq: 0,
            ack,
            payload: Vec::new(),
        }
    }

    pub fn sync() -> Self {
        Self {
            kind: FrameKind::Control(ControlKind::Sync),
            seq: 0,
            ack: 0,
            payload: vec![SUBTYPE_SYNC],
        }
    }

    pub fn nack(ack: u8) -> Self {
        Self {
            kind: FrameKind::Control(ControlKind::Nack),
            seq: 0,
            ack,
            payload: vec![SUBTYPE_NACK],
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self.kind, FrameKind::Control(_))
    }

    /// Encode into wire bytes, appending the FCS.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.payload.len() > 0xFFFF {
            return Err(Error::InvalidLength {
                expected: 0xFFFF,
                actual: self.payload.len(),
            });
        }
        debug_assert!(self.seq <= 3 && self.ack <= 3);

        let mut fctr = (self.ack << FCTR_ACK_SHIFT) | self.seq;
        if self.is_control() {
            fctr |= FCTR_TYPE_CONTROL;
        }

        let mut out = Vec::with_capacity(FRAME_OVERHEAD + self.payload.len());
        out.push(fctr);
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.payload);
        let fcs = crc16_ccitt(&out);
        out.extend_from_slice(&fcs.to_be_bytes());
        Ok(out)
    }

    /// Decode wire bytes, verifying LEN and the FCS.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < FRAME_OVERHEAD {
            return Err(Error::InvalidLength {
                expected: FRAME_OVERHEAD,
                actual: raw.len(),
            });
        }

        let len = get_be16(raw, 1) as usize;
        if raw.len() != FRAME_OVERHEAD + len {
            return Err(Error::InvalidLength {
                expected: FRAME_OVERHEAD + len,
                actual: raw.len(),
            });
        }

        let fcs_offset = FRAME_HEADER_LEN + len;
        let actual = get_be16(raw, fcs_offset);
        let expected = crc16_ccitt(&raw[..fcs_offset]);
        if actual != expected {
            return Err(Error::FcsMismatch { expected, actual });
        }

        let fctr = raw[0];
        let seq = fctr & FCTR_SEQ_MASK;
        let ack = (fctr & FCTR_ACK_MASK) >> FCTR_ACK_SHIFT;
        let payload = raw[FRAME_HEADER_LEN..fcs_offset].to_vec();

        let kind = if fctr & FCTR_TYPE_CONTROL != 0 {
            match payload.as_slice() {
                [] => FrameKind::Control(ControlKind::Ack),
                [SUBTYPE_SYNC] => FrameKind::Control(ControlKind::Sync),
                [SUBTYPE_NACK] => FrameKind::Control(ControlKind::Nack),
                _ => {
                    return Err(Error::FrameFormat(format!(
                        "invalid control frame payload ({} bytes)",
                        payload.len()
                    )))
                }
            }
        } else {
            FrameKind::Data
        };

        Ok(Self {
            kind,
            seq,
            ack,
            payload,
        })
    }
}
