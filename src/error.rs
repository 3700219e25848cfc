// optiga-rs/src/error.rs

use thiserror::Error;

use crate::types::ErrorCode;

/// Common error type for all layers of the driver.
///
/// Lower layers return these directly; the dispatcher worker collapses
/// anything transport-shaped into a reset-and-drain cycle and reports
/// `Outcome::Transport` to waiting callers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("bus transaction not acknowledged")]
    Nack,

    #[error("bus error: {0}")]
    Bus(String),

    #[error("operation timed out")]
    Timeout,

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("frame check sequence mismatch: expected {expected:#06x}, got {actual:#06x}")]
    FcsMismatch { expected: u16, actual: u16 },

    #[error("frame format error: {0}")]
    FrameFormat(String),

    #[error("sequence desync: expected {expected}, got {actual}")]
    SequenceDesync { expected: u8, actual: u8 },

    #[error("packet chain violation: pctr {pctr:#04x}")]
    ChainViolation { pctr: u8 },

    #[error("receive buffer overflow: capacity {capacity}, needed {needed}")]
    BufferOverflow { capacity: usize, needed: usize },

    #[error("DATA_REG_LEN {value:#06x} outside allowed range")]
    DataRegLen { value: u16 },

    #[error("apdu too long: {len} bytes")]
    ApduTooLong { len: usize },

    #[error("incomplete apdu: header announces {announced} body bytes, got {actual}")]
    IncompleteApdu { announced: usize, actual: usize },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("device error: {0}")]
    Device(ErrorCode),

    #[error("transport failure, request was not completed")]
    Transport,
}

impl Error {
    /// True for errors that mean the element (not the host side) rejected
    /// a command; everything else escalates to reset-and-drain.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Error::Device(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
