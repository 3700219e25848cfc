// optiga-rs/src/constants.rs
//! Protocol constants shared across the crate.

/// DATA register: variable-length frame FIFO (read/write).
pub const REG_DATA: u8 = 0x80;

/// DATA_REG_LEN register: u16 big-endian maximum frame length.
pub const REG_DATA_REG_LEN: u8 = 0x81;

/// I2C_STATE register: 4 bytes, flags in byte 0, read length in bytes 2..4.
pub const REG_I2C_STATE: u8 = 0x82;

/// SOFT_RESET register: writing any value resets the element.
pub const REG_SOFT_RESET: u8 = 0x88;

/// I2C_STATE flag: element busy executing a command.
pub const I2C_STATE_FLAG_BUSY: u8 = 0x80;

/// I2C_STATE flag: a response frame is ready to be read.
pub const I2C_STATE_FLAG_RESP_READY: u8 = 0x40;

/// Default 7-bit bus address of the element.
pub const DEFAULT_BUS_ADDRESS: u8 = 0x30;

/// Register transaction attempts before a NACK becomes an I/O failure.
pub const PHY_ACK_TRIES: u32 = 5;

/// Pause between register transaction attempts in milliseconds.
pub const PHY_ACK_RETRY_MS: u64 = 10;

/// Default status poll attempts while waiting for a response frame.
pub const PHY_POLL_TRIES: u32 = 10;

/// Default pause between status polls in milliseconds.
pub const PHY_POLL_INTERVAL_MS: u64 = 10;

/// Guard pause between register select and register read, in microseconds.
pub const PHY_GUARD_TIME_US: u64 = 50;

/// Smallest DATA_REG_LEN the element may advertise.
pub const DATA_REG_LEN_MIN: u16 = 0x10;

/// Host-side DATA_REG_LEN ceiling negotiated down to during init.
pub const DATA_REG_LEN_DEFAULT: u16 = 0x40;

/// Frame header: FCTR (1) + LEN (2).
pub const FRAME_HEADER_LEN: usize = 3;

/// Frame trailer: FCS (2).
pub const FRAME_TRAILER_LEN: usize = 2;

/// Total frame overhead around the payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + FRAME_TRAILER_LEN;

/// Wire length of a bare acknowledgement control frame (empty payload).
pub const BARE_ACK_FRAME_LEN: usize = FRAME_OVERHEAD;

/// Packet header: PCTR (1).
pub const PACKET_HEADER_LEN: usize = 1;

/// Receive retries (by retransmission) before a transport fault.
pub const DL_SEND_RETRIES: u32 = 3;

/// Default data-link receive deadline in milliseconds.
pub const DL_RECV_DEADLINE_MS: u64 = 100;

/// Consecutive failed resets before the core goes dead.
pub const MAX_RESETS: u32 = 3;

/// Largest APDU the wire format can carry.
pub const MAX_APDU_LEN: usize = 0xFFFF;

/// Outcome code reported for host-side transport and internal failures.
pub const OUTCOME_TRANSPORT: i32 = -5;

/// OpenApplication command APDU, sent after every stack reset.
pub const OPEN_APPLICATION_APDU: [u8; 20] = [
    0xF0, // command code
    0x00, // clean application context
    0x00, 0x10, // 16 bytes parameter
    // unique application identifier
    0xD2, 0x76, 0x00, 0x00, 0x04, 0x47, 0x65, 0x6E, 0x41, 0x75, 0x74, 0x68, 0x41, 0x70, 0x70,
    0x6C,
];

/// GetDataObject APDU reading the one-byte error code object.
///
/// The command code has bit 7 clear so the read does not flush the stored
/// error code on the element.
pub const GET_ERROR_CODE_APDU: [u8; 10] =
    [0x01, 0x00, 0x00, 0x06, 0xF1, 0xC2, 0x00, 0x00, 0x00, 0x01];
