// optiga-rs/src/protocol/mod.rs
//! Wire formats shared by the transport stack: the CRC-16 frame check
//! sequence, the data-link frame, the packet chain header and the APDU
//! header. Stateless encode/decode only; the stateful layers live in
//! `phy`, `datalink` and `nettran`.

pub mod apdu;
pub mod crc;
pub mod frame;
pub mod packet;

pub use apdu::{decode_response, encode_header, ResponseHeader};
pub use crc::crc16_ccitt;
pub use frame::{ControlKind, Frame, FrameKind};
pub use packet::Chain;
