// optiga-rs/src/prelude.rs

pub use crate::bus::TwoWireBus;
pub use crate::cmds::Client;
pub use crate::config::Config;
pub use crate::device::{ApduRequest, Completion, Handle, Optiga, Outcome};
pub use crate::{Algorithm, BusAddress, Error, ErrorCode, KeyUsage, Oid, Result};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, parse_hex};
