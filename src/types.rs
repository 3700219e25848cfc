// optiga-rs/src/types.rs

use std::convert::TryFrom;
use std::fmt;

use crate::Error;

/// OID - Newtype Pattern (two-byte identifier of an on-chip data object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Oid(u16);

impl Oid {
    /// Error code data object, readable without flushing via GetDataObject.
    pub const ERROR_CODE: Self = Self(0xF1C2);
    /// Coprocessor UID / chip identification object.
    pub const COPROCESSOR_UID: Self = Self(0xE0C2);
    /// First Infineon-provisioned ECC key slot.
    pub const ECC_KEY_1: Self = Self(0xE0F0);

    pub const fn new(oid: u16) -> Self {
        Self(oid)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// 7-bit bus address of the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAddress(u8);

impl BusAddress {
    pub const fn new(addr: u8) -> Self {
        Self(addr)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl Default for BusAddress {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_BUS_ADDRESS)
    }
}

/// Command error code reported by the element in the error code object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(u8);

impl ErrorCode {
    pub const INVALID_OID: Self = Self(0x01);
    pub const INVALID_PARAMETER: Self = Self(0x03);
    pub const INVALID_LENGTH: Self = Self(0x04);
    pub const INVALID_IN_DATA: Self = Self(0x05);
    pub const INTERNAL_PROCESS_ERROR: Self = Self(0x06);
    pub const ACCESS_CONDITIONS: Self = Self(0x07);
    pub const DATA_OBJECT_BOUNDARY: Self = Self(0x08);
    pub const METADATA_TRUNCATED: Self = Self(0x09);
    pub const INVALID_COMMAND: Self = Self(0x0A);
    pub const OUT_OF_SEQUENCE: Self = Self(0x0B);
    pub const COMMAND_NOT_AVAILABLE: Self = Self(0x0C);
    pub const INSUFFICIENT_MEMORY: Self = Self(0x0D);
    pub const COUNTER_LIMIT_EXCEEDED: Self = Self(0x0E);
    pub const SIGNATURE_VERIFICATION_FAILURE: Self = Self(0x2C);

    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Human-readable name for well-known codes.
    pub fn name(&self) -> Option<&'static str> {
        Some(match self.0 {
            0x01 => "invalid oid",
            0x03 => "invalid parameter field",
            0x04 => "invalid length field",
            0x05 => "invalid parameter in data field",
            0x06 => "internal process error",
            0x07 => "access conditions not satisfied",
            0x08 => "data object boundary exceeded",
            0x09 => "metadata truncation error",
            0x0A => "invalid command field",
            0x0B => "command out of sequence",
            0x0C => "command not available",
            0x0D => "insufficient memory",
            0x0E => "counter threshold limit exceeded",
            0x2C => "signature verification failure",
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{:#04x} ({})", self.0, name),
            None => write!(f, "{:#04x}", self.0),
        }
    }
}

/// Key and hash algorithm identifiers used in APDU parameter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Algorithm {
    NistP256 = 0x03,
    NistP384 = 0x04,
    Rsa1024 = 0x41,
    Rsa2048 = 0x42,
    Sha256 = 0xE2,
}

impl Algorithm {
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Raw public key length for ECC algorithms, if fixed.
    pub fn public_key_len(&self) -> Option<usize> {
        match self {
            Algorithm::NistP256 => Some(64),
            Algorithm::NistP384 => Some(96),
            _ => None,
        }
    }
}

/// Key usage bits for GenKeyPair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(u8);

impl KeyUsage {
    pub const AUTH: Self = Self(0x01);
    pub const ENCRYPT: Self = Self(0x02);
    pub const SIGN: Self = Self(0x10);
    pub const KEY_AGREEMENT: Self = Self(0x20);

    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for KeyUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl TryFrom<&[u8]> for Oid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != 2 {
            return Err(Error::InvalidLength {
                expected: 2,
                actual: bytes.len(),
            });
        }
        Ok(Self(u16::from_be_bytes([bytes[0], bytes[1]])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_round_trip() {
        let oid = Oid::new(0xE0C2);
        assert_eq!(oid.to_be_bytes(), [0xE0, 0xC2]);
        assert_eq!(Oid::from_be_bytes([0xE0, 0xC2]), oid);
        assert_eq!(format!("{}", oid), "0xe0c2");
    }

    #[test]
    fn oid_try_from_slice() {
        assert_eq!(Oid::try_from(&[0xF1u8, 0xC2][..]).unwrap(), Oid::ERROR_CODE);
        assert!(Oid::try_from(&[0xF1u8][..]).is_err());
    }

    #[test]
    fn error_code_names() {
        assert_eq!(
            ErrorCode::ACCESS_CONDITIONS.name(),
            Some("access conditions not satisfied")
        );
        assert_eq!(ErrorCode::new(0xEE).name(), None);
        assert!(format!("{}", ErrorCode::new(0x01)).contains("invalid oid"));
    }

    #[test]
    fn key_usage_combines() {
        let usage = KeyUsage::AUTH | KeyUsage::SIGN;
        assert_eq!(usage.bits(), 0x11);
    }

    #[test]
    fn default_bus_address() {
        assert_eq!(BusAddress::default().as_u8(), 0x30);
    }
}
