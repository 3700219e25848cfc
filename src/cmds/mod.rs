// optiga-rs/src/cmds/mod.rs
//! Command encoders: build APDUs for the element's command set, submit
//! them through the dispatcher and decode the responses.
//!
//! New commands get their encoder as a free function in a submodule here;
//! [`Client`] wires encoders to the dispatcher.

pub mod data;
pub mod hash;
pub mod keys;
pub mod random;
pub mod sign;

pub use data::{encode_counter_inc, encode_get_data_object, encode_set_data_object};
pub use hash::{encode_sha256, encode_sha256_oid};
pub use keys::encode_gen_keypair;
pub use random::encode_get_random;
pub use sign::{encode_ecdsa_sign, encode_ecdsa_verify};

use crate::device::{ApduRequest, Handle, Outcome};
use crate::protocol::apdu;
use crate::{Error, Result};

/// Command codes of the element's command set. Bit 7 requests that the
/// stored error code is flushed by the command.
pub mod codes {
    pub const GET_DATA_OBJECT: u8 = 0x81;
    pub const SET_DATA_OBJECT: u8 = 0x82;
    pub const GET_RANDOM: u8 = 0x8C;
    pub const CALC_HASH: u8 = 0xB0;
    pub const CALC_SIGN: u8 = 0xB1;
    pub const VERIFY_SIGN: u8 = 0xB2;
    pub const GEN_KEYPAIR: u8 = 0xB8;
    pub const OPEN_APPLICATION: u8 = 0xF0;
}

/// High-level command client bound to one driver instance.
pub struct Client {
    handle: Handle,
}

impl Client {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Submit one APDU and return the response body after stripping and
    /// validating the response header.
    pub(crate) fn transceive(&self, tx: Vec<u8>, rx_capacity: usize) -> Result<Vec<u8>> {
        match self
            .handle
            .submit(ApduRequest::with_capacity(tx, rx_capacity))
            .wait()
        {
            Outcome::Success(rx) => {
                let (_, body) = apdu::decode_response(&rx)?;
                Ok(body.to_vec())
            }
            Outcome::Device(code) => Err(Error::Device(code)),
            Outcome::Transport => Err(Error::Transport),
        }
    }

    /// Read `max_len` bytes from a data object, starting at `offset`.
    pub fn data_get(
        &self,
        oid: crate::types::Oid,
        offset: u16,
        max_len: u16,
    ) -> Result<Vec<u8>> {
        let tx = encode_get_data_object(oid, offset, max_len);
        self.transceive(tx, apdu::HEADER_LEN + max_len as usize)
    }

    /// Write `data` into a data object, optionally erasing it first.
    pub fn data_set(
        &self,
        oid: crate::types::Oid,
        erase: bool,
        offset: u16,
        data: &[u8],
    ) -> Result<()> {
        let tx = encode_set_data_object(oid, erase, offset, data)?;
        self.transceive(tx, 16).map(|_| ())
    }

    /// Increment a monotonic counter object by `by`.
    pub fn counter_inc(&self, oid: crate::types::Oid, by: u8) -> Result<()> {
        let tx = encode_counter_inc(oid, by);
        self.transceive(tx, 16).map(|_| ())
    }

    /// SHA-256 over caller-supplied bytes, computed on the element.
    pub fn sha256(&self, data: &[u8]) -> Result<[u8; 32]> {
        let tx = encode_sha256(data)?;
        hash::decode_digest(&self.transceive(tx, 64)?)
    }

    /// SHA-256 over a data object region.
    pub fn sha256_oid(&self, oid: crate::types::Oid, offset: u16, len: u16) -> Result<[u8; 32]> {
        let tx = encode_sha256_oid(oid, offset, len);
        hash::decode_digest(&self.transceive(tx, 64)?)
    }

    /// ECDSA sign a digest with the private key in `key_oid`. Returns the
    /// DER-encoded signature integers as produced by the element.
    pub fn ecdsa_sign(&self, key_oid: crate::types::Oid, digest: &[u8]) -> Result<Vec<u8>> {
        let tx = encode_ecdsa_sign(key_oid, digest)?;
        self.transceive(tx, 256)
    }

    /// Verify a signature against the public key certificate in
    /// `cert_oid`. A bad signature reports as a device error.
    pub fn ecdsa_verify(
        &self,
        cert_oid: crate::types::Oid,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let tx = encode_ecdsa_verify(cert_oid, digest, signature)?;
        self.transceive(tx, 16).map(|_| ())
    }

    /// Generate a key pair in `oid` and return the public part.
    pub fn gen_keypair(
        &self,
        oid: crate::types::Oid,
        algorithm: crate::types::Algorithm,
        usage: crate::types::KeyUsage,
    ) -> Result<Vec<u8>> {
        let tx = encode_gen_keypair(oid, algorithm, usage);
        let body = self.transceive(tx, 512)?;
        keys::decode_public_key(algorithm, &body)
    }

    /// `len` random bytes from the element's TRNG, 8..=256 per request.
    pub fn random(&self, len: u16) -> Result<Vec<u8>> {
        let tx = encode_get_random(len)?;
        let body = self.transceive(tx, apdu::HEADER_LEN + len as usize)?;
        if body.len() != len as usize {
            return Err(Error::InvalidLength {
                expected: len as usize,
                actual: body.len(),
            });
        }
        Ok(body)
    }
}
