// optiga-rs/src/cmds/keys.rs

use crate::cmds::codes;
use crate::protocol::apdu::{encode_header, put_tlv_u16, put_tlv_u8};
use crate::types::{Algorithm, KeyUsage, Oid};
use crate::{Error, Result};

/// Encode GenKeyPair: generate a key pair in `oid` and export the public
/// part.
pub fn encode_gen_keypair(oid: Oid, algorithm: Algorithm, usage: KeyUsage) -> Vec<u8> {
    let mut tx = Vec::with_capacity(13);
    tx.extend_from_slice(&encode_header(codes::GEN_KEYPAIR, algorithm.id(), 0x09));
    put_tlv_u16(&mut tx, 0x01, oid.as_u16());
    put_tlv_u8(&mut tx, 0x02, usage.bits());
    tx
}

/// Extract the raw public key from a GenKeyPair response body.
///
/// ECC public keys come back as a TLV (tag 0x02) holding a DER BIT STRING
/// whose value is `0x00 0x04 || X || Y`; the fixed 7-byte prefix is
/// stripped. RSA keys are returned as the whole TLV value.
pub fn decode_public_key(algorithm: Algorithm, body: &[u8]) -> Result<Vec<u8>> {
    if body.len() < 3 || body[0] != 0x02 {
        return Err(Error::UnexpectedResponse(
            "GenKeyPair did not return a public key TLV".into(),
        ));
    }
    let tlv_len = crate::utils::get_be16(body, 1) as usize;
    let value = body
        .get(3..3 + tlv_len)
        .ok_or(Error::InvalidLength {
            expected: 3 + tlv_len,
            actual: body.len(),
        })?;

    match algorithm.public_key_len() {
        Some(raw_len) => {
            // tag + length + unused-bits byte + uncompressed-point marker
            if value.len() != raw_len + 4 {
                return Err(Error::UnexpectedResponse(
                    "unexpected public key encoding".into(),
                ));
            }
            Ok(value[4..].to_vec())
        }
        None => Ok(value.to_vec()),
    }
}
