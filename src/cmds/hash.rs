// optiga-rs/src/cmds/hash.rs

use crate::cmds::codes;
use crate::protocol::apdu::encode_header;
use crate::types::{Algorithm, Oid};
use crate::utils::put_be16;
use crate::{Error, Result};

/// CalcHash sequence tags. Only single-shot hashing is exposed; the
/// streaming continue/final tags stay internal to the element.
const HASH_START_FINAL: u8 = 0x01;
const HASH_OID_START_FINAL: u8 = 0x11;

pub const SHA256_DIGEST_LEN: usize = 32;

/// Encode CalcHash over caller-supplied bytes in one shot.
pub fn encode_sha256(data: &[u8]) -> Result<Vec<u8>> {
    let in_len = data
        .len()
        .checked_add(3)
        .filter(|&l| l <= 0xFFFF)
        .ok_or(Error::ApduTooLong {
            len: data.len() + 3,
        })?;

    let mut tx = Vec::with_capacity(7 + data.len());
    tx.extend_from_slice(&encode_header(
        codes::CALC_HASH,
        Algorithm::Sha256.id(),
        in_len as u16,
    ));
    tx.push(HASH_START_FINAL);
    put_be16(&mut tx, data.len() as u16);
    tx.extend_from_slice(data);
    Ok(tx)
}

/// Encode CalcHash over `len` bytes of a data object starting at `offset`.
pub fn encode_sha256_oid(oid: Oid, offset: u16, len: u16) -> Vec<u8> {
    let mut tx = Vec::with_capacity(13);
    tx.extend_from_slice(&encode_header(
        codes::CALC_HASH,
        Algorithm::Sha256.id(),
        0x09,
    ));
    tx.push(HASH_OID_START_FINAL);
    put_be16(&mut tx, 0x06);
    tx.extend_from_slice(&oid.to_be_bytes());
    put_be16(&mut tx, offset);
    put_be16(&mut tx, len);
    tx
}

/// Decode the digest TLV from a CalcHash response body.
pub fn decode_digest(body: &[u8]) -> Result<[u8; 32]> {
    if body.len() != SHA256_DIGEST_LEN + 3 {
        return Err(Error::InvalidLength {
            expected: SHA256_DIGEST_LEN + 3,
            actual: body.len(),
        });
    }
    if crate::utils::get_be16(body, 1) as usize != SHA256_DIGEST_LEN {
        return Err(Error::UnexpectedResponse("digest TLV length".into()));
    }
    let mut digest = [0u8; SHA256_DIGEST_LEN];
    digest.copy_from_slice(&body[3..]);
    Ok(digest)
}
