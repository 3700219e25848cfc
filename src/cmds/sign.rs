// optiga-rs/src/cmds/sign.rs

use crate::cmds::codes;
use crate::protocol::apdu::{encode_header, put_tlv, put_tlv_u16};
use crate::types::Oid;
use crate::{Error, Result};

/// Signature scheme parameter: ECDSA FIPS 186-3 without hashing.
const SCHEME_ECDSA_RAW: u8 = 0x11;

/// Encode CalcSign: sign `digest` with the private key in `key_oid`.
pub fn encode_ecdsa_sign(key_oid: Oid, digest: &[u8]) -> Result<Vec<u8>> {
    let in_len = digest
        .len()
        .checked_add(8)
        .filter(|&l| l <= 0xFFFF)
        .ok_or(Error::ApduTooLong {
            len: digest.len() + 8,
        })?;

    let mut tx = Vec::with_capacity(4 + in_len);
    tx.extend_from_slice(&encode_header(
        codes::CALC_SIGN,
        SCHEME_ECDSA_RAW,
        in_len as u16,
    ));
    put_tlv(&mut tx, 0x01, digest);
    put_tlv_u16(&mut tx, 0x03, key_oid.as_u16());
    Ok(tx)
}

/// Encode VerifySign: check `signature` over `digest` against the public
/// key certificate in `cert_oid`.
pub fn encode_ecdsa_verify(cert_oid: Oid, digest: &[u8], signature: &[u8]) -> Result<Vec<u8>> {
    let in_len = digest
        .len()
        .checked_add(signature.len())
        .and_then(|l| l.checked_add(11))
        .filter(|&l| l <= 0xFFFF)
        .ok_or(Error::ApduTooLong {
            len: digest.len() + signature.len() + 11,
        })?;

    let mut tx = Vec::with_capacity(4 + in_len);
    tx.extend_from_slice(&encode_header(
        codes::VERIFY_SIGN,
        SCHEME_ECDSA_RAW,
        in_len as u16,
    ));
    put_tlv(&mut tx, 0x01, digest);
    put_tlv(&mut tx, 0x02, signature);
    put_tlv_u16(&mut tx, 0x04, cert_oid.as_u16());
    Ok(tx)
}
