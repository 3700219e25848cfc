// fixtures.rs - commonly used APDUs and scripted responses

#![allow(dead_code)]

/// GetDataObject for the coprocessor UID, short form: OID only.
pub fn chip_id_apdu() -> Vec<u8> {
    vec![0x81, 0x00, 0x00, 0x02, 0xE0, 0xC2]
}

/// Scripted chip identification response: success header announcing 27
/// body bytes.
pub fn chip_id_response() -> Vec<u8> {
    let mut rx = vec![0x00, 0x00, 0x00, 0x1B];
    rx.extend((0..0x1B).map(|i| 0xC0 + (i % 16) as u8));
    rx
}

/// A DER-shaped ECDSA signature body of two 32-byte integers.
pub fn asn1_signature() -> Vec<u8> {
    let mut sig = vec![0x02, 0x20];
    sig.extend_from_slice(&[0x11; 32]);
    sig.push(0x02);
    sig.push(0x20);
    sig.extend_from_slice(&[0x22; 32]);
    sig
}

/// Success response carrying `body`.
pub fn success_response(body: &[u8]) -> Vec<u8> {
    let mut rx = vec![0x00, 0x00];
    rx.extend_from_slice(&(body.len() as u16).to_be_bytes());
    rx.extend_from_slice(body);
    rx
}
