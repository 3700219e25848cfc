// optiga-rs/src/cmds/data.rs

use crate::cmds::codes;
use crate::protocol::apdu::encode_header;
use crate::types::Oid;
use crate::utils::put_be16;
use crate::{Error, Result};

/// SetDataObject parameter values.
const SET_DATA_WRITE: u8 = 0x00;
/// Count mode: the payload byte is added to a monotonic counter object.
const SET_DATA_COUNT: u8 = 0x02;
const SET_DATA_ERASE_WRITE: u8 = 0x40;

/// Encode GetDataObject: read `max_len` bytes at `offset`.
pub fn encode_get_data_object(oid: Oid, offset: u16, max_len: u16) -> Vec<u8> {
    let mut tx = Vec::with_capacity(10);
    tx.extend_from_slice(&encode_header(codes::GET_DATA_OBJECT, 0x00, 0x06));
    tx.extend_from_slice(&oid.to_be_bytes());
    put_be16(&mut tx, offset);
    put_be16(&mut tx, max_len);
    tx
}

/// Encode SetDataObject: write `data` at `offset`, optionally erasing the
/// object first.
pub fn encode_set_data_object(oid: Oid, erase: bool, offset: u16, data: &[u8]) -> Result<Vec<u8>> {
    let in_len = data
        .len()
        .checked_add(4)
        .filter(|&l| l <= 0xFFFF)
        .ok_or(Error::ApduTooLong {
            len: data.len() + 4,
        })?;

    let param = if erase {
        SET_DATA_ERASE_WRITE
    } else {
        SET_DATA_WRITE
    };

    let mut tx = Vec::with_capacity(8 + data.len());
    tx.extend_from_slice(&encode_header(codes::SET_DATA_OBJECT, param, in_len as u16));
    tx.extend_from_slice(&oid.to_be_bytes());
    put_be16(&mut tx, offset);
    tx.extend_from_slice(data);
    Ok(tx)
}

/// Encode a monotonic counter increment: SetDataObject in count mode with
/// a one-byte increment.
pub fn encode_counter_inc(oid: Oid, by: u8) -> Vec<u8> {
    let mut tx = Vec::with_capacity(9);
    tx.extend_from_slice(&encode_header(codes::SET_DATA_OBJECT, SET_DATA_COUNT, 0x05));
    tx.extend_from_slice(&oid.to_be_bytes());
    put_be16(&mut tx, 0);
    tx.push(by);
    tx
}
