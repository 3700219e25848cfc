// optiga-rs/src/cmds/random.rs

use crate::cmds::codes;
use crate::protocol::apdu::encode_header;
use crate::utils::put_be16;
use crate::{Error, Result};

/// Random byte counts the element accepts per GetRandom request.
pub const RANDOM_MIN: u16 = 8;
pub const RANDOM_MAX: u16 = 256;

/// Encode GetRandom: request `len` bytes from the TRNG.
pub fn encode_get_random(len: u16) -> Result<Vec<u8>> {
    if !(RANDOM_MIN..=RANDOM_MAX).contains(&len) {
        return Err(Error::InvalidLength {
            expected: RANDOM_MAX as usize,
            actual: len as usize,
        });
    }

    let mut tx = Vec::with_capacity(6);
    tx.extend_from_slice(&encode_header(codes::GET_RANDOM, 0x00, 0x02));
    put_be16(&mut tx, len);
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_random_layout() {
        assert_eq!(
            encode_get_random(8).unwrap(),
            vec![0x8C, 0x00, 0x00, 0x02, 0x00, 0x08]
        );
        assert_eq!(
            encode_get_random(256).unwrap(),
            vec![0x8C, 0x00, 0x00, 0x02, 0x01, 0x00]
        );
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(encode_get_random(0).is_err());
        assert!(encode_get_random(7).is_err());
        assert!(encode_get_random(257).is_err());
    }
}
