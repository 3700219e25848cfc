// optiga-rs/src/protocol/crc.rs

/// Compute the frame check sequence: CRC-16/CCITT, polynomial 0x1021,
/// initial value 0x0000, no reflection, no final XOR, over FCTR || LEN ||
/// payload. Transmitted big-endian after the payload.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
