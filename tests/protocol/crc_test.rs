use optiga::protocol::crc16_ccitt;

#[test]
fn crc_check_value() {
    // CRC-16/XMODEM reference check value
    assert_eq!(crc16_ccitt(b"123456789"), 0x31C3);
}

#[test]
fn crc_covers_header_and_payload() {
    // FCTR || LEN || payload for a one-byte data frame
    let covered = [0x00u8, 0x00, 0x01, 0xAA];
    let fcs = crc16_ccitt(&covered);
    // Extending the covered region changes the FCS
    let extended = [0x00u8, 0x00, 0x01, 0xAA, 0x00];
    assert_ne!(crc16_ccitt(&extended), fcs);
}

#[test]
fn crc_of_empty_input_is_seed() {
    assert_eq!(crc16_ccitt(&[]), 0x0000);
}
