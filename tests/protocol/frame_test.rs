use optiga::protocol::{ControlKind, Frame, FrameKind};
use optiga::Error;

#[test]
fn data_frame_wire_layout() {
    let raw = Frame::data(1, 2, vec![0xC0, 0xAA]).encode().unwrap();
    // FCTR: ack 2 in bits 4..3, seq 1 in bits 1..0
    assert_eq!(raw[0], 0x11);
    // LEN big-endian
    assert_eq!(&raw[1..3], &[0x00, 0x02]);
    // payload, then 2 FCS bytes
    assert_eq!(&raw[3..5], &[0xC0, 0xAA]);
    assert_eq!(raw.len(), 7);
}

#[test]
fn fcs_transmitted_big_endian() {
    let raw = Frame::data(0, 0, vec![0x55]).encode().unwrap();
    let fcs = optiga::protocol::crc16_ccitt(&raw[..4]);
    assert_eq!(raw[4], (fcs >> 8) as u8);
    assert_eq!(raw[5], (fcs & 0xFF) as u8);
}

#[test]
fn every_single_bit_corruption_is_detected() {
    let raw = Frame::data(3, 1, vec![0x01, 0x02, 0x03, 0x04]).encode().unwrap();
    for byte in 0..raw.len() {
        for bit in 0..8 {
            let mut corrupt = raw.clone();
            corrupt[byte] ^= 1 << bit;
            let result = Frame::decode(&corrupt);
            assert!(
                result.is_err(),
                "corruption at byte {} bit {} went unnoticed",
                byte,
                bit
            );
        }
    }
}

#[test]
fn control_frames_round_trip() {
    for frame in [Frame::bare_ack(2), Frame::sync(), Frame::nack(1)] {
        let raw = frame.encode().unwrap();
        let decoded = Frame::decode(&raw).unwrap();
        assert_eq!(decoded, frame);
        assert!(decoded.is_control());
    }
}

#[test]
fn length_field_is_authoritative() {
    // A frame whose LEN disagrees with the byte count is rejected before
    // the FCS is even considered
    let mut raw = Frame::data(0, 0, vec![0x99, 0x98]).encode().unwrap();
    raw[2] = 0x01;
    assert!(matches!(
        Frame::decode(&raw),
        Err(Error::InvalidLength { .. })
    ));
}

#[test]
fn sync_resets_are_control_kind() {
    let decoded = Frame::decode(&Frame::sync().encode().unwrap()).unwrap();
    assert_eq!(decoded.kind, FrameKind::Control(ControlKind::Sync));
}
