use optiga::cmds::{
    encode_ecdsa_sign, encode_gen_keypair, encode_get_data_object, encode_get_random,
    encode_sha256,
};
use optiga::protocol::apdu::decode_response;
use optiga::types::{Algorithm, KeyUsage, Oid};

#[test]
fn encoders_announce_exact_body_length() {
    let apdus = vec![
        encode_get_data_object(Oid::new(0xE0C2), 0, 27),
        encode_get_random(32).unwrap(),
        encode_sha256(&[0xAB; 100]).unwrap(),
        encode_ecdsa_sign(Oid::new(0xE0F0), &[0x11; 32]).unwrap(),
        encode_gen_keypair(Oid::new(0xE0F1), Algorithm::NistP256, KeyUsage::SIGN),
    ];

    for apdu in apdus {
        let announced = u16::from_be_bytes([apdu[2], apdu[3]]) as usize;
        assert_eq!(apdu.len(), 4 + announced, "apdu {:02x?}", &apdu[..4]);
    }
}

#[test]
fn response_length_rule() {
    // For any well-formed response, be16(rx[2..4]) == len(rx) - 4
    let rx = [0x00, 0x00, 0x00, 0x03, 0x01, 0x02, 0x03];
    let (header, body) = decode_response(&rx).unwrap();
    assert_eq!(header.out_len as usize, rx.len() - 4);
    assert_eq!(body.len(), 3);
}

#[test]
fn open_application_constant_is_the_documented_bytes() {
    let apdu = optiga::constants::OPEN_APPLICATION_APDU;
    assert_eq!(apdu.len(), 20);
    assert_eq!(&apdu[..4], &[0xF0, 0x00, 0x00, 0x10]);
    assert_eq!(&apdu[4..9], &[0xD2, 0x76, 0x00, 0x00, 0x04]);
    // "GenAuthAppl"
    assert_eq!(&apdu[9..], b"GenAuthAppl");
}

#[test]
fn get_error_code_constant_targets_the_error_object() {
    let apdu = optiga::constants::GET_ERROR_CODE_APDU;
    assert_eq!(
        apdu,
        [0x01, 0x00, 0x00, 0x06, 0xF1, 0xC2, 0x00, 0x00, 0x00, 0x01]
    );
}
