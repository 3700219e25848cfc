use optiga::cmds::Client;
use optiga::config::Config;
use optiga::device::{ApduRequest, Outcome};
use optiga::test_support::{open_mock_device, MockElement};
use optiga::types::Oid;
use optiga::Optiga;

use crate::common::fixtures;

#[test]
fn fragmented_sign_request_chains_on_the_wire() {
    let (device, element) = open_mock_device();
    element.push_response(fixtures::success_response(&fixtures::asn1_signature()));

    // 192-byte digest: 204 byte APDU against a 58 byte MTU
    let client = Client::new(device.handle());
    let signature = client.ecdsa_sign(Oid::new(0xE0F0), &[0xD9; 192]).unwrap();
    assert_eq!(signature, fixtures::asn1_signature());

    // Wire order: OpenApplication as ONLY, then FIRST MIDDLE MIDDLE LAST.
    // received_chain_flags() decodes every frame, so each one also passed
    // the FCS check.
    let flags = element.received_chain_flags();
    assert_eq!(flags, vec![0xC0, 0x80, 0x00, 0x00, 0x40]);
    device.shutdown();
}

#[test]
fn fragment_payload_sums_to_apdu_length() {
    let (device, element) = open_mock_device();
    element.push_response(fixtures::success_response(&[]));

    let apdu = {
        let mut tx = vec![0x82, 0x00];
        tx.extend_from_slice(&200u16.to_be_bytes());
        tx.extend(std::iter::repeat(0xEE).take(200));
        tx
    };
    let sent_len = apdu.len();
    assert!(device.submit(ApduRequest::new(apdu)).wait().is_success());

    let frames = element.received_data_frames();
    // Skip the OpenApplication frame; sum the APDU fragments (payload
    // minus the packet control byte)
    let total: usize = frames[1..]
        .iter()
        .map(|f| f.payload.len() - 1)
        .sum();
    assert_eq!(total, sent_len);
    device.shutdown();
}

#[test]
fn minimum_window_still_carries_large_apdus() {
    let element = MockElement::new();
    element.set_data_reg_len(0x10);
    let device = Optiga::open(Box::new(element.clone()), Config::fast()).unwrap();

    // MTU is 0x10 - 6 = 10 bytes; even OpenApplication chained. Now push
    // a 100-byte body both ways.
    let body = vec![0x3C; 100];
    element.push_response(fixtures::success_response(&body));

    let mut tx = vec![0x82, 0x00];
    tx.extend_from_slice(&100u16.to_be_bytes());
    tx.extend_from_slice(&body);

    match device.submit(ApduRequest::new(tx)).wait() {
        Outcome::Success(rx) => assert_eq!(&rx[4..], &body[..]),
        other => panic!("expected success, got code {}", other.code()),
    }
    device.shutdown();
}

#[test]
fn responses_larger_than_one_frame_reassemble() {
    let (device, element) = open_mock_device();
    let body: Vec<u8> = (0..=255u8).collect();
    element.push_response(fixtures::success_response(&body));

    match device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait()
    {
        Outcome::Success(rx) => {
            assert_eq!(rx.len(), 4 + 256);
            assert_eq!(&rx[4..], &body[..]);
        }
        other => panic!("expected success, got code {}", other.code()),
    }
    device.shutdown();
}

#[test]
fn rx_capacity_overflow_is_a_transport_failure() {
    let (device, element) = open_mock_device();
    element.push_response(fixtures::success_response(&[0xAB; 64]));

    let outcome = device
        .submit(ApduRequest::with_capacity(fixtures::chip_id_apdu(), 16))
        .wait();
    assert_eq!(outcome, Outcome::Transport);

    // The overflow escalated like any transport fault: reset and recover
    assert_eq!(device.resets(), 1);
    element.push_response(fixtures::chip_id_response());
    assert!(device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait()
        .is_success());
    device.shutdown();
}
