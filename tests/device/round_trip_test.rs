use std::thread;

use optiga::cmds::Client;
use optiga::device::{ApduRequest, Outcome};
use optiga::test_support::open_mock_device;
use optiga::types::Oid;

use crate::common::fixtures;

#[test]
fn chip_id_round_trip() {
    let (device, element) = open_mock_device();
    element.push_response(fixtures::chip_id_response());

    let outcome = device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait();

    assert_eq!(outcome.code(), 0);
    match outcome {
        Outcome::Success(rx) => {
            assert_eq!(&rx[..4], &[0x00, 0x00, 0x00, 0x1B]);
            assert_eq!(rx.len(), 4 + 27);
        }
        other => panic!("expected success, got code {}", other.code()),
    }
    device.shutdown();
}

#[test]
fn outcomes_follow_enqueue_order() {
    let (device, element) = open_mock_device();
    for i in 0..5u8 {
        element.push_response(fixtures::success_response(&[i]));
    }

    let completions: Vec<_> = (0..5u8)
        .map(|_| device.submit(ApduRequest::new(fixtures::chip_id_apdu())))
        .collect();

    for (i, completion) in completions.into_iter().enumerate() {
        match completion.wait() {
            Outcome::Success(rx) => assert_eq!(rx[4], i as u8),
            other => panic!("request {} failed with code {}", i, other.code()),
        }
    }
    device.shutdown();
}

#[test]
fn concurrent_submitters_all_complete() {
    let (device, element) = open_mock_device();
    const THREADS: usize = 4;
    const PER_THREAD: usize = 8;
    for _ in 0..THREADS * PER_THREAD {
        element.push_response(fixtures::success_response(&[0x5A]));
    }

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let handle = device.handle();
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|_| {
                        handle
                            .submit(ApduRequest::new(fixtures::chip_id_apdu()))
                            .wait()
                            .code()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for worker in workers {
        let codes = worker.join().unwrap();
        assert!(codes.iter().all(|&c| c == 0));
    }

    // One APDU per submission reached the element, plus OpenApplication
    assert_eq!(element.apdus().len(), THREADS * PER_THREAD + 1);
    device.shutdown();
}

#[test]
fn client_operations_compose_over_one_device() {
    let (device, element) = open_mock_device();
    let client = Client::new(device.handle());

    // data_get
    element.push_response(fixtures::success_response(&[0x01, 0x02, 0x03]));
    assert_eq!(
        client.data_get(Oid::new(0xE0E0), 0, 16).unwrap(),
        vec![0x01, 0x02, 0x03]
    );

    // sha256
    let mut digest_body = vec![0x01, 0x00, 0x20];
    digest_body.extend_from_slice(&[0x7E; 32]);
    element.push_response(fixtures::success_response(&digest_body));
    assert_eq!(client.sha256(b"abc").unwrap(), [0x7E; 32]);

    // data_set answers with an empty body
    element.push_response(fixtures::success_response(&[]));
    client
        .data_set(Oid::new(0xF1D0), true, 0, &[0xAA, 0xBB])
        .unwrap();

    device.shutdown();
}

#[test]
fn response_bytes_are_returned_whole() {
    // Round-trip law: the response body length always matches the header
    let (device, element) = open_mock_device();
    let body: Vec<u8> = (0..100).collect();
    element.push_response(fixtures::success_response(&body));

    match device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait()
    {
        Outcome::Success(rx) => {
            let announced = u16::from_be_bytes([rx[2], rx[3]]) as usize;
            assert_eq!(announced, rx.len() - 4);
            assert_eq!(&rx[4..], &body[..]);
        }
        other => panic!("expected success, got code {}", other.code()),
    }
    device.shutdown();
}
