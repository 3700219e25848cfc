use optiga::device::{ApduRequest, Outcome};
use optiga::test_support::open_mock_device;
use optiga::types::ErrorCode;

use crate::common::fixtures;

/// The initial read plus three retransmissions all seeing a corrupted FCS
/// exhausts the host's receive retry budget.
const FAULT_SERVES: usize = 4;

#[test]
fn element_error_fetches_code_from_error_object() {
    let (device, element) = open_mock_device();
    // Corrupt the status byte of the next response; the error object
    // holds the matching code
    element.set_error_code(0x07);
    element.force_status(0x07);

    let outcome = device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait();
    assert_eq!(outcome, Outcome::Device(ErrorCode::new(0x07)));
    assert_eq!(outcome.code(), 7);

    // No reset happened and the queue stays healthy
    assert_eq!(device.resets(), 0);
    element.push_response(fixtures::chip_id_response());
    let next = device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait();
    assert!(next.is_success());
    device.shutdown();
}

#[test]
fn transport_fault_resets_and_drains_the_queue() {
    let (device, element) = open_mock_device();

    // A warmup keeps the worker busy while the two doomed requests are
    // enqueued behind it; the second response is scripted to never
    // survive the wire
    element.push_response(fixtures::success_response(&[0x00; 64]));
    element.push_response_corrupt(fixtures::chip_id_response(), FAULT_SERVES);

    let warmup = device.submit(ApduRequest::new(fixtures::chip_id_apdu()));
    let doomed = device.submit(ApduRequest::new(fixtures::chip_id_apdu()));
    let queued = device.submit(ApduRequest::new(fixtures::chip_id_apdu()));

    assert!(warmup.wait().is_success());
    assert_eq!(doomed.wait(), Outcome::Transport);
    // The descriptor queued behind the fault is drained, not sent
    assert_eq!(queued.wait(), Outcome::Transport);
    assert_eq!(device.resets(), 1);

    // The stack came back: subsequent submissions work
    element.push_response(fixtures::chip_id_response());
    let next = device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait();
    assert!(next.is_success());
    assert!(device.is_alive());
    device.shutdown();
}

#[test]
fn dead_after_reset_budget_exhausted() {
    let (device, element) = open_mock_device();

    // From now on every bus transaction NACKs: the round-trip faults and
    // all three reset attempts fail
    element.nack_everything(true);
    let outcome = device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait();
    assert_eq!(outcome, Outcome::Transport);
    assert_eq!(device.resets(), 3);
    assert!(!device.is_alive());

    // Dead is sticky and immediate, element health notwithstanding
    element.nack_everything(false);
    for _ in 0..3 {
        let outcome = device
            .submit(ApduRequest::new(fixtures::chip_id_apdu()))
            .wait();
        assert_eq!(outcome, Outcome::Transport);
    }
    device.shutdown();
}

#[test]
fn consecutive_faults_without_recovery_go_dead() {
    let (device, element) = open_mock_device();

    // Three transport faults in a row, each reset succeeding, with no
    // clean round-trip in between
    for i in 1..=3u32 {
        element.push_response_corrupt(fixtures::chip_id_response(), FAULT_SERVES);
        let outcome = device
            .submit(ApduRequest::new(fixtures::chip_id_apdu()))
            .wait();
        assert_eq!(outcome, Outcome::Transport);
        assert_eq!(device.resets(), i);
    }

    // The fourth submission completes immediately with a transport
    // failure and the core is dead
    let outcome = device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait();
    assert_eq!(outcome, Outcome::Transport);
    assert!(!device.is_alive());
    device.shutdown();
}

#[test]
fn clean_round_trip_clears_the_fault_streak() {
    let (device, element) = open_mock_device();

    // Two faults...
    for _ in 0..2 {
        element.push_response_corrupt(fixtures::chip_id_response(), FAULT_SERVES);
        let outcome = device
            .submit(ApduRequest::new(fixtures::chip_id_apdu()))
            .wait();
        assert_eq!(outcome, Outcome::Transport);
    }

    // ...then a success, then two more faults: never three in a row
    element.push_response(fixtures::chip_id_response());
    assert!(device
        .submit(ApduRequest::new(fixtures::chip_id_apdu()))
        .wait()
        .is_success());

    for _ in 0..2 {
        element.push_response_corrupt(fixtures::chip_id_response(), FAULT_SERVES);
        let outcome = device
            .submit(ApduRequest::new(fixtures::chip_id_apdu()))
            .wait();
        assert_eq!(outcome, Outcome::Transport);
    }
    assert!(device.is_alive());
    device.shutdown();
}
