//! Integration tests for the knx-tpuart stack.
//!
//! These tests drive the full stack (data link over physical layer over
//! transport) against the mock transport, so they run under plain
//! `cargo test` without bus hardware.

use knx_tpuart::configuration::LinkConfig;
use knx_tpuart::protocol::constants::{
    AddressType, FrameType, Priority, DATA_CONFIRM_FAILED, DATA_CONFIRM_SUCCESS, RESET_INDICATION,
};
use knx_tpuart::protocol::frame::{build_frame, vertical_parity};
use knx_tpuart::queue::TraceQueue;
use knx_tpuart::{DataLink, IndividualAddress, LinkState, MockTransport, PhysicalLayer, Timer};

const LOCAL: u16 = 0x1101;

fn test_config() -> LinkConfig {
    LinkConfig {
        retry_limit: 3,
        default_timeout: 100,
        byte_timeout: 10,
        ..LinkConfig::default()
    }
}

/// Bring up a link whose controller answers the init exchange.
fn bring_up<'a>(timer: &'a Timer, extra_rx: &[u8]) -> DataLink<'a, MockTransport<'a>> {
    let mut transport = MockTransport::new().with_timer(timer);
    transport.queue_bytes(&[RESET_INDICATION, 0x07]);
    transport.queue_bytes(extra_rx);

    let phy = PhysicalLayer::new(timer, transport);
    let mut link = DataLink::new(phy, test_config());
    link.init().expect("init failed");
    link.physical_mut().transport_mut().clear_sent();
    link
}

#[test]
fn test_full_stack_bring_up() {
    println!("\n=== Test: Stack Bring-Up ===");

    let timer = Timer::new();
    let link = bring_up(&timer, &[]);
    assert_eq!(link.state(), LinkState::Normal);
    println!("✓ Link reached Normal after reset + state confirm");
}

#[test]
fn test_send_success_and_wire_image() {
    println!("\n=== Test: Send with Data Confirm ===");

    let timer = Timer::new();
    let mut link = bring_up(&timer, &[DATA_CONFIRM_SUCCESS]);

    link.send(
        FrameType::Standard,
        AddressType::Individual,
        LOCAL,
        Priority::Normal,
        &[0x01, 0x02],
    )
    .expect("send failed");
    println!("✓ Frame sent and confirmed");

    // Even sent bytes are segmentation markers, odd ones the frame image.
    let sent = link.physical().transport().sent();
    let frame: Vec<u8> = sent.iter().skip(1).step_by(2).copied().collect();
    assert_eq!(frame[0], 0x94, "control byte: standard, fixed bit, normal");
    assert_eq!(&frame[1..3], &[0x11, 0x01], "source is the local address");
    assert_eq!(&frame[3..5], &[0x11, 0x01], "destination");
    assert_eq!(frame[5], 0x02, "individual destination, two payload bytes");
    assert_eq!(vertical_parity(&frame), 0, "checksum seals the frame");
    println!("✓ Wire image matches the frame layout");
}

#[test]
fn test_send_confirm_failed_and_timeout() {
    println!("\n=== Test: Send Failure Modes ===");

    let timer = Timer::new();
    let mut link = bring_up(&timer, &[DATA_CONFIRM_FAILED]);
    let err = link
        .send(
            FrameType::Standard,
            AddressType::Individual,
            LOCAL,
            Priority::Normal,
            &[0xAA],
        )
        .unwrap_err();
    assert!(err.is_data_confirm_failed());
    println!("✓ Peer-reported failure surfaces as DataConfirmFailed");

    let timer = Timer::new();
    let mut link = bring_up(&timer, &[]);
    let err = link
        .send(
            FrameType::Standard,
            AddressType::Individual,
            LOCAL,
            Priority::Normal,
            &[0xAA],
        )
        .unwrap_err();
    assert!(err.is_timeout());
    println!("✓ Missing confirm surfaces as Timeout");
}

#[test]
fn test_receive_round_trip() {
    println!("\n=== Test: Receive Round Trip ===");

    let mut buf = [0u8; 32];
    let len = build_frame(
        &mut buf,
        FrameType::Standard,
        AddressType::Individual,
        IndividualAddress::from(0x2203),
        LOCAL,
        Priority::Urgent,
        &[0xCA, 0xFE, 0xBA, 0xBE],
    )
    .unwrap();

    let timer = Timer::new();
    let mut link = bring_up(&timer, &buf[..len]);

    let input = link.receive().expect("receive failed");
    assert_eq!(input.source.raw(), 0x2203);
    assert_eq!(input.destination.raw(), LOCAL);
    assert_eq!(input.priority, Priority::Urgent);
    assert_eq!(&input.payload[..], &[0xCA, 0xFE, 0xBA, 0xBE]);
    println!("✓ Payload delivered: {:02X?}", &input.payload[..]);

    assert_eq!(link.physical().transport().sent(), &[0x11]);
    println!("✓ Addressed acknowledgment sent");
}

#[test]
fn test_receive_rejections() {
    println!("\n=== Test: Receive Rejections ===");

    // Foreign destination: silent drop.
    let mut buf = [0u8; 32];
    let len = build_frame(
        &mut buf,
        FrameType::Standard,
        AddressType::Individual,
        IndividualAddress::from(0x2203),
        0x7777,
        Priority::Normal,
        &[0x01],
    )
    .unwrap();
    let timer = Timer::new();
    let mut link = bring_up(&timer, &buf[..len]);
    assert!(link.receive().unwrap_err().is_address_error());
    assert!(link.physical().transport().sent().is_empty());
    println!("✓ Foreign destination dropped without acknowledgment");

    // Corrupted checksum: NACK.
    let len = build_frame(
        &mut buf,
        FrameType::Standard,
        AddressType::Individual,
        IndividualAddress::from(0x2203),
        LOCAL,
        Priority::Normal,
        &[0x01],
    )
    .unwrap();
    buf[6] ^= 0x80;
    let timer = Timer::new();
    let mut link = bring_up(&timer, &buf[..len]);
    assert!(link.receive().unwrap_err().is_frame_error());
    assert_eq!(link.physical().transport().sent(), &[0x14]);
    println!("✓ Corrupted frame answered with NACK");
}

#[test]
fn test_busy_mode_rejects_valid_frame() {
    println!("\n=== Test: Busy Mode ===");

    let mut buf = [0u8; 32];
    let len = build_frame(
        &mut buf,
        FrameType::Standard,
        AddressType::Individual,
        IndividualAddress::from(0x2203),
        LOCAL,
        Priority::Normal,
        &[0x55],
    )
    .unwrap();

    let timer = Timer::new();
    let mut link = bring_up(&timer, &buf[..len]);
    link.enter_busy_mode().expect("busy mode activation failed");

    let err = link.receive().unwrap_err();
    assert!(err.is_busy());
    // Busy-mode activation byte, then the BUSY acknowledgment.
    assert_eq!(link.physical().transport().sent(), &[0x21, 0x12]);
    println!("✓ Valid frame refused with BUSY while busy");
}

#[test]
fn test_diagnostic_trace_flows_through_queue() {
    println!("\n=== Test: Diagnostic Trace Queue ===");

    static TRACE: TraceQueue = TraceQueue::new();

    let timer = Timer::new();
    let mut transport = MockTransport::new().with_timer(&timer);
    transport.queue_bytes(&[RESET_INDICATION, 0x07]);

    let mut phy = PhysicalLayer::new(&timer, transport);
    phy.attach_trace(&TRACE);
    let mut link = DataLink::new(phy, test_config());
    link.init().expect("init failed");

    // Drain everything the bring-up produced; the queue invariant holds
    // throughout and the first line is the Uninitialized state change.
    let mut buf = [0u8; 32];
    let first = TRACE.pop(&mut buf).unwrap();
    assert_eq!(&buf[..first], b"PH state -> 00\n");

    let mut lines = 1;
    while TRACE.pop(&mut buf).unwrap() > 0 {
        assert_eq!(
            TRACE.free_bytes() + TRACE.used_bytes(),
            TRACE.capacity(),
            "queue capacity invariant"
        );
        lines += 1;
    }
    assert!(lines >= 5, "bring-up should trace states and wire bytes");
    println!("✓ {lines} trace lines drained from the queue");
}
