//! Mock transport implementation for testing.
//!
//! This module provides a mock implementation of [`Transport`] that can be
//! used in unit tests to simulate the TP-UART byte stream without serial
//! hardware.
//!
//! The mock can:
//! - Pre-program bytes that will be returned by `receive()` in FIFO order
//! - Record every byte handed to `send()`
//! - Report `Busy` for a programmable number of polls per direction
//! - Simulate an initialization failure
//! - Advance a shared [`Timer`] once per poll, so that timeout paths
//!   terminate deterministically in tests
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::transport::{MockTransport, RecvPoll, SendPoll, Transport};
//!
//! let mut mock = MockTransport::new();
//! mock.queue_bytes(&[0x03]);
//!
//! assert_eq!(mock.send(0x01), SendPoll::Accepted);
//! assert_eq!(mock.receive(), RecvPoll::Received(0x03));
//! assert_eq!(mock.receive(), RecvPoll::Busy);
//! assert_eq!(mock.sent(), &[0x01]);
//! ```

use heapless::{Deque, Vec};

use crate::error::{Result, TpuartError};
use crate::timer::Timer;
use crate::transport::{RecvPoll, SendPoll, Transport};

/// Capacity of the mock's per-direction byte buffers.
const MOCK_CAPACITY: usize = 256;

/// Mock byte-serial transport for protocol tests.
#[derive(Debug, Default)]
pub struct MockTransport<'a> {
    /// Bytes the "peer" has placed on the wire, delivered in FIFO order.
    rx_bytes: Deque<u8, MOCK_CAPACITY>,
    /// Every byte accepted through `send()`.
    sent: Vec<u8, MOCK_CAPACITY>,
    /// Remaining send polls that report Busy before accepting.
    send_busy: usize,
    /// Remaining receive polls that report Busy before delivering.
    recv_busy: usize,
    /// Whether `init()` should fail.
    fail_init: bool,
    /// Ticked once per poll to simulate time passing.
    timer: Option<&'a Timer>,
}

impl<'a> MockTransport<'a> {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a timer that advances by one tick on every poll.
    ///
    /// With the polled retry loops this makes wall-clock timeouts elapse
    /// after a bounded number of polls instead of spinning forever.
    pub fn with_timer(mut self, timer: &'a Timer) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Queue bytes to be delivered by subsequent `receive()` polls.
    pub fn queue_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let _ = self.rx_bytes.push_back(byte);
        }
    }

    /// All bytes accepted through `send()`, in order.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Clear the sent-byte record.
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    /// Report Busy for the next `polls` send attempts.
    pub fn set_send_busy(&mut self, polls: usize) {
        self.send_busy = polls;
    }

    /// Report Busy for the next `polls` receive attempts.
    pub fn set_recv_busy(&mut self, polls: usize) {
        self.recv_busy = polls;
    }

    /// Make `init()` fail.
    pub fn fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    fn advance_time(&self) {
        if let Some(timer) = self.timer {
            timer.tick();
        }
    }
}

impl Transport for MockTransport<'_> {
    fn init(&mut self) -> Result<()> {
        if self.fail_init {
            Err(TpuartError::transport_init())
        } else {
            Ok(())
        }
    }

    fn send(&mut self, byte: u8) -> SendPoll {
        self.advance_time();
        if self.send_busy > 0 {
            self.send_busy -= 1;
            return SendPoll::Busy;
        }
        match self.sent.push(byte) {
            Ok(()) => SendPoll::Accepted,
            Err(_) => SendPoll::Error,
        }
    }

    fn receive(&mut self) -> RecvPoll {
        self.advance_time();
        if self.recv_busy > 0 {
            self.recv_busy -= 1;
            return RecvPoll::Busy;
        }
        match self.rx_bytes.pop_front() {
            Some(byte) => RecvPoll::Received(byte),
            None => RecvPoll::Busy,
        }
    }
}
