//! Physical-layer protocol state machine.
//!
//! This layer owns the device state and drives byte-level request/response
//! exchanges with the TP-UART controller: timeout-bounded single-byte send
//! and receive, masked waits for indications, the segmented frame-send
//! protocol and frame reception.
//!
//! Every operation makes one attempt and reports a one-shot outcome; retry
//! policy lives with the data-link layer above. All waits are spin-polls
//! bounded by a wall-clock [`Deadline`]; there is no cancellation token.
//!
//! The state machine is single-caller by contract: none of its fields are
//! lock protected, and the integrating system must ensure only one task
//! drives it at a time.
//!
//! ## State Machine
//!
//! ```text
//! Uninitialized → (transport init ok) → Reset → (reset confirmed) → Normal
//!                                        ↑            |
//!                                        └── (failure reported to caller)
//! ```

use crate::addressing::IndividualAddress;
use crate::error::{Result, TpuartError};
use crate::protocol::constants::{
    Ack, ServiceRequest, StatusIndication, DATA_CONFIRM_MASK, DATA_CONFIRM_SUCCESS, DATA_CONTINUE,
    DATA_END, DATA_START, MAX_FRAME_SIZE, RESET_INDICATION, STATE_INDICATION_MASK,
};
use crate::queue::TraceQueue;
use crate::text;
use crate::timer::{Deadline, Timer};
use crate::transport::{RecvPoll, SendPoll, Transport};
use crate::tp_log;

/// Physical-layer device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PhyState {
    /// Transport not yet initialized
    Uninitialized = 0,
    /// Initialized, reset request pending or in flight
    Reset = 1,
    /// Normal operating mode
    Normal = 2,
    /// Passive bus-monitor mode
    Monitor = 3,
    /// Stopped
    Stopped = 4,
}

/// Physical-layer protocol driver over a byte-serial [`Transport`].
///
/// # Examples
///
/// ```rust
/// use knx_tpuart::protocol::physical::{PhyState, PhysicalLayer};
/// use knx_tpuart::timer::Timer;
/// use knx_tpuart::transport::MockTransport;
///
/// let timer = Timer::new();
/// let mut transport = MockTransport::new().with_timer(&timer);
/// transport.queue_bytes(&[0x03]); // reset indication
///
/// let mut phy = PhysicalLayer::new(&timer, transport);
/// phy.init().unwrap();
/// phy.reset(100).unwrap();
/// assert_eq!(phy.state(), PhyState::Normal);
/// ```
#[derive(Debug)]
pub struct PhysicalLayer<'a, T: Transport> {
    timer: &'a Timer,
    transport: T,
    state: PhyState,
    trace: Option<&'a TraceQueue>,
}

impl<'a, T: Transport> PhysicalLayer<'a, T> {
    /// Create a driver in the Uninitialized state.
    pub fn new(timer: &'a Timer, transport: T) -> Self {
        Self {
            timer,
            transport,
            state: PhyState::Uninitialized,
            trace: None,
        }
    }

    /// Attach a diagnostic trace queue.
    ///
    /// State changes and every byte moved over the wire are mirrored as
    /// hex-formatted text lines; lines are dropped when the queue is full.
    pub fn attach_trace(&mut self, queue: &'a TraceQueue) {
        self.trace = Some(queue);
    }

    /// Initialize the timer and the transport.
    ///
    /// On success the device is in the Reset state, ready for
    /// [`reset`](Self::reset); an Init error is returned if the transport
    /// fails to come up.
    pub fn init(&mut self) -> Result<()> {
        self.set_state(PhyState::Uninitialized);

        self.timer.init();
        self.timer.start();

        if self.transport.init().is_err() {
            tp_log!(error, "phy transport init failed");
            return Err(TpuartError::phy_init());
        }

        self.set_state(PhyState::Reset);
        Ok(())
    }

    /// Hand one byte to the transport, polling until accepted or timeout.
    pub fn send_data(&mut self, byte: u8, timeout: u32) -> Result<()> {
        let mut deadline = Deadline::start(self.timer, timeout);
        while !deadline.expired(self.timer) {
            if self.transport.send(byte) == SendPoll::Accepted {
                self.trace_value(b"PH tx ", byte);
                return Ok(());
            }
        }

        tp_log!(warn, "phy send timeout");
        Err(TpuartError::timeout())
    }

    /// Poll the transport for one received byte until success or timeout.
    pub fn recv_data(&mut self, timeout: u32) -> Result<u8> {
        let mut deadline = Deadline::start(self.timer, timeout);
        while !deadline.expired(self.timer) {
            if let RecvPoll::Received(byte) = self.transport.receive() {
                self.trace_value(b"PH rx ", byte);
                return Ok(byte);
            }
        }

        Err(TpuartError::timeout())
    }

    /// Wait until a byte exactly equal to `expected` arrives.
    ///
    /// Returns a Response error on deadline expiry: bytes may have
    /// arrived without matching, which is distinct from a raw timeout.
    pub fn wait_for(&mut self, expected: u8, timeout: u32) -> Result<()> {
        let mut deadline = Deadline::start(self.timer, timeout);
        while !deadline.expired(self.timer) {
            if let RecvPoll::Received(byte) = self.transport.receive() {
                self.trace_value(b"PH rx ", byte);
                if byte == expected {
                    return Ok(());
                }
            }
        }

        tp_log!(warn, "phy awaited response did not arrive");
        Err(TpuartError::response())
    }

    /// Wait for the first byte whose bits under `mask` are all set,
    /// returning that byte.
    pub fn wait_for_masked(&mut self, mask: u8, timeout: u32) -> Result<u8> {
        let mut deadline = Deadline::start(self.timer, timeout);
        while !deadline.expired(self.timer) {
            if let RecvPoll::Received(byte) = self.transport.receive() {
                self.trace_value(b"PH rx ", byte);
                if byte & mask == mask {
                    return Ok(byte);
                }
            }
        }

        tp_log!(warn, "phy masked response did not arrive");
        Err(TpuartError::response())
    }

    /// Send the wire byte of a service request.
    ///
    /// [`ServiceRequest::None`] is rejected with a Request error before
    /// any byte reaches the transport.
    pub fn send_request(&mut self, request: ServiceRequest, timeout: u32) -> Result<()> {
        let Some(byte) = request.wire_byte() else {
            tp_log!(error, "phy invalid service request");
            return Err(TpuartError::request());
        };
        self.send_data(byte, timeout)
    }

    /// Reset the controller and wait for the reset indication.
    ///
    /// On success the device enters Normal mode. A send failure maps to a
    /// Request error, a missing indication to Timeout; the caller owns
    /// any retry loop.
    pub fn reset(&mut self, timeout: u32) -> Result<()> {
        if self.state != PhyState::Reset {
            self.set_state(PhyState::Reset);
        }

        if self.send_request(ServiceRequest::Reset, timeout).is_err() {
            return Err(TpuartError::request());
        }

        match self.wait_for(RESET_INDICATION, timeout) {
            Ok(()) => {
                self.set_state(PhyState::Normal);
                Ok(())
            }
            Err(_) => Err(TpuartError::timeout()),
        }
    }

    /// Query the controller's communication state.
    ///
    /// The returned byte carries the diagnostic flags exposed by
    /// [`StatusIndication`].
    pub fn state_query(&mut self, timeout: u32) -> Result<StatusIndication> {
        if self
            .send_request(ServiceRequest::StateQuery, timeout)
            .is_err()
        {
            return Err(TpuartError::request());
        }

        match self.wait_for_masked(STATE_INDICATION_MASK, timeout) {
            Ok(byte) => Ok(StatusIndication::new(byte)),
            Err(_) => Err(TpuartError::timeout()),
        }
    }

    /// Transmit a complete frame with the segmented send protocol and wait
    /// for the data confirm.
    ///
    /// Wire sequence: `DataStart`, first byte; for each interior byte, a
    /// `DataContinue` marker carrying the running index, then the byte;
    /// finally a `DataEnd` marker carrying the total length, then the
    /// checksum byte. Any send failure aborts the remaining segments.
    pub fn data_request(&mut self, frame: &[u8], timeout: u32) -> Result<()> {
        if frame.len() < 2 || frame.len() > MAX_FRAME_SIZE {
            return Err(TpuartError::request());
        }

        if self.send_data(DATA_START, timeout).is_err() {
            return Err(TpuartError::request());
        }
        self.send_data(frame[0], timeout)?;

        for (index, &byte) in frame.iter().enumerate().take(frame.len() - 1).skip(1) {
            self.send_data(DATA_CONTINUE | index as u8, timeout)?;
            self.send_data(byte, timeout)?;
        }

        self.send_data(DATA_END | frame.len() as u8, timeout)?;
        self.send_data(frame[frame.len() - 1], timeout)?;

        match self.wait_for_masked(DATA_CONFIRM_MASK, timeout) {
            Ok(DATA_CONFIRM_SUCCESS) => Ok(()),
            Ok(_) => {
                tp_log!(warn, "phy peer reported delivery failure");
                Err(TpuartError::data_confirm_failed())
            }
            Err(_) => Err(TpuartError::timeout()),
        }
    }

    /// Read an incoming frame byte by byte into `buf`.
    ///
    /// Reception stops at the frame-size limit or at the first per-byte
    /// timeout, whichever comes first. Returns the byte count, or Timeout
    /// if nothing arrived at all.
    pub fn data_receive(&mut self, buf: &mut [u8], byte_timeout: u32) -> Result<usize> {
        let limit = buf.len().min(MAX_FRAME_SIZE);
        let mut count = 0;

        while count < limit {
            match self.recv_data(byte_timeout) {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(_) => break,
            }
        }

        if count == 0 {
            Err(TpuartError::timeout())
        } else {
            Ok(count)
        }
    }

    /// Send an acknowledgment-information byte to the peer.
    pub fn send_ack(&mut self, ack: Ack, timeout: u32) -> Result<()> {
        self.send_data(ack.to_u8(), timeout)
    }

    /// Enter passive bus-monitor mode.
    pub fn activate_busmonitor(&mut self, timeout: u32) -> Result<()> {
        self.send_request(ServiceRequest::ActivateBusMonitor, timeout)?;
        self.set_state(PhyState::Monitor);
        Ok(())
    }

    /// Query the controller's product identifier byte.
    pub fn product_id_query(&mut self, timeout: u32) -> Result<u8> {
        self.send_request(ServiceRequest::ProductIdQuery, timeout)?;
        self.recv_data(timeout)
    }

    /// Ask the controller to answer incoming frames with BUSY.
    pub fn activate_busy_mode(&mut self, timeout: u32) -> Result<()> {
        self.send_request(ServiceRequest::ActivateBusyMode, timeout)
    }

    /// Return the controller to normal acknowledgment behavior.
    pub fn deactivate_busy_mode(&mut self, timeout: u32) -> Result<()> {
        self.send_request(ServiceRequest::DeactivateBusyMode, timeout)
    }

    /// Program the physical address the controller auto-acknowledges.
    pub fn set_address(&mut self, address: IndividualAddress, timeout: u32) -> Result<()> {
        self.send_request(ServiceRequest::SetAddress, timeout)?;
        let octets = address.to_be_bytes();
        self.send_data(octets[0], timeout)?;
        self.send_data(octets[1], timeout)
    }

    /// Adjust the controller's maximum retransmission count.
    pub fn set_max_retry_count(&mut self, count: u8, timeout: u32) -> Result<()> {
        self.send_request(ServiceRequest::SetMaxRetryCount, timeout)?;
        self.send_data(count, timeout)
    }

    /// Enable checksum generation in the controller.
    pub fn activate_checksum(&mut self, timeout: u32) -> Result<()> {
        self.send_request(ServiceRequest::ActivateChecksum, timeout)
    }

    /// Stop the device; only [`init`](Self::init) leaves this state.
    pub fn stop(&mut self) {
        self.set_state(PhyState::Stopped);
    }

    /// Current device state.
    pub const fn state(&self) -> PhyState {
        self.state
    }

    /// Shared timer handle.
    pub const fn timer(&self) -> &'a Timer {
        self.timer
    }

    /// Access the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn set_state(&mut self, state: PhyState) {
        self.state = state;
        tp_log!(debug, "phy state -> {}", state as u8);
        self.trace_value(b"PH state -> ", state as u8);
    }

    fn trace_value(&self, label: &[u8], value: u8) {
        if let Some(queue) = self.trace {
            let mut line: heapless::Vec<u8, 32> = heapless::Vec::new();
            let _ = line.extend_from_slice(label);
            let _ = line.extend_from_slice(&text::byte_to_hex(value));
            let _ = line.push(b'\n');
            // A full queue drops the line rather than stalling the protocol.
            let _ = queue.push(&line);
        }
    }
}
