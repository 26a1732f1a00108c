//! Data-link layer: addressed, checksummed frames over the physical layer.
//!
//! Outgoing frames are assembled into a reusable transmit buffer and handed
//! to the physical layer's segmented send; incoming frames are read into a
//! reusable receive buffer, validated, and answered with an ACK, NACK or
//! BUSY acknowledgment. Both buffers support a single in-flight operation
//! per direction and are not lock protected; a single task drives the link
//! at a time (same contract as the physical layer).
//!
//! All bounded retry policy of the stack lives here: the physical layer
//! reports one-shot outcomes and this layer retries initialization up to
//! the configured limit before surfacing a fatal Init error.

use heapless::Vec;

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::configuration::LinkConfig;
use crate::error::{Result, TpuartError};
use crate::protocol::constants::{
    Ack, AddressType, FrameType, Priority, MAX_FRAME_SIZE, MAX_PAYLOAD,
};
use crate::protocol::frame::{build_frame, ParsedFrame};
use crate::protocol::physical::PhysicalLayer;
use crate::tp_log;
use crate::transport::Transport;

/// Data-link layer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LinkState {
    /// Stack not yet initialized
    Uninitialized = 0,
    /// Reset sequence in progress
    Reset = 1,
    /// Normal operating mode
    Normal = 2,
    /// Bus-monitor mode
    Monitor = 3,
    /// Stopped
    Stopped = 4,
}

/// Destination address of a received frame, typed by the address-type bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Destination {
    /// Individual (physical) destination
    Individual(IndividualAddress),
    /// Group destination
    Group(GroupAddress),
}

impl Destination {
    /// Raw 16-bit address value.
    pub const fn raw(self) -> u16 {
        match self {
            Self::Individual(addr) => addr.raw(),
            Self::Group(addr) => addr.raw(),
        }
    }
}

/// A validated, accepted incoming frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInput {
    /// Source individual address
    pub source: IndividualAddress,
    /// Typed destination address
    pub destination: Destination,
    /// Frame priority
    pub priority: Priority,
    /// User payload
    pub payload: Vec<u8, MAX_PAYLOAD>,
}

/// Data-link layer over a [`PhysicalLayer`].
///
/// # Examples
///
/// ```rust
/// use knx_tpuart::configuration::LinkConfig;
/// use knx_tpuart::protocol::link::DataLink;
/// use knx_tpuart::protocol::physical::PhysicalLayer;
/// use knx_tpuart::timer::Timer;
/// use knx_tpuart::transport::MockTransport;
///
/// let timer = Timer::new();
/// let mut transport = MockTransport::new().with_timer(&timer);
/// transport.queue_bytes(&[0x03, 0x07]); // reset + state indications
///
/// let phy = PhysicalLayer::new(&timer, transport);
/// let mut link = DataLink::new(phy, LinkConfig::default());
/// link.init().unwrap();
/// ```
#[derive(Debug)]
pub struct DataLink<'a, T: Transport> {
    phy: PhysicalLayer<'a, T>,
    config: LinkConfig,
    state: LinkState,
    busy: bool,
    tx: [u8; MAX_FRAME_SIZE],
    rx: [u8; MAX_FRAME_SIZE],
}

impl<'a, T: Transport> DataLink<'a, T> {
    /// Create a link over an (uninitialized) physical layer.
    pub fn new(phy: PhysicalLayer<'a, T>, config: LinkConfig) -> Self {
        Self {
            phy,
            config,
            state: LinkState::Uninitialized,
            busy: false,
            tx: [0; MAX_FRAME_SIZE],
            rx: [0; MAX_FRAME_SIZE],
        }
    }

    /// Bring up the whole stack.
    ///
    /// Initializes the physical layer, then retries the reset/confirm
    /// exchange up to the configured limit. Exhausting the retries
    /// surfaces a fatal Init error and leaves the link Uninitialized.
    pub fn init(&mut self) -> Result<()> {
        self.set_state(LinkState::Uninitialized);

        self.phy.init()?;
        self.set_state(LinkState::Reset);

        for attempt in 1..=self.config.retry_limit {
            if self.phy.reset(self.config.default_timeout).is_ok()
                && self.phy.state_query(self.config.default_timeout).is_ok()
            {
                self.set_state(LinkState::Normal);
                return Ok(());
            }
            tp_log!(warn, "link init attempt {} failed", attempt);
        }

        self.set_state(LinkState::Uninitialized);
        Err(TpuartError::link_init())
    }

    /// Build a frame and send it to the bus.
    ///
    /// The source field carries the configured local address; the outcome
    /// maps to success, Timeout, or DataConfirmFailed (the peer reported
    /// delivery failure, the whole frame may be retried).
    pub fn send(
        &mut self,
        frame_type: FrameType,
        address_type: AddressType,
        destination: u16,
        priority: Priority,
        payload: &[u8],
    ) -> Result<()> {
        if self.state != LinkState::Normal {
            return Err(TpuartError::invalid_state());
        }

        let len = build_frame(
            &mut self.tx,
            frame_type,
            address_type,
            self.config.local_address,
            destination,
            priority,
            payload,
        )?;

        match self.phy.data_request(&self.tx[..len], self.config.default_timeout) {
            Ok(()) => Ok(()),
            Err(err) if err.is_data_confirm_failed() => Err(TpuartError::link_confirm_failed()),
            Err(_) => Err(TpuartError::link_timeout()),
        }
    }

    /// Receive one frame, validate it, and acknowledge to the peer.
    ///
    /// Validation order and acknowledgment outcomes:
    /// - too short, bad format bits, extended frame: FrameError, no ack;
    /// - destination not this node: AddressError, silently dropped;
    /// - checksum mismatch or declared/actual length mismatch: NACK sent,
    ///   FrameError;
    /// - valid but this node is busy: BUSY sent, Busy error (validated,
    ///   not delivered);
    /// - valid: ACK sent, payload copied out.
    pub fn receive(&mut self) -> Result<LinkInput> {
        let count = match self.phy.data_receive(&mut self.rx, self.config.byte_timeout) {
            Ok(count) => count,
            Err(_) => return Err(TpuartError::link_timeout()),
        };

        let frame = ParsedFrame::split(&self.rx[..count])?;

        if frame.destination() != self.config.local_address.raw() {
            // Not ours: discard without any acknowledgment byte.
            tp_log!(debug, "link dropped frame for {}", frame.destination());
            return Err(TpuartError::address_error());
        }

        if !frame.checksum_ok() {
            self.phy.send_ack(Ack::Nack, self.config.default_timeout)?;
            tp_log!(warn, "link checksum mismatch");
            return Err(TpuartError::frame_error());
        }

        if !frame.length_consistent() {
            self.phy.send_ack(Ack::Nack, self.config.default_timeout)?;
            tp_log!(warn, "link length mismatch");
            return Err(TpuartError::frame_error());
        }

        if self.busy {
            self.phy.send_ack(Ack::Busy, self.config.default_timeout)?;
            return Err(TpuartError::busy());
        }

        self.phy
            .send_ack(Ack::Addressed, self.config.default_timeout)?;

        let destination = match frame.address_type() {
            AddressType::Individual => {
                Destination::Individual(IndividualAddress::from(frame.destination()))
            }
            AddressType::Group => Destination::Group(GroupAddress::from(frame.destination())),
        };

        let mut payload = Vec::new();
        if payload.extend_from_slice(frame.payload()).is_err() {
            return Err(TpuartError::frame_error());
        }

        Ok(LinkInput {
            source: frame.source(),
            destination,
            priority: frame.priority(),
            payload,
        })
    }

    /// Put the node into busy mode: the controller and this layer answer
    /// valid frames with BUSY until [`leave_busy_mode`](Self::leave_busy_mode).
    pub fn enter_busy_mode(&mut self) -> Result<()> {
        self.phy.activate_busy_mode(self.config.default_timeout)?;
        self.busy = true;
        Ok(())
    }

    /// Leave busy mode.
    pub fn leave_busy_mode(&mut self) -> Result<()> {
        self.phy.deactivate_busy_mode(self.config.default_timeout)?;
        self.busy = false;
        Ok(())
    }

    /// Set the local busy flag without touching the controller.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Whether the node currently rejects valid frames with BUSY.
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Current link state.
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Individual address this node sends from and accepts frames for.
    pub const fn local_address(&self) -> IndividualAddress {
        self.config.local_address
    }

    /// Access the physical layer beneath this link.
    pub const fn physical(&self) -> &PhysicalLayer<'a, T> {
        &self.phy
    }

    /// Mutable access to the physical layer beneath this link.
    pub fn physical_mut(&mut self) -> &mut PhysicalLayer<'a, T> {
        &mut self.phy
    }

    fn set_state(&mut self, state: LinkState) {
        self.state = state;
        tp_log!(debug, "link state -> {}", state as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{
        DATA_CONFIRM_FAILED, DATA_CONFIRM_SUCCESS, RESET_INDICATION,
    };
    use crate::protocol::frame::vertical_parity;
    use crate::timer::Timer;
    use crate::transport::MockTransport;

    fn test_config() -> LinkConfig {
        LinkConfig {
            retry_limit: 2,
            default_timeout: 50,
            byte_timeout: 10,
            ..LinkConfig::default()
        }
    }

    fn link_with<'a>(
        timer: &'a Timer,
        config: LinkConfig,
        configure: impl FnOnce(&mut MockTransport<'a>),
    ) -> DataLink<'a, MockTransport<'a>> {
        let mut transport = MockTransport::new().with_timer(timer);
        configure(&mut transport);
        DataLink::new(PhysicalLayer::new(timer, transport), config)
    }

    /// Initialized link with the init wire traffic cleared away.
    fn ready_link<'a>(
        timer: &'a Timer,
        configure: impl FnOnce(&mut MockTransport<'a>),
    ) -> DataLink<'a, MockTransport<'a>> {
        let mut link = link_with(timer, test_config(), |t| {
            t.queue_bytes(&[RESET_INDICATION, 0x07]);
        });
        link.init().unwrap();
        link.physical_mut().transport_mut().clear_sent();
        configure(link.physical_mut().transport_mut());
        link
    }

    /// Frame addressed to the default local address (1.1.1).
    fn frame_to_local(payload: &[u8]) -> ([u8; MAX_FRAME_SIZE], usize) {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = build_frame(
            &mut buf,
            FrameType::Standard,
            AddressType::Individual,
            IndividualAddress::from(0x2203),
            0x1101,
            Priority::Normal,
            payload,
        )
        .unwrap();
        (buf, len)
    }

    #[test]
    fn test_init_reset_and_confirm() {
        let timer = Timer::new();
        let mut link = link_with(&timer, test_config(), |t| {
            t.queue_bytes(&[RESET_INDICATION, 0x07]);
        });

        link.init().unwrap();
        assert_eq!(link.state(), LinkState::Normal);
        // One reset request, one state query.
        assert_eq!(link.physical().transport().sent(), &[0x01, 0x02]);
    }

    #[test]
    fn test_init_retries_until_indication_arrives() {
        let timer = Timer::new();
        let mut link = link_with(&timer, test_config(), |t| {
            // First attempt's wait polls all come up empty.
            t.set_recv_busy(60);
            t.queue_bytes(&[RESET_INDICATION, 0x07]);
        });

        link.init().unwrap();
        assert_eq!(link.state(), LinkState::Normal);
        // Two reset requests, one state query.
        assert_eq!(link.physical().transport().sent(), &[0x01, 0x01, 0x02]);
    }

    #[test]
    fn test_init_exhausts_retries() {
        let timer = Timer::new();
        let mut link = link_with(&timer, test_config(), |_| {});

        let err = link.init().unwrap_err();
        assert!(err.is_init());
        assert_eq!(link.state(), LinkState::Uninitialized);
        assert_eq!(link.physical().transport().sent(), &[0x01, 0x01]);
    }

    #[test]
    fn test_init_transport_failure_is_fatal() {
        let timer = Timer::new();
        let mut link = link_with(&timer, test_config(), |t| t.fail_init(true));

        let err = link.init().unwrap_err();
        assert!(err.is_init());
        assert_eq!(link.state(), LinkState::Uninitialized);
    }

    #[test]
    fn test_send_wire_sequence() {
        let timer = Timer::new();
        // Local address of the default config is 1.1.1 = 0x1101.
        let mut link = ready_link(&timer, |t| t.queue_bytes(&[DATA_CONFIRM_SUCCESS]));

        link.send(
            FrameType::Standard,
            AddressType::Individual,
            0x1101,
            Priority::Normal,
            &[0x01, 0x02],
        )
        .unwrap();

        let checksum = vertical_parity(&[0x94, 0x11, 0x01, 0x11, 0x01, 0x02, 0x01, 0x02]);
        assert_eq!(
            link.physical().transport().sent(),
            &[
                0x80, 0x94, // DataStart, control
                0x81, 0x11, // source high
                0x82, 0x01, // source low
                0x83, 0x11, // destination high
                0x84, 0x01, // destination low
                0x85, 0x02, // address type | length
                0x86, 0x01, // payload
                0x87, 0x02, // payload
                0x89, checksum, // DataEnd | 9, checksum
            ]
        );
    }

    #[test]
    fn test_send_outcomes() {
        let timer = Timer::new();
        let mut link = ready_link(&timer, |t| t.queue_bytes(&[DATA_CONFIRM_SUCCESS]));
        assert!(link
            .send(
                FrameType::Standard,
                AddressType::Group,
                0x0A03,
                Priority::Low,
                &[0xFF],
            )
            .is_ok());

        let timer = Timer::new();
        let mut link = ready_link(&timer, |t| t.queue_bytes(&[DATA_CONFIRM_FAILED]));
        let err = link
            .send(
                FrameType::Standard,
                AddressType::Group,
                0x0A03,
                Priority::Low,
                &[0xFF],
            )
            .unwrap_err();
        assert!(err.is_data_confirm_failed());

        let timer = Timer::new();
        let mut link = ready_link(&timer, |_| {});
        let err = link
            .send(
                FrameType::Standard,
                AddressType::Group,
                0x0A03,
                Priority::Low,
                &[0xFF],
            )
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_send_requires_normal_state() {
        let timer = Timer::new();
        let mut link = link_with(&timer, test_config(), |_| {});

        let err = link
            .send(
                FrameType::Standard,
                AddressType::Individual,
                0x1101,
                Priority::Normal,
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, TpuartError::Physical(_)));
    }

    #[test]
    fn test_receive_valid_frame_acks() {
        let timer = Timer::new();
        let (frame, len) = frame_to_local(&[0xCA, 0xFE]);
        let mut link = ready_link(&timer, |t| t.queue_bytes(&frame[..len]));

        let input = link.receive().unwrap();
        assert_eq!(input.source.raw(), 0x2203);
        assert_eq!(input.destination.raw(), 0x1101);
        assert!(matches!(input.destination, Destination::Individual(_)));
        assert_eq!(input.priority, Priority::Normal);
        assert_eq!(&input.payload[..], &[0xCA, 0xFE]);

        // Exactly one acknowledgment byte: addressed.
        assert_eq!(link.physical().transport().sent(), &[0x11]);
    }

    #[test]
    fn test_receive_foreign_address_is_silent() {
        let timer = Timer::new();
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let len = build_frame(
            &mut buf,
            FrameType::Standard,
            AddressType::Individual,
            IndividualAddress::from(0x2203),
            0x5544,
            Priority::Normal,
            &[0x01],
        )
        .unwrap();
        let mut link = ready_link(&timer, |t| t.queue_bytes(&buf[..len]));

        let err = link.receive().unwrap_err();
        assert!(err.is_address_error());
        // No acknowledgment byte at all.
        assert!(link.physical().transport().sent().is_empty());
    }

    #[test]
    fn test_receive_checksum_mismatch_nacks() {
        let timer = Timer::new();
        let (mut frame, len) = frame_to_local(&[0xCA, 0xFE]);
        frame[6] ^= 0x01; // flip a payload bit
        let mut link = ready_link(&timer, |t| t.queue_bytes(&frame[..len]));

        let err = link.receive().unwrap_err();
        assert!(err.is_frame_error());
        assert_eq!(link.physical().transport().sent(), &[0x14]);
    }

    #[test]
    fn test_receive_length_mismatch_nacks() {
        let timer = Timer::new();
        let (mut frame, len) = frame_to_local(&[0x01, 0x02, 0x03]);
        // Understate the declared length and re-seal the checksum.
        frame[5] = (frame[5] & 0xF0) | 0x02;
        frame[len - 1] = vertical_parity(&frame[..len - 1]);
        let mut link = ready_link(&timer, |t| t.queue_bytes(&frame[..len]));

        let err = link.receive().unwrap_err();
        assert!(err.is_frame_error());
        assert_eq!(link.physical().transport().sent(), &[0x14]);
    }

    #[test]
    fn test_receive_while_busy_sends_busy_ack() {
        let timer = Timer::new();
        let (frame, len) = frame_to_local(&[0x01]);
        let mut link = ready_link(&timer, |t| t.queue_bytes(&frame[..len]));
        link.set_busy(true);

        let err = link.receive().unwrap_err();
        assert!(err.is_busy());
        assert_eq!(link.physical().transport().sent(), &[0x12]);
    }

    #[test]
    fn test_receive_nothing_is_timeout() {
        let timer = Timer::new();
        let mut link = ready_link(&timer, |_| {});

        let err = link.receive().unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_receive_group_destination() {
        let timer = Timer::new();
        let mut buf = [0u8; MAX_FRAME_SIZE];
        // Group-addressed frame whose raw destination equals the local
        // address, so it passes the destination filter.
        let len = build_frame(
            &mut buf,
            FrameType::Standard,
            AddressType::Group,
            IndividualAddress::from(0x2203),
            0x1101,
            Priority::Urgent,
            &[0x07],
        )
        .unwrap();
        let mut link = ready_link(&timer, |t| t.queue_bytes(&buf[..len]));

        let input = link.receive().unwrap();
        assert!(matches!(input.destination, Destination::Group(_)));
        assert_eq!(input.priority, Priority::Urgent);
    }

    #[test]
    fn test_busy_mode_round_trip() {
        let timer = Timer::new();
        let mut link = ready_link(&timer, |_| {});

        link.enter_busy_mode().unwrap();
        assert!(link.is_busy());
        link.leave_busy_mode().unwrap();
        assert!(!link.is_busy());
        // Activate then deactivate busy mode on the wire.
        assert_eq!(link.physical().transport().sent(), &[0x21, 0x22]);
    }
}
