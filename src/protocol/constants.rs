//! TP-UART protocol constants and wire byte codes.

// =============================================================================
// Sizes and timeouts
// =============================================================================

/// Maximum size of a link frame in bytes (checksum included).
pub const MAX_FRAME_SIZE: usize = 22;

/// Minimum size of a link frame: 6-byte header plus checksum.
pub const MIN_FRAME_SIZE: usize = 7;

/// Maximum payload carried by one frame (4-bit length field).
pub const MAX_PAYLOAD: usize = 15;

/// Default request/response timeout budget in timer ticks.
pub const DEFAULT_TIMEOUT: u32 = 2000;

/// Default per-byte receive timeout in timer ticks during frame reception.
pub const BYTE_TIMEOUT: u32 = 50;

// =============================================================================
// Service bytes (service-to-transport direction)
// =============================================================================

/// Marker opening a segmented frame transmission.
pub const DATA_START: u8 = 0x80;

/// Marker carrying the running byte index of a segmented transmission.
pub const DATA_CONTINUE: u8 = 0x80;

/// Marker carrying the total frame length, closing a transmission.
pub const DATA_END: u8 = 0x80;

/// Physical-layer service requests.
///
/// Each request maps to exactly one wire byte through [`wire_byte`]
/// (`Self::wire_byte`); [`None`](Self::None) has no wire encoding and is
/// rejected before reaching the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceRequest {
    /// Reset the TP-UART controller
    Reset,
    /// Query the internal communication state
    StateQuery,
    /// Enter passive bus-monitor mode
    ActivateBusMonitor,
    /// Query the controller's product identifier
    ProductIdQuery,
    /// Enter busy mode (flow control)
    ActivateBusyMode,
    /// Leave busy mode
    DeactivateBusyMode,
    /// Adjust the controller's maximum retransmission count
    SetMaxRetryCount,
    /// Enable checksum generation in the controller
    ActivateChecksum,
    /// Program the physical address used for auto-acknowledgment
    SetAddress,
    /// Acknowledgment information (see [`Ack`] for the concrete bytes)
    AckInfo,
    /// No request; not a valid wire value
    None,
}

impl ServiceRequest {
    /// Total lookup from request to wire byte.
    ///
    /// Returns `Option::None` only for [`ServiceRequest::None`], which
    /// signals a caller programming error. There is deliberately no
    /// wildcard arm: a new variant without a wire byte fails to compile
    /// rather than silently mapping to a valid-looking code.
    pub const fn wire_byte(self) -> Option<u8> {
        match self {
            Self::Reset => Some(0x01),
            Self::StateQuery => Some(0x02),
            Self::ActivateBusMonitor => Some(0x05),
            Self::ProductIdQuery => Some(0x20),
            Self::ActivateBusyMode => Some(0x21),
            Self::DeactivateBusyMode => Some(0x22),
            Self::SetMaxRetryCount => Some(0x24),
            Self::ActivateChecksum => Some(0x25),
            Self::SetAddress => Some(0x28),
            Self::AckInfo => Some(0x11),
            Self::None => None,
        }
    }
}

/// Acknowledgment-information bytes the link layer hands to the peer
/// after validating (or rejecting) a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Ack {
    /// Frame accepted and addressed to this node
    Addressed = 0x11,
    /// Frame valid but this node cannot accept it right now
    Busy = 0x12,
    /// Frame failed validation
    Nack = 0x14,
}

impl Ack {
    /// Wire byte of this acknowledgment.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Indication bytes (transport-to-service direction)
// =============================================================================

/// Indication confirming a controller reset.
pub const RESET_INDICATION: u8 = 0x03;

/// Mask matching a state-indication byte.
pub const STATE_INDICATION_MASK: u8 = 0x07;

/// Mask matching both data-confirm outcomes.
pub const DATA_CONFIRM_MASK: u8 = 0x0B;

/// Data confirm: transmission succeeded.
pub const DATA_CONFIRM_SUCCESS: u8 = 0x8B;

/// Data confirm: transmission failed.
pub const DATA_CONFIRM_FAILED: u8 = 0x0B;

/// State-indication byte with its diagnostic flag accessors.
///
/// The upper bits of a state indication carry controller status flags;
/// the low three bits are the indication signature itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusIndication(u8);

impl StatusIndication {
    /// Wrap a raw state-indication byte.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw byte value.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Slave collision detected.
    pub const fn slave_collision(self) -> bool {
        (self.0 & 0x80) != 0
    }

    /// Receive error (checksum, parity or framing).
    pub const fn receive_error(self) -> bool {
        (self.0 & 0x40) != 0
    }

    /// Transmit error (send collision).
    pub const fn transmit_error(self) -> bool {
        (self.0 & 0x20) != 0
    }

    /// Protocol error (illegal control byte).
    pub const fn protocol_error(self) -> bool {
        (self.0 & 0x10) != 0
    }

    /// Temperature warning.
    pub const fn temperature_warning(self) -> bool {
        (self.0 & 0x08) != 0
    }

    /// No error flags set.
    pub const fn is_ok(self) -> bool {
        (self.0 & 0xF8) == 0
    }
}

// =============================================================================
// Frame field enums
// =============================================================================

/// Frame format carried in bit 7 of the control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FrameType {
    /// `L_Data_Extended` frame
    Extended = 0,
    /// `L_Data_Standard` frame
    Standard = 1,
}

/// Destination address type carried in bit 7 of the address/length byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AddressType {
    /// Destination is an individual (physical) address
    Individual = 0,
    /// Destination is a group address
    Group = 1,
}

/// KNX message priority levels (bits 3-2 of the control byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    /// System priority
    System = 0b00,
    /// Normal priority (default)
    Normal = 0b01,
    /// Urgent priority
    Urgent = 0b10,
    /// Low priority
    Low = 0b11,
}

impl Priority {
    /// Convert the two priority bits to a Priority.
    pub const fn from_u8(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::System,
            0b01 => Self::Normal,
            0b10 => Self::Urgent,
            _ => Self::Low,
        }
    }

    /// Convert Priority to its two-bit encoding.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}
