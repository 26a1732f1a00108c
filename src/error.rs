//! Error types for the TP-UART stack.
//!
//! This module provides structured error types with backtraces (when std is
//! enabled) and helper methods for error information. Retry policy lives with
//! the callers: the physical layer reports one-shot outcomes, the data-link
//! layer retries a bounded number of times, and everything above sees a typed
//! error rather than a crash.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for TP-UART operations.
pub type Result<T> = core::result::Result<T, TpuartError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Physical-layer error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum PhysicalErrorKind {
    /// Transport or timer failed to initialize
    Init,
    /// No byte accepted or received within the timeout budget
    Timeout,
    /// Caller supplied an invalid or unsupported service request
    Request,
    /// Bytes arrived but none matched what was awaited
    Response,
    /// The peer explicitly reported delivery failure
    DataConfirmFailed,
    /// Operation not valid in the current device state
    State,
}

/// Data-link error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum LinkErrorKind {
    /// Initialization retries exhausted
    Init,
    /// The physical layer timed out
    Timeout,
    /// The peer reported delivery failure for the whole frame
    DataConfirmFailed,
    /// Malformed length, bad format bits, or checksum mismatch
    Frame,
    /// Frame not addressed to this node
    Address,
    /// Frame valid but this node is in busy mode
    Busy,
}

/// Queue error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum QueueErrorKind {
    /// Message larger than the free space left in the buffer
    Full,
    /// Destination buffer smaller than the next complete message
    TooSmall,
    /// Message has no `\n` terminator
    MissingTerminator,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidIndividualAddress,
    InvalidGroupAddress,
    OutOfRange,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    InitFailed,
}

/// Text formatting error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum FormatErrorKind {
    InvalidHexDigit,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// TP-UART stack error type.
///
/// This is the main error type returned by all operations in this crate.
/// It contains a backtrace (when the std feature is enabled) and detailed
/// error information through helper methods.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TpuartError {
    /// Physical-layer errors (request/response, timeouts, device state)
    Physical(PhysicalError),
    /// Data-link errors (frame validation, addressing, busy mode)
    Link(LinkError),
    /// Message-queue errors (overflow, undersized drain buffer)
    Queue(QueueError),
    /// Addressing errors (invalid address format, out of range)
    Addressing(AddressingError),
    /// Transport capability errors
    Transport(TransportError),
    /// Text/hex formatting errors
    Format(FormatError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Physical-layer error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalError {
    kind: PhysicalErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl PhysicalError {
    pub(crate) fn new(kind: PhysicalErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, PhysicalErrorKind::Timeout)
    }

    /// Check if a response arrived but did not match
    pub fn is_response(&self) -> bool {
        matches!(self.kind, PhysicalErrorKind::Response)
    }

    /// Check if the peer reported delivery failure
    pub fn is_data_confirm_failed(&self) -> bool {
        matches!(self.kind, PhysicalErrorKind::DataConfirmFailed)
    }
}

/// Data-link error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkError {
    kind: LinkErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl LinkError {
    pub(crate) fn new(kind: LinkErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if this is a frame validation error
    pub fn is_frame(&self) -> bool {
        matches!(self.kind, LinkErrorKind::Frame)
    }

    /// Check if the frame was addressed to another node
    pub fn is_address(&self) -> bool {
        matches!(self.kind, LinkErrorKind::Address)
    }

    /// Check if the node rejected a valid frame while busy
    pub fn is_busy(&self) -> bool {
        matches!(self.kind, LinkErrorKind::Busy)
    }
}

/// Queue error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueError {
    kind: QueueErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl QueueError {
    pub(crate) fn new(kind: QueueErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the queue had no room for the message
    pub fn is_full(&self) -> bool {
        matches!(self.kind, QueueErrorKind::Full)
    }

    /// Check if the drain buffer was too small
    pub fn is_too_small(&self) -> bool {
        matches!(self.kind, QueueErrorKind::TooSmall)
    }
}

/// Addressing error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressingError {
    kind: AddressingErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl AddressingError {
    pub(crate) fn new(kind: AddressingErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if address is out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }
}

/// Transport error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportError {
    kind: TransportErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl TransportError {
    pub(crate) fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }
}

/// Text formatting error with optional backtrace
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FormatError {
    kind: FormatErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl FormatError {
    pub(crate) fn new(kind: FormatErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }
}

// =============================================================================
// Convenience Constructors for TpuartError
// =============================================================================

impl TpuartError {
    // Physical-layer errors
    pub(crate) fn phy_init() -> Self {
        Self::Physical(PhysicalError::new(PhysicalErrorKind::Init))
    }

    pub(crate) fn timeout() -> Self {
        Self::Physical(PhysicalError::new(PhysicalErrorKind::Timeout))
    }

    pub(crate) fn request() -> Self {
        Self::Physical(PhysicalError::new(PhysicalErrorKind::Request))
    }

    pub(crate) fn response() -> Self {
        Self::Physical(PhysicalError::new(PhysicalErrorKind::Response))
    }

    pub(crate) fn data_confirm_failed() -> Self {
        Self::Physical(PhysicalError::new(PhysicalErrorKind::DataConfirmFailed))
    }

    pub(crate) fn invalid_state() -> Self {
        Self::Physical(PhysicalError::new(PhysicalErrorKind::State))
    }

    // Data-link errors
    pub(crate) fn link_init() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::Init))
    }

    pub(crate) fn link_timeout() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::Timeout))
    }

    pub(crate) fn link_confirm_failed() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::DataConfirmFailed))
    }

    pub(crate) fn frame_error() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::Frame))
    }

    pub(crate) fn address_error() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::Address))
    }

    pub(crate) fn busy() -> Self {
        Self::Link(LinkError::new(LinkErrorKind::Busy))
    }

    // Queue errors
    pub(crate) fn queue_full() -> Self {
        Self::Queue(QueueError::new(QueueErrorKind::Full))
    }

    pub(crate) fn queue_too_small() -> Self {
        Self::Queue(QueueError::new(QueueErrorKind::TooSmall))
    }

    pub(crate) fn missing_terminator() -> Self {
        Self::Queue(QueueError::new(QueueErrorKind::MissingTerminator))
    }

    // Addressing errors
    pub(crate) fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidIndividualAddress,
        ))
    }

    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidGroupAddress,
        ))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    // Transport errors
    pub(crate) fn transport_init() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::InitFailed))
    }

    // Formatting errors
    pub(crate) fn invalid_hex_digit() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::InvalidHexDigit))
    }
}

// =============================================================================
// Top-level helpers
// =============================================================================

impl TpuartError {
    /// Check if this is a timeout at either layer.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Physical(e) => matches!(e.kind, PhysicalErrorKind::Timeout),
            Self::Link(e) => matches!(e.kind, LinkErrorKind::Timeout),
            _ => false,
        }
    }

    /// Check if the peer explicitly reported delivery failure.
    pub fn is_data_confirm_failed(&self) -> bool {
        match self {
            Self::Physical(e) => matches!(e.kind, PhysicalErrorKind::DataConfirmFailed),
            Self::Link(e) => matches!(e.kind, LinkErrorKind::DataConfirmFailed),
            _ => false,
        }
    }

    /// Check if this is an initialization failure at any layer.
    pub fn is_init(&self) -> bool {
        match self {
            Self::Physical(e) => matches!(e.kind, PhysicalErrorKind::Init),
            Self::Link(e) => matches!(e.kind, LinkErrorKind::Init),
            Self::Transport(e) => matches!(e.kind, TransportErrorKind::InitFailed),
            _ => false,
        }
    }

    /// Check if a response arrived but did not match what was awaited.
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Physical(e) if matches!(e.kind, PhysicalErrorKind::Response))
    }

    /// Check if the caller supplied an invalid service request.
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Physical(e) if matches!(e.kind, PhysicalErrorKind::Request))
    }

    /// Check if a received frame failed validation.
    pub fn is_frame_error(&self) -> bool {
        matches!(self, Self::Link(e) if matches!(e.kind, LinkErrorKind::Frame))
    }

    /// Check if a received frame was addressed to another node.
    pub fn is_address_error(&self) -> bool {
        matches!(self, Self::Link(e) if matches!(e.kind, LinkErrorKind::Address))
    }

    /// Check if a valid frame was rejected because this node is busy.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Link(e) if matches!(e.kind, LinkErrorKind::Busy))
    }

    /// Check if the queue rejected a message for lack of space.
    pub fn is_queue_full(&self) -> bool {
        matches!(self, Self::Queue(e) if matches!(e.kind, QueueErrorKind::Full))
    }

    /// Check if a drain buffer was smaller than the next message.
    pub fn is_queue_too_small(&self) -> bool {
        matches!(self, Self::Queue(e) if matches!(e.kind, QueueErrorKind::TooSmall))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for TpuartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TpuartError::Physical(e) => write!(f, "Physical layer error: {:?}", e.kind),
            TpuartError::Link(e) => write!(f, "Data link error: {:?}", e.kind),
            TpuartError::Queue(e) => write!(f, "Queue error: {:?}", e.kind),
            TpuartError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            TpuartError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            TpuartError::Format(e) => write!(f, "Format error: {:?}", e.kind),
        }
    }
}

// Implement std::error::Error for std-based applications
#[cfg(feature = "std")]
impl std::error::Error for TpuartError {}
