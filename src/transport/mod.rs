//! Byte-serial transport abstraction for the TP-UART interface.
//!
//! This module defines the `Transport` trait that abstracts the underlying
//! serial driver, enabling:
//! - Testability through a mock implementation
//! - Flexibility to support different UART peripherals
//! - Keeping register-level driver code out of the protocol layers
//!
//! ## Contract
//!
//! Both directions are strictly non-blocking and single-transfer: a call
//! either rejects immediately with `Busy` because a transfer of that
//! direction is already in flight (or no byte has arrived yet), or accepts
//! and completes asynchronously. Completion surfaces to the protocol layer
//! only through the physical layer's polled retry loops; the driver never
//! blocks the caller.

pub mod mock;

pub use mock::MockTransport;

use crate::error::Result;

/// Outcome of one non-blocking send poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendPoll {
    /// The byte was accepted for transmission.
    Accepted,
    /// A send transfer is already in flight; try again later.
    Busy,
    /// The driver reported a fault; the byte was not accepted.
    Error,
}

/// Outcome of one non-blocking receive poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecvPoll {
    /// One byte has arrived.
    Received(u8),
    /// No byte available yet, or a receive transfer is in flight.
    Busy,
    /// The driver reported a fault.
    Error,
}

/// Byte-serial transport capability.
///
/// Implementations wrap the actual UART peripheral; at most one send and
/// one receive transfer may be in flight at a time.
///
/// # Examples
///
/// ## Implementing for a custom driver
///
/// ```rust,no_run
/// use knx_tpuart::transport::{RecvPoll, SendPoll, Transport};
///
/// struct UartDriver {
///     // ... peripheral handle
/// }
///
/// impl Transport for UartDriver {
///     fn send(&mut self, byte: u8) -> SendPoll {
///         // Start a one-byte DMA/IRQ transfer, or report Busy
///         # let _ = byte;
///         SendPoll::Accepted
///     }
///
///     fn receive(&mut self) -> RecvPoll {
///         // Return the next byte the ISR captured, if any
///         RecvPoll::Busy
///     }
/// }
/// ```
pub trait Transport {
    /// Initialize the peripheral.
    ///
    /// Default implementation does nothing. Override if the driver needs
    /// explicit bring-up before moving bytes.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Try to hand one byte to the driver for transmission.
    fn send(&mut self, byte: u8) -> SendPoll;

    /// Try to take one received byte from the driver.
    fn receive(&mut self) -> RecvPoll;
}
