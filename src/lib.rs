#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

//! # knx-tpuart
//!
//! TP-UART data link and physical layer stack for the KNX twisted-pair bus.
//!
//! This crate provides a `no_std` implementation of the byte-serial
//! protocol spoken with a TP-UART-style bus controller: the physical
//! service layer (device state, timeout-bounded request/response, the
//! segmented frame-send protocol) and the data-link layer above it
//! (addressed frames with vertical-parity checksums and ACK/NACK/BUSY
//! acknowledgment), together with the monotonic timer primitive and the
//! interrupt-safe diagnostic message queue they rely on.
//!
//! ## Features
//!
//! - Physical-layer state machine with one-shot request/response services
//! - Segmented frame transmission with data-confirm classification
//! - Frame codec with checksum and destination-address validation
//! - Wraparound-safe timeout arithmetic over a tick counter
//! - Lock-protected message queue for ISR-to-task diagnostic hand-off
//! - Transport trait with a mock implementation for hardware-free tests
//!
//! ## Example
//!
//! ```rust
//! use knx_tpuart::configuration::LinkConfig;
//! use knx_tpuart::protocol::link::DataLink;
//! use knx_tpuart::protocol::physical::PhysicalLayer;
//! use knx_tpuart::timer::Timer;
//! use knx_tpuart::transport::MockTransport;
//!
//! let timer = Timer::new();
//! let mut transport = MockTransport::new().with_timer(&timer);
//! transport.queue_bytes(&[0x03, 0x07]); // reset + state indications
//!
//! let phy = PhysicalLayer::new(&timer, transport);
//! let mut link = DataLink::new(phy, LinkConfig::default());
//! link.init().unwrap();
//! ```

pub mod addressing;
pub mod configuration;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod queue;
pub mod text;
pub mod timer;
pub mod transport;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use configuration::LinkConfig;
#[doc(inline)]
pub use error::{Result, TpuartError};
#[doc(inline)]
pub use protocol::link::{DataLink, Destination, LinkInput, LinkState};
#[doc(inline)]
pub use protocol::physical::{PhyState, PhysicalLayer};
#[doc(inline)]
pub use queue::MessageQueue;
#[doc(inline)]
pub use timer::{Deadline, Timer};
#[doc(inline)]
pub use transport::{MockTransport, RecvPoll, SendPoll, Transport};
