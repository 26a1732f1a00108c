//! TP-UART protocol implementation.
//!
//! This module contains the wire constants, the link-frame codec, the
//! physical-layer state machine and the data-link layer built on top of it.

pub mod constants;
pub mod frame;
pub mod link;
pub mod physical;

pub use constants::*;
pub use frame::*;
pub use link::*;
pub use physical::*;
