//! Unified logging macros for the TP-UART stack.
//!
//! This module provides a unified logging interface that automatically
//! selects between `defmt::` and `log::` based on the active feature flags,
//! and compiles to nothing when neither backend is enabled.
//!
//! # Usage
//!
//! ```rust,ignore
//! tp_log!(info, "physical layer initialized");
//! tp_log!(debug, "received {} bytes", n);
//! tp_log!(warn, "confirm timeout");
//! ```
//!
//! # Feature Flags
//!
//! - `defmt` - Uses `defmt::` (preferred on embedded targets)
//! - `log` - Uses the `log::` crate (host-side applications)
//! - neither - Statements compile away; format arguments are type-checked
//!   but never evaluated

/// Unified logging macro - selects defmt:: or log:: based on features.
///
/// Call sites use plain `{}` formatting only, which both backends accept.
#[macro_export]
#[cfg(feature = "defmt")]
macro_rules! tp_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(not(feature = "defmt"), feature = "log"))]
macro_rules! tp_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(not(feature = "defmt"), not(feature = "log")))]
macro_rules! tp_log {
    ($level:ident, $($arg:tt)*) => {{
        let _ = core::format_args!($($arg)*);
    }};
}
