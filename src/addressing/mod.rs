//! KNX addressing types.
//!
//! Individual addresses identify physical devices on the bus; group
//! addresses identify logical communication groups. Both are 16-bit values
//! carried big-endian in the frame header.

mod group;
mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;
