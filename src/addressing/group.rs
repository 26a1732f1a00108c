//! KNX Group Address implementation.
//!
//! Group addresses identify logical communication groups on the bus, using
//! 3-level notation Main/Middle/Sub (e.g., 1/2/3):
//! - Main: 0-31 (5 bits)
//! - Middle: 0-7 (3 bits)
//! - Sub: 0-255 (8 bits)
//!
//! A frame whose address-type bit is set carries a group address in its
//! destination field.

use crate::error::{Result, TpuartError};
use core::fmt;

/// KNX Group Address (Main/Middle/Sub)
///
/// # Examples
///
/// ```
/// use knx_tpuart::addressing::GroupAddress;
///
/// let addr = GroupAddress::new(1, 2, 3).unwrap();
/// assert_eq!(addr.raw(), 0x0A03);
///
/// let addr: GroupAddress = "1/2/3".parse().unwrap();
/// assert_eq!(addr.sub(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;

    /// Create a new Group Address from 3-level components.
    ///
    /// # Errors
    ///
    /// Returns an out-of-range addressing error if main or middle exceeds
    /// its bit range.
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(TpuartError::address_out_of_range());
        }

        let raw = (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub);
        Ok(Self { raw })
    }

    /// Get the raw u16 representation of the address.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the main group (0-31).
    #[inline]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Get the middle group (0-7).
    #[inline]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Get the sub group (0-255).
    #[inline]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Big-endian octet pair as carried in the frame header.
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.raw.to_be_bytes()
    }

    /// Rebuild an address from the big-endian octet pair of a frame.
    #[inline]
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self {
            raw: u16::from_be_bytes(bytes),
        }
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl From<u16> for GroupAddress {
    #[inline]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl core::str::FromStr for GroupAddress {
    type Err = TpuartError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('/');

        let main = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(TpuartError::invalid_group_address)?;

        let middle = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(TpuartError::invalid_group_address)?;

        let sub = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(TpuartError::invalid_group_address)?;

        if parts.next().is_some() {
            return Err(TpuartError::invalid_group_address());
        }

        Self::new(main, middle, sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let addr = GroupAddress::new(1, 2, 3).unwrap();
        assert_eq!(addr.main(), 1);
        assert_eq!(addr.middle(), 2);
        assert_eq!(addr.sub(), 3);
        assert_eq!(addr.raw(), 0x0A03);
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(GroupAddress::new(32, 0, 0).is_err());
        assert!(GroupAddress::new(0, 8, 0).is_err());
    }

    #[test]
    fn test_wire_octets() {
        let addr = GroupAddress::new(4, 1, 10).unwrap();
        assert_eq!(addr.to_be_bytes(), [0x21, 0x0A]);
        assert_eq!(GroupAddress::from_be_bytes([0x21, 0x0A]), addr);
    }

    #[test]
    fn test_display() {
        let addr = GroupAddress::new(31, 7, 255).unwrap();
        assert_eq!(format!("{addr}"), "31/7/255");
    }

    #[test]
    fn test_from_str() {
        let addr: GroupAddress = "1/2/3".parse().unwrap();
        assert_eq!(addr.raw(), 0x0A03);

        assert!("1/2".parse::<GroupAddress>().is_err());
        assert!("32/0/0".parse::<GroupAddress>().is_err());
        assert!("1/2/3/4".parse::<GroupAddress>().is_err());
    }
}
