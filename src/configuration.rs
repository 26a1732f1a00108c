//! Link configuration and `KEY=value` text parsing.
//!
//! Deployments carry their settings as a small text blob (baked in with
//! `include_str!` or received from a provisioning channel); missing or
//! malformed keys fall back to the defaults.

use crate::addressing::IndividualAddress;
use crate::protocol::constants::{BYTE_TIMEOUT, DEFAULT_TIMEOUT};

/// Default configuration text, to be replaced per deployment.
pub const CONFIG: &str = r"
LOCAL_ADDRESS=1.1.1
RETRY_LIMIT=10
DEFAULT_TIMEOUT_MS=2000
BYTE_TIMEOUT_MS=50
";

/// Configuration of the data-link layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Individual address of this node; stamped as the source of every
    /// outgoing frame and matched against incoming destinations.
    pub local_address: IndividualAddress,
    /// Bounded number of reset attempts during link initialization.
    pub retry_limit: u16,
    /// Timeout budget in timer ticks for request/response exchanges.
    pub default_timeout: u32,
    /// Per-byte receive timeout in timer ticks during frame reception.
    pub byte_timeout: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            local_address: IndividualAddress::from(0x1101),
            retry_limit: 10,
            default_timeout: DEFAULT_TIMEOUT,
            byte_timeout: BYTE_TIMEOUT,
        }
    }
}

impl LinkConfig {
    /// Parse a configuration from `KEY=value` lines.
    ///
    /// Unknown keys are ignored; missing or malformed values keep their
    /// defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use knx_tpuart::configuration::LinkConfig;
    ///
    /// let config = LinkConfig::parse("LOCAL_ADDRESS=1.1.5\nRETRY_LIMIT=3\n");
    /// assert_eq!(config.local_address.raw(), 0x1105);
    /// assert_eq!(config.retry_limit, 3);
    /// ```
    pub fn parse(text: &str) -> Self {
        let defaults = Self::default();

        let local_address = lookup(text, "LOCAL_ADDRESS=")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.local_address);

        let retry_limit = lookup(text, "RETRY_LIMIT=")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.retry_limit);

        let default_timeout = lookup(text, "DEFAULT_TIMEOUT_MS=")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_timeout);

        let byte_timeout = lookup(text, "BYTE_TIMEOUT_MS=")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.byte_timeout);

        Self {
            local_address,
            retry_limit,
            default_timeout,
            byte_timeout,
        }
    }
}

fn lookup<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with(key))
        .map(|line| &line[key.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.local_address.raw(), 0x1101);
        assert_eq!(config.retry_limit, 10);
        assert_eq!(config.default_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.byte_timeout, BYTE_TIMEOUT);
    }

    #[test]
    fn test_parse_builtin_config() {
        let config = LinkConfig::parse(CONFIG);
        assert_eq!(config.local_address.raw(), 0x1101);
        assert_eq!(config.retry_limit, 10);
    }

    #[test]
    fn test_parse_overrides() {
        let config = LinkConfig::parse(
            "LOCAL_ADDRESS=2.3.4\nRETRY_LIMIT=5\nDEFAULT_TIMEOUT_MS=100\nBYTE_TIMEOUT_MS=7\n",
        );
        assert_eq!(config.local_address.raw(), 0x2304);
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.default_timeout, 100);
        assert_eq!(config.byte_timeout, 7);
    }

    #[test]
    fn test_parse_malformed_value_falls_back() {
        let config = LinkConfig::parse("LOCAL_ADDRESS=not-an-address\nRETRY_LIMIT=many\n");
        assert_eq!(config.local_address.raw(), 0x1101);
        assert_eq!(config.retry_limit, 10);
    }
}
