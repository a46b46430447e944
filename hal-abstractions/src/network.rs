//! Network join primitives
//!
//! The retry/escalation policy drives these primitives and never looks at the
//! transport underneath. A join that cannot succeed simply never reports
//! [`LinkStatus::Connected`]; implementors log their own errors.

use core::fmt;

/// Identity of an access point the radio has associated with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccessPoint {
    /// Radio channel the access point was found on
    pub channel: u8,
    /// Hardware address of the access point (BSSID)
    pub bssid: [u8; 6],
}

impl AccessPoint {
    /// Create a new access point identity
    pub const fn new(channel: u8, bssid: [u8; 6]) -> Self {
        Self { channel, bssid }
    }
}

impl fmt::Display for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bssid;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}@ch{}",
            b[0], b[1], b[2], b[3], b[4], b[5], self.channel
        )
    }
}

/// Link state sampled once per poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// Associated and ready for traffic
    Connected,
    /// Not (yet) associated
    Disconnected,
}

impl LinkStatus {
    /// Check if the link is up
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Radio power control and association primitives
#[allow(async_fn_in_trait)]
pub trait NetworkJoin {
    /// Power the radio subsystem up
    async fn power_on(&mut self);

    /// Power the radio subsystem fully down
    ///
    /// May be called again while already off; that call must be a no-op.
    async fn power_off(&mut self);

    /// Start association directly on a cached channel and BSSID, skipping the scan
    async fn join_fast(&mut self, access_point: AccessPoint);

    /// Start a discovery-based association
    async fn join_full(&mut self);

    /// Sample the current link state
    async fn status(&mut self) -> LinkStatus;

    /// Disconnect and drop the association
    async fn teardown(&mut self);

    /// Channel and BSSID of the current association, if any
    fn current_access_point(&mut self) -> Option<AccessPoint>;
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_access_point_display() {
        let ap = AccessPoint::new(6, [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(ap.to_string(), "de:ad:be:ef:00:01@ch6");
    }

    #[test]
    fn test_link_status() {
        assert!(LinkStatus::Connected.is_connected());
        assert!(!LinkStatus::Disconnected.is_connected());
    }
}
