//! The radio stack as seen by the beacon.

use crate::configurator::AdvertisingSet;
use crate::error::BeaconError;

/// Identifies an advertising set registered with the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingHandle(u8);

impl AdvertisingHandle {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TerminationReason {
    /// The duration limit elapsed.
    Timeout,
    /// The maximum number of advertising events was sent.
    LimitReached,
    /// Advertising was torn down from the other side of the radio.
    PeerTeardown,
}

/// Events pushed by the radio, outside of the caller's own call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent {
    SetTerminated {
        handle: AdvertisingHandle,
        reason: TerminationReason,
        completed_events: u8,
    },
    /// A scanner asked for the scan response. Diagnostic only.
    ScanRequest,
    /// The radio refused to start the set after `start_advertising` returned.
    StartFailed { code: u32 },
}

pub trait RadioService {
    /// Registers an advertising set. The radio keeps its own copy of the data.
    fn configure_advertising_set(
        &mut self,
        set: &AdvertisingSet<'_>,
    ) -> Result<AdvertisingHandle, BeaconError>;

    fn start_advertising(
        &mut self,
        handle: AdvertisingHandle,
        conn_cfg_tag: u8,
    ) -> Result<(), BeaconError>;
}
