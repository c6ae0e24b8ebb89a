/// Services the beacon depends on at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Service {
    Radio,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Encoded advertising data does not fit in a legacy advertising PDU.
    PayloadTooLong(usize),
    /// A record's length byte points past the end of the buffer, or is zero.
    MalformedRecord(usize),
    /// Advertising interval outside of [100 ms, 10.24 s].
    IntervalOutOfRange(u32),
    DurationOutOfRange(u32),
    EventCountOutOfRange(u32),
    /// Only non-connectable advertising is supported.
    ConnectableUnsupported,
    /// Scannable advertising was requested without a scan response, or the other way around.
    ScanResponseMismatch,
    /// The radio has no free advertising set left.
    NoFreeSet,
    /// The wake source names a pin the chip does not have.
    InvalidWakePin(u8),
    /// Start was requested for a handle the radio does not know about.
    InvalidHandle,
    NotConfigured,
    AlreadyConfigured,
    AlreadyStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeaconError {
    Configuration(ConfigError),
    ServiceUnavailable(Service),
    /// The platform refused a power state transition. Carries the raw error code.
    HardwareFault(u32),
}

impl From<ConfigError> for BeaconError {
    fn from(e: ConfigError) -> Self {
        BeaconError::Configuration(e)
    }
}
