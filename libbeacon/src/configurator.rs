//! Turns an [`AdvertisingPolicy`] into radio parameters and registers the set.

use crate::error::{BeaconError, ConfigError};
use crate::payload::AdvertisingPayload;
use crate::policy::{AdvertisingPolicy, FilterPolicy, Limit};
use crate::radio::{AdvertisingHandle, RadioService, TerminationReason};

/// Connection configuration the radio stack was enabled with.
pub const APP_CONN_CFG_TAG: u8 = 1;

pub const INTERVAL_MIN_MS: u32 = 100;
pub const INTERVAL_MAX_MS: u32 = 10_240;

const TIMEOUT_UNIT_MS: u32 = 10;
const TIMEOUT_MAX_UNITS: u32 = u16::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingKind {
    NonconnectableNonscannableUndirected,
    /// Non-connectable, but answers scan requests with a static scan response.
    NonconnectableScannableUndirected,
}

/// A validated policy, in the units the radio works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingParams {
    /// 0.625 ms units.
    pub interval: u32,
    /// 10 ms units, 0 means no timeout.
    pub timeout: u16,
    /// 0 means no limit.
    pub max_events: u8,
    pub filter_policy: FilterPolicy,
    pub kind: AdvertisingKind,
}

impl AdvertisingParams {
    pub fn from_policy(policy: &AdvertisingPolicy) -> Result<Self, ConfigError> {
        if policy.connectable {
            return Err(ConfigError::ConnectableUnsupported);
        }

        if !(INTERVAL_MIN_MS..=INTERVAL_MAX_MS).contains(&policy.interval_ms) {
            return Err(ConfigError::IntervalOutOfRange(policy.interval_ms));
        }
        // ms -> 0.625 ms, rounded to the nearest unit
        let interval = (policy.interval_ms * 8 + 2) / 5;

        // Rounded up, so the radio never stops before the requested duration.
        let timeout = match policy.duration_limit_ms {
            Limit::Unlimited => 0,
            Limit::Finite(ms) => {
                let units = ms.div_ceil(TIMEOUT_UNIT_MS);
                if units == 0 || units > TIMEOUT_MAX_UNITS {
                    return Err(ConfigError::DurationOutOfRange(ms));
                }
                units as u16
            }
        };

        let max_events = match policy.max_events {
            Limit::Unlimited => 0,
            Limit::Finite(count) => match u8::try_from(count) {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::EventCountOutOfRange(count)),
            },
        };

        let kind = if policy.scannable {
            AdvertisingKind::NonconnectableScannableUndirected
        } else {
            AdvertisingKind::NonconnectableNonscannableUndirected
        };

        Ok(Self {
            interval,
            timeout,
            max_events,
            filter_policy: policy.filter_policy,
            kind,
        })
    }

    pub const fn interval_us(&self) -> u32 {
        self.interval * 625
    }

    pub const fn timeout_ms(&self) -> Option<u32> {
        match self.timeout {
            0 => None,
            units => Some(units as u32 * TIMEOUT_UNIT_MS),
        }
    }

    pub const fn max_events(&self) -> Option<u8> {
        match self.max_events {
            0 => None,
            n => Some(n),
        }
    }

    /// The policy as the radio applies it, after rounding to radio units.
    pub const fn effective_policy(&self) -> AdvertisingPolicy {
        AdvertisingPolicy {
            interval_ms: self.interval * 5 / 8,
            duration_limit_ms: match self.timeout_ms() {
                Some(ms) => Limit::Finite(ms),
                None => Limit::Unlimited,
            },
            max_events: match self.max_events() {
                Some(n) => Limit::Finite(n as u32),
                None => Limit::Unlimited,
            },
            filter_policy: self.filter_policy,
            connectable: false,
            scannable: matches!(self.kind, AdvertisingKind::NonconnectableScannableUndirected),
        }
    }

    /// Recovers why a set stopped from how long it ran, for radios that report
    /// the timeout and the event limit the same way.
    pub fn classify_termination(&self, elapsed_ms: u64) -> TerminationReason {
        match (self.timeout_ms(), self.max_events()) {
            (Some(timeout), Some(_)) if elapsed_ms < u64::from(timeout) => {
                TerminationReason::LimitReached
            }
            (Some(_), _) => TerminationReason::Timeout,
            (None, Some(_)) => TerminationReason::LimitReached,
            (None, None) => TerminationReason::PeerTeardown,
        }
    }

    /// Best guess of the advertising events sent before the set stopped after `elapsed_ms`.
    pub fn completed_events(&self, elapsed_ms: u64) -> u8 {
        if let (TerminationReason::LimitReached, Some(max)) =
            (self.classify_termination(elapsed_ms), self.max_events())
        {
            return max;
        }
        // One event at the start of every interval that began before the end.
        let interval_us = u64::from(self.interval_us());
        let sent = (elapsed_ms * 1000).div_ceil(interval_us);
        sent.min(u64::from(u8::MAX)) as u8
    }
}

/// Everything the radio needs to advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingSet<'a> {
    pub adv_data: &'a AdvertisingPayload,
    pub scan_data: Option<&'a AdvertisingPayload>,
    pub params: AdvertisingParams,
}

impl<'a> AdvertisingSet<'a> {
    pub fn new(
        adv_data: &'a AdvertisingPayload,
        scan_data: Option<&'a AdvertisingPayload>,
        policy: &AdvertisingPolicy,
    ) -> Result<Self, ConfigError> {
        let params = AdvertisingParams::from_policy(policy)?;

        let has_scan_data = scan_data.is_some_and(|s| !s.is_empty());
        if has_scan_data != policy.scannable {
            return Err(ConfigError::ScanResponseMismatch);
        }

        Ok(Self {
            adv_data,
            scan_data,
            params,
        })
    }
}

/// Validates the policy and registers the set. A rejection is not retried.
pub fn configure<R: RadioService>(
    radio: &mut R,
    adv_data: &AdvertisingPayload,
    scan_data: Option<&AdvertisingPayload>,
    policy: &AdvertisingPolicy,
) -> Result<AdvertisingHandle, BeaconError> {
    let set = AdvertisingSet::new(adv_data, scan_data, policy)?;

    #[cfg(feature = "defmt")]
    {
        defmt::info!("Configuring advertising set: {:?}", set.params);
        if !policy.self_terminates() {
            defmt::warn!("No duration or event limit, advertising never stops");
        }
    }

    radio.configure_advertising_set(&set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{flags, PayloadBuilder};

    const ADV: AdvertisingPayload = PayloadBuilder::new()
        .flags(flags::LE_ONLY_GENERAL_DISC_MODE)
        .short_name(b"beacon")
        .build();
    const SCAN: AdvertisingPayload = PayloadBuilder::new()
        .complete_name(b"Caravana 125")
        .build();

    #[test]
    fn converts_policy_into_radio_units() {
        let policy = AdvertisingPolicy::new(100)
            .with_duration_limit(4000)
            .with_max_events(3);
        let params = AdvertisingParams::from_policy(&policy).unwrap();

        assert_eq!(params.interval, 160);
        assert_eq!(params.interval_us(), 100_000);
        assert_eq!(params.timeout, 400);
        assert_eq!(params.timeout_ms(), Some(4000));
        assert_eq!(params.max_events(), Some(3));
        assert_eq!(
            params.kind,
            AdvertisingKind::NonconnectableNonscannableUndirected
        );
    }

    #[test]
    fn interval_rounds_to_the_nearest_unit() {
        let params = |ms| AdvertisingParams::from_policy(&AdvertisingPolicy::new(ms)).unwrap();
        // 101 ms is 161.6 units
        assert_eq!(params(101).interval, 162);
        // 102 ms is 163.2 units
        assert_eq!(params(102).interval, 163);
        assert_eq!(params(10_240).interval, 0x4000);
    }

    #[test]
    fn effective_policy_keeps_the_rounded_limits() {
        let policy = AdvertisingPolicy::new(100)
            .with_duration_limit(4001)
            .with_max_events(7);
        let effective = AdvertisingParams::from_policy(&policy)
            .unwrap()
            .effective_policy();

        assert_eq!(effective.interval_ms, 100);
        assert_eq!(effective.duration_limit_ms, Limit::Finite(4010));
        assert_eq!(effective.max_events, Limit::Finite(7));
        assert!(effective.self_terminates());

        let unlimited = AdvertisingParams::from_policy(&AdvertisingPolicy::new(100))
            .unwrap()
            .effective_policy();
        assert!(!unlimited.self_terminates());
    }

    #[test]
    fn unlimited_policy_maps_to_zero() {
        let params = AdvertisingParams::from_policy(&AdvertisingPolicy::new(10_240)).unwrap();
        assert_eq!(params.interval, 0x4000);
        assert_eq!(params.timeout_ms(), None);
        assert_eq!(params.max_events(), None);
    }

    #[test]
    fn duration_is_rounded_up_to_radio_units() {
        let params =
            AdvertisingParams::from_policy(&AdvertisingPolicy::new(100).with_duration_limit(4001))
                .unwrap();
        assert_eq!(params.timeout, 401);
        assert!(params.timeout_ms().unwrap() >= 4001);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let check = |policy: AdvertisingPolicy| AdvertisingParams::from_policy(&policy).unwrap_err();

        assert_eq!(
            check(AdvertisingPolicy::new(99)),
            ConfigError::IntervalOutOfRange(99)
        );
        assert_eq!(
            check(AdvertisingPolicy::new(10_241)),
            ConfigError::IntervalOutOfRange(10_241)
        );
        assert_eq!(
            check(AdvertisingPolicy::new(100).with_duration_limit(0)),
            ConfigError::DurationOutOfRange(0)
        );
        assert_eq!(
            check(AdvertisingPolicy::new(100).with_duration_limit(655_351)),
            ConfigError::DurationOutOfRange(655_351)
        );
        assert_eq!(
            check(AdvertisingPolicy::new(100).with_max_events(0)),
            ConfigError::EventCountOutOfRange(0)
        );
        assert_eq!(
            check(AdvertisingPolicy::new(100).with_max_events(256)),
            ConfigError::EventCountOutOfRange(256)
        );
        assert_eq!(
            check(AdvertisingPolicy {
                connectable: true,
                ..AdvertisingPolicy::new(100)
            }),
            ConfigError::ConnectableUnsupported
        );
    }

    #[test]
    fn scan_response_must_match_policy() {
        let plain = AdvertisingPolicy::new(100);
        let scannable = plain.scannable();

        assert!(AdvertisingSet::new(&ADV, None, &plain).is_ok());
        assert_eq!(
            AdvertisingSet::new(&ADV, Some(&SCAN), &plain),
            Err(ConfigError::ScanResponseMismatch)
        );
        assert_eq!(
            AdvertisingSet::new(&ADV, None, &scannable),
            Err(ConfigError::ScanResponseMismatch)
        );

        let set = AdvertisingSet::new(&ADV, Some(&SCAN), &scannable).unwrap();
        assert_eq!(
            set.params.kind,
            AdvertisingKind::NonconnectableScannableUndirected
        );
    }

    #[test]
    fn classifies_termination_from_elapsed_time() {
        let both = AdvertisingParams::from_policy(
            &AdvertisingPolicy::new(100)
                .with_duration_limit(4000)
                .with_max_events(5),
        )
        .unwrap();
        assert_eq!(both.classify_termination(500), TerminationReason::LimitReached);
        assert_eq!(both.classify_termination(4000), TerminationReason::Timeout);

        let duration_only =
            AdvertisingParams::from_policy(&AdvertisingPolicy::new(100).with_duration_limit(4000))
                .unwrap();
        assert_eq!(
            duration_only.classify_termination(3990),
            TerminationReason::Timeout
        );

        let events_only =
            AdvertisingParams::from_policy(&AdvertisingPolicy::new(100).with_max_events(5))
                .unwrap();
        assert_eq!(
            events_only.classify_termination(10_000),
            TerminationReason::LimitReached
        );
    }

    #[test]
    fn estimates_completed_events() {
        let duration_only =
            AdvertisingParams::from_policy(&AdvertisingPolicy::new(100).with_duration_limit(4000))
                .unwrap();
        assert_eq!(duration_only.completed_events(4000), 40);

        let both = AdvertisingParams::from_policy(
            &AdvertisingPolicy::new(100)
                .with_duration_limit(4000)
                .with_max_events(5),
        )
        .unwrap();
        assert_eq!(both.completed_events(400), 5);

        let long = AdvertisingParams::from_policy(&AdvertisingPolicy::new(100)).unwrap();
        assert_eq!(long.completed_events(3_600_000), u8::MAX);
    }
}
