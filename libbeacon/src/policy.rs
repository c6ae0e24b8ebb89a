use crate::radio::TerminationReason;

/// A bound that may be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Limit<T> {
    Unlimited,
    Finite(T),
}

impl<T: Copy> Limit<T> {
    pub const fn is_finite(&self) -> bool {
        matches!(self, Limit::Finite(_))
    }

    pub fn finite(&self) -> Option<T> {
        match self {
            Limit::Finite(v) => Some(*v),
            Limit::Unlimited => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterPolicy {
    /// Accept scan requests from any device.
    #[default]
    Any,
}

/// How the beacon advertises. Built once from constants, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingPolicy {
    pub interval_ms: u32,
    /// Advertising stops once this much time has passed.
    pub duration_limit_ms: Limit<u32>,
    /// Advertising stops after this many advertising events.
    pub max_events: Limit<u32>,
    pub filter_policy: FilterPolicy,
    pub connectable: bool,
    pub scannable: bool,
}

impl AdvertisingPolicy {
    /// Non-connectable, non-scannable advertising that never stops on its own.
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            duration_limit_ms: Limit::Unlimited,
            max_events: Limit::Unlimited,
            filter_policy: FilterPolicy::Any,
            connectable: false,
            scannable: false,
        }
    }

    pub const fn with_duration_limit(self, duration_ms: u32) -> Self {
        Self {
            duration_limit_ms: Limit::Finite(duration_ms),
            ..self
        }
    }

    pub const fn with_max_events(self, max_events: u32) -> Self {
        Self {
            max_events: Limit::Finite(max_events),
            ..self
        }
    }

    pub const fn scannable(self) -> Self {
        Self {
            scannable: true,
            ..self
        }
    }

    /// False when neither the duration nor the event count is bounded.
    pub const fn self_terminates(&self) -> bool {
        self.duration_limit_ms.is_finite() || self.max_events.is_finite()
    }

    /// Checks both limits after `completed_events` events and `elapsed_ms` of advertising.
    /// Whichever limit is hit first ends advertising.
    pub fn termination(&self, elapsed_ms: u64, completed_events: u32) -> Option<TerminationReason> {
        if let Limit::Finite(max) = self.max_events {
            if completed_events >= max {
                return Some(TerminationReason::LimitReached);
            }
        }
        if let Limit::Finite(duration) = self.duration_limit_ms {
            if elapsed_ms >= u64::from(duration) {
                return Some(TerminationReason::Timeout);
            }
        }
        None
    }
}
