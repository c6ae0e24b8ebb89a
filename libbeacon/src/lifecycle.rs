//! Advertising lifecycle.
//!
//! ```text
//! Uninitialized --configure--> Configured --start--> Advertising
//!     --SetTerminated--> Terminated --enter_low_power--> Sleeping
//! ```
//!
//! The reaction to radio events is the pure [`transition`] function; [`Beacon`]
//! owns the state together with the collaborators and carries out its effects.

use crate::configurator::{self, APP_CONN_CFG_TAG};
use crate::error::{BeaconError, ConfigError, Service};
use crate::indication::{Indication, Indicator};
use crate::payload::AdvertisingPayload;
use crate::policy::AdvertisingPolicy;
use crate::power::{Platform, PowerStateManager};
use crate::radio::{AdvertisingHandle, RadioEvent, RadioService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    Uninitialized,
    Configured,
    Advertising,
    Terminated,
    Sleeping,
}

/// What the beacon has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    EnterLowPower,
    Halt(BeaconError),
}

/// Reaction to a radio event. Only the first termination while advertising
/// leads to a power-down; anything after it is dropped.
pub fn transition(state: LifecycleState, event: &RadioEvent) -> (LifecycleState, Option<Effect>) {
    match (state, event) {
        (LifecycleState::Advertising, RadioEvent::SetTerminated { .. }) => {
            (LifecycleState::Terminated, Some(Effect::EnterLowPower))
        }
        (LifecycleState::Advertising, RadioEvent::StartFailed { .. }) => (
            state,
            Some(Effect::Halt(BeaconError::ServiceUnavailable(Service::Radio))),
        ),
        _ => (state, None),
    }
}

/// The beacon context: lifecycle state, advertising handle and the services it drives.
pub struct Beacon<R, I, P> {
    state: LifecycleState,
    handle: Option<AdvertisingHandle>,
    radio: R,
    indicator: I,
    power: PowerStateManager<P>,
}

impl<R, I, P> Beacon<R, I, P>
where
    R: RadioService,
    I: Indicator,
    P: Platform,
{
    pub fn new(radio: R, indicator: I, power: PowerStateManager<P>) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            handle: None,
            radio,
            indicator,
            power,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn handle(&self) -> Option<AdvertisingHandle> {
        self.handle
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn power(&self) -> &PowerStateManager<P> {
        &self.power
    }

    /// Registers the advertising set. Only allowed once.
    pub fn configure(
        &mut self,
        adv_data: &AdvertisingPayload,
        scan_data: Option<&AdvertisingPayload>,
        policy: &AdvertisingPolicy,
    ) -> Result<AdvertisingHandle, BeaconError> {
        if self.state != LifecycleState::Uninitialized {
            return Err(ConfigError::AlreadyConfigured.into());
        }

        let handle = configurator::configure(&mut self.radio, adv_data, scan_data, policy)?;
        self.handle = Some(handle);
        self.state = LifecycleState::Configured;
        self.indicator.set_indication(Indication::Idle);

        Ok(handle)
    }

    /// Starts broadcasting the configured set. Only allowed once.
    pub fn start(&mut self) -> Result<(), BeaconError> {
        let handle = match (self.state, self.handle) {
            (LifecycleState::Configured, Some(handle)) => handle,
            (LifecycleState::Uninitialized, _) => return Err(ConfigError::NotConfigured.into()),
            _ => return Err(ConfigError::AlreadyStarted.into()),
        };

        self.radio.start_advertising(handle, APP_CONN_CFG_TAG)?;
        self.state = LifecycleState::Advertising;
        self.indicator.set_indication(Indication::Advertising);

        #[cfg(feature = "defmt")]
        defmt::info!("Advertising started on handle {}", handle.raw());

        Ok(())
    }

    /// Feeds one radio event through the state machine and performs the resulting effect.
    pub fn handle_event(&mut self, event: RadioEvent) -> Result<LifecycleState, BeaconError> {
        if let RadioEvent::SetTerminated { handle, .. } = event {
            if Some(handle) != self.handle {
                #[cfg(feature = "defmt")]
                defmt::warn!("Termination for unknown handle {}", handle.raw());
                return Ok(self.state);
            }
        }

        let (next, effect) = transition(self.state, &event);

        #[cfg(feature = "defmt")]
        match event {
            RadioEvent::SetTerminated { reason, completed_events, .. } if effect.is_some() => {
                defmt::info!(
                    "Advertising terminated ({:?}) after {} events",
                    reason,
                    completed_events
                )
            }
            RadioEvent::SetTerminated { .. } => {
                defmt::warn!("Ignoring termination in state {:?}", self.state)
            }
            RadioEvent::ScanRequest => defmt::trace!("Scan request"),
            RadioEvent::StartFailed { code } => defmt::error!("Advertising failed to start: {}", code),
        }

        self.state = next;
        match effect {
            Some(Effect::EnterLowPower) => {
                self.indicator.set_indication(Indication::Off);
                self.power.enter_low_power()?;
                self.state = LifecycleState::Sleeping;
            }
            Some(Effect::Halt(e)) => return Err(e),
            None => {}
        }

        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::TerminationReason;

    const TERMINATED: RadioEvent = RadioEvent::SetTerminated {
        handle: AdvertisingHandle::new(0),
        reason: TerminationReason::Timeout,
        completed_events: 40,
    };

    #[test]
    fn termination_while_advertising_powers_down() {
        assert_eq!(
            transition(LifecycleState::Advertising, &TERMINATED),
            (LifecycleState::Terminated, Some(Effect::EnterLowPower))
        );
    }

    #[test]
    fn repeated_termination_is_ignored() {
        for state in [LifecycleState::Terminated, LifecycleState::Sleeping] {
            assert_eq!(transition(state, &TERMINATED), (state, None));
        }
    }

    #[test]
    fn termination_before_start_is_ignored() {
        for state in [LifecycleState::Uninitialized, LifecycleState::Configured] {
            assert_eq!(transition(state, &TERMINATED), (state, None));
        }
    }

    #[test]
    fn scan_requests_do_not_change_state() {
        assert_eq!(
            transition(LifecycleState::Advertising, &RadioEvent::ScanRequest),
            (LifecycleState::Advertising, None)
        );
    }

    #[test]
    fn late_start_failure_halts() {
        assert_eq!(
            transition(
                LifecycleState::Advertising,
                &RadioEvent::StartFailed { code: 7 }
            ),
            (
                LifecycleState::Advertising,
                Some(Effect::Halt(BeaconError::ServiceUnavailable(Service::Radio)))
            )
        );
    }
}
