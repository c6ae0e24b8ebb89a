//! Power-down sequencing.

use crate::error::BeaconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Input level that wakes the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sense {
    Low,
    High,
}

/// The single pin allowed to bring the device back from the lowest power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeSource {
    pub pin: u8,
    pub pull: Pull,
    pub sense: Sense,
}

impl WakeSource {
    /// A button to ground: pulled up, wakes on the falling edge.
    pub const fn falling_edge(pin: u8) -> Self {
        Self {
            pin,
            pull: Pull::Up,
            sense: Sense::Low,
        }
    }
}

pub trait Platform {
    /// Releases every output the application drives.
    fn quiesce_outputs(&mut self);

    fn arm_wake_source(&mut self, wake: &WakeSource) -> Result<(), BeaconError>;

    /// Asks for the lowest power state. On hardware this only returns on failure;
    /// the device comes back through a reset.
    fn request_system_off(&mut self) -> Result<(), BeaconError>;
}

pub struct PowerStateManager<P> {
    platform: P,
    wake: WakeSource,
    requests: u32,
}

impl<P: Platform> PowerStateManager<P> {
    pub const fn new(platform: P, wake: WakeSource) -> Self {
        Self {
            platform,
            wake,
            requests: 0,
        }
    }

    /// Quiesces the outputs, arms the wake source and requests the lowest power state.
    pub fn enter_low_power(&mut self) -> Result<(), BeaconError> {
        self.platform.quiesce_outputs();
        self.platform.arm_wake_source(&self.wake)?;

        #[cfg(feature = "defmt")]
        defmt::info!("Entering system off, wake on pin {}", self.wake.pin);

        self.requests += 1;
        self.platform.request_system_off()
    }

    /// How many times the lowest power state was requested.
    pub fn requests(&self) -> u32 {
        self.requests
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}
