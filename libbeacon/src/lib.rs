#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod configurator;
pub mod error;
pub mod indication;
pub mod lifecycle;
pub mod payload;
pub mod policy;
pub mod power;
pub mod radio;

pub use configurator::{AdvertisingKind, AdvertisingParams, AdvertisingSet};
pub use error::{BeaconError, ConfigError, Service};
pub use indication::{Indication, Indicator};
pub use lifecycle::{Beacon, Effect, LifecycleState};
pub use payload::{AdRecord, AdvertisingPayload, BeaconInfo, PayloadBuilder};
pub use policy::{AdvertisingPolicy, FilterPolicy, Limit};
pub use power::{Platform, PowerStateManager, Pull, Sense, WakeSource};
pub use radio::{AdvertisingHandle, RadioEvent, RadioService, TerminationReason};
