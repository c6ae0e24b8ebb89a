/// What the status LEDs show. Observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indication {
    Idle,
    Advertising,
    Off,
}

pub trait Indicator {
    fn set_indication(&mut self, indication: Indication);
}
