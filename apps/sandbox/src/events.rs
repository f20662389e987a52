//! Payloads exchanged by sandbox entities.

use ember_event_bus::OwnerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeverPulled {
    pub lever: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorOpened {
    pub door: OwnerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerChanged {
    pub online: bool,
    pub output: u32,
}

/// Negative amounts are a scripting error and are rejected by listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Damage {
    pub amount: i32,
}
