//! Turn indicator state with a timed auto-off.
use serde::{Deserialize, Serialize};

use crate::constants::TURN_SIGNAL_TICKS;

/// Indicator lamp state; the numeric code is the lever status reported in
/// telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnSignal {
    #[default]
    Disabled,
    Left,
    Right,
    Emergency,
}

impl TurnSignal {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Emergency => 3,
        }
    }

    /// Lever position: hazard lamps are switched separately from the lever.
    #[must_use]
    pub const fn lever_code(self) -> u8 {
        match self {
            Self::Emergency => 0,
            other => other.code(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indicator {
    signal: TurnSignal,
    countdown: u32,
}

impl Indicator {
    #[must_use]
    pub const fn signal(&self) -> TurnSignal {
        self.signal
    }

    /// Switch on `signal` for the next `TURN_SIGNAL_TICKS` ticks.
    pub fn enable(&mut self, signal: TurnSignal) {
        self.signal = signal;
        self.countdown = TURN_SIGNAL_TICKS;
    }

    /// Count down one tick, switching off when the countdown expires.
    pub fn tick(&mut self) {
        if self.countdown == 0 {
            return;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            self.signal = TurnSignal::Disabled;
        }
    }
}
