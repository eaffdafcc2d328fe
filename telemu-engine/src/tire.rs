//! Scripted rear tire blowout, roadside repair and recovery.
//!
//! The sequence runs for `REPLACE_TIRE_COUNTDOWN` ticks once triggered. The
//! countdown is decremented before the milestones are checked, so the first
//! tick after a break observes 235:
//!
//! | countdown  | effect                                     |
//! |------------|--------------------------------------------|
//! | 235..=180  | pressure drops linearly from 27 to 14      |
//! | 215        | stop is forced                             |
//! | 190        | driver door opens, seatbelt unfastened     |
//! | 180        | driver door closes                         |
//! | 165        | rear door unlocked                         |
//! | 100..=74   | pressure refilled back to 27               |
//! | 35         | rear door locked                           |
//! | 20         | driver door opens                          |
//! | 10         | driver door closes, seatbelt fastened      |
//! | 0          | sequence reset, stop released              |
use crate::constants::{
    FLAT_TIRE_PRESSURE, NOMINAL_TIRE_PRESSURE, REPLACE_TIRE_COUNTDOWN, TIRE_DOOR_CLOSED,
    TIRE_DOOR_OPEN, TIRE_DOOR_RECLOSED, TIRE_DOOR_REOPEN, TIRE_DROOP_END, TIRE_FORCE_STOP,
    TIRE_REFILL_END, TIRE_REFILL_START, TIRE_TRUNK_LOCKED, TIRE_TRUNK_UNLOCKED,
};

/// Change to the forced-stop flag requested by the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    Engage,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TireFailure {
    broken: bool,
    countdown: u32,
    pressure: f64,
    driver_door_ajar: bool,
    seatbelt_unfastened: bool,
    rear_door_unlocked: bool,
}

impl Default for TireFailure {
    fn default() -> Self {
        Self {
            broken: false,
            countdown: REPLACE_TIRE_COUNTDOWN,
            pressure: NOMINAL_TIRE_PRESSURE,
            driver_door_ajar: false,
            seatbelt_unfastened: false,
            rear_door_unlocked: false,
        }
    }
}

impl TireFailure {
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    #[must_use]
    pub const fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Rear-left pressure in psi.
    #[must_use]
    pub const fn pressure(&self) -> f64 {
        self.pressure
    }

    #[must_use]
    pub const fn driver_door_ajar(&self) -> bool {
        self.driver_door_ajar
    }

    /// Raw seatbelt sensor: set while the driver is out of the seat.
    #[must_use]
    pub const fn seatbelt_unfastened(&self) -> bool {
        self.seatbelt_unfastened
    }

    #[must_use]
    pub const fn rear_door_unlocked(&self) -> bool {
        self.rear_door_unlocked
    }

    /// Start the sequence. Refused while a failure is already running.
    pub fn try_break(&mut self) -> bool {
        if self.broken || self.countdown != REPLACE_TIRE_COUNTDOWN {
            return false;
        }
        self.broken = true;
        log::debug!("tire failure sequence started");
        true
    }

    /// Advance the sequence by one tick; no-op while intact.
    pub fn tick(&mut self) -> Option<StopRequest> {
        if !self.broken {
            return None;
        }
        self.countdown = self.countdown.saturating_sub(1);
        let countdown = self.countdown;
        let mut request = None;

        if countdown >= TIRE_DROOP_END {
            self.pressure -= droop_per_tick();
        }
        if countdown == TIRE_FORCE_STOP {
            log::debug!("tire failure forcing stop");
            request = Some(StopRequest::Engage);
        }
        if countdown == TIRE_DOOR_OPEN {
            self.driver_door_ajar = true;
            self.seatbelt_unfastened = true;
        }
        if countdown == TIRE_DOOR_CLOSED {
            self.driver_door_ajar = false;
        }
        if countdown == TIRE_TRUNK_UNLOCKED {
            self.rear_door_unlocked = true;
        }
        if (TIRE_REFILL_END..=TIRE_REFILL_START).contains(&countdown) {
            self.pressure += refill_per_tick().min(NOMINAL_TIRE_PRESSURE - self.pressure);
        }
        if countdown == TIRE_TRUNK_LOCKED {
            self.rear_door_unlocked = false;
        }
        if countdown == TIRE_DOOR_REOPEN {
            self.driver_door_ajar = true;
        }
        if countdown == TIRE_DOOR_RECLOSED {
            self.driver_door_ajar = false;
            self.seatbelt_unfastened = false;
        }
        if countdown == 0 {
            log::debug!("tire replaced");
            *self = Self::default();
            request = Some(StopRequest::Release);
        }
        request
    }
}

fn droop_per_tick() -> f64 {
    (NOMINAL_TIRE_PRESSURE - FLAT_TIRE_PRESSURE)
        / f64::from(REPLACE_TIRE_COUNTDOWN - TIRE_DROOP_END)
}

fn refill_per_tick() -> f64 {
    (NOMINAL_TIRE_PRESSURE - FLAT_TIRE_PRESSURE) / f64::from(TIRE_REFILL_START - TIRE_REFILL_END)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intact_tire_ignores_ticks() {
        let mut tire = TireFailure::default();
        assert_eq!(tire.tick(), None);
        assert_eq!(tire, TireFailure::default());
    }

    #[test]
    fn second_break_is_refused_without_resetting() {
        let mut tire = TireFailure::default();
        assert!(tire.try_break());
        tire.tick();
        tire.tick();
        assert!(!tire.try_break());
        assert_eq!(tire.countdown(), REPLACE_TIRE_COUNTDOWN - 2);
    }

    #[test]
    fn full_sequence_forces_then_releases_stop() {
        let mut tire = TireFailure::default();
        assert!(tire.try_break());
        let mut requests = Vec::new();
        let mut min_pressure = f64::MAX;
        for tick in 1..=REPLACE_TIRE_COUNTDOWN {
            if let Some(request) = tire.tick() {
                requests.push((tick, request));
            }
            min_pressure = min_pressure.min(tire.pressure());
            if tick == REPLACE_TIRE_COUNTDOWN - TIRE_DOOR_OPEN {
                assert!(tire.driver_door_ajar() && tire.seatbelt_unfastened());
            }
            if tick == REPLACE_TIRE_COUNTDOWN - TIRE_TRUNK_UNLOCKED {
                assert!(tire.rear_door_unlocked());
            }
        }
        assert_eq!(
            requests,
            vec![
                (REPLACE_TIRE_COUNTDOWN - TIRE_FORCE_STOP, StopRequest::Engage),
                (REPLACE_TIRE_COUNTDOWN, StopRequest::Release),
            ]
        );
        assert!((min_pressure - FLAT_TIRE_PRESSURE).abs() < 1e-9);
        assert!(!tire.is_broken());
        assert!((tire.pressure() - NOMINAL_TIRE_PRESSURE).abs() < f64::EPSILON);
    }

    #[test]
    fn pressure_is_restored_before_reset() {
        let mut tire = TireFailure::default();
        tire.try_break();
        while tire.countdown() > TIRE_REFILL_END {
            tire.tick();
        }
        assert!((tire.pressure() - NOMINAL_TIRE_PRESSURE).abs() < 1e-9);
        assert!(tire.is_broken());
    }
}
