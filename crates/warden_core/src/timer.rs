//! Debounce timers for periodic unit checks.
//!
//! Each unit owns one [`IntervalTimer`] with a fixed set of named slots.
//! A slot accumulates elapsed ticks and fires once the accumulated time
//! reaches a threshold, after which it starts counting from zero again.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Number of independent slots per timer.
pub const TIMER_SLOTS: usize = 5;

/// Default retarget cadence in ticks.
pub const RETARGET_INTERVAL: u32 = 20;

/// Named slots of a unit's [`IntervalTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerSlot {
    /// Closest-target reacquisition.
    Target,
    /// Secondary target search used by controllers.
    Target2,
    /// Left weapon side shot cadence.
    ShootLeft,
    /// Right weapon side shot cadence.
    ShootRight,
    /// Unused, kept so the slot count stays stable.
    Reserved,
}

impl TimerSlot {
    const fn index(self) -> usize {
        match self {
            Self::Target => 0,
            Self::Target2 => 1,
            Self::ShootLeft => 2,
            Self::ShootRight => 3,
            Self::Reserved => 4,
        }
    }
}

/// Fixed array of debounce accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntervalTimer {
    slots: [Accumulator; TIMER_SLOTS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
struct Accumulator {
    #[serde(with = "fixed_serde")]
    elapsed: Fixed,
}

impl IntervalTimer {
    /// Create a timer with every slot at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `slot` by one tick and report whether it fired.
    pub fn elapsed(&mut self, slot: TimerSlot, threshold_ticks: u32) -> bool {
        self.elapsed_by(slot, Fixed::from_num(1), Fixed::from_num(threshold_ticks))
    }

    /// Advance `slot` by `delta` and report whether `threshold` was reached.
    ///
    /// Only the named slot is touched. When it fires, its accumulator is
    /// reset to zero.
    pub fn elapsed_by(&mut self, slot: TimerSlot, delta: Fixed, threshold: Fixed) -> bool {
        let acc = &mut self.slots[slot.index()];
        acc.elapsed += delta;
        if acc.elapsed >= threshold {
            acc.elapsed = Fixed::ZERO;
            true
        } else {
            false
        }
    }

    /// Ticks accumulated in `slot` since it last fired.
    #[must_use]
    pub fn accumulated(&self, slot: TimerSlot) -> Fixed {
        self.slots[slot.index()].elapsed
    }

    /// Reset a single slot.
    pub fn reset(&mut self, slot: TimerSlot) {
        self.slots[slot.index()].elapsed = Fixed::ZERO;
    }

    /// Overwrite a slot's accumulated time.
    ///
    /// Alternating weapons use this to put the opposite side half a reload
    /// behind the side that just fired.
    pub fn set_accumulated(&mut self, slot: TimerSlot, value: Fixed) {
        self.slots[slot.index()].elapsed = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retarget_cadence() {
        let mut timer = IntervalTimer::new();
        for tick in 1..RETARGET_INTERVAL {
            assert!(
                !timer.elapsed(TimerSlot::Target, RETARGET_INTERVAL),
                "fired early on tick {tick}"
            );
        }
        assert!(timer.elapsed(TimerSlot::Target, RETARGET_INTERVAL));
        assert_eq!(timer.accumulated(TimerSlot::Target), Fixed::ZERO);

        // Cadence restarts from zero after firing.
        assert!(!timer.elapsed(TimerSlot::Target, RETARGET_INTERVAL));
    }

    #[test]
    fn test_slots_are_independent() {
        let mut timer = IntervalTimer::new();
        for _ in 0..5 {
            timer.elapsed(TimerSlot::ShootLeft, 10);
        }
        assert_eq!(timer.accumulated(TimerSlot::ShootLeft), Fixed::from_num(5));
        assert_eq!(timer.accumulated(TimerSlot::ShootRight), Fixed::ZERO);
        assert_eq!(timer.accumulated(TimerSlot::Target), Fixed::ZERO);
    }

    #[test]
    fn test_zero_threshold_fires_every_call() {
        let mut timer = IntervalTimer::new();
        assert!(timer.elapsed(TimerSlot::Reserved, 0));
        assert!(timer.elapsed(TimerSlot::Reserved, 0));
    }

    #[test]
    fn test_set_accumulated_shortens_next_wait() {
        let mut timer = IntervalTimer::new();
        timer.set_accumulated(TimerSlot::ShootRight, Fixed::from_num(9));
        assert!(timer.elapsed(TimerSlot::ShootRight, 10));
    }

    #[test]
    fn test_fractional_delta() {
        let mut timer = IntervalTimer::new();
        let half = Fixed::from_num(0.5);
        let threshold = Fixed::from_num(1);
        assert!(!timer.elapsed_by(TimerSlot::Target2, half, threshold));
        assert!(timer.elapsed_by(TimerSlot::Target2, half, threshold));
    }
}
