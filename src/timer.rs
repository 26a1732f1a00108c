//! Monotonic millisecond timer and timeout service.
//!
//! The timer is a free-running tick counter driven by an external periodic
//! source (typically a 1 kHz system-tick interrupt calling [`Timer::tick`]).
//! All fields are atomics, so a shared `&Timer` can be read by protocol code
//! while the interrupt handler increments it.
//!
//! Timeout budgets are the caller's business: a [`Deadline`] pairs a
//! reference tick with a remaining budget and answers "has this elapsed"
//! with wraparound-safe unsigned arithmetic, tolerating exactly one counter
//! wraparound between polls.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Timeout budget that never elapses.
pub const MAX_DELAY: u32 = u32::MAX;

/// Timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TimerState {
    /// Counter zeroed, not counting
    Reset = 0,
    /// Counter increments on every tick
    Running = 1,
    /// Counter frozen at its current value
    Paused = 2,
}

impl TimerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Paused,
            _ => Self::Reset,
        }
    }
}

/// Free-running tick counter with start/stop/reset control.
///
/// The counter wraps at `u32::MAX`; elapsed-time checks through [`Deadline`]
/// stay correct across one wraparound.
///
/// # Examples
///
/// ```
/// use knx_tpuart::timer::{Deadline, Timer};
///
/// let timer = Timer::new();
/// timer.start();
///
/// let mut deadline = Deadline::start(&timer, 3);
/// timer.tick();
/// assert!(!deadline.expired(&timer));
/// timer.tick();
/// timer.tick();
/// assert!(deadline.expired(&timer));
/// ```
#[derive(Debug)]
pub struct Timer {
    state: AtomicU8,
    ticks: AtomicU32,
}

impl Timer {
    /// Create a timer in the Reset state.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(TimerState::Reset as u8),
            ticks: AtomicU32::new(0),
        }
    }

    /// Set state to Reset and zero the counter.
    pub fn init(&self) {
        self.state.store(TimerState::Reset as u8, Ordering::Relaxed);
        self.ticks.store(0, Ordering::Relaxed);
    }

    /// Set state to Running and zero the counter.
    ///
    /// The timeout budget belongs to the caller (see [`Deadline`]); the
    /// timer itself only counts.
    pub fn start(&self) {
        self.state
            .store(TimerState::Running as u8, Ordering::Relaxed);
        self.ticks.store(0, Ordering::Relaxed);
    }

    /// Advance the counter by one tick if Running.
    ///
    /// Invoked once per time unit from the periodic interrupt source; safe
    /// to call from interrupt context. This is the only mutator besides
    /// start/stop/reset.
    #[inline]
    pub fn tick(&self) {
        if self.state.load(Ordering::Relaxed) == TimerState::Running as u8 {
            self.ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Set state to Paused and return the counter without resetting it.
    pub fn stop(&self) -> u32 {
        self.state.store(TimerState::Paused as u8, Ordering::Relaxed);
        self.ticks.load(Ordering::Relaxed)
    }

    /// Set state to Reset, returning the prior counter value and zeroing it.
    pub fn reset(&self) -> u32 {
        self.state.store(TimerState::Reset as u8, Ordering::Relaxed);
        self.ticks.swap(0, Ordering::Relaxed)
    }

    /// Current timer state.
    pub fn state(&self) -> TimerState {
        TimerState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// Current counter value.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn set_ticks(&self, value: u32) {
        self.ticks.store(value, Ordering::Relaxed);
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// A reference tick plus remaining budget for one bounded wait.
///
/// Repeated [`expired`](Self::expired) polls decrement the budget by the
/// ticks elapsed since the previous poll and advance the reference, so the
/// check converges correctly even when individual polls are far apart or
/// the counter wraps once in between.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    reference: u32,
    remaining: u32,
}

impl Deadline {
    /// Capture the current tick as reference for a wait of `budget` ticks.
    ///
    /// A budget of [`MAX_DELAY`] never expires.
    pub fn start(timer: &Timer, budget: u32) -> Self {
        Self {
            reference: timer.ticks(),
            remaining: budget,
        }
    }

    /// Check whether the budget has elapsed.
    ///
    /// Has no side effect when the budget is [`MAX_DELAY`]; otherwise, when
    /// not yet elapsed, consumes the elapsed ticks from the budget and
    /// advances the reference to now.
    pub fn expired(&mut self, timer: &Timer) -> bool {
        // The tick count cannot change within this block.
        let now = timer.ticks();

        if self.remaining == MAX_DELAY {
            return false;
        }

        let elapsed = now.wrapping_sub(self.reference);
        if elapsed < self.remaining {
            // Not a genuine timeout. Adjust for the time remaining.
            self.remaining -= elapsed;
            self.reference = now;
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(timer: &Timer, n: u32) {
        for _ in 0..n {
            timer.tick();
        }
    }

    #[test]
    fn test_tick_only_counts_while_running() {
        let timer = Timer::new();
        timer.init();
        timer.tick();
        assert_eq!(timer.ticks(), 0);

        timer.start();
        advance(&timer, 5);
        assert_eq!(timer.ticks(), 5);

        assert_eq!(timer.stop(), 5);
        timer.tick();
        assert_eq!(timer.ticks(), 5);
        assert_eq!(timer.state(), TimerState::Paused);
    }

    #[test]
    fn test_start_zeroes_counter() {
        let timer = Timer::new();
        timer.start();
        advance(&timer, 3);
        timer.start();
        assert_eq!(timer.ticks(), 0);
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn test_reset_returns_prior_value() {
        let timer = Timer::new();
        timer.start();
        advance(&timer, 7);
        assert_eq!(timer.reset(), 7);
        assert_eq!(timer.ticks(), 0);
        assert_eq!(timer.state(), TimerState::Reset);
    }

    #[test]
    fn test_deadline_expires_exactly_at_budget() {
        let timer = Timer::new();
        timer.start();
        let mut deadline = Deadline::start(&timer, 4);

        advance(&timer, 3);
        assert!(!deadline.expired(&timer));
        advance(&timer, 1);
        assert!(deadline.expired(&timer));
    }

    #[test]
    fn test_deadline_converges_across_short_polls() {
        let timer = Timer::new();
        timer.start();
        let mut deadline = Deadline::start(&timer, 10);

        for _ in 0..9 {
            timer.tick();
            assert!(!deadline.expired(&timer));
        }
        timer.tick();
        assert!(deadline.expired(&timer));
    }

    #[test]
    fn test_max_delay_never_expires() {
        let timer = Timer::new();
        timer.start();
        let mut deadline = Deadline::start(&timer, MAX_DELAY);

        advance(&timer, 1000);
        assert!(!deadline.expired(&timer));
        // No side effect: the budget stays at the sentinel.
        assert_eq!(deadline.remaining, MAX_DELAY);
        assert_eq!(deadline.reference, 0);
    }

    #[test]
    fn test_deadline_survives_counter_wraparound() {
        let timer = Timer::new();
        timer.start();
        timer.set_ticks(u32::MAX - 2);

        // Budget of 6 ticks set 3 ticks before the wrap.
        let mut deadline = Deadline::start(&timer, 6);

        advance(&timer, 4); // counter wraps to 1
        assert_eq!(timer.ticks(), 1);
        assert!(!deadline.expired(&timer));

        advance(&timer, 2);
        assert!(deadline.expired(&timer));
    }

    #[test]
    fn test_deadline_wraparound_already_elapsed() {
        let timer = Timer::new();
        timer.start();
        timer.set_ticks(u32::MAX - 1);

        let mut deadline = Deadline::start(&timer, 2);
        advance(&timer, 3); // wraps past zero
        assert!(deadline.expired(&timer));
    }
}
