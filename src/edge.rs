use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, PinState},
};

use crate::timer::{ElapsedTimer, MicroClock};

/// Delay between two samples of the pin, in microseconds.
pub const POLL_INTERVAL_US: u32 = 1;

/// Default number of samples before a wait gives up (~1 ms).
pub const DEFAULT_EDGE_BUDGET: u32 = 1000;

/// Bounded busy-poll for a logic level.
pub struct EdgeWaiter<'c, C: MicroClock> {
    clock: &'c C,
    budget: u32,
}

impl<'c, C: MicroClock> EdgeWaiter<'c, C> {
    /// Creates a waiter sampling at most `budget` times per wait.
    pub fn new(clock: &'c C, budget: u32) -> Self {
        Self { clock, budget }
    }

    /// Duration at or beyond which a wait counts as timed out.
    pub fn ceiling(&self) -> u32 {
        self.budget.saturating_mul(POLL_INTERVAL_US)
    }

    /// Whether a duration returned by [`EdgeWaiter::wait_for`] is a timeout.
    pub fn timed_out(&self, duration: u32) -> bool {
        duration >= self.ceiling()
    }

    /// Polls `pin` until it reads `level` and returns the time it took.
    ///
    /// When the budget runs out the elapsed time is returned as well; use
    /// [`EdgeWaiter::timed_out`] to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns the pin's error if sampling fails.
    pub fn wait_for<P, D>(
        &self,
        pin: &mut P,
        delay: &mut D,
        level: PinState,
    ) -> Result<u32, P::Error>
    where
        P: InputPin,
        D: DelayNs,
    {
        let timer = ElapsedTimer::start(self.clock);
        for _ in 0..self.budget {
            let reached = match level {
                PinState::High => pin.is_high()?,
                PinState::Low => pin.is_low()?,
            };
            if reached {
                return Ok(timer.duration());
            }
            delay.delay_us(POLL_INTERVAL_US);
        }
        Ok(timer.duration())
    }
}
