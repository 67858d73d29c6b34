/// A free-running microsecond counter.
///
/// The counter must increase monotonically and is allowed to wrap at `2^32`,
/// including in the middle of a read.
pub trait MicroClock {
    /// Returns the current counter value in microseconds.
    fn now_us(&self) -> u32;
}

impl<C: MicroClock + ?Sized> MicroClock for &C {
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

/// Measures the time elapsed since its construction.
pub struct ElapsedTimer<'c, C: MicroClock> {
    clock: &'c C,
    t0: u32,
}

impl<'c, C: MicroClock> ElapsedTimer<'c, C> {
    /// Captures the reference timestamp from `clock`.
    pub fn start(clock: &'c C) -> Self {
        Self {
            clock,
            t0: clock.now_us(),
        }
    }

    /// Microseconds elapsed since [`ElapsedTimer::start`].
    pub fn duration(&self) -> u32 {
        elapsed(self.t0, self.clock.now_us())
    }
}

/// Wrap-safe difference between two counter readings.
pub(crate) fn elapsed(t0: u32, now: u32) -> u32 {
    if now >= t0 {
        now - t0
    } else {
        // counter wrapped between the two readings
        (u32::MAX - t0) + now + 1
    }
}
