use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

use crate::correct::{self, Correction};
use crate::edge::{DEFAULT_EDGE_BUDGET, EdgeWaiter, POLL_INTERVAL_US};
use crate::error::Am2302Error;
use crate::frame::{EdgeTimings, Frame, StartSequence};
use crate::timer::MicroClock;
use crate::validate::{self, Validation};

/// Time the host holds the line low to request a reading, in milliseconds.
pub const DEFAULT_START_HOLD_MS: u32 = 2;

/// Session parameters.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// How long the start pulse drives the line low, in milliseconds.
    pub start_hold_ms: u32,
    /// Pin samples per edge wait before it counts as timed out.
    pub edge_budget: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_hold_ms: DEFAULT_START_HOLD_MS,
            edge_budget: DEFAULT_EDGE_BUDGET,
        }
    }
}

impl Config {
    /// Duration at or beyond which an edge wait counts as timed out.
    pub fn edge_ceiling_us(&self) -> u32 {
        self.edge_budget.saturating_mul(POLL_INTERVAL_US)
    }
}

/// Driver for the AM2302 temperature and humidity sensor.
pub struct Am2302<PIN, DELAY, CLOCK> {
    pin: PIN,
    delay: DELAY,
    clock: CLOCK,
    config: Config,
}

/// Reading returned by the AM2302 sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    /// Relative humidity in tenths of a percent.
    pub humidity: u16,
    /// Temperature in tenths of a degree Celsius. Bit 15 is the sign flag.
    pub temperature: u16,
    /// Parity byte as transmitted.
    pub parity: u8,
    /// The frame only validated after a merged edge was repaired.
    pub correction_applied: bool,
}

impl Reading {
    fn from_frame(frame: Frame, correction_applied: bool) -> Self {
        Reading {
            humidity: frame.humidity(),
            temperature: frame.temperature(),
            parity: frame.parity(),
            correction_applied,
        }
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f32 {
        f32::from(self.humidity) / 10.0
    }

    /// Temperature in degrees Celsius, with bit 15 taken as the sign.
    pub fn temperature_celsius(&self) -> f32 {
        let is_temp_negative = self.temperature & 0x8000 != 0;
        let temperature = f32::from(self.temperature & 0x7FFF) / 10.0;
        if is_temp_negative {
            -temperature
        } else {
            temperature
        }
    }

    /// Parity the sensor should have sent for these data bytes.
    pub fn expected_parity(&self) -> u8 {
        validate::checksum(self.humidity, self.temperature)
    }
}

/// Raw timings of one read, before decoding.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capture {
    /// Handshake samples.
    pub start: StartSequence,
    /// Per-bit samples.
    pub timings: EdgeTimings,
    /// Duration at or beyond which a sample is a timed-out wait.
    pub edge_ceiling_us: u32,
}

impl Capture {
    /// Wraps timings captured with the default edge budget.
    pub fn new(start: StartSequence, timings: EdgeTimings) -> Self {
        Self {
            start,
            timings,
            edge_ceiling_us: Config::default().edge_ceiling_us(),
        }
    }

    /// Decodes and validates the capture, repairing a single merged edge if
    /// the first attempt fails.
    ///
    /// The capture itself is left untouched; repairs work on a copy.
    ///
    /// # Errors
    ///
    /// Returns the first failing check, in the order: handshake range, edge
    /// timeout, uncorrectable defect, checksum.
    pub fn evaluate(&self) -> Result<Reading, Am2302Error<Infallible>> {
        let frame = Frame::decode(&self.timings.low);
        let validation = Validation::check(&self.start, frame);
        if validation.is_valid() {
            return Ok(Reading::from_frame(frame, false));
        }

        let mut timings = self.timings;
        let correction = correct::repair(&mut timings);

        #[cfg(feature = "defmt")]
        defmt::debug!("am2302: {} invalid, correction {}", validation, correction);

        let (frame, validation) = match correction {
            Correction::Applied { .. } => {
                let frame = Frame::decode(&timings.low);
                (frame, Validation::check(&self.start, frame))
            }
            Correction::NoDefect | Correction::Uncorrectable => (frame, validation),
        };
        let applied = matches!(correction, Correction::Applied { .. });
        let reading = Reading::from_frame(frame, applied);

        if validation.is_valid() {
            return Ok(reading);
        }
        if !validation.start_valid {
            return Err(Am2302Error::StartSequenceOutOfRange(reading));
        }
        if let Some(bit) = self.timings.first_missing_bit(self.edge_ceiling_us) {
            return Err(Am2302Error::EdgeTimeout { bit, reading });
        }
        match correction {
            Correction::NoDefect => Err(Am2302Error::ChecksumMismatch(reading)),
            Correction::Applied { .. } | Correction::Uncorrectable => {
                Err(Am2302Error::UncorrectableDefect(reading))
            }
        }
    }
}

impl<PIN, DELAY, CLOCK, E> Am2302<PIN, DELAY, CLOCK>
where
    PIN: InputPin<Error = E> + OutputPin<Error = E>,
    DELAY: DelayNs,
    CLOCK: MicroClock,
{
    /// Creates a new instance of the AM2302 driver with the default [`Config`].
    ///
    /// # Arguments
    ///
    /// * `pin` - The open-drain GPIO pin connected to the data line. Must support both input and output.
    /// * `delay` - A delay provider implementing the `DelayNs` trait.
    /// * `clock` - A free-running microsecond counter.
    pub fn new(pin: PIN, delay: DELAY, clock: CLOCK) -> Self {
        Self::with_config(pin, delay, clock, Config::default())
    }

    /// Creates a new instance of the AM2302 driver with explicit timing parameters.
    pub fn with_config(pin: PIN, delay: DELAY, clock: CLOCK, config: Config) -> Self {
        Am2302 {
            pin,
            delay,
            clock,
            config,
        }
    }

    /// Reads a temperature and humidity measurement from the sensor.
    ///
    /// Performs the start handshake, records all 40 bit timings, then decodes
    /// and validates them. A single merged edge is repaired once; no other
    /// retry is attempted. Successive reads should be at least 2 seconds apart.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the frame validates, possibly after a repair.
    /// * `Err(Am2302Error)` describing why it did not.
    pub fn read(&mut self) -> Result<Reading, Am2302Error<E>> {
        let capture = self.capture()?;
        capture.evaluate().map_err(Am2302Error::widen)
    }

    /// Runs the handshake and records the raw timings without decoding them.
    ///
    /// # Errors
    ///
    /// * `StartSequenceTimeout` if the sensor does not answer the start pulse.
    /// * `PinError` on GPIO failure.
    pub fn capture(&mut self) -> Result<Capture, Am2302Error<E>> {
        let start = self.start()?;

        #[cfg(feature = "defmt")]
        defmt::trace!("am2302: start {}", start);

        let timings = self.capture_edges()?;
        Ok(Capture {
            start,
            timings,
            edge_ceiling_us: self.config.edge_ceiling_us(),
        })
    }

    /// Sends the start pulse and records the sensor's answer.
    ///
    /// The line is driven low for `start_hold_ms`, then released; the
    /// handshake is timed as waits for LOW, HIGH and LOW.
    fn start(&mut self) -> Result<StartSequence, Am2302Error<E>> {
        // MCU sends start request
        self.pin.set_low()?;
        self.delay.delay_ms(self.config.start_hold_ms);
        self.pin.set_high()?;

        let waiter = EdgeWaiter::new(&self.clock, self.config.edge_budget);
        let mut samples = [0; 3];
        for (sample, level) in samples
            .iter_mut()
            .zip([PinState::Low, PinState::High, PinState::Low])
        {
            *sample = waiter.wait_for(&mut self.pin, &mut self.delay, level)?;
            if waiter.timed_out(*sample) {
                return Err(Am2302Error::StartSequenceTimeout);
            }
        }

        Ok(StartSequence::from(samples))
    }

    /// Records the HIGH and LOW wait of every bit slot.
    ///
    /// Never stops early: a timed-out wait is recorded as is.
    fn capture_edges(&mut self) -> Result<EdgeTimings, E> {
        let waiter = EdgeWaiter::new(&self.clock, self.config.edge_budget);
        let mut timings = EdgeTimings::default();

        for (high, low) in timings.high.iter_mut().zip(timings.low.iter_mut()) {
            *high = waiter.wait_for(&mut self.pin, &mut self.delay, PinState::High)?;
            *low = waiter.wait_for(&mut self.pin, &mut self.delay, PinState::Low)?;
        }

        Ok(timings)
    }
}
