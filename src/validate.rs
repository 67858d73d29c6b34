use core::ops::RangeInclusive;

use crate::frame::{Frame, StartSequence};

/// Accepted delay between releasing the line and the sensor pulling it low.
pub const START_HOLD_US: RangeInclusive<u32> = 0..=50;

/// Accepted length of each of the sensor's two answering pulses.
pub const START_RESPONSE_US: RangeInclusive<u32> = 50..=100;

/// Result of validating one decoded frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validation {
    /// The handshake timings are within tolerance.
    pub start_valid: bool,
    /// The parity byte matches the data bytes.
    pub checksum_valid: bool,
}

impl Validation {
    /// Checks `frame` received after the handshake `start`.
    pub fn check(start: &StartSequence, frame: Frame) -> Self {
        Self {
            start_valid: valid_start(start),
            checksum_valid: valid_parity(frame),
        }
    }

    /// Both the handshake and the checksum passed.
    pub fn is_valid(&self) -> bool {
        self.start_valid && self.checksum_valid
    }
}

/// Checks the three handshake samples against their windows (inclusive).
pub fn valid_start(start: &StartSequence) -> bool {
    START_HOLD_US.contains(&start.hold)
        && START_RESPONSE_US.contains(&start.sensor_high)
        && START_RESPONSE_US.contains(&start.sensor_low)
}

/// Checks the transmitted parity byte against [`checksum`].
pub fn valid_parity(frame: Frame) -> bool {
    checksum(frame.humidity(), frame.temperature()) == frame.parity()
}

/// The low 8 bits of the sum of the four data bytes.
pub fn checksum(humidity: u16, temperature: u16) -> u8 {
    let [hum_hi, hum_lo] = humidity.to_be_bytes();
    let [temp_hi, temp_lo] = temperature.to_be_bytes();
    [hum_hi, hum_lo, temp_hi, temp_lo]
        .iter()
        .fold(0u8, |sum, v| sum.wrapping_add(*v))
}
