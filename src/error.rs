use core::convert::Infallible;
use core::fmt;

use crate::am2302::Reading;

/// Possible outcomes of a failed AM2302 read.
///
/// Every variant raised after the bits were captured carries the best-effort
/// [`Reading`] decoded from them, so the caller can still inspect the frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum Am2302Error<E> {
    /// The sensor did not answer the start pulse within the polling budget.
    StartSequenceTimeout,
    /// The handshake timings are outside tolerance.
    StartSequenceOutOfRange(Reading),
    /// A bit's HIGH or LOW wait exhausted the polling budget.
    EdgeTimeout {
        /// First bit slot whose wait timed out.
        bit: usize,
        /// Frame decoded from whatever was captured.
        reading: Reading,
    },
    /// Checksum did not match the received data and no timing defect was found.
    ChecksumMismatch(Reading),
    /// A timing defect was found that could not be repaired.
    UncorrectableDefect(Reading),
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> Am2302Error<E> {
    /// The best-effort reading attached to this outcome, if bits were captured.
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::StartSequenceOutOfRange(reading)
            | Self::EdgeTimeout { reading, .. }
            | Self::ChecksumMismatch(reading)
            | Self::UncorrectableDefect(reading) => Some(reading),
            Self::StartSequenceTimeout | Self::PinError(_) => None,
        }
    }
}

impl Am2302Error<Infallible> {
    /// Lifts a pin-independent outcome into the error type of a concrete pin.
    pub(crate) fn widen<E>(self) -> Am2302Error<E> {
        match self {
            Self::StartSequenceTimeout => Am2302Error::StartSequenceTimeout,
            Self::StartSequenceOutOfRange(reading) => Am2302Error::StartSequenceOutOfRange(reading),
            Self::EdgeTimeout { bit, reading } => Am2302Error::EdgeTimeout { bit, reading },
            Self::ChecksumMismatch(reading) => Am2302Error::ChecksumMismatch(reading),
            Self::UncorrectableDefect(reading) => Am2302Error::UncorrectableDefect(reading),
            Self::PinError(never) => match never {},
        }
    }
}

impl<E> From<E> for Am2302Error<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Display> fmt::Display for Am2302Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartSequenceTimeout => write!(f, "Sensor did not answer the start pulse"),
            Self::StartSequenceOutOfRange(_) => write!(f, "Start handshake timings out of range"),
            Self::EdgeTimeout { bit, .. } => write!(f, "Timeout while waiting for edge of bit {bit}"),
            Self::ChecksumMismatch(reading) => write!(
                f,
                "Checksum validation failed. Received: {}, Computed: {}",
                reading.parity,
                reading.expected_parity()
            ),
            Self::UncorrectableDefect(_) => write!(f, "Uncorrectable timing defect"),
            Self::PinError(err) => write!(f, "PinError: {err}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for Am2302Error<E> {}
