//! Raw timing records and the 40-bit frame decoded from them.

/// Number of data bits in one AM2302 transmission.
pub const FRAME_BITS: usize = 40;

/// A `low` sample longer than this (in microseconds) encodes a `1` bit.
pub const ONE_THRESHOLD_US: u32 = 50;

/// Handshake timings recorded right after the host releases the line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StartSequence {
    /// Time until the sensor pulls the line low after the host releases it.
    pub hold: u32,
    /// Sensor's answering pulse, measured as the wait for HIGH.
    pub sensor_high: u32,
    /// Sensor's second answering pulse, measured as the wait for LOW before the data bits.
    pub sensor_low: u32,
}

impl From<[u32; 3]> for StartSequence {
    fn from([hold, sensor_high, sensor_low]: [u32; 3]) -> Self {
        Self {
            hold,
            sensor_high,
            sensor_low,
        }
    }
}

/// Per-bit edge timings, in transmission order (index 0 is the frame's MSB).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeTimings {
    /// Duration of the wait for HIGH that opens each bit slot.
    pub high: [u32; FRAME_BITS],
    /// Duration of the wait for LOW that closes each bit slot. Carries the bit value.
    pub low: [u32; FRAME_BITS],
}

impl Default for EdgeTimings {
    fn default() -> Self {
        Self {
            high: [0; FRAME_BITS],
            low: [0; FRAME_BITS],
        }
    }
}

impl EdgeTimings {
    /// Creates a timing record from captured samples.
    pub fn new(high: [u32; FRAME_BITS], low: [u32; FRAME_BITS]) -> Self {
        Self { high, low }
    }

    /// Number of bit slots in which either wait reached `ceiling_us`.
    pub fn missing_bits(&self, ceiling_us: u32) -> usize {
        self.missing(ceiling_us).count()
    }

    /// First bit slot in which either wait reached `ceiling_us`.
    pub fn first_missing_bit(&self, ceiling_us: u32) -> Option<usize> {
        self.missing(ceiling_us).next()
    }

    fn missing(&self, ceiling_us: u32) -> impl Iterator<Item = usize> + '_ {
        self.high
            .iter()
            .zip(self.low.iter())
            .enumerate()
            .filter(move |(_, (high, low))| **high >= ceiling_us || **low >= ceiling_us)
            .map(|(i, _)| i)
    }
}

/// A decoded 40-bit frame: humidity, temperature and parity.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame(u64);

impl Frame {
    const MASK: u64 = (1 << FRAME_BITS) - 1;

    /// Decodes the frame from the `low` samples.
    ///
    /// Bit `39 - i` (counting from the LSB) is set iff `low[i]` exceeds
    /// [`ONE_THRESHOLD_US`].
    pub fn decode(low: &[u32; FRAME_BITS]) -> Self {
        let bits = low
            .iter()
            .enumerate()
            .filter(|(_, sample)| **sample > ONE_THRESHOLD_US)
            .fold(0u64, |bits, (i, _)| bits | 1 << (FRAME_BITS - 1 - i));
        Self(bits)
    }

    /// Assembles a frame from its raw fields.
    pub fn from_fields(humidity: u16, temperature: u16, parity: u8) -> Self {
        Self(u64::from(humidity) << 24 | u64::from(temperature) << 8 | u64::from(parity))
    }

    /// Builds a frame from the low 40 bits of `bits`.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits & Self::MASK)
    }

    /// The raw 40-bit value.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// Whether the bit sent in slot `index` (0 = first transmitted) is set.
    pub fn bit(self, index: usize) -> bool {
        index < FRAME_BITS && (self.0 >> (FRAME_BITS - 1 - index)) & 1 == 1
    }

    /// Raw humidity field, in tenths of %RH.
    pub fn humidity(self) -> u16 {
        ((self.0 >> 24) & 0xFFFF) as u16
    }

    /// Raw temperature field, in tenths of °C with bit 15 as the sign flag.
    pub fn temperature(self) -> u16 {
        ((self.0 >> 8) & 0xFFFF) as u16
    }

    /// Parity byte as transmitted by the sensor.
    pub fn parity(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canonical `low` samples for every bit of `frame`.
    fn lows_for(frame: Frame) -> [u32; FRAME_BITS] {
        core::array::from_fn(|i| if frame.bit(i) { 73 } else { 26 })
    }

    #[test]
    fn test_decode_fields() {
        // Humidity: 50.0% -> 0x01F4, Temperature: 20.0C -> 0x00C8
        let frame = Frame::from_fields(0x01F4, 0x00C8, 0xBD);
        let decoded = Frame::decode(&lows_for(frame));

        assert_eq!(decoded, frame);
        assert_eq!(decoded.humidity(), 0x01F4);
        assert_eq!(decoded.temperature(), 0x00C8);
        assert_eq!(decoded.parity(), 0xBD);
    }

    #[test]
    fn test_decode_threshold_is_exclusive() {
        let mut low = [26; FRAME_BITS];
        low[0] = 50;
        low[39] = 51;

        let frame = Frame::decode(&low);
        assert!(!frame.bit(0));
        assert!(frame.bit(39));
        assert_eq!(frame.bits(), 1);
    }

    #[test]
    fn test_first_sample_is_msb() {
        let mut low = [26; FRAME_BITS];
        low[0] = 73;

        assert_eq!(Frame::decode(&low).bits(), 1 << 39);
        assert_eq!(Frame::decode(&low).humidity(), 0x8000);
    }

    #[test]
    fn test_recorded_frame() {
        // 30.3 %RH, 29.8 C captured from a sensor
        let low = [
            26, 26, 26, 26, 26, 26, 26, 73, 26, 26, 74, 26, 74, 74, 74, 72, 26, 26, 26, 26, 26, 26,
            26, 73, 26, 26, 74, 26, 74, 26, 73, 25, 26, 73, 26, 74, 74, 26, 73, 73,
        ];
        let frame = Frame::decode(&low);

        assert_eq!(frame.humidity(), 303);
        assert_eq!(frame.temperature(), 298);
        assert_eq!(frame.parity(), 0x5B);
    }

    #[test]
    fn test_from_bits_masks_to_40_bits() {
        let frame = Frame::from_bits(u64::MAX);
        assert_eq!(frame.bits(), (1 << 40) - 1);
        assert!(!frame.bit(40));
    }

    #[test]
    fn test_missing_bits() {
        let mut timings = EdgeTimings::new([54; FRAME_BITS], [26; FRAME_BITS]);
        assert_eq!(timings.missing_bits(1000), 0);
        assert_eq!(timings.first_missing_bit(1000), None);

        timings.low[39] = 1008;
        timings.high[20] = 1000;
        assert_eq!(timings.missing_bits(1000), 2);
        assert_eq!(timings.first_missing_bit(1000), Some(20));
    }
}
