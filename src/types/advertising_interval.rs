//! The LE advertising interval.

use byteorder::{ByteOrder, LittleEndian};
use core::time::Duration;

/// Advertising interval range for undirected advertising.
///
/// The controller picks an actual interval inside the range. Both bounds are
/// serialized in units of 0.625 ms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdvertisingInterval {
    min: Duration,
    max: Duration,
}

impl AdvertisingInterval {
    /// Serialized length: minimum (2 bytes) and maximum (2 bytes).
    pub const LENGTH: usize = 4;

    const MIN: Duration = Duration::from_millis(20);
    const MAX: Duration = Duration::from_millis(10240);

    /// Builds an interval range after validating the bounds.
    ///
    /// # Errors
    ///
    /// - [`TooShort`](AdvertisingIntervalError::TooShort) if `min` is below
    ///   20 ms.
    /// - [`TooLong`](AdvertisingIntervalError::TooLong) if `max` is above
    ///   10.24 s.
    /// - [`Inverted`](AdvertisingIntervalError::Inverted) if `min > max`.
    pub fn with_range(
        min: Duration,
        max: Duration,
    ) -> Result<AdvertisingInterval, AdvertisingIntervalError> {
        if min < Self::MIN {
            return Err(AdvertisingIntervalError::TooShort(min));
        }
        if max > Self::MAX {
            return Err(AdvertisingIntervalError::TooLong(max));
        }
        if min > max {
            return Err(AdvertisingIntervalError::Inverted(min, max));
        }
        Ok(AdvertisingInterval { min, max })
    }

    /// Serializes both bounds into the first [`LENGTH`](Self::LENGTH) bytes
    /// of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`LENGTH`](Self::LENGTH).
    pub fn copy_into_slice(&self, bytes: &mut [u8]) {
        LittleEndian::write_u16(&mut bytes[0..2], Self::duration_as_units(self.min));
        LittleEndian::write_u16(&mut bytes[2..4], Self::duration_as_units(self.max));
    }

    // T = N * 0.625 ms, so N = T / 625 us. Note: 1600 = 1_000_000 / 625.
    fn duration_as_units(d: Duration) -> u16 {
        (1600 * d.as_secs() as u32 + d.subsec_micros() / 625) as u16
    }
}

impl Default for AdvertisingInterval {
    /// 1.28 s for both bounds, the value peripherals traditionally advertise
    /// with.
    fn default() -> AdvertisingInterval {
        AdvertisingInterval {
            min: Duration::from_millis(1280),
            max: Duration::from_millis(1280),
        }
    }
}

/// Errors building an [`AdvertisingInterval`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdvertisingIntervalError {
    /// The minimum was below 20 ms. Contains the rejected value.
    TooShort(Duration),
    /// The maximum was above 10.24 s. Contains the rejected value.
    TooLong(Duration),
    /// The minimum was greater than the maximum. Contains both values in
    /// order.
    Inverted(Duration, Duration),
}
