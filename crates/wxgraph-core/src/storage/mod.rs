//! In-memory sample storage.
//!
//! Samples decoded from the sensor log live in a [`SampleRingBuffer`] for the
//! lifetime of the dashboard. Nothing is persisted: on restart the log is
//! ingested again from the beginning.

pub mod ring_buffer;

use core::fmt;

pub use ring_buffer::SampleRingBuffer;

use thiserror::Error;

/// Default number of samples kept in RAM (one per x-axis pixel of a 320px panel)
pub const DEFAULT_CAPACITY: usize = 300;

/// One decoded log record.
///
/// All values are fixed-point integers scaled by 100, so `21.34` is stored as
/// `2134`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    /// Temperature in 1/100 °C
    pub temp: u32,
    /// Pressure in 1/100 hPa
    pub press: u32,
    /// Relative humidity in 1/100 %
    pub hum: u32,
}

impl Sample {
    pub const fn new(temp: u32, press: u32, hum: u32) -> Self {
        Self { temp, press, hum }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T={}.{:02} P={}.{:02} H={}.{:02}",
            self.temp / 100,
            self.temp % 100,
            self.press / 100,
            self.press % 100,
            self.hum / 100,
            self.hum % 100
        )
    }
}

/// Error types for sample storage
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// A ring buffer must hold at least one sample
    #[error("Ring buffer capacity must be non-zero")]
    ZeroCapacity,
}
