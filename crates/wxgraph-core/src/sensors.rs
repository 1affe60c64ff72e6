//! Sensor channel identities.
//!
//! Each graph shows exactly one channel of a [`Sample`]. The channel is a tagged
//! variant rather than a stored accessor so that configuration files can name it
//! and the value lookup stays a plain `match`.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::Sample;

/// Number of channels carried by every sample
pub const CHANNEL_COUNT: usize = 3;

/// The measured quantity a graph displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Air temperature in 1/100 °C
    Temperature,
    /// Barometric pressure in 1/100 hPa
    Pressure,
    /// Relative humidity in 1/100 %
    Humidity,
}

impl ChannelKind {
    /// All channels in log-field order
    pub const ALL: [ChannelKind; CHANNEL_COUNT] =
        [Self::Temperature, Self::Pressure, Self::Humidity];

    /// Stable index of the channel, matching its position in a log line
    pub const fn index(self) -> usize {
        match self {
            Self::Temperature => 0,
            Self::Pressure => 1,
            Self::Humidity => 2,
        }
    }

    /// Extract this channel's fixed-point value from a sample
    pub const fn value(self, sample: &Sample) -> u32 {
        match self {
            Self::Temperature => sample.temp,
            Self::Pressure => sample.press,
            Self::Humidity => sample.hum,
        }
    }

    /// Default (big, small) tick spacing in fixed-point units
    pub const fn default_marks(self) -> (u32, u32) {
        match self {
            Self::Temperature => (100, 50),
            Self::Pressure => (100, 50),
            Self::Humidity => (500, 250),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Humidity => "humidity",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_dispatch() {
        let sample = Sample::new(2134, 99012, 4567);
        assert_eq!(ChannelKind::Temperature.value(&sample), 2134);
        assert_eq!(ChannelKind::Pressure.value(&sample), 99012);
        assert_eq!(ChannelKind::Humidity.value(&sample), 4567);
    }

    #[test]
    fn test_indices_are_unique() {
        for (i, kind) in ChannelKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
