//! Per-channel render state

use thiserror::Error;

use crate::sensors::ChannelKind;

/// Whether the channel's chrome is known to be on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    NotYetDrawn,
    Drawn,
}

/// Inclusive value span of the samples currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    /// Range covering every value, or `None` when there are none
    pub fn of(values: impl IntoIterator<Item = u32>) -> Option<Self> {
        values.into_iter().fold(None, |range, v| {
            Some(match range {
                None => Self { min: v, max: v },
                Some(Self { min, max }) => Self {
                    min: min.min(v),
                    max: max.max(v),
                },
            })
        })
    }

    pub fn span(&self) -> u32 {
        self.max - self.min
    }

    pub fn is_flat(&self) -> bool {
        self.min == self.max
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    #[error("tick spacing must be non-zero")]
    ZeroTickSpacing,
}

/// Tick spacing and last-drawn state of one channel.
///
/// Owned by whoever drives the renderer; only the renderer mutates the
/// range and state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphChannelConfig {
    kind: ChannelKind,
    mark_big: u32,
    mark_small: u32,
    pub(super) last_range: Option<ValueRange>,
    pub(super) state: RenderState,
}

impl GraphChannelConfig {
    /// Channel with explicit (big, small) tick spacing in fixed-point units
    pub fn new(kind: ChannelKind, mark_big: u32, mark_small: u32) -> Result<Self, ScaleError> {
        if mark_big == 0 || mark_small == 0 {
            return Err(ScaleError::ZeroTickSpacing);
        }
        Ok(Self {
            kind,
            mark_big,
            mark_small,
            last_range: None,
            state: RenderState::NotYetDrawn,
        })
    }

    pub fn with_default_marks(kind: ChannelKind) -> Self {
        let (mark_big, mark_small) = kind.default_marks();
        Self {
            kind,
            mark_big,
            mark_small,
            last_range: None,
            state: RenderState::NotYetDrawn,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn mark_big(&self) -> u32 {
        self.mark_big
    }

    pub fn mark_small(&self) -> u32 {
        self.mark_small
    }

    /// Value range of the last successful render
    pub fn last_range(&self) -> Option<ValueRange> {
        self.last_range
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Forget what is on screen so the next render is full
    pub fn invalidate(&mut self) {
        self.state = RenderState::NotYetDrawn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range() {
        assert_eq!(ValueRange::of([]), None);
        let range = ValueRange::of([2100, 1950, 2230]).unwrap();
        assert_eq!(range, ValueRange { min: 1950, max: 2230 });
        assert_eq!(range.span(), 280);
        assert!(ValueRange::of([7, 7]).unwrap().is_flat());
    }

    #[test]
    fn test_zero_spacing_rejected() {
        assert_eq!(
            GraphChannelConfig::new(ChannelKind::Humidity, 500, 0),
            Err(ScaleError::ZeroTickSpacing)
        );
    }

    #[test]
    fn test_starts_not_yet_drawn() {
        let channel = GraphChannelConfig::with_default_marks(ChannelKind::Pressure);
        assert_eq!(channel.state(), RenderState::NotYetDrawn);
        assert_eq!(channel.last_range(), None);
        assert_eq!((channel.mark_big(), channel.mark_small()), (100, 50));
    }
}
