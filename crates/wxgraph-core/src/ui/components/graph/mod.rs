//! Bar-column time-series graphs with cheap incremental redraw
//!
//! A graph occupies one rectangular region of a physical panel and shows one
//! [`ChannelKind`] of the sample history as a row of one-pixel columns, newest
//! on the right. Axis chrome is costly to push over SPI, so every render
//! decides how much of it actually has to change:
//!
//! - full render: clear the panel region, draw both axes, x ticks with hour
//!   labels, y ticks with value labels, then the data
//! - incremental render, value range unchanged: data columns only
//! - incremental render, value range changed: y tick region and data columns
//!
//! ```ignore
//! use wxgraph_core::ui::components::graph::*;
//!
//! let renderer = GraphRenderer::new(15, 720);
//! let panel = GraphPanel::new(PanelId(0), Rectangle::new(Point::zero(), Size::new(320, 120)), ChannelKind::Temperature);
//! let mut channel = GraphChannelConfig::with_default_marks(ChannelKind::Temperature);
//!
//! renderer.render(&mut sink, &panel, &mut channel, &buffer, RenderMode::Incremental)?;
//! ```
//!
//! [`ChannelKind`]: crate::sensors::ChannelKind

use thiserror::Error;

use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;

use crate::sensors::ChannelKind;

mod axis;
mod channel;
pub mod constants;
mod panel;
mod renderer;

pub use axis::{AxisLabel, XTick, YTick, format_hours_label, format_value_label};
pub use channel::{GraphChannelConfig, RenderState, ScaleError, ValueRange};
pub use panel::{GraphPanel, PanelGeometry};
pub use renderer::{AxisRedraw, GraphRenderer, RenderMode, RenderOutcome};

/// Axis label formatting failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    /// The formatted label is longer than the label buffer
    #[error("label for {value} does not fit in {capacity} characters")]
    TooLong {
        /// Value being formatted
        value: u32,
        /// Label buffer capacity
        capacity: usize,
    },
}

/// Error types for graph rendering
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError<E> {
    /// Panel rectangle extends past the physical display
    #[error("panel {area:?} does not fit the {display:?} display")]
    PanelOutOfBounds {
        /// Requested panel region
        area: Rectangle,
        /// Physical display size
        display: Size,
    },

    /// Panel is too small to leave a plot area of at least 2x2
    #[error("panel {width}x{height} leaves no room for a plot")]
    PanelTooSmall {
        /// Panel width
        width: u32,
        /// Panel height
        height: u32,
    },

    /// Panel and channel state describe different channels
    #[error("panel shows {panel} but the channel state is for {channel}")]
    ChannelMismatch {
        /// Channel configured on the panel
        panel: ChannelKind,
        /// Channel of the state passed in
        channel: ChannelKind,
    },

    /// An axis label could not be formatted
    #[error("axis label: {0}")]
    Label(#[from] LabelError),

    /// The pixel sink rejected a draw call
    #[error("pixel sink error: {0:?}")]
    Sink(E),
}
