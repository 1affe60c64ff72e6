//! Drawing-side boundary of the dashboard.
//!
//! The renderer only ever talks to a [`PixelSink`]: clipped rectangle and
//! pixel writes executed in the order they are issued. Several physical panels
//! may share one transport, so every render pass happens inside a
//! [`PanelSelection`] obtained from a [`DisplayMultiplexer`].
//!
//! Implementations provided here:
//! - [`DrawTargetSink`] - any `embedded-graphics` `DrawTarget<Color = Rgb565>`
//! - [`ChipSelectMultiplexer`] - shared SPI display with one active-low chip
//!   select per panel
//! - [`FramebufferPanels`] - one in-RAM [`FrameBuffer`] per panel

pub mod chip_select;
pub mod framebuffer;
pub mod multiplexer;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use chip_select::ChipSelectMultiplexer;
pub use framebuffer::{FrameBuffer, FramebufferPanels};
pub use multiplexer::{DisplayMultiplexer, DrawError, MuxError, PanelId, PanelSelection};
pub use sink::{DrawTargetSink, PixelSink, SinkTarget};

/// Width of the ILI9341 panels in landscape orientation
pub const DISPLAY_WIDTH_PX: u32 = 320;

/// Height of the ILI9341 panels in landscape orientation
pub const DISPLAY_HEIGHT_PX: u32 = 240;
