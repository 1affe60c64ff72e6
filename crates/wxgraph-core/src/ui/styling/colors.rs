//! Color definitions and the graph gradient
//!
//! # RGB565 Format
//! - Red: 5 bits (0-31)
//! - Green: 6 bits (0-63)
//! - Blue: 5 bits (0-31)

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;

/// Default color for axes, ticks and labels
pub const GRAPH_FOREGROUND: Rgb565 = Rgb565::GREEN;

/// Default panel background
pub const GRAPH_BACKGROUND: Rgb565 = Rgb565::BLACK;

/// Color the column gradient starts from before its first step
pub const GRADIENT_START: Rgb565 = Rgb565::BLACK;

/// Advance the column gradient by one step.
///
/// Green rises first until it saturates at 63, after which red rises instead
/// (wrapping at its 5-bit width). Blue is always cleared. The sequence does
/// not depend on the sample values, so every render of the same panel colors
/// its columns identically.
pub fn color_increase(color: Rgb565) -> Rgb565 {
    let mut r = color.r();
    let mut g = color.g();

    if g != Rgb565::MAX_G {
        g += 1;
    } else {
        r = (r + 1) & Rgb565::MAX_R;
    }

    Rgb565::new(r, g & Rgb565::MAX_G, 0)
}

/// Build a color from its packed `RRRRRGGGGGGBBBBB` representation
pub fn color_from_raw(raw: u16) -> Rgb565 {
    Rgb565::from(RawU16::new(raw))
}

/// Packed `RRRRRGGGGGGBBBBB` representation of a color
pub fn color_to_raw(color: Rgb565) -> u16 {
    color.into_storage()
}
