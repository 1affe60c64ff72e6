//! Graph layout constants

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::ascii::FONT_6X10;

/// Font used for every axis label
pub const AXIS_LABEL_FONT: &MonoFont<'static> = &FONT_6X10;

/// Length of an x-axis tick below the axis line
pub const X_TICK_LENGTH_PX: u32 = 5;

/// Vertical offset of x labels below the axis line
pub const X_LABEL_OFFSET_PX: i32 = X_TICK_LENGTH_PX as i32 + 1;

/// Label buffer capacity (characters)
pub const MAX_AXIS_LABEL_LENGTH: usize = 6;

/// Label of the rightmost x tick
pub const NOW_LABEL: &str = "now";

/// The column gradient advances once every this many columns
pub const GRADIENT_STEP_COLUMNS: usize = 4;

/// Fixed-point scale of sample values (two fractional digits)
pub const VALUE_SCALE: u32 = 100;

pub const MINUTES_PER_HOUR: u32 = 60;

/// Divisors applied to the panel size to obtain the axis margins
pub const LEFT_MARGIN_DIVISOR: u32 = 9;
pub const BOTTOM_MARGIN_DIVISOR: u32 = 8;

/// Divisors applied to the left margin to obtain tick lengths
pub const MAJOR_TICK_DIVISOR: u32 = 4;
pub const MINOR_TICK_DIVISOR: u32 = 8;
