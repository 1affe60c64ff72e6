//! Graph placement and derived plot geometry

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::display::PanelId;
use crate::sensors::ChannelKind;
use crate::ui::styling::{GRAPH_BACKGROUND, GRAPH_FOREGROUND};

use super::constants::{
    BOTTOM_MARGIN_DIVISOR, LEFT_MARGIN_DIVISOR, MAJOR_TICK_DIVISOR, MINOR_TICK_DIVISOR,
};

/// Where a graph sits and what it shows. Immutable after setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphPanel {
    /// Physical panel the graph is drawn on
    pub display: PanelId,
    /// Region of that panel, in panel pixels
    pub area: Rectangle,
    /// Channel shown
    pub channel: ChannelKind,
    /// Axes, ticks and labels
    pub foreground: Rgb565,
    /// Erase color
    pub background: Rgb565,
}

impl GraphPanel {
    pub fn new(display: PanelId, area: Rectangle, channel: ChannelKind) -> Self {
        Self {
            display,
            area,
            channel,
            foreground: GRAPH_FOREGROUND,
            background: GRAPH_BACKGROUND,
        }
    }

    pub fn with_colors(mut self, foreground: Rgb565, background: Rgb565) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn geometry(&self) -> PanelGeometry {
        PanelGeometry::new(self.area)
    }
}

/// Plot layout derived from a panel rectangle (screen coordinates, y down).
///
/// The x axis sits on row `oy`, the y axis on column `ox`. Data columns live
/// strictly right of the y axis and strictly above the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    pub area: Rectangle,
    pub left_margin: u32,
    pub bottom_margin: u32,
    pub plot_width: u32,
    pub plot_height: u32,
    /// Column of the y axis
    pub ox: i32,
    /// Row of the x axis
    pub oy: i32,
}

impl PanelGeometry {
    pub fn new(area: Rectangle) -> Self {
        let Size { width, height } = area.size;
        let left_margin = width / LEFT_MARGIN_DIVISOR;
        let bottom_margin = height / BOTTOM_MARGIN_DIVISOR;
        let plot_width = width - left_margin;
        let plot_height = height - bottom_margin;

        Self {
            area,
            left_margin,
            bottom_margin,
            plot_width,
            plot_height,
            ox: area.top_left.x + left_margin as i32,
            oy: area.top_left.y + plot_height as i32 - 1,
        }
    }

    /// Whether the plot area is at least 2x2
    pub fn has_plot(&self) -> bool {
        self.plot_width >= 2 && self.plot_height >= 2
    }

    /// Number of one-pixel data columns right of the y axis
    pub fn data_columns(&self) -> usize {
        self.plot_width.saturating_sub(1) as usize
    }

    /// Screen column of data column `index` (0 = leftmost)
    pub fn column_x(&self, index: usize) -> i32 {
        self.ox + 1 + index as i32
    }

    /// Rightmost column of the panel
    pub fn right_edge(&self) -> i32 {
        self.area.top_left.x + self.area.size.width as i32 - 1
    }

    /// Region left of the y axis holding y ticks and their labels
    pub fn y_tick_region(&self) -> Rectangle {
        Rectangle::new(
            self.area.top_left,
            Size::new(self.left_margin, self.plot_height),
        )
    }

    /// Band below the x axis holding x ticks and their labels
    pub fn x_label_band(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.area.top_left.x, self.oy + 1),
            Size::new(self.area.size.width, self.bottom_margin),
        )
    }

    /// Vertical strip of data column `index` above the x axis
    pub fn column_strip(&self, index: usize) -> Rectangle {
        Rectangle::new(
            Point::new(self.column_x(index), self.area.top_left.y),
            Size::new(1, self.plot_height - 1),
        )
    }

    pub fn y_axis_line(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.ox, self.area.top_left.y),
            Size::new(1, self.plot_height),
        )
    }

    pub fn x_axis_line(&self) -> Rectangle {
        Rectangle::new(Point::new(self.ox, self.oy), Size::new(self.plot_width, 1))
    }

    pub fn major_tick_length(&self) -> u32 {
        self.left_margin / MAJOR_TICK_DIVISOR
    }

    pub fn minor_tick_length(&self) -> u32 {
        self.left_margin / MINOR_TICK_DIVISOR
    }

    /// Bar height in pixels for an offset into a value span.
    ///
    /// Integer half-up rounding of `offset * (plot_height - 1) / span`. A zero
    /// span maps everything to the baseline.
    pub fn scale(&self, offset: u32, span: u32) -> u32 {
        if span == 0 {
            return 0;
        }
        let rows = u64::from(self.plot_height - 1);
        let span = u64::from(span);
        let scaled = (2 * u64::from(offset) * rows + span) / (2 * span);
        scaled.min(rows) as u32
    }

    /// Screen row of a bar of `height` pixels
    pub fn row_for_height(&self, height: u32) -> i32 {
        self.oy - height as i32
    }
}
