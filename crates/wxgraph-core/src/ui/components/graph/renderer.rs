//! Full and incremental graph rendering

use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use log::debug;

use crate::display::{PixelSink, SinkTarget};
use crate::storage::SampleRingBuffer;
use crate::ui::styling::{GRADIENT_START, color_increase};

use super::RenderError;
use super::axis::{format_value_label, plan_x_ticks, plan_y_ticks};
use super::channel::{GraphChannelConfig, RenderState, ValueRange};
use super::constants::{
    AXIS_LABEL_FONT, GRADIENT_STEP_COLUMNS, X_LABEL_OFFSET_PX, X_TICK_LENGTH_PX,
};
use super::panel::{GraphPanel, PanelGeometry};

/// Requested amount of redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Clear the panel region and draw everything
    Full,
    /// Redraw only what changed since the last render of this channel
    Incremental,
}

/// How much axis chrome a render pass touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRedraw {
    /// Panel cleared, axes, ticks and labels drawn
    Full,
    /// Y tick region erased and redrawn
    YTicks,
    /// No chrome drawn
    None,
}

/// Summary of one successful render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    pub axes: AxisRedraw,
    /// Data columns that received a bar
    pub columns_drawn: usize,
    /// Value range now on screen
    pub range: Option<ValueRange>,
}

/// Draws graph panels from the sample history.
///
/// The renderer itself is stateless; everything that survives between passes
/// lives in the [`GraphChannelConfig`] handed to [`GraphRenderer::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphRenderer {
    data_interval_minutes: u32,
    x_mark_interval_minutes: u32,
}

impl GraphRenderer {
    /// `data_interval_minutes` is the time one data column represents,
    /// `x_mark_interval_minutes` the time between x ticks.
    pub fn new(data_interval_minutes: u32, x_mark_interval_minutes: u32) -> Self {
        Self {
            data_interval_minutes: data_interval_minutes.max(1),
            x_mark_interval_minutes,
        }
    }

    /// Columns between two x ticks
    pub fn pixel_step(&self) -> u32 {
        (self.x_mark_interval_minutes / self.data_interval_minutes).max(1)
    }

    /// Render one panel.
    ///
    /// An incremental request on a channel that was never drawn (or whose
    /// last pass failed) is upgraded to a full render. On error the channel
    /// is reset so the next pass redraws everything.
    pub fn render<S: PixelSink + ?Sized>(
        &self,
        sink: &mut S,
        panel: &GraphPanel,
        channel: &mut GraphChannelConfig,
        samples: &SampleRingBuffer,
        mode: RenderMode,
    ) -> Result<RenderOutcome, RenderError<S::Error>> {
        let result = self.render_pass(sink, panel, channel, samples, mode);
        match &result {
            Ok(outcome) => {
                channel.last_range = outcome.range;
                channel.state = RenderState::Drawn;
            }
            Err(_) => channel.invalidate(),
        }
        result
    }

    fn render_pass<S: PixelSink + ?Sized>(
        &self,
        sink: &mut S,
        panel: &GraphPanel,
        channel: &GraphChannelConfig,
        samples: &SampleRingBuffer,
        mode: RenderMode,
    ) -> Result<RenderOutcome, RenderError<S::Error>> {
        let geometry = validate(sink, panel, channel)?;
        let columns = geometry.data_columns();
        let kind = channel.kind();

        let range = ValueRange::of(samples.window(columns).map(|s| kind.value(s)));

        let mode = match (mode, channel.state()) {
            (RenderMode::Incremental, RenderState::NotYetDrawn) => RenderMode::Full,
            (mode, _) => mode,
        };
        let axes = match mode {
            RenderMode::Full => AxisRedraw::Full,
            RenderMode::Incremental if range != channel.last_range() => AxisRedraw::YTicks,
            RenderMode::Incremental => AxisRedraw::None,
        };

        match axes {
            AxisRedraw::Full => {
                sink.fill_rect(panel.area, panel.background)
                    .map_err(RenderError::Sink)?;
                self.draw_axes(sink, panel, &geometry)?;
                if let Some(range) = range {
                    draw_y_ticks(sink, panel, channel, &geometry, range)?;
                }
            }
            AxisRedraw::YTicks => {
                sink.fill_rect(geometry.y_tick_region(), panel.background)
                    .map_err(RenderError::Sink)?;
                if let Some(range) = range {
                    draw_y_ticks(sink, panel, channel, &geometry, range)?;
                }
            }
            AxisRedraw::None => {}
        }

        let columns_drawn = draw_columns(sink, panel, channel, &geometry, samples, range)?;

        // Bars are filled down to the axis row
        sink.fill_rect(geometry.x_axis_line(), panel.foreground)
            .map_err(RenderError::Sink)?;

        debug!(
            "{} panel {} at {:?}: axes {:?}, {} columns, range {:?}",
            kind, panel.display, panel.area.top_left, axes, columns_drawn, range
        );

        Ok(RenderOutcome {
            axes,
            columns_drawn,
            range,
        })
    }

    fn draw_axes<S: PixelSink + ?Sized>(
        &self,
        sink: &mut S,
        panel: &GraphPanel,
        geometry: &PanelGeometry,
    ) -> Result<(), RenderError<S::Error>> {
        sink.fill_rect(geometry.y_axis_line(), panel.foreground)
            .map_err(RenderError::Sink)?;
        sink.fill_rect(geometry.x_axis_line(), panel.foreground)
            .map_err(RenderError::Sink)?;

        let band = geometry.x_label_band();
        for tick in plan_x_ticks(geometry, self.pixel_step(), self.x_mark_interval_minutes) {
            let tick = tick?;
            sink.fill_rect(
                Rectangle::new(
                    Point::new(tick.column, geometry.oy + 1),
                    Size::new(1, X_TICK_LENGTH_PX),
                ),
                panel.foreground,
            )
            .map_err(RenderError::Sink)?;
            draw_label(
                sink,
                panel,
                band,
                &tick.label,
                Point::new(tick.column, geometry.oy + X_LABEL_OFFSET_PX),
                Baseline::Top,
            )?;
        }
        Ok(())
    }
}

fn validate<S: PixelSink + ?Sized>(
    sink: &S,
    panel: &GraphPanel,
    channel: &GraphChannelConfig,
) -> Result<PanelGeometry, RenderError<S::Error>> {
    let display = sink.size();
    let area = panel.area;
    let fits = |origin: i32, extent: u32, limit: u32| {
        origin >= 0 && i64::from(origin) + i64::from(extent) <= i64::from(limit)
    };
    if !fits(area.top_left.x, area.size.width, display.width)
        || !fits(area.top_left.y, area.size.height, display.height)
    {
        return Err(RenderError::PanelOutOfBounds { area, display });
    }

    let geometry = panel.geometry();
    if !geometry.has_plot() {
        return Err(RenderError::PanelTooSmall {
            width: area.size.width,
            height: area.size.height,
        });
    }

    if panel.channel != channel.kind() {
        return Err(RenderError::ChannelMismatch {
            panel: panel.channel,
            channel: channel.kind(),
        });
    }
    Ok(geometry)
}

fn draw_y_ticks<S: PixelSink + ?Sized>(
    sink: &mut S,
    panel: &GraphPanel,
    channel: &GraphChannelConfig,
    geometry: &PanelGeometry,
    range: ValueRange,
) -> Result<(), RenderError<S::Error>> {
    let region = geometry.y_tick_region();
    let major = geometry.major_tick_length();
    let minor = geometry.minor_tick_length();
    let mark_x = geometry.ox - major as i32;

    for tick in plan_y_ticks(geometry, range, channel.mark_big(), channel.mark_small()) {
        let length = if tick.major { major } else { minor };
        sink.fill_rect(
            Rectangle::new(
                Point::new(geometry.ox - length as i32, tick.row),
                Size::new(length, 1),
            ),
            panel.foreground,
        )
        .map_err(RenderError::Sink)?;

        if tick.major {
            let label = format_value_label(tick.value)?;
            draw_label(
                sink,
                panel,
                region,
                &label,
                Point::new(mark_x - 1, tick.row),
                Baseline::Middle,
            )?;
        }
    }
    Ok(())
}

fn draw_columns<S: PixelSink + ?Sized>(
    sink: &mut S,
    panel: &GraphPanel,
    channel: &GraphChannelConfig,
    geometry: &PanelGeometry,
    samples: &SampleRingBuffer,
    range: Option<ValueRange>,
) -> Result<usize, RenderError<S::Error>> {
    let columns = geometry.data_columns();
    let mut window = samples.window(columns);
    let first_filled = columns - samples.len().min(columns);
    let kind = channel.kind();

    let mut color = GRADIENT_START;
    let mut drawn = 0;
    for index in 0..columns {
        if index % GRADIENT_STEP_COLUMNS == 0 {
            color = color_increase(color);
        }

        sink.fill_rect(geometry.column_strip(index), panel.background)
            .map_err(RenderError::Sink)?;

        if index < first_filled {
            continue;
        }
        let (Some(sample), Some(range)) = (window.next(), range) else {
            continue;
        };

        let height = geometry.scale(kind.value(sample) - range.min, range.span());
        sink.fill_rect(
            Rectangle::new(
                Point::new(geometry.column_x(index), geometry.row_for_height(height)),
                Size::new(1, height + 1),
            ),
            color,
        )
        .map_err(RenderError::Sink)?;
        drawn += 1;
    }
    Ok(drawn)
}

/// Right-aligned opaque label ending on `anchor.x`, clipped to `clip`
fn draw_label<S: PixelSink + ?Sized>(
    sink: &mut S,
    panel: &GraphPanel,
    clip: Rectangle,
    text: &str,
    anchor: Point,
    baseline: Baseline,
) -> Result<(), RenderError<S::Error>> {
    let character_style = MonoTextStyleBuilder::new()
        .font(AXIS_LABEL_FONT)
        .text_color(panel.foreground)
        .background_color(panel.background)
        .build();
    let text_style = TextStyleBuilder::new()
        .alignment(Alignment::Right)
        .baseline(baseline)
        .build();

    let mut target = SinkTarget::new(sink, clip);
    Text::with_text_style(text, anchor, character_style, text_style)
        .draw(&mut target)
        .map_err(RenderError::Sink)?;
    Ok(())
}
