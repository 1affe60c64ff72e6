//! Axis tick planning and label formatting
//!
//! Ticks are planned as plain data so the renderer can draw them and the
//! tests can inspect them without a sink.

use core::fmt::Write;
use core::iter;

use heapless::String;

use super::LabelError;
use super::channel::ValueRange;
use super::constants::{MAX_AXIS_LABEL_LENGTH, MINUTES_PER_HOUR, NOW_LABEL, VALUE_SCALE};
use super::panel::PanelGeometry;

/// Fixed-capacity axis label
pub type AxisLabel = String<MAX_AXIS_LABEL_LENGTH>;

/// One x-axis tick, counted from the right edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XTick {
    /// Screen column of the tick
    pub column: i32,
    pub label: AxisLabel,
}

/// One y-axis tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YTick {
    /// Fixed-point value the tick marks
    pub value: u32,
    /// Screen row of the tick
    pub row: i32,
    /// Long tick with a value label
    pub major: bool,
}

fn format_bounded(value: u32, args: core::fmt::Arguments<'_>) -> Result<AxisLabel, LabelError> {
    let mut label = AxisLabel::new();
    label.write_fmt(args).map_err(|_| LabelError::TooLong {
        value,
        capacity: MAX_AXIS_LABEL_LENGTH,
    })?;
    Ok(label)
}

/// Label of a y tick: the whole-unit part of the fixed-point value
pub fn format_value_label(value: u32) -> Result<AxisLabel, LabelError> {
    let whole = value / VALUE_SCALE;
    format_bounded(whole, format_args!("{whole}"))
}

/// Label of the `index`-th x tick from the right: `"now"`, then hours ago
pub fn format_hours_label(index: u32, mark_interval_minutes: u32) -> Result<AxisLabel, LabelError> {
    if index == 0 {
        return format_bounded(0, format_args!("{NOW_LABEL}"));
    }
    let hours = index.saturating_mul(mark_interval_minutes) / MINUTES_PER_HOUR;
    format_bounded(hours, format_args!("{hours}"))
}

/// X ticks every `pixel_step` columns leftwards from the panel's right edge
pub(super) fn plan_x_ticks(
    geometry: &PanelGeometry,
    pixel_step: u32,
    mark_interval_minutes: u32,
) -> impl Iterator<Item = Result<XTick, LabelError>> + '_ {
    let step = pixel_step.max(1);
    let right = geometry.right_edge();
    (0..=geometry.plot_width / step).map(move |k| {
        Ok(XTick {
            column: right - (k * step) as i32,
            label: format_hours_label(k, mark_interval_minutes)?,
        })
    })
}

/// Y ticks at every multiple of `mark_small` strictly above `range.min`
/// and not above `range.max`
pub(super) fn plan_y_ticks(
    geometry: &PanelGeometry,
    range: ValueRange,
    mark_big: u32,
    mark_small: u32,
) -> impl Iterator<Item = YTick> + '_ {
    let rest = mark_small - range.min % mark_small;
    iter::successors(range.min.checked_add(rest), move |v| {
        v.checked_add(mark_small)
    })
    .take_while(move |v| *v <= range.max)
    .map(move |value| {
        let height = geometry.scale(value - range.min, range.span());
        YTick {
            value,
            row: geometry.row_for_height(height),
            major: value % mark_big == 0,
        }
    })
}
