//! Recording sink for unit tests.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::FrameBuffer;
use super::sink::PixelSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawCall {
    FillRect(Rectangle, Rgb565),
    WritePixel(Point, Rgb565),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InjectedFault;

/// Records every call in order and mirrors it into a framebuffer.
pub(crate) struct RecordingSink {
    calls: Vec<DrawCall>,
    frame: FrameBuffer,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub(crate) fn new(size: Size) -> Self {
        Self {
            calls: Vec::new(),
            frame: FrameBuffer::new(size),
            fail_after: None,
        }
    }

    /// Fail every call once `n` calls have succeeded
    pub(crate) fn failing_after(size: Size, n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(size)
        }
    }

    pub(crate) fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub(crate) fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub(crate) fn pixel(&self, x: i32, y: i32) -> Rgb565 {
        self.frame
            .pixel(Point::new(x, y))
            .unwrap_or_else(|| panic!("({x}, {y}) outside the sink"))
    }

    pub(crate) fn fill_rects(&self) -> impl Iterator<Item = (Rectangle, Rgb565)> + '_ {
        self.calls.iter().filter_map(|call| match *call {
            DrawCall::FillRect(area, color) => Some((area, color)),
            DrawCall::WritePixel(..) => None,
        })
    }

    fn check_fault(&self) -> Result<(), InjectedFault> {
        match self.fail_after {
            Some(n) if self.calls.len() >= n => Err(InjectedFault),
            _ => Ok(()),
        }
    }
}

impl PixelSink for RecordingSink {
    type Error = InjectedFault;

    fn size(&self) -> Size {
        OriginDimensions::size(&self.frame)
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        self.check_fault()?;
        self.calls.push(DrawCall::FillRect(area, color));
        let _ = self.frame.fill_solid(&area, color);
        Ok(())
    }

    fn write_pixel(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error> {
        self.check_fault()?;
        self.calls.push(DrawCall::WritePixel(point, color));
        let _ = self.frame.draw_iter(core::iter::once(Pixel(point, color)));
        Ok(())
    }
}
