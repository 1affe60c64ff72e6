//! The [`PixelSink`] drawing capability and its `embedded-graphics` adapters.

use core::fmt;
use core::iter;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Clipped drawing primitives consumed by the graph renderer.
///
/// Calls are executed synchronously and in the exact order they are issued.
/// Anything outside the panel is clipped by the sink.
pub trait PixelSink {
    /// Error raised by the underlying transport
    type Error: fmt::Debug;

    /// Physical size of the panel currently addressed
    fn size(&self) -> Size;

    /// Fill a rectangle with a solid color
    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    /// Set a single pixel
    fn write_pixel(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error>;

    /// Bounding rectangle of the physical panel
    fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size())
    }
}

impl<S: PixelSink + ?Sized> PixelSink for &mut S {
    type Error = S::Error;

    fn size(&self) -> Size {
        (**self).size()
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        (**self).fill_rect(area, color)
    }

    fn write_pixel(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error> {
        (**self).write_pixel(point, color)
    }
}

/// [`PixelSink`] over any `embedded-graphics` draw target
///
/// Use this to drive a `mipidsi` display, a simulator window, or a
/// [`FrameBuffer`](super::FrameBuffer) directly.
pub struct DrawTargetSink<D> {
    target: D,
}

impl<D> DrawTargetSink<D> {
    pub const fn new(target: D) -> Self {
        Self { target }
    }

    pub fn inner(&self) -> &D {
        &self.target
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.target
    }

    pub fn into_inner(self) -> D {
        self.target
    }
}

impl<D> PixelSink for DrawTargetSink<D>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
    D::Error: fmt::Debug,
{
    type Error = D::Error;

    fn size(&self) -> Size {
        OriginDimensions::size(&self.target)
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.target.bounding_box());
        if clipped.is_zero_sized() {
            return Ok(());
        }
        self.target.fill_solid(&clipped, color)
    }

    fn write_pixel(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error> {
        if !self.target.bounding_box().contains(point) {
            return Ok(());
        }
        self.target.draw_iter(iter::once(Pixel(point, color)))
    }
}

/// `embedded-graphics` draw target that routes into a [`PixelSink`]
///
/// Everything drawn through it is clipped to `clip`, so text and other
/// primitives can never spill outside the region that the caller will later
/// erase.
pub struct SinkTarget<'a, S: PixelSink + ?Sized> {
    sink: &'a mut S,
    clip: Rectangle,
}

impl<'a, S: PixelSink + ?Sized> SinkTarget<'a, S> {
    pub fn new(sink: &'a mut S, clip: Rectangle) -> Self {
        let clip = clip.intersection(&sink.bounds());
        Self { sink, clip }
    }
}

impl<S: PixelSink + ?Sized> Dimensions for SinkTarget<'_, S> {
    fn bounding_box(&self) -> Rectangle {
        self.clip
    }
}

impl<S: PixelSink + ?Sized> DrawTarget for SinkTarget<'_, S> {
    type Color = Rgb565;
    type Error = S::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if self.clip.contains(point) {
                self.sink.write_pixel(point, color)?;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.clip);
        if clipped.is_zero_sized() {
            return Ok(());
        }
        self.sink.fill_rect(clipped, color)
    }
}
