//! In-RAM panels with per-pixel change detection.
//!
//! A [`FrameBuffer`] stands in for one physical panel. Drawing lands in the
//! buffer and only the rectangle containing changed pixels is pushed to a real
//! draw target by [`FrameBuffer::flush`]. [`FramebufferPanels`] groups several
//! of them behind the [`DisplayMultiplexer`] contract, which is what the
//! simulator and the tests drive.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use super::multiplexer::{DisplayMultiplexer, DrawError, MuxError, PanelId};
use super::sink::PixelSink;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::with_corners(
            Point::new(self.min_x as i32, self.min_y as i32),
            Point::new(self.max_x as i32, self.max_y as i32),
        )
    }
}

/// Heap-allocated RGB565 pixel buffer implementing `DrawTarget`.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb565>,
    dirty: Option<DirtyRect>,
}

impl FrameBuffer {
    /// Allocate a framebuffer of the given size filled with black pixels.
    pub fn new(size: Size) -> Self {
        let width = size.width as usize;
        let height = size.height as usize;
        Self {
            width,
            height,
            pixels: vec![Rgb565::BLACK; width * height],
            dirty: None,
        }
    }

    /// Color at `point`, or `None` when it lies outside the buffer
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        let (x, y) = self.index_of(point)?;
        Some(self.pixels[y * self.width + x])
    }

    /// Whether any pixel changed since the last flush
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Rectangle that the next flush would send
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.dirty.map(DirtyRect::to_rectangle)
    }

    fn index_of(&self, point: Point) -> Option<(usize, usize)> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Write a single pixel, expanding the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) {
        let idx = y * self.width + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Flush the dirty region to `display`, then reset the dirty state.
    ///
    /// If nothing changed this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let width = rect.max_x - rect.min_x + 1;
        let area = rect.to_rectangle();
        debug!(
            "flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, rect.min_x, rect.min_y
        );

        let pixels = &self.pixels;
        let stride = self.width;
        let pixel_iter = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * stride + rect.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }

    /// Clamp `area` to the buffer, returning `(x_start, y_start, x_end, y_end)`
    fn clamp(&self, area: &Rectangle) -> (usize, usize, usize, usize) {
        let clip = |v: i32, max: usize| (v.max(0) as usize).min(max);
        let x_end = i64::from(area.top_left.x) + i64::from(area.size.width);
        let y_end = i64::from(area.top_left.y) + i64::from(area.size.height);
        (
            clip(area.top_left.x, self.width),
            clip(area.top_left.y, self.height),
            (x_end.max(0) as usize).min(self.width),
            (y_end.max(0) as usize).min(self.height),
        )
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let Some((x, y)) = self.index_of(coord) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let points = area.points();
        for (point, color) in points.zip(colors) {
            if let Some((x, y)) = self.index_of(point) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let (x_start, y_start, x_end, y_end) = self.clamp(area);
        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

/// A set of framebuffers addressed one at a time.
///
/// Panel `n` of the multiplexer is `panels[n]`. Drawing while no panel is
/// selected fails with [`DrawError::NoPanelSelected`], the same as a shared
/// SPI bus with every chip select released.
pub struct FramebufferPanels {
    panels: Vec<FrameBuffer>,
    selected: Option<PanelId>,
}

impl FramebufferPanels {
    /// `count` panels of identical `size`
    pub fn new(count: usize, size: Size) -> Self {
        Self {
            panels: (0..count).map(|_| FrameBuffer::new(size)).collect(),
            selected: None,
        }
    }

    pub fn panel(&self, id: PanelId) -> Option<&FrameBuffer> {
        self.panels.get(id.index())
    }

    pub fn panel_mut(&mut self, id: PanelId) -> Option<&mut FrameBuffer> {
        self.panels.get_mut(id.index())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PanelId, &mut FrameBuffer)> {
        self.panels
            .iter_mut()
            .enumerate()
            .map(|(i, fb)| (PanelId(i as u8), fb))
    }

    fn active(&mut self) -> Result<&mut FrameBuffer, DrawError<Infallible>> {
        let id = self.selected.ok_or(DrawError::NoPanelSelected)?;
        self.panels
            .get_mut(id.index())
            .ok_or(DrawError::NoPanelSelected)
    }
}

impl DisplayMultiplexer for FramebufferPanels {
    type Error = MuxError<Infallible>;

    fn panel_count(&self) -> usize {
        self.panels.len()
    }

    fn selected_panel(&self) -> Option<PanelId> {
        self.selected
    }

    fn select_panel(&mut self, id: PanelId) -> Result<(), Self::Error> {
        if id.index() >= self.panels.len() {
            return Err(MuxError::UnknownPanel(id));
        }
        if let Some(active) = self.selected {
            return Err(MuxError::AlreadySelected {
                active,
                requested: id,
            });
        }
        self.selected = Some(id);
        Ok(())
    }

    fn deselect_panel(&mut self, id: PanelId) -> Result<(), Self::Error> {
        if self.selected != Some(id) {
            return Err(MuxError::NotSelected(id));
        }
        self.selected = None;
        Ok(())
    }
}

impl PixelSink for FramebufferPanels {
    type Error = DrawError<Infallible>;

    fn size(&self) -> Size {
        self.selected
            .and_then(|id| self.panels.get(id.index()))
            .or_else(|| self.panels.first())
            .map(OriginDimensions::size)
            .unwrap_or_default()
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let fb = self.active()?;
        fb.fill_solid(&area, color).map_err(DrawError::Target)
    }

    fn write_pixel(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error> {
        let fb = self.active()?;
        fb.draw_iter(core::iter::once(Pixel(point, color)))
            .map_err(DrawError::Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_rect_tracks_changes() {
        let mut fb = FrameBuffer::new(Size::new(16, 8));
        assert!(!fb.is_dirty());

        fb.draw_iter([
            Pixel(Point::new(3, 2), Rgb565::RED),
            Pixel(Point::new(10, 5), Rgb565::RED),
        ])
        .unwrap();

        assert_eq!(
            fb.dirty_area(),
            Some(Rectangle::with_corners(Point::new(3, 2), Point::new(10, 5)))
        );
    }

    #[test]
    fn test_same_color_is_not_dirty() {
        let mut fb = FrameBuffer::new(Size::new(4, 4));
        fb.fill_solid(&Rectangle::new(Point::zero(), Size::new(4, 4)), Rgb565::BLACK)
            .unwrap();
        assert!(!fb.is_dirty());
    }

    #[test]
    fn test_flush_copies_dirty_region_and_resets() {
        let mut fb = FrameBuffer::new(Size::new(8, 8));
        fb.fill_solid(
            &Rectangle::new(Point::new(2, 2), Size::new(3, 2)),
            Rgb565::GREEN,
        )
        .unwrap();

        let mut target = FrameBuffer::new(Size::new(8, 8));
        fb.flush(&mut target).unwrap();

        assert!(!fb.is_dirty());
        assert_eq!(target.pixel(Point::new(4, 3)), Some(Rgb565::GREEN));
        assert_eq!(target.pixel(Point::new(5, 3)), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_fill_solid_clamps_to_bounds() {
        let mut fb = FrameBuffer::new(Size::new(4, 4));
        fb.fill_solid(
            &Rectangle::new(Point::new(-2, 3), Size::new(10, 10)),
            Rgb565::BLUE,
        )
        .unwrap();
        assert_eq!(fb.pixel(Point::new(0, 3)), Some(Rgb565::BLUE));
        assert_eq!(fb.pixel(Point::new(3, 3)), Some(Rgb565::BLUE));
        assert_eq!(fb.pixel(Point::new(0, 2)), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_panels_require_selection() {
        let mut panels = FramebufferPanels::new(2, Size::new(4, 4));
        assert_eq!(
            panels.write_pixel(Point::zero(), Rgb565::RED),
            Err(DrawError::NoPanelSelected)
        );

        panels.select_panel(PanelId(1)).unwrap();
        panels.write_pixel(Point::zero(), Rgb565::RED).unwrap();
        panels.deselect_panel(PanelId(1)).unwrap();

        assert_eq!(
            panels.panel(PanelId(1)).unwrap().pixel(Point::zero()),
            Some(Rgb565::RED)
        );
        assert_eq!(
            panels.panel(PanelId(0)).unwrap().pixel(Point::zero()),
            Some(Rgb565::BLACK)
        );
    }

    #[test]
    fn test_panels_reject_double_selection() {
        let mut panels = FramebufferPanels::new(2, Size::new(4, 4));
        panels.select_panel(PanelId(0)).unwrap();
        assert_eq!(
            panels.select_panel(PanelId(1)),
            Err(MuxError::AlreadySelected {
                active: PanelId(0),
                requested: PanelId(1)
            })
        );
        assert_eq!(
            panels.select_panel(PanelId(7)),
            Err(MuxError::UnknownPanel(PanelId(7)))
        );
    }
}
