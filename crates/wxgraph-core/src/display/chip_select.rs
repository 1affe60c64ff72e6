//! Several ILI9341 panels sharing one SPI display driver.
//!
//! All panels see the same clock, data and D/C lines; each one listens only
//! while its own chip-select line is held low. The driver `D` therefore talks
//! to whichever panel is selected.

use core::fmt;
use core::iter;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::digital::OutputPin;
use log::debug;

use super::multiplexer::{DisplayMultiplexer, DrawError, MuxError, PanelId};
use super::sink::PixelSink;

/// Shared display driver plus one active-low chip select per panel
pub struct ChipSelectMultiplexer<D, P> {
    display: D,
    chip_selects: Vec<P>,
    selected: Option<PanelId>,
}

impl<D, P: OutputPin> ChipSelectMultiplexer<D, P> {
    /// Take ownership of the driver and chip selects, releasing every panel.
    pub fn new(display: D, chip_selects: Vec<P>) -> Result<Self, MuxError<P::Error>> {
        let mut mux = Self {
            display,
            chip_selects,
            selected: None,
        };
        mux.deselect_every_line()?;
        Ok(mux)
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Return the driver and pins; every line is left high.
    pub fn release(mut self) -> Result<(D, Vec<P>), MuxError<P::Error>> {
        self.deselect_every_line()?;
        Ok((self.display, self.chip_selects))
    }

    fn deselect_every_line(&mut self) -> Result<(), MuxError<P::Error>> {
        for pin in &mut self.chip_selects {
            pin.set_high().map_err(MuxError::Pin)?;
        }
        self.selected = None;
        Ok(())
    }
}

impl<D, P: OutputPin> DisplayMultiplexer for ChipSelectMultiplexer<D, P> {
    type Error = MuxError<P::Error>;

    fn panel_count(&self) -> usize {
        self.chip_selects.len()
    }

    fn selected_panel(&self) -> Option<PanelId> {
        self.selected
    }

    fn select_panel(&mut self, id: PanelId) -> Result<(), Self::Error> {
        if let Some(active) = self.selected {
            return Err(MuxError::AlreadySelected {
                active,
                requested: id,
            });
        }
        let pin = self
            .chip_selects
            .get_mut(id.index())
            .ok_or(MuxError::UnknownPanel(id))?;
        pin.set_low().map_err(MuxError::Pin)?;
        debug!("panel {} selected", id);
        self.selected = Some(id);
        Ok(())
    }

    fn deselect_panel(&mut self, id: PanelId) -> Result<(), Self::Error> {
        if self.selected != Some(id) {
            return Err(MuxError::NotSelected(id));
        }
        let pin = self
            .chip_selects
            .get_mut(id.index())
            .ok_or(MuxError::UnknownPanel(id))?;
        pin.set_high().map_err(MuxError::Pin)?;
        self.selected = None;
        Ok(())
    }

    fn release_all(&mut self) -> Result<(), Self::Error> {
        self.deselect_every_line()
    }
}

impl<D, P> PixelSink for ChipSelectMultiplexer<D, P>
where
    D: DrawTarget<Color = Rgb565> + OriginDimensions,
    D::Error: fmt::Debug,
    P: OutputPin,
{
    type Error = DrawError<D::Error>;

    fn size(&self) -> Size {
        OriginDimensions::size(&self.display)
    }

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        if self.selected.is_none() {
            return Err(DrawError::NoPanelSelected);
        }
        let clipped = area.intersection(&self.display.bounding_box());
        if clipped.is_zero_sized() {
            return Ok(());
        }
        self.display
            .fill_solid(&clipped, color)
            .map_err(DrawError::Target)
    }

    fn write_pixel(&mut self, point: Point, color: Rgb565) -> Result<(), Self::Error> {
        if self.selected.is_none() {
            return Err(DrawError::NoPanelSelected);
        }
        if !self.display.bounding_box().contains(point) {
            return Ok(());
        }
        self.display
            .draw_iter(iter::once(Pixel(point, color)))
            .map_err(DrawError::Target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{FrameBuffer, PanelSelection};
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::rc::Rc;

    type PinLog = Rc<RefCell<Vec<(u8, bool)>>>;

    struct MockPin {
        line: u8,
        log: PinLog,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.line, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push((self.line, true));
            Ok(())
        }
    }

    fn mux_with_pins(count: u8) -> (ChipSelectMultiplexer<FrameBuffer, MockPin>, PinLog) {
        let log = PinLog::default();
        let pins = (0..count)
            .map(|line| MockPin {
                line,
                log: log.clone(),
            })
            .collect();
        let mux = ChipSelectMultiplexer::new(FrameBuffer::new(Size::new(8, 8)), pins).unwrap();
        (mux, log)
    }

    #[test]
    fn test_new_releases_every_line() {
        let (_mux, log) = mux_with_pins(2);
        assert_eq!(*log.borrow(), vec![(0, true), (1, true)]);
    }

    #[test]
    fn test_select_drives_line_low() {
        let (mut mux, log) = mux_with_pins(2);
        log.borrow_mut().clear();

        let guard = PanelSelection::acquire(&mut mux, PanelId(1)).unwrap();
        guard.finish().unwrap();

        assert_eq!(*log.borrow(), vec![(1, false), (1, true)]);
    }

    #[test]
    fn test_drawing_without_selection_fails() {
        let (mut mux, _log) = mux_with_pins(1);
        assert_eq!(
            mux.fill_rect(Rectangle::new(Point::zero(), Size::new(2, 2)), Rgb565::RED),
            Err(DrawError::NoPanelSelected)
        );
    }

    #[test]
    fn test_selected_panel_receives_drawing() {
        let (mut mux, _log) = mux_with_pins(2);
        mux.select_panel(PanelId(0)).unwrap();
        mux.write_pixel(Point::new(3, 3), Rgb565::RED).unwrap();
        mux.deselect_panel(PanelId(0)).unwrap();
        assert_eq!(
            mux.display_mut().pixel(Point::new(3, 3)),
            Some(Rgb565::RED)
        );
    }

    #[test]
    fn test_unknown_and_unselected_panels() {
        let (mut mux, _log) = mux_with_pins(2);
        assert_eq!(
            mux.select_panel(PanelId(4)),
            Err(MuxError::UnknownPanel(PanelId(4)))
        );
        assert_eq!(
            mux.deselect_panel(PanelId(0)),
            Err(MuxError::NotSelected(PanelId(0)))
        );
    }
}
