//! Panel addressing on a shared display transport.

use core::fmt;
use core::ops::{Deref, DerefMut};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a physical panel on a multiplexed transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(pub u8);

impl PanelId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Panel selection failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MuxError<E> {
    /// No panel with this id is wired up
    #[error("panel {0} does not exist")]
    UnknownPanel(PanelId),

    /// Another panel still holds the transport
    #[error("panel {requested} requested while panel {active} is still selected")]
    AlreadySelected {
        /// Panel currently selected
        active: PanelId,
        /// Panel that was asked for
        requested: PanelId,
    },

    /// Released a panel that is not the selected one
    #[error("panel {0} is not selected")]
    NotSelected(PanelId),

    /// Chip-select line could not be driven
    #[error("chip-select line error: {0:?}")]
    Pin(E),
}

/// Drawing failures on a multiplexed transport
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError<E> {
    /// Draw call issued while every panel is deselected
    #[error("no panel is selected")]
    NoPanelSelected,

    /// The underlying draw target failed
    #[error("draw target error: {0:?}")]
    Target(E),
}

/// Exclusive addressing of one panel at a time.
///
/// Exactly one panel may be selected while drawing. Prefer
/// [`PanelSelection`] over calling `select_panel`/`deselect_panel` by hand,
/// so an early return cannot leave a panel selected.
pub trait DisplayMultiplexer {
    type Error: fmt::Debug;

    /// Number of addressable panels
    fn panel_count(&self) -> usize;

    /// Panel currently holding the transport
    fn selected_panel(&self) -> Option<PanelId>;

    fn select_panel(&mut self, id: PanelId) -> Result<(), Self::Error>;

    fn deselect_panel(&mut self, id: PanelId) -> Result<(), Self::Error>;

    /// Release whatever panel is selected
    fn release_all(&mut self) -> Result<(), Self::Error> {
        match self.selected_panel() {
            Some(id) => self.deselect_panel(id),
            None => Ok(()),
        }
    }
}

/// Scoped selection of one panel.
///
/// Dereferences to the multiplexer so draw calls go to the selected panel.
/// The panel is deselected when the guard is dropped; use
/// [`PanelSelection::finish`] to observe the deselect result.
pub struct PanelSelection<'a, M: DisplayMultiplexer> {
    mux: &'a mut M,
    id: PanelId,
    released: bool,
}

impl<'a, M: DisplayMultiplexer> PanelSelection<'a, M> {
    pub fn acquire(mux: &'a mut M, id: PanelId) -> Result<Self, M::Error> {
        mux.select_panel(id)?;
        Ok(Self {
            mux,
            id,
            released: false,
        })
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    /// Deselect the panel, reporting failure to the caller
    pub fn finish(mut self) -> Result<(), M::Error> {
        self.released = true;
        self.mux.deselect_panel(self.id)
    }
}

impl<M: DisplayMultiplexer> Deref for PanelSelection<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.mux
    }
}

impl<M: DisplayMultiplexer> DerefMut for PanelSelection<'_, M> {
    fn deref_mut(&mut self) -> &mut M {
        self.mux
    }
}

impl<M: DisplayMultiplexer> Drop for PanelSelection<'_, M> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.mux.deselect_panel(self.id) {
            warn!("failed to deselect panel {}: {:?}", self.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::FramebufferPanels;
    use embedded_graphics::prelude::Size;

    #[test]
    fn test_guard_deselects_on_drop() {
        let mut panels = FramebufferPanels::new(2, Size::new(4, 4));
        {
            let guard = PanelSelection::acquire(&mut panels, PanelId(1)).unwrap();
            assert_eq!(guard.selected_panel(), Some(PanelId(1)));
        }
        assert_eq!(panels.selected_panel(), None);
    }

    #[test]
    fn test_finish_reports_and_skips_drop() {
        let mut panels = FramebufferPanels::new(1, Size::new(4, 4));
        let guard = PanelSelection::acquire(&mut panels, PanelId(0)).unwrap();
        assert_eq!(guard.finish(), Ok(()));
        assert_eq!(panels.selected_panel(), None);
    }

    #[test]
    fn test_release_all() {
        let mut panels = FramebufferPanels::new(2, Size::new(4, 4));
        panels.release_all().unwrap();
        panels.select_panel(PanelId(0)).unwrap();
        panels.release_all().unwrap();
        assert_eq!(panels.selected_panel(), None);
    }
}
