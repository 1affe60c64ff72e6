//! The live dashboard: wake, ingest, redraw.
//!
//! A [`Dashboard`] owns everything that lives for the whole session: the
//! sample history, the log cursor, one render state per graph and the panel
//! bus. Each physical panel is selected for exactly as long as its graphs are
//! being drawn.

use core::convert::Infallible;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::{ConfigError, DashboardConfig};
use crate::display::{DisplayMultiplexer, PanelId, PanelSelection, PixelSink};
use crate::ingest::{IngestError, LogCursor, SensorLogIngester, TailReport};
use crate::storage::{SampleRingBuffer, StorageError};
use crate::ui::components::graph::{RenderMode, RenderOutcome};
use crate::ui::styling::GRAPH_BACKGROUND;
use crate::ui::{GraphChannelConfig, GraphPanel, GraphRenderer, RenderError};
use crate::watcher::ChangeWatcher;

/// Error types for the dashboard, generic over the bus's draw (`S`) and
/// selection (`M`) errors
#[derive(Debug, Error)]
pub enum DashboardError<S, M> {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("sample storage: {0}")]
    Storage(#[from] StorageError),

    /// The log could not be read when starting up
    #[error("initial ingest failed: {0}")]
    InitialIngest(IngestError),

    #[error("{configured} displays configured but the bus has {available}")]
    MissingDisplays { configured: u8, available: usize },

    #[error("panel selection failed: {0:?}")]
    Panel(M),

    #[error("clearing panel {display} failed: {error:?}")]
    Clear { display: PanelId, error: S },

    #[error("rendering graph {index} failed: {error}")]
    Render { index: usize, error: RenderError<S> },
}

/// Dashboard error for a given bus type
pub type BusError<B> =
    DashboardError<<B as PixelSink>::Error, <B as DisplayMultiplexer>::Error>;

/// Result of one [`Dashboard::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The log could not be read; treated as no new data
    ReadFailed,
    /// Nothing to draw
    Idle(TailReport),
    /// New samples arrived and every graph was updated
    Rendered {
        report: TailReport,
        outcomes: Vec<RenderOutcome>,
    },
}

pub struct Dashboard<B> {
    bus: B,
    ingester: SensorLogIngester,
    cursor: LogCursor,
    samples: SampleRingBuffer,
    renderer: GraphRenderer,
    graphs: Vec<GraphPanel>,
    channels: Vec<GraphChannelConfig>,
    display_count: u8,
}

impl<B> Dashboard<B>
where
    B: PixelSink + DisplayMultiplexer,
{
    /// Load the log and draw every panel from scratch.
    ///
    /// Failing to read the log here is fatal, unlike during [`Self::update`].
    pub fn start(config: &DashboardConfig, bus: B) -> Result<Self, BusError<B>> {
        config.validate()?;
        if usize::from(config.display.count) > bus.panel_count() {
            return Err(DashboardError::MissingDisplays {
                configured: config.display.count,
                available: bus.panel_count(),
            });
        }

        let ingester = SensorLogIngester::new(&config.log_path, config.data_interval_minutes)
            .map_err(DashboardError::InitialIngest)?;
        let mut samples = SampleRingBuffer::new(config.buffer_capacity)?;
        let mut cursor = LogCursor::new();
        let report = ingester
            .tail(&mut cursor, &mut samples)
            .map_err(DashboardError::InitialIngest)?;
        info!(
            "loaded {} samples from {} ({} bytes)",
            samples.len(),
            config.log_path.display(),
            report.bytes
        );

        let graphs: Vec<GraphPanel> = config.panels.iter().map(|p| p.to_graph_panel()).collect();
        let channels = config
            .panels
            .iter()
            .map(|p| config.channel_config(p.channel))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dashboard = Self {
            bus,
            ingester,
            cursor,
            samples,
            renderer: GraphRenderer::new(
                config.data_interval_minutes,
                config.x_axis_mark_interval_minutes,
            ),
            graphs,
            channels,
            display_count: config.display.count,
        };
        dashboard.redraw()?;
        Ok(dashboard)
    }

    /// Tail the log and incrementally redraw if anything new was accepted
    pub fn update(&mut self) -> Result<UpdateOutcome, BusError<B>> {
        let report = match self.ingester.tail(&mut self.cursor, &mut self.samples) {
            Ok(report) => report,
            Err(e) => {
                warn!("sensor log read failed, treating as no new data: {e}");
                return Ok(UpdateOutcome::ReadFailed);
            }
        };

        if !report.has_new_samples() {
            debug!("no new samples ({} decimated)", report.decimated);
            return Ok(UpdateOutcome::Idle(report));
        }

        let outcomes = self.render_all(RenderMode::Incremental, false)?;
        Ok(UpdateOutcome::Rendered { report, outcomes })
    }

    /// Clear every physical panel and draw all graphs in full
    pub fn redraw(&mut self) -> Result<Vec<RenderOutcome>, BusError<B>> {
        for channel in &mut self.channels {
            channel.invalidate();
        }
        self.render_all(RenderMode::Full, true)
    }

    /// Block on `watcher` forever, updating once per wake-up.
    ///
    /// Failed updates are logged and the loop continues; only a watcher
    /// failure ends it.
    pub fn run<W: ChangeWatcher>(&mut self, watcher: &mut W) -> Result<Infallible, W::Error> {
        info!("waiting for sensor log changes");
        loop {
            let events = watcher.wait_for_change()?;
            debug!("woke for {} change event(s)", events);
            if let Err(e) = self.update() {
                error!("dashboard update failed: {e}");
            }
        }
    }

    /// Deselect every panel and hand the bus back
    pub fn release(mut self) -> Result<B, <B as DisplayMultiplexer>::Error> {
        self.bus.release_all()?;
        info!("dashboard released");
        Ok(self.bus)
    }

    pub fn samples(&self) -> &SampleRingBuffer {
        &self.samples
    }

    pub fn cursor(&self) -> LogCursor {
        self.cursor
    }

    pub fn graphs(&self) -> &[GraphPanel] {
        &self.graphs
    }

    pub fn channel(&self, index: usize) -> Option<&GraphChannelConfig> {
        self.channels.get(index)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn render_all(
        &mut self,
        mode: RenderMode,
        clear: bool,
    ) -> Result<Vec<RenderOutcome>, BusError<B>> {
        let mut outcomes = Vec::with_capacity(self.graphs.len());

        for display in (0..self.display_count).map(PanelId) {
            if !clear && !self.graphs.iter().any(|g| g.display == display) {
                continue;
            }

            let mut selection =
                PanelSelection::acquire(&mut self.bus, display).map_err(DashboardError::Panel)?;
            if clear {
                let bounds = selection.bounds();
                selection
                    .fill_rect(bounds, GRAPH_BACKGROUND)
                    .map_err(|error| DashboardError::Clear { display, error })?;
            }

            for (index, (panel, channel)) in self
                .graphs
                .iter()
                .zip(self.channels.iter_mut())
                .enumerate()
                .filter(|(_, (panel, _))| panel.display == display)
            {
                let outcome = self
                    .renderer
                    .render(&mut *selection, panel, channel, &self.samples, mode)
                    .map_err(|error| {
                        error!("{} graph on panel {} failed: {error}", panel.channel, display);
                        DashboardError::Render { index, error }
                    })?;
                outcomes.push(outcome);
            }

            selection.finish().map_err(DashboardError::Panel)?;
        }
        Ok(outcomes)
    }
}
