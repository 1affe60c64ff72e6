//! Dashboard configuration.
//!
//! Every field has a default, so an empty TOML document yields the stock
//! two-display weather station layout:
//!
//! ```toml
//! log_path = "BME280.log"
//! data_interval_minutes = 15
//! x_axis_mark_interval_minutes = 720
//! buffer_capacity = 300
//!
//! [display]
//! count = 2
//! width = 320
//! height = 240
//!
//! [[panels]]
//! display = 0
//! x = 0
//! y = 0
//! width = 320
//! height = 120
//! channel = "temperature"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, PanelId};
use crate::sensors::ChannelKind;
use crate::storage::DEFAULT_CAPACITY;
use crate::ui::components::graph::PanelGeometry;
use crate::ui::styling::{GRAPH_BACKGROUND, GRAPH_FOREGROUND, color_from_raw, color_to_raw};
use crate::ui::{GraphChannelConfig, GraphPanel};

/// Log records are kept when their minute is a multiple of this
pub const DEFAULT_DATA_INTERVAL_MINUTES: u32 = 15;

/// Time between two x-axis ticks (12 hours)
pub const DEFAULT_X_AXIS_MARK_INTERVAL_MINUTES: u32 = 12 * 60;

pub const DEFAULT_LOG_PATH: &str = "BME280.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} must be non-zero")]
    Zero(&'static str),

    #[error("x-axis mark interval {mark} is shorter than the data interval {data}")]
    MarkIntervalTooShort { mark: u32, data: u32 },

    #[error("{channel} tick spacing must be non-zero")]
    ZeroTickSpacing { channel: ChannelKind },

    #[error("no graph panels configured")]
    NoPanels,

    #[error("panel {index} is on display {display}, but only {count} displays exist")]
    UnknownDisplay {
        index: usize,
        display: PanelId,
        count: u8,
    },

    #[error("panel {index} at {area:?} does not fit the {display:?} display")]
    PanelOutOfBounds {
        index: usize,
        area: Rectangle,
        display: Size,
    },

    #[error("panel {index} is too small to hold a graph")]
    PanelTooSmall { index: usize },
}

/// Physical panel geometry, shared by every display on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub count: u8,
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            count: 2,
            width: DISPLAY_WIDTH_PX,
            height: DISPLAY_HEIGHT_PX,
        }
    }
}

impl DisplayConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Y tick spacing in fixed-point units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelScale {
    pub mark_big: u32,
    pub mark_small: u32,
}

impl ChannelScale {
    fn defaults_for(kind: ChannelKind) -> Self {
        let (mark_big, mark_small) = kind.default_marks();
        Self {
            mark_big,
            mark_small,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub temperature: ChannelScale,
    pub pressure: ChannelScale,
    pub humidity: ChannelScale,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            temperature: ChannelScale::defaults_for(ChannelKind::Temperature),
            pressure: ChannelScale::defaults_for(ChannelKind::Pressure),
            humidity: ChannelScale::defaults_for(ChannelKind::Humidity),
        }
    }
}

impl ScaleConfig {
    pub fn get(&self, kind: ChannelKind) -> ChannelScale {
        match kind {
            ChannelKind::Temperature => self.temperature,
            ChannelKind::Pressure => self.pressure,
            ChannelKind::Humidity => self.humidity,
        }
    }
}

fn default_foreground() -> u16 {
    color_to_raw(GRAPH_FOREGROUND)
}

fn default_background() -> u16 {
    color_to_raw(GRAPH_BACKGROUND)
}

/// One graph on one display. Colors are packed RGB565.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub display: PanelId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub channel: ChannelKind,
    #[serde(default = "default_foreground")]
    pub foreground: u16,
    #[serde(default = "default_background")]
    pub background: u16,
}

impl PanelConfig {
    fn new(display: u8, x: i32, y: i32, width: u32, height: u32, channel: ChannelKind) -> Self {
        Self {
            display: PanelId(display),
            x,
            y,
            width,
            height,
            channel,
            foreground: default_foreground(),
            background: default_background(),
        }
    }

    pub fn area(&self) -> Rectangle {
        Rectangle::new(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }

    pub fn to_graph_panel(&self) -> GraphPanel {
        GraphPanel::new(self.display, self.area(), self.channel)
            .with_colors(color_from_raw(self.foreground), color_from_raw(self.background))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Sensor log to tail
    pub log_path: PathBuf,
    pub data_interval_minutes: u32,
    pub x_axis_mark_interval_minutes: u32,
    /// Samples kept in memory
    pub buffer_capacity: usize,
    pub display: DisplayConfig,
    pub scales: ScaleConfig,
    pub panels: Vec<PanelConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            data_interval_minutes: DEFAULT_DATA_INTERVAL_MINUTES,
            x_axis_mark_interval_minutes: DEFAULT_X_AXIS_MARK_INTERVAL_MINUTES,
            buffer_capacity: DEFAULT_CAPACITY,
            display: DisplayConfig::default(),
            scales: ScaleConfig::default(),
            panels: vec![
                PanelConfig::new(0, 0, 0, 320, 120, ChannelKind::Temperature),
                PanelConfig::new(0, 0, 120, 320, 120, ChannelKind::Humidity),
                PanelConfig::new(1, 0, 0, 320, 240, ChannelKind::Pressure),
            ],
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_interval_minutes == 0 {
            return Err(ConfigError::Zero("data_interval_minutes"));
        }
        if self.x_axis_mark_interval_minutes == 0 {
            return Err(ConfigError::Zero("x_axis_mark_interval_minutes"));
        }
        if self.x_axis_mark_interval_minutes < self.data_interval_minutes {
            return Err(ConfigError::MarkIntervalTooShort {
                mark: self.x_axis_mark_interval_minutes,
                data: self.data_interval_minutes,
            });
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Zero("buffer_capacity"));
        }
        if self.display.count == 0 {
            return Err(ConfigError::Zero("display.count"));
        }

        for channel in ChannelKind::ALL {
            let scale = self.scales.get(channel);
            if scale.mark_big == 0 || scale.mark_small == 0 {
                return Err(ConfigError::ZeroTickSpacing { channel });
            }
        }

        if self.panels.is_empty() {
            return Err(ConfigError::NoPanels);
        }
        let display = self.display.size();
        let bounds = Rectangle::new(Point::zero(), display);
        for (index, panel) in self.panels.iter().enumerate() {
            if panel.display.0 >= self.display.count {
                return Err(ConfigError::UnknownDisplay {
                    index,
                    display: panel.display,
                    count: self.display.count,
                });
            }
            let area = panel.area();
            if panel.x < 0 || panel.y < 0 || bounds.intersection(&area) != area {
                return Err(ConfigError::PanelOutOfBounds {
                    index,
                    area,
                    display,
                });
            }
            if !PanelGeometry::new(area).has_plot() {
                return Err(ConfigError::PanelTooSmall { index });
            }
        }
        Ok(())
    }

    /// Fresh render state for `kind` with the configured tick spacing
    pub fn channel_config(&self, kind: ChannelKind) -> Result<GraphChannelConfig, ConfigError> {
        let scale = self.scales.get(kind);
        GraphChannelConfig::new(kind, scale.mark_big, scale.mark_small)
            .map_err(|_| ConfigError::ZeroTickSpacing { channel: kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DashboardConfig::default();
        config.validate().unwrap();
        assert_eq!(config.panels.len(), 3);
        assert_eq!(config.scales.get(ChannelKind::Humidity).mark_big, 500);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(
            DashboardConfig::from_toml_str("").unwrap(),
            DashboardConfig::default()
        );
    }

    #[test]
    fn test_partial_document() {
        let config = DashboardConfig::from_toml_str(
            r#"
            log_path = "/var/log/bme280.log"
            data_interval_minutes = 5

            [scales.pressure]
            mark_big = 200
            mark_small = 100

            [[panels]]
            display = 0
            x = 0
            y = 0
            width = 320
            height = 240
            channel = "pressure"
            foreground = 0xFFFF
            "#,
        )
        .unwrap();

        assert_eq!(config.log_path, PathBuf::from("/var/log/bme280.log"));
        assert_eq!(config.data_interval_minutes, 5);
        assert_eq!(config.x_axis_mark_interval_minutes, 720);
        assert_eq!(config.scales.pressure.mark_big, 200);
        assert_eq!(config.scales.temperature.mark_big, 100);
        assert_eq!(config.panels.len(), 1);
        assert_eq!(config.panels[0].foreground, 0xFFFF);
        assert_eq!(config.panels[0].background, 0x0000);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = DashboardConfig {
            data_interval_minutes: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero("data_interval_minutes"))
        ));
    }

    #[test]
    fn test_rejects_panel_outside_display() {
        let mut config = DashboardConfig::default();
        config.panels[1].y = 200;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PanelOutOfBounds { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_display() {
        let mut config = DashboardConfig::default();
        config.panels[2].display = PanelId(2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownDisplay { index: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_tick_spacing() {
        let mut config = DashboardConfig::default();
        config.scales.humidity.mark_small = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTickSpacing {
                channel: ChannelKind::Humidity
            })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            DashboardConfig::from_toml_str("buffer_capacity = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_panel_colors_convert() {
        let panel = DashboardConfig::default().panels[0].to_graph_panel();
        assert_eq!(panel.foreground, GRAPH_FOREGROUND);
        assert_eq!(panel.background, GRAPH_BACKGROUND);
        assert_eq!(panel.area.size, Size::new(320, 120));
    }
}
