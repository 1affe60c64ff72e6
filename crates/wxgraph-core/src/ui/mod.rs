//! Graph rendering for RGB565 panels
//!
//! - [`components::graph`] - per-channel area graphs with incremental redraw
//! - [`styling`] - color constants and the column gradient

pub mod components;
pub mod styling;

pub use components::graph::{GraphChannelConfig, GraphPanel, GraphRenderer, RenderError};
