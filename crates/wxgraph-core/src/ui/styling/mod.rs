//! Styling for dashboard panels
//!
//! Only the pieces the graphs need: the default foreground/background pair,
//! raw RGB565 conversions used by configuration files, and the deterministic
//! column gradient.

pub mod colors;

pub use colors::{
    GRADIENT_START, GRAPH_BACKGROUND, GRAPH_FOREGROUND, color_from_raw, color_increase,
    color_to_raw,
};
