//! Hardware-independent core library for wxgraph
//!
//! This crate contains the live data-to-pixels pipeline of the wxgraph
//! sensor dashboard: a fixed-capacity sample store, incremental ingestion of
//! the append-only sensor log, and the graph renderer that decides how much of
//! each panel has to be redrawn on every update.
//!
//! Display hardware is reached only through the [`display::PixelSink`] and
//! [`display::DisplayMultiplexer`] capabilities, so the same code drives real
//! SPI panels, the desktop simulator, and the unit tests.

pub mod config;
pub mod dashboard;
pub mod display;
pub mod ingest;
pub mod sensors;
pub mod storage;
pub mod ui;
pub mod watcher;
