//! Desktop simulator for the wxgraph sensor dashboard.
//!
//! Writes a synthetic BME280-style log, tails it with the real ingester and
//! file watcher, and shows every configured display side by side in an SDL2
//! window via `embedded-graphics-simulator`. One simulated minute is appended
//! to the log every [`MOCK_MINUTE`].
//!
//! Usage: `wxgraph-simulator [config.toml]`
//!
//! # Key bindings
//!
//! | Key | Action            |
//! |-----|-------------------|
//! | R   | Full redraw       |
//! | Q   | Quit              |

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};

use wxgraph_core::config::DashboardConfig;
use wxgraph_core::dashboard::{Dashboard, UpdateOutcome};
use wxgraph_core::display::FramebufferPanels;
use wxgraph_core::watcher::NotifyWatcher;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Wall-clock time per simulated minute of sensor data.
const MOCK_MINUTE: Duration = Duration::from_millis(100);

/// Simulated minutes written before the dashboard starts (three days).
const MOCK_HISTORY_MINUTES: u32 = 3 * 24 * 60;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Appends synthetic one-line-per-minute records to the sensor log.
struct MockLogWriter {
    file: File,
    /// Simulated minutes since the log started
    minute: u32,
}

impl MockLogWriter {
    fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file, minute: 0 })
    }

    fn line(minute: u32) -> String {
        let t = f64::from(minute);
        let temperature = 21.0 + 4.0 * (t / 720.0).sin() + 0.4 * (t / 97.0).cos();
        let pressure = 1000.0 + 9.0 * (t / 2600.0).sin() + 0.8 * (t / 311.0).cos();
        let humidity = 55.0 + 15.0 * (t / 1100.0).cos() + 1.5 * (t / 53.0).sin();

        let of_day = minute % MINUTES_PER_DAY;
        format!(
            "{:02}:{:02}:{:02},{:.2},{:.2},{:.2}",
            of_day / 60,
            of_day % 60,
            (minute * 7) % 60,
            temperature,
            pressure,
            humidity
        )
    }

    /// Append `count` simulated minutes and flush them to disk.
    fn advance(&mut self, count: u32) -> io::Result<()> {
        for _ in 0..count {
            writeln!(self.file, "{}", Self::line(self.minute))?;
            self.minute += 1;
        }
        self.file.flush()
    }
}

fn load_config() -> DashboardConfig {
    match std::env::args().nth(1) {
        Some(path) => match DashboardConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        },
        None => DashboardConfig {
            log_path: std::env::temp_dir().join("wxgraph-simulator.log"),
            ..Default::default()
        },
    }
}

fn main() {
    env_logger::init();
    info!("Starting wxgraph simulator");

    let config = load_config();
    let panel_size = config.display.size();
    let display_count = u32::from(config.display.count);
    info!(
        "{} display(s) of {}×{} (scale {}×), log at {}",
        display_count,
        panel_size.width,
        panel_size.height,
        WINDOW_SCALE,
        config.log_path.display()
    );
    info!("Keys: R=Redraw  Q=Quit");

    let mut writer = match MockLogWriter::create(&config.log_path) {
        Ok(writer) => writer,
        Err(e) => {
            error!("cannot create {}: {e}", config.log_path.display());
            process::exit(1);
        }
    };
    if let Err(e) = writer.advance(MOCK_HISTORY_MINUTES) {
        error!("cannot write mock history: {e}");
        process::exit(1);
    }

    let panels = FramebufferPanels::new(usize::from(config.display.count), panel_size);
    let mut dashboard = match Dashboard::start(&config, panels) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            error!("dashboard failed to start: {e}");
            process::exit(1);
        }
    };
    let mut watcher = match NotifyWatcher::new(&config.log_path) {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    // Displays are laid out left to right
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        panel_size.width * display_count,
        panel_size.height,
    ));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("wxgraph Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    flush_panels(&mut dashboard, &mut display, panel_size);
    window.update(&display);

    let mut last_minute = Instant::now();

    'running: loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::R => {
                        info!("Full redraw requested");
                        if let Err(e) = dashboard.redraw() {
                            error!("redraw failed: {e}");
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if last_minute.elapsed() >= MOCK_MINUTE {
            if let Err(e) = writer.advance(1) {
                warn!("mock log write failed: {e}");
            }
            last_minute = Instant::now();
        }

        match watcher.poll_change() {
            Ok(0) => {}
            Ok(_) => match dashboard.update() {
                Ok(UpdateOutcome::Rendered { report, .. }) => {
                    info!("{} new sample(s)", report.accepted);
                }
                Ok(_) => {}
                Err(e) => error!("update failed: {e}"),
            },
            Err(e) => {
                error!("{e}");
                break 'running;
            }
        }

        flush_panels(&mut dashboard, &mut display, panel_size);
        window.update(&display);

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    if let Err(e) = dashboard.release() {
        warn!("failed to release panels: {e:?}");
    }
    info!("Simulator exiting");
}

/// Copy every panel's dirty region into its slot of the window.
fn flush_panels(
    dashboard: &mut Dashboard<FramebufferPanels>,
    display: &mut SimulatorDisplay<Rgb565>,
    panel_size: Size,
) {
    for (id, framebuffer) in dashboard.bus_mut().iter_mut() {
        let offset = Point::new(id.index() as i32 * panel_size.width as i32, 0);
        let _ = framebuffer.flush(&mut display.translated(offset));
    }
}
