use crate::{
    chart::{Chart, Style},
    collector::ChartSource,
    display::{Display, Event, Rect},
    prelude::*,
};
use log::Level;

const SNAPSHOT_FAILURE_LOG_INTERVAL_MS: u64 = 10_000;
const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Frames presented during the last complete second.
#[derive(Debug)]
struct FpsCounter {
    window_start: Instant,
    frames: u32,
    shown: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            shown: 0,
        }
    }

    fn frame(&mut self) {
        self.frames += 1;
        if self.window_start.elapsed() >= FPS_WINDOW {
            self.shown = self.frames;
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }

    fn text(&self) -> String {
        format!("{} fps", self.shown)
    }
}

/// The render loop: turns window events and buffer changes into frames.
#[derive(Debug)]
pub struct Dashboard<D> {
    display: D,
    config: Config,
    charts: Vec<Chart>,
    style: Style,
    fullscreen: bool,
    needs_redraw: bool,
    window_size: (i32, i32),
    window_size_dirty: bool,
    /// Window width minus margins the buffers were last resized for.
    chart_width: i32,
    last_fullscreen_check: Instant,
    fps: FpsCounter,
    snapshot_failures: IntervalLogger<String>,
}

impl<D: Display> Dashboard<D> {
    /// Pairs every configured chart with its collector view, in config order.
    pub fn new(
        mut display: D,
        config: Config,
        sources: &[ChartSource],
        hostname: &str,
    ) -> Result<Self, Error> {
        if sources.len() != config.charts().len() {
            warn!(
                "{} charts configured but {} sources given",
                config.charts().len(),
                sources.len()
            );
        }
        let charts = config
            .charts()
            .iter()
            .zip(sources)
            .map(|(chart, source)| Chart::new(chart.clone(), source.clone()))
            .collect();
        let fullscreen = config.fullscreen() != Fullscreen::Off;
        if fullscreen {
            display.set_fullscreen(true)?;
        }
        Ok(Self {
            display,
            style: Style::from_config(&config, hostname),
            config,
            charts,
            fullscreen,
            needs_redraw: true,
            window_size: (0, 0),
            window_size_dirty: true,
            chart_width: 0,
            last_fullscreen_check: Instant::now(),
            fps: FpsCounter::new(),
            snapshot_failures: IntervalLogger::new(SNAPSHOT_FAILURE_LOG_INTERVAL_MS, Level::Warn),
        })
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Runs one loop iteration: waits at most one frame interval for events,
    /// applies them and draws a frame if anything changed.
    ///
    /// Returns `Ok(false)` when the dashboard should quit.
    pub fn update(&mut self) -> Result<bool, Error> {
        if !self.display.wait_event(self.config.frame_interval()) {
            info!("display closed");
            return Ok(false);
        }
        while let Some(event) = self.display.poll_event() {
            match event {
                Event::Quit => {
                    info!("quit requested");
                    return Ok(false);
                }
                Event::Refresh => self.needs_redraw = true,
                Event::FullscreenToggle => self.set_fullscreen(!self.fullscreen)?,
                Event::KeyPress(key) => trace!("key {:?} ignored", key),
            }
        }

        self.enforce_fullscreen()?;
        let window_changed = self.track_window_size();
        let width_changed = self.track_chart_width();
        if window_changed || width_changed || self.needs_redraw() {
            self.render()?;
        }
        Ok(true)
    }

    /// Loops until quit.
    pub fn run(&mut self) -> Result<(), Error> {
        while self.update()? {}
        Ok(())
    }

    /// Whether a frame is due: explicitly requested or some chart has new data.
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw || self.window_size_dirty || self.charts.iter().any(Chart::is_dirty)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), Error> {
        self.display.set_fullscreen(fullscreen)?;
        debug!("fullscreen {}", if fullscreen { "on" } else { "off" });
        self.fullscreen = fullscreen;
        self.needs_redraw = true;
        self.window_size_dirty = true;
        Ok(())
    }

    fn enforce_fullscreen(&mut self) -> Result<(), Error> {
        if self.config.fullscreen() != Fullscreen::Force {
            return Ok(());
        }
        if self.last_fullscreen_check.elapsed() >= self.config.refresh_interval() {
            if !self.display.is_fullscreen() {
                info!("restoring forced fullscreen");
                self.set_fullscreen(true)?;
            }
            self.last_fullscreen_check = Instant::now();
        }
        Ok(())
    }

    fn track_window_size(&mut self) -> bool {
        if self.display.was_resized() || self.window_size_dirty {
            self.window_size = self.display.size();
            self.window_size_dirty = false;
            self.needs_redraw = true;
            true
        } else {
            false
        }
    }

    /// Follows the window width with the buffer capacity of every chart.
    /// A chart whose resize fails keeps its old capacity, and with it its
    /// old width on screen.
    fn track_chart_width(&mut self) -> bool {
        let margin = self.config.window_margin() as i32;
        let width = self.window_size.0 - 2 * margin;
        if width == self.chart_width {
            return false;
        }
        debug!("chart width {} -> {}", self.chart_width, width);
        let capacity = usize::try_from(width - 2).unwrap_or(0);
        for chart in &mut self.charts {
            if let Err(e) = chart.resize(capacity) {
                let name = chart.source().name();
                if e.is_allocation() {
                    error!("chart '{}': keeping width {}: {}", name, chart.width(), e);
                } else {
                    warn!("chart '{}': keeping width {}: {}", name, chart.width(), e);
                }
            }
        }
        self.chart_width = width;
        self.needs_redraw = true;
        true
    }

    /// Draws every chart and presents the frame.
    pub fn render(&mut self) -> Result<(), Error> {
        self.display.clear(self.config.background_color());
        let height = self.config.default_height() as i32;
        let margin = self.config.window_margin() as i32;
        let spacing = self.config.chart_spacing() as i32;
        for (i, chart) in self.charts.iter_mut().enumerate() {
            let y = i as i32 * (height + spacing) + margin;
            let area = Rect::new(margin, y, chart.width(), height);
            if let Err(e) = chart.draw(&mut self.display, area, &self.style) {
                self.snapshot_failures
                    .report(format!("chart '{}' skipped: {}", chart.source().name(), e));
            }
        }
        if self.config.fps_counter() {
            let text = self.fps.text();
            let (text_width, _) = self.display.text_size(&text);
            self.display.set_color(self.style.text);
            self.display
                .draw_text(self.window_size.0 - text_width, 0, &text);
        }
        self.display.present()?;
        self.fps.frame();
        self.needs_redraw = false;
        Ok(())
    }
}
