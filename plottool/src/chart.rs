use crate::{collector::ChartSource, display::Display, display::Rect, prelude::*};

const NO_DATA: &str = "No data";
const HOSTNAME_PLACEHOLDER: &str = "local";

/// Colors and names shared by all charts of a frame.
#[derive(Debug, Clone)]
pub struct Style {
    pub hostname: String,
    pub border: Color,
    pub text: Color,
    pub error_line: Color,
}

impl Style {
    pub fn from_config(config: &Config, hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            border: config.border_color(),
            text: config.text_color(),
            error_line: config.error_line_color(),
        }
    }
}

type Positions = (Position, Option<Position>);

/// Render side state of one strip chart.
#[derive(Debug)]
pub struct Chart {
    config: ChartConfig,
    source: ChartSource,
    drawn: Option<Positions>,
    primary: Vec<f64>,
    secondary: Vec<f64>,
}

impl Chart {
    pub fn new(config: ChartConfig, source: ChartSource) -> Self {
        Self {
            config,
            source,
            drawn: None,
            primary: Vec::new(),
            secondary: Vec::new(),
        }
    }

    pub fn source(&self) -> &ChartSource {
        &self.source
    }

    /// Chart name with its first `local` replaced by `hostname`.
    pub fn title(&self, hostname: &str) -> String {
        self.config.name().replacen(HOSTNAME_PLACEHOLDER, hostname, 1)
    }

    fn positions(&self) -> Positions {
        (
            self.source.primary().position(),
            self.source.secondary().map(|buffer| buffer.position()),
        )
    }

    /// Whether any buffer of the chart changed since it was last drawn.
    pub fn is_dirty(&self) -> bool {
        self.drawn != Some(self.positions())
    }

    /// Width on screen: one column per sample plus the border.
    pub fn width(&self) -> i32 {
        self.source.primary().capacity() as i32 + 2
    }

    pub fn resize(&mut self, capacity: usize) -> Result<(), Error> {
        self.source.resize(capacity)?;
        self.drawn = None;
        Ok(())
    }

    /// Top of the vertical scale: the fixed scale of the chart or the source,
    /// otherwise the largest observed value (1 when nothing positive was seen).
    pub fn display_max(&self, stats: &DualStatistics) -> f64 {
        if self.config.max_scale() > 0.0 {
            return self.config.max_scale();
        }
        let descriptor = self.source.descriptor();
        if descriptor.max_scale > 0.0 {
            return descriptor.max_scale;
        }
        let observed = if descriptor.is_dual {
            stats.max()
        } else {
            stats.primary.max()
        };
        if observed > 0.0 {
            observed
        } else {
            1.0
        }
    }

    /// Time covered by a full buffer, e.g. `78s`, `2m`, `1h`.
    pub fn time_span(&self) -> String {
        let capacity = self.source.primary().capacity() as u32;
        format_time_span(self.source.interval() * capacity)
    }

    /// Copies the series into the chart's scratch vectors, oldest first, and
    /// returns how many samples each one holds. The buffers are snapshotted
    /// one after the other, so a dual chart pairs them from the newest sample.
    fn read_samples(&mut self) -> Result<(usize, usize), Error> {
        let primary = self.source.primary();
        self.primary.resize(primary.capacity(), 0.0);
        let first = primary.snapshot(&mut self.primary)?;
        let second = match self.source.secondary() {
            Some(secondary) => {
                self.secondary.resize(secondary.capacity(), 0.0);
                secondary.snapshot(&mut self.secondary)?.count
            }
            None => 0,
        };
        Ok((first.count, second))
    }

    /// Draws the chart into `area`: title and scale on the first text row,
    /// the bordered plot, then the time span and last value on the last row.
    ///
    /// On a snapshot failure only the title and border are drawn and the
    /// chart stays dirty, so the next frame retries it.
    pub fn draw(&mut self, display: &mut dyn Display, area: Rect, style: &Style) -> Result<(), Error> {
        let positions = self.positions();
        let (_, text_height) = display.text_size(NO_DATA);
        let plot = Rect::new(
            area.x,
            area.y + text_height,
            area.width,
            area.height - 2 * text_height,
        );
        let text_y = area.y + area.height - text_height;

        display.set_color(style.text);
        display.draw_text(area.x, area.y, &self.title(&style.hostname));
        display.set_color(style.border);
        display.draw_rect(plot);

        if self.source.primary().is_empty() {
            display.set_color(style.text);
            display.draw_text(area.x, text_y, NO_DATA);
            self.drawn = Some(positions);
            return Ok(());
        }

        let stats = self.source.stats();
        let max = self.display_max(&stats);
        let scale = self.source.format_value(max);
        let (scale_width, _) = display.text_size(&scale);
        display.set_color(style.text);
        display.draw_text(area.x + area.width - scale_width, area.y, &scale);

        let (count, second) = self.read_samples()?;
        if self.source.secondary().is_some() {
            let paired = count.min(second);
            let inbound = &self.primary[count - paired..count];
            let outbound = &self.secondary[second - paired..second];
            self.draw_dual(display, plot, inbound, outbound, max, style);
        } else {
            self.draw_single(display, plot, count, max, style);
        }

        let last = self.source.format_value(stats.primary.last());
        let (last_width, _) = display.text_size(&last);
        display.set_color(style.text);
        display.draw_text(area.x + area.width - last_width, text_y, &last);
        display.draw_text(area.x, text_y, &self.time_span());

        self.drawn = Some(positions);
        Ok(())
    }

    fn draw_single(&self, display: &mut dyn Display, plot: Rect, count: usize, max: f64, style: &Style) {
        let area = PlotArea::new(plot);
        for (i, value) in self.primary[..count].iter().enumerate() {
            let x = match area.column(i, count) {
                Some(x) => x,
                None => continue,
            };
            if *value < 0.0 {
                display.set_color(style.error_line);
                display.draw_line(x, area.top, x, area.bottom);
            } else {
                display.set_color(self.config.line_color());
                display.draw_line(x, area.bar_top(*value, max), x, area.bottom);
            }
        }
    }

    /// `inbound` and `outbound` hold the same number of samples, newest last.
    fn draw_dual(
        &self,
        display: &mut dyn Display,
        plot: Rect,
        inbound: &[f64],
        outbound: &[f64],
        max: f64,
        style: &Style,
    ) {
        let area = PlotArea::new(plot);
        let count = inbound.len();
        let mut previous: Option<(i32, i32)> = None;
        for (i, (inbound, outbound)) in inbound.iter().zip(outbound).enumerate() {
            let x = match area.column(i, count) {
                Some(x) => x,
                None => continue,
            };
            if *inbound < 0.0 || *outbound < 0.0 {
                display.set_color(style.error_line);
                display.draw_line(x, area.top, x, area.bottom);
                previous = None;
                continue;
            }
            display.set_color(self.config.line_color());
            display.draw_line(x, area.bar_top(*inbound, max), x, area.bottom);

            let y = area.point(*outbound, max);
            display.set_color(self.config.line_color_secondary());
            let (from_x, from_y) = previous.unwrap_or((x, y));
            display.draw_line(from_x, from_y, x, y);
            previous = Some((x, y));
        }
    }
}

/// Inside of the plot border, samples are right aligned.
struct PlotArea {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

impl PlotArea {
    fn new(plot: Rect) -> Self {
        Self {
            left: plot.x + 1,
            right: plot.right() - 1,
            top: plot.y + 1,
            bottom: plot.bottom() - 1,
        }
    }

    fn rows(&self) -> i32 {
        (self.bottom - self.top + 1).max(1)
    }

    /// Column of sample `i` out of `count`, the newest one is rightmost.
    fn column(&self, i: usize, count: usize) -> Option<i32> {
        let x = self.right - (count - 1 - i) as i32;
        if x < self.left {
            None
        } else {
            Some(x)
        }
    }

    /// Top row of a bar, at least one row high and never above the plot.
    fn bar_top(&self, value: f64, max: f64) -> i32 {
        let height = ((value / max) * f64::from(self.rows())) as i32;
        self.bottom - height.clamp(1, self.rows()) + 1
    }

    /// Row of a line point, 0 on the bottom row and `max` on the top row.
    fn point(&self, value: f64, max: f64) -> i32 {
        let offset = ((value / max) * f64::from(self.rows() - 1)) as i32;
        self.bottom - offset.clamp(0, self.rows() - 1)
    }
}

/// Formats a span as whole seconds below a minute, otherwise rounded up
/// to minutes, hours or days.
pub fn format_time_span(span: Duration) -> String {
    const MINUTE: u128 = 60_000;
    const DAY: u128 = 86_400_000;
    let ms = span.as_millis();
    if ms < MINUTE {
        format!("{}s", ms / 1000)
    } else if ms < DAY {
        let minutes = (ms + MINUTE - 1) / MINUTE;
        if minutes < 60 {
            format!("{}m", minutes)
        } else {
            format!("{}h", (minutes + 59) / 60)
        }
    } else {
        format!("{}d", (ms + DAY - 1) / DAY)
    }
}
