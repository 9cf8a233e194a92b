use super::{
    color::Color,
    reader::YamlConfig,
    validation::{Validatable, Validator},
};
use humantime::Duration as HumanDuration;
use std::time::Duration;

/// Smallest chart width that still leaves one sample column inside the border.
pub const MIN_WIDTH: u32 = 3;
/// Smallest chart height: title, one plot row inside the border, bottom text.
pub const MIN_HEIGHT: u32 = 5;

const CONFIG_OWNER: &str = "'config'";

const DEFAULT_REFRESH_INTERVAL: &str = "1s";
const DEFAULT_MAX_FPS: u32 = 30;
const DEFAULT_WIDTH: u32 = 80;
const DEFAULT_HEIGHT: u32 = 8;
const DEFAULT_MARGIN: u32 = 1;
const DEFAULT_SPACING: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fullscreen {
    Off,
    On,
    /// Re-enter fullscreen whenever the window left it.
    Force,
}

impl Default for Fullscreen {
    fn default() -> Self {
        Self::Off
    }
}

/// One strip chart: which source feeds it and how it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    name: String,
    kind: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    refresh_interval: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    max_scale: f64,
    #[serde(default = "ChartConfig::default_line_color")]
    line_color: Color,
    #[serde(default = "ChartConfig::default_line_color_secondary")]
    line_color_secondary: Color,
}

impl ChartConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            target: target.into(),
            refresh_interval: None,
            width: None,
            max_scale: 0.0,
            line_color: Self::default_line_color(),
            line_color_secondary: Self::default_line_color_secondary(),
        }
    }

    /// Title template, `local` is substituted with the short hostname when drawn.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    /// Fixed vertical scale, 0 means auto-scale.
    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn line_color(&self) -> Color {
        self.line_color
    }

    pub fn line_color_secondary(&self) -> Color {
        self.line_color_secondary
    }

    /// Sampling interval of this chart, unset or zero falls back to `global`.
    pub fn refresh_interval(&self, global: Duration) -> Duration {
        self.refresh_interval
            .as_deref()
            .and_then(|s| s.parse::<HumanDuration>().ok())
            .map(Duration::from)
            .filter(|interval| !interval.is_zero())
            .unwrap_or(global)
    }

    pub fn with_refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.refresh_interval = Some(interval.into());
        self
    }

    pub fn with_max_scale(mut self, max_scale: f64) -> Self {
        self.max_scale = max_scale;
        self
    }

    pub fn with_colors(mut self, line: Color, secondary: Color) -> Self {
        self.line_color = line;
        self.line_color_secondary = secondary;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    fn default_line_color() -> Color {
        Color::rgb(0x00, 0xc0, 0x40)
    }

    fn default_line_color_secondary() -> Color {
        Color::rgb(0x40, 0x80, 0xff)
    }
}

impl Validatable for ChartConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            let msg = "field 'name' for 'chart' is empty".to_string();
            error!("{}", msg);
            return Err(msg);
        }
        if self.kind.trim().is_empty() {
            let msg = format!("field 'kind' for chart '{}' is empty", self.name);
            error!("{}", msg);
            return Err(msg);
        }
        let owner = format!("chart '{}'", self.name);
        if let Some(interval) = &self.refresh_interval {
            Validator::duration("refresh_interval", &owner, interval, false)?;
        }
        if let Some(width) = self.width {
            Validator::at_least("width", &owner, width, MIN_WIDTH)?;
        }
        if !self.max_scale.is_finite() || self.max_scale < 0.0 {
            let msg = format!(
                "field 'max_scale' for chart '{}' must be a non-negative number",
                self.name
            );
            error!("{}", msg);
            return Err(msg);
        }
        Ok(())
    }
}

/// Top level dashboard config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    log_config: Option<String>,
    #[serde(default = "Config::default_refresh_interval")]
    refresh_interval: String,
    #[serde(default = "Config::default_max_fps")]
    max_fps: u32,
    #[serde(default = "Config::default_width_value")]
    default_width: u32,
    #[serde(default = "Config::default_height_value")]
    default_height: u32,
    #[serde(default = "Config::default_margin")]
    window_margin: u32,
    #[serde(default = "Config::default_spacing")]
    chart_spacing: u32,
    #[serde(default)]
    fullscreen: Fullscreen,
    #[serde(default)]
    fps_counter: bool,
    #[serde(default = "Config::default_background_color")]
    background_color: Color,
    #[serde(default = "Config::default_border_color")]
    border_color: Color,
    #[serde(default = "Config::default_text_color")]
    text_color: Color,
    #[serde(default = "Config::default_error_line_color")]
    error_line_color: Color,
    charts: Vec<ChartConfig>,
}

impl Config {
    pub fn get(filename: &str) -> Result<Self, String> {
        YamlConfig::get(filename)
    }

    pub fn from_charts(charts: Vec<ChartConfig>) -> Self {
        Self {
            log_config: None,
            refresh_interval: Self::default_refresh_interval(),
            max_fps: Self::default_max_fps(),
            default_width: Self::default_width_value(),
            default_height: Self::default_height_value(),
            window_margin: Self::default_margin(),
            chart_spacing: Self::default_spacing(),
            fullscreen: Fullscreen::default(),
            fps_counter: false,
            background_color: Self::default_background_color(),
            border_color: Self::default_border_color(),
            text_color: Self::default_text_color(),
            error_line_color: Self::default_error_line_color(),
            charts,
        }
    }

    /// Path to a log4rs yaml file, console logging is used when unset.
    pub fn log_config(&self) -> Option<&str> {
        self.log_config.as_deref()
    }

    /// Global sampling interval, parsed from humantime format.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
            .parse::<HumanDuration>()
            .expect("parse humantime duration")
            .into()
    }

    pub fn max_fps(&self) -> u32 {
        self.max_fps
    }

    /// Upper bound of a single render loop iteration.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.max_fps.max(1)))
    }

    pub fn default_width(&self) -> u32 {
        self.default_width
    }

    pub fn default_height(&self) -> u32 {
        self.default_height
    }

    pub fn window_margin(&self) -> u32 {
        self.window_margin
    }

    pub fn chart_spacing(&self) -> u32 {
        self.chart_spacing
    }

    pub fn fullscreen(&self) -> Fullscreen {
        self.fullscreen
    }

    pub fn fps_counter(&self) -> bool {
        self.fps_counter
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn border_color(&self) -> Color {
        self.border_color
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    pub fn error_line_color(&self) -> Color {
        self.error_line_color
    }

    pub fn charts(&self) -> &[ChartConfig] {
        &self.charts
    }

    /// Initial sample capacity of a chart's buffers: its display width minus
    /// the two border columns.
    pub fn buffer_capacity(&self, chart: &ChartConfig) -> usize {
        let width = chart.width().unwrap_or(self.default_width);
        width.saturating_sub(2) as usize
    }

    pub fn with_fullscreen(mut self, fullscreen: Fullscreen) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_fps_counter(mut self, enabled: bool) -> Self {
        self.fps_counter = enabled;
        self
    }

    pub fn with_refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.refresh_interval = interval.into();
        self
    }

    fn default_refresh_interval() -> String {
        DEFAULT_REFRESH_INTERVAL.to_string()
    }

    fn default_max_fps() -> u32 {
        DEFAULT_MAX_FPS
    }

    fn default_width_value() -> u32 {
        DEFAULT_WIDTH
    }

    fn default_height_value() -> u32 {
        DEFAULT_HEIGHT
    }

    fn default_margin() -> u32 {
        DEFAULT_MARGIN
    }

    fn default_spacing() -> u32 {
        DEFAULT_SPACING
    }

    fn default_background_color() -> Color {
        Color::BLACK
    }

    fn default_border_color() -> Color {
        Color::rgb(0x80, 0x80, 0x80)
    }

    fn default_text_color() -> Color {
        Color::WHITE
    }

    fn default_error_line_color() -> Color {
        Color::rgb(0xc0, 0x20, 0x20)
    }

    fn check_refresh_interval(&self) -> Result<(), String> {
        Validator::duration("refresh_interval", CONFIG_OWNER, &self.refresh_interval, true)?;
        Ok(())
    }

    fn check_geometry(&self) -> Result<(), String> {
        Validator::at_least("max_fps", CONFIG_OWNER, self.max_fps, 1)?;
        Validator::at_least("default_width", CONFIG_OWNER, self.default_width, MIN_WIDTH)?;
        Validator::at_least("default_height", CONFIG_OWNER, self.default_height, MIN_HEIGHT)
    }
}

impl Validatable for Config {
    fn validate(&self) -> Result<(), String> {
        self.check_refresh_interval()?;
        self.check_geometry()?;
        if self.charts.is_empty() {
            let msg = "no charts configured".to_string();
            error!("{}", msg);
            return Err(msg);
        }
        Validator::aggregate(&self.charts)
    }
}
