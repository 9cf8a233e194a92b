use crate::prelude::*;

/// Input and window events delivered to the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Quit,
    /// The window contents were damaged and must be redrawn.
    Refresh,
    FullscreenToggle,
    KeyPress(char),
}

/// Axis-aligned rectangle in display units (pixels or terminal cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width - 1
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }
}

/// Window and drawing primitives the dashboard renders through.
pub trait Display {
    /// Current drawable size as `(width, height)`.
    fn size(&self) -> (i32, i32);

    /// Whether the size changed since the previous call.
    fn was_resized(&mut self) -> bool;

    fn is_fullscreen(&self) -> bool;

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), Error>;

    /// Blocks until an event is pending or `timeout` passes. Returns `false`
    /// when the display is gone and the loop has to stop.
    fn wait_event(&mut self, timeout: Duration) -> bool;

    fn poll_event(&mut self) -> Option<Event>;

    fn clear(&mut self, color: Color);

    fn set_color(&mut self, color: Color);

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32);

    /// Outline of `rect` in the current color.
    fn draw_rect(&mut self, rect: Rect);

    fn draw_text(&mut self, x: i32, y: i32, text: &str);

    /// Size of `text` as `(width, height)`.
    fn text_size(&self, text: &str) -> (i32, i32);

    fn present(&mut self) -> Result<(), Error>;
}
