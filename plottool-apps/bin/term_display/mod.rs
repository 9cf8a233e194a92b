mod canvas;

use self::canvas::Canvas;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};
use plottool::{Color, Display, Error, Event, Rect};
use std::{
    collections::VecDeque,
    io::{self, Stdout, Write},
    time::Duration,
};

/// Maps terminal keys to dashboard events.
fn map_key(key: KeyEvent) -> Option<Event> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(Event::Quit),
        KeyCode::Char('l') if ctrl => Some(Event::Refresh),
        KeyCode::Char('q') | KeyCode::Esc => Some(Event::Quit),
        KeyCode::Char('f') | KeyCode::F(11) => Some(Event::FullscreenToggle),
        KeyCode::Char('r') => Some(Event::Refresh),
        KeyCode::Char(c) => Some(Event::KeyPress(c)),
        _ => None,
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Renders the dashboard into the terminal, one chart column per cell.
/// Fullscreen is the alternate screen.
#[derive(Debug)]
pub struct TermDisplay {
    out: Stdout,
    canvas: Canvas,
    color: Color,
    events: VecDeque<Event>,
    resized: bool,
    fullscreen: bool,
}

impl TermDisplay {
    /// Switches the terminal to raw mode and sets its title.
    pub fn open(title: &str) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, SetTitle(title), Hide, Clear(ClearType::All))?;
        debug!("terminal {}x{} opened", width, height);
        Ok(Self {
            out,
            canvas: Canvas::new(i32::from(width), i32::from(height), Color::BLACK),
            color: Color::WHITE,
            events: VecDeque::new(),
            resized: true,
            fullscreen: false,
        })
    }

    /// Waits up to `timeout` for the first terminal event, then drains the
    /// ones already queued.
    fn read_events(&mut self, timeout: Duration) -> io::Result<()> {
        let mut wait = timeout;
        while event::poll(wait)? {
            match event::read()? {
                TermEvent::Key(key) => {
                    trace!("key {:?}", key);
                    if let Some(event) = map_key(key) {
                        self.events.push_back(event);
                    }
                }
                TermEvent::Resize(width, height) => self.resize(width, height),
                _ => {}
            }
            wait = Duration::ZERO;
        }
        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (i32::from(width), i32::from(height));
        if (width, height) != (self.canvas.width(), self.canvas.height()) {
            debug!("terminal resized to {}x{}", width, height);
            self.canvas.resize(width, height);
            self.resized = true;
        }
    }

    /// Queues the canvas row by row, switching colors only between runs.
    fn queue_frame(&mut self) -> io::Result<()> {
        let mut current: Option<(Color, Color)> = None;
        let mut run = String::new();
        for (y, row) in self.canvas.rows().enumerate() {
            queue!(self.out, MoveTo(0, y as u16))?;
            for cell in row {
                if current != Some((cell.fg, cell.bg)) {
                    if !run.is_empty() {
                        queue!(self.out, Print(&run))?;
                        run.clear();
                    }
                    queue!(
                        self.out,
                        SetForegroundColor(term_color(cell.fg)),
                        SetBackgroundColor(term_color(cell.bg))
                    )?;
                    current = Some((cell.fg, cell.bg));
                }
                run.push(cell.ch);
            }
            if !run.is_empty() {
                queue!(self.out, Print(&run))?;
                run.clear();
            }
        }
        Ok(())
    }
}

impl Display for TermDisplay {
    fn size(&self) -> (i32, i32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn was_resized(&mut self) -> bool {
        std::mem::replace(&mut self.resized, false)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), Error> {
        if fullscreen {
            execute!(self.out, EnterAlternateScreen, Hide)?;
        } else {
            execute!(self.out, LeaveAlternateScreen, Hide)?;
        }
        self.fullscreen = fullscreen;
        self.resized = true;
        Ok(())
    }

    fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.read_events(timeout) {
            Ok(()) => true,
            Err(e) => {
                error!("terminal input failed: {}", e);
                false
            }
        }
    }

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn clear(&mut self, color: Color) {
        self.canvas.clear(color);
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.canvas.line(x1, y1, x2, y2, self.color);
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.canvas.rect(rect, self.color);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) {
        self.canvas.text(x, y, text, self.color);
    }

    fn text_size(&self, text: &str) -> (i32, i32) {
        (text.chars().count() as i32, 1)
    }

    fn present(&mut self) -> Result<(), Error> {
        self.queue_frame()?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TermDisplay {
    fn drop(&mut self) {
        let mut restore = execute!(self.out, ResetColor, Clear(ClearType::All), MoveTo(0, 0), Show);
        if self.fullscreen {
            restore = restore.and_then(|_| execute!(self.out, LeaveAlternateScreen));
        }
        if let Err(e) = restore.and_then(|_| disable_raw_mode()) {
            error!("can't restore terminal: {}", e);
        }
    }
}
