use plottool::{Color, Rect};

const BAR: char = '█';
const DOT: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

/// Off-screen character grid, one cell per terminal column and row.
#[derive(Debug)]
pub struct Canvas {
    width: i32,
    height: i32,
    background: Color,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(width: i32, height: i32, background: Color) -> Self {
        let mut canvas = Self {
            width: 0,
            height: 0,
            background,
            cells: Vec::new(),
        };
        canvas.resize(width, height);
        canvas
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.cells = vec![self.blank(); (self.width * self.height) as usize];
    }

    fn blank(&self) -> Cell {
        Cell {
            ch: ' ',
            fg: self.background,
            bg: self.background,
        }
    }

    pub fn clear(&mut self, background: Color) {
        self.background = background;
        let blank = self.blank();
        self.cells.iter_mut().for_each(|cell| *cell = blank);
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }

    /// Writes one character, silently clipping outside the grid.
    pub fn put(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if let Some(i) = self.index(x, y) {
            let cell = &mut self.cells[i];
            cell.ch = ch;
            cell.fg = fg;
        }
    }

    /// Bresenham line. Vertical runs are drawn as solid blocks.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, fg: Color) {
        let ch = if x1 == x2 { BAR } else { DOT };
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let (mut x, mut y) = (x1, y1);
        let mut err = dx + dy;
        loop {
            self.put(x, y, ch, fg);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn rect(&mut self, rect: Rect, fg: Color) {
        if rect.width <= 0 || rect.height <= 0 {
            return;
        }
        let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
        for x in left + 1..right {
            self.put(x, top, '─', fg);
            self.put(x, bottom, '─', fg);
        }
        for y in top + 1..bottom {
            self.put(left, y, '│', fg);
            self.put(right, y, '│', fg);
        }
        self.put(left, top, '┌', fg);
        self.put(right, top, '┐', fg);
        self.put(left, bottom, '└', fg);
        self.put(right, bottom, '┘', fg);
    }

    pub fn text(&mut self, x: i32, y: i32, text: &str, fg: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i as i32, y, ch, fg);
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1) as usize)
    }
}
