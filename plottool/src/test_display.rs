use crate::{
    display::{Display, Event, Rect},
    prelude::*,
};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Op {
    Clear(Color),
    Line(Color, (i32, i32, i32, i32)),
    Rect(Rect),
    Text(String),
    Present,
}

/// Display double that records every drawing call, one cell per character.
#[derive(Debug)]
pub(crate) struct RecordingDisplay {
    size: (i32, i32),
    color: Color,
    ops: Vec<Op>,
    events: VecDeque<Event>,
    resized: bool,
    fullscreen: bool,
    pub(crate) closed: bool,
}

impl RecordingDisplay {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            size: (width, height),
            color: Color::BLACK,
            ops: Vec::new(),
            events: VecDeque::new(),
            resized: false,
            fullscreen: false,
            closed: false,
        }
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub(crate) fn resize(&mut self, width: i32, height: i32) {
        self.size = (width, height);
        self.resized = true;
    }

    /// Simulates the window manager taking fullscreen away.
    pub(crate) fn leave_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    pub(crate) fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub(crate) fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    pub(crate) fn lines(&self) -> Vec<(Color, (i32, i32, i32, i32))> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Line(color, line) => Some((*color, *line)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn presents(&self) -> usize {
        self.ops.iter().filter(|op| **op == Op::Present).count()
    }
}

impl Display for RecordingDisplay {
    fn size(&self) -> (i32, i32) {
        self.size
    }

    fn was_resized(&mut self) -> bool {
        std::mem::replace(&mut self.resized, false)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), Error> {
        self.fullscreen = fullscreen;
        Ok(())
    }

    fn wait_event(&mut self, _timeout: Duration) -> bool {
        !self.closed
    }

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn clear(&mut self, color: Color) {
        self.ops.push(Op::Clear(color));
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.ops.push(Op::Line(self.color, (x1, y1, x2, y2)));
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.ops.push(Op::Rect(rect));
    }

    fn draw_text(&mut self, _x: i32, _y: i32, text: &str) {
        self.ops.push(Op::Text(text.to_string()));
    }

    fn text_size(&self, text: &str) -> (i32, i32) {
        (text.chars().count() as i32, 1)
    }

    fn present(&mut self) -> Result<(), Error> {
        self.ops.push(Op::Present);
        Ok(())
    }
}
