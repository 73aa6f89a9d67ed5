//! Coordinate carry-forward over linear moves.
//!
//! A linear move that omits an axis keeps that axis from the previous move.
//! X and Y start at the machine origin; Z is unknown until first given.
//! The anomaly detector and the metrics calculator both resolve moves through
//! [`PositionTracker`] so they agree on every position.

use serde::Serialize;

use crate::parser::CommandLine;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Position {
    fn advance(&self, line: &CommandLine) -> Position {
        Position {
            x: line.param('X').unwrap_or(self.x),
            y: line.param('Y').unwrap_or(self.y),
            z: line.param('Z').or(self.z),
        }
    }
}

/// One linear move with both endpoints resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMove<'a> {
    pub line: &'a CommandLine,
    pub from: Position,
    pub to: Position,
}

impl ResolvedMove<'_> {
    pub fn planar_delta(&self) -> (f64, f64) {
        (self.to.x - self.from.x, self.to.y - self.from.y)
    }

    pub fn planar_distance(&self) -> f64 {
        let (dx, dy) = self.planar_delta();
        dx.hypot(dy)
    }

    /// Unit direction of travel in the XY plane, `None` for a zero-length move.
    pub fn direction(&self) -> Option<(f64, f64)> {
        let (dx, dy) = self.planar_delta();
        let length = dx.hypot(dy);
        if length > 0.0 && length.is_finite() {
            Some((dx / length, dy / length))
        } else {
            None
        }
    }
}

/// Carry-forward state, advanced one line at a time.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    position: Position,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Resolve `line` if it is a linear move; other lines leave the position untouched.
    pub fn step<'a>(&mut self, line: &'a CommandLine) -> Option<ResolvedMove<'a>> {
        if !line.is_linear_move() {
            return None;
        }
        let from = self.position;
        let to = from.advance(line);
        self.position = to;
        Some(ResolvedMove { line, from, to })
    }
}

/// Iterator over the resolved linear moves of a parsed program.
pub struct Toolpath<'a> {
    lines: std::slice::Iter<'a, CommandLine>,
    tracker: PositionTracker,
}

impl<'a> Toolpath<'a> {
    pub fn new(lines: &'a [CommandLine]) -> Self {
        Self {
            lines: lines.iter(),
            tracker: PositionTracker::new(),
        }
    }
}

impl<'a> Iterator for Toolpath<'a> {
    type Item = ResolvedMove<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tracker = &mut self.tracker;
        self.lines.find_map(|line| tracker.step(line))
    }
}
