//! Layout authoring state machine.
//!
//! The interactive drawing tool feeds user input in as [`AuthoringEvent`]s;
//! the machine keeps the slots drawn so far, the monitored area and the
//! polygon in progress, and hands back a [`ZoneLayout`] at the end. It does no
//! I/O and draws nothing, so any front end (mouse, script, stdin) can drive it.

use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::geometry::{Point, Polygon};
use crate::layout::ZoneLayout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthoringState {
    /// No polygon in progress.
    Idle,
    /// Collecting points for the next slot.
    DrawingSlot,
    /// Collecting points for the monitored area.
    DrawingArea,
    /// `Quit` received; no further events are accepted.
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthoringEvent {
    AddPoint(Point),
    ClosePolygon,
    ToggleMode,
    Reset,
    Quit,
}

/// Parses the line commands `add X Y`, `close`, `mode`, `reset` and `quit`.
impl FromStr for AuthoringEvent {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let event = match command.to_ascii_lowercase().as_str() {
            "add" => {
                let mut coord = |axis: &str| -> Result<i32> {
                    words
                        .next()
                        .ok_or_else(|| anyhow!("add needs an {} coordinate", axis))?
                        .parse()
                        .map_err(|_| anyhow!("invalid {} coordinate in {:?}", axis, line))
                };
                let x = coord("x")?;
                let y = coord("y")?;
                AuthoringEvent::AddPoint(Point::new(x, y))
            }
            "close" => AuthoringEvent::ClosePolygon,
            "mode" => AuthoringEvent::ToggleMode,
            "reset" => AuthoringEvent::Reset,
            "quit" => AuthoringEvent::Quit,
            other => return Err(anyhow!("unknown command {:?}", other)),
        };
        if words.next().is_some() {
            return Err(anyhow!("trailing input in {:?}", line));
        }
        Ok(event)
    }
}

/// What an event did, for the front end to report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthoringOutcome {
    PointAdded { points: usize },
    SlotAdded { index: usize, polygon: Polygon },
    AreaDefined { polygon: Polygon },
    /// Close with fewer than 3 points; the points were dropped.
    Discarded { points: usize },
    ModeChanged { drawing_area: bool },
    Reset,
    Finished,
}

#[derive(Clone, Debug, Default)]
pub struct LayoutAuthoring {
    slots: Vec<Polygon>,
    monitored_area: Option<Polygon>,
    current: Vec<Point>,
    drawing_area: bool,
    finished: bool,
}

impl LayoutAuthoring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AuthoringState {
        if self.finished {
            AuthoringState::Finished
        } else if self.current.is_empty() {
            AuthoringState::Idle
        } else if self.drawing_area {
            AuthoringState::DrawingArea
        } else {
            AuthoringState::DrawingSlot
        }
    }

    /// Whether a close would commit the monitored area rather than a slot.
    pub fn is_drawing_area(&self) -> bool {
        self.drawing_area
    }

    pub fn current_points(&self) -> &[Point] {
        &self.current
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn handle(&mut self, event: AuthoringEvent) -> Result<AuthoringOutcome> {
        if self.finished {
            return Err(anyhow!("layout authoring already finished"));
        }
        let outcome = match event {
            AuthoringEvent::AddPoint(p) => {
                self.current.push(p);
                AuthoringOutcome::PointAdded {
                    points: self.current.len(),
                }
            }
            AuthoringEvent::ClosePolygon => self.close_polygon(),
            AuthoringEvent::ToggleMode => {
                self.drawing_area = !self.drawing_area;
                AuthoringOutcome::ModeChanged {
                    drawing_area: self.drawing_area,
                }
            }
            AuthoringEvent::Reset => {
                *self = Self::default();
                AuthoringOutcome::Reset
            }
            AuthoringEvent::Quit => {
                self.finished = true;
                AuthoringOutcome::Finished
            }
        };
        Ok(outcome)
    }

    fn close_polygon(&mut self) -> AuthoringOutcome {
        let points = std::mem::take(&mut self.current);
        if points.len() < Polygon::MIN_POINTS {
            return AuthoringOutcome::Discarded {
                points: points.len(),
            };
        }
        let polygon = Polygon::new(points);
        if self.drawing_area {
            // A later area replaces an earlier one.
            self.monitored_area = Some(polygon.clone());
            AuthoringOutcome::AreaDefined { polygon }
        } else {
            self.slots.push(polygon.clone());
            AuthoringOutcome::SlotAdded {
                index: self.slots.len(),
                polygon,
            }
        }
    }

    /// Snapshot of the committed polygons. Points in progress are not included.
    pub fn layout(&self) -> ZoneLayout {
        ZoneLayout::new(self.slots.clone(), self.monitored_area.clone())
    }

    pub fn into_layout(self) -> ZoneLayout {
        ZoneLayout::new(self.slots, self.monitored_area)
    }
}
