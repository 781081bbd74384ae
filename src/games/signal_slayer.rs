//! SignalSlayer: steer the train onto the track with the next signal
//!
//! Rows of signals fall toward the train, one signal per track. The row is
//! judged by the track the train is on when the row reaches it.

use serde::{Deserialize, Serialize};

use super::{GameEvent, SnapshotDetail, Steer, TickInput, abort, transition_events};
use crate::catalog::LineData;
use crate::consts::{CANVAS_HEIGHT, TRACKS};
use crate::error::Result;
use crate::settings::SlayerTuning;
use crate::sim::{
    CollisionGate, Direction, GateGeometry, Phase, RoundId, SessionConfig, SessionState, Span,
};
use crate::{row_height, train_size, train_y};

/// A falling row as drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowView {
    pub round_id: RoundId,
    /// Top edge in canvas coordinates
    pub y: f32,
    /// One label per track, left to right
    pub labels: Vec<String>,
}

fn geometry() -> GateGeometry {
    GateGeometry {
        band: Span::new(train_y(), train_y() + train_size()),
        visible: Span::new(0.0, CANVAS_HEIGHT),
        extent: row_height(),
        direction: Direction::Forward,
    }
}

#[derive(Debug, Clone)]
pub struct SignalSlayer {
    session: SessionState,
    tuning: SlayerTuning,
    gate: CollisionGate,
    lane: usize,
}

impl SignalSlayer {
    pub fn loading(line: &str, config: SessionConfig, tuning: SlayerTuning) -> Self {
        Self {
            session: SessionState::loading(line, config),
            tuning,
            gate: CollisionGate::new(geometry()),
            lane: TRACKS / 2,
        }
    }

    pub fn provide(&mut self, data: LineData) -> Result<Vec<GameEvent>> {
        self.session.provide_catalog(data)?;
        let mut events = Vec::new();
        self.spawn_row(&mut events);
        Ok(events)
    }

    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if input.restart && self.session.phase() == Phase::GameOver {
            self.restart(&mut events);
        }
        if !self.session.is_playing() {
            return events;
        }

        let steer = if input.autoplay {
            self.autopilot_steer()
        } else {
            input.steer
        };
        match steer {
            Some(Steer::Left) => self.lane = self.lane.saturating_sub(1),
            Some(Steer::Right) => self.lane = (self.lane + 1).min(TRACKS - 1),
            None => {}
        }

        self.gate.tick(self.tuning.row_speed);
        let purged = self.gate.purge();
        if !purged.is_empty() {
            log::debug!("purged rows {:?}", purged);
        }
        if self.gate.is_empty() && !self.session.sequence().is_complete() {
            self.spawn_row(&mut events);
        }

        if let Some(judgment) = self.gate.check_judgment(self.lane) {
            events.push(GameEvent::Judged {
                round_id: judgment.round_id,
                position: judgment.position,
                correct: judgment.correct,
                content: judgment.content.clone(),
            });
            let transition = self.session.resolve(&judgment);
            transition_events(&self.session, transition, &mut events);
            if judgment.correct {
                self.gate.remove(judgment.round_id);
                if self.session.is_playing() {
                    self.spawn_row(&mut events);
                }
            }
        }
        events
    }

    fn restart(&mut self, events: &mut Vec<GameEvent>) {
        log::info!("restarting '{}'", self.session.line());
        self.session.restart();
        self.gate.clear();
        self.lane = TRACKS / 2;
        events.push(GameEvent::Restarted);
        if self.session.is_playing() {
            self.spawn_row(events);
        }
    }

    fn spawn_row(&mut self, events: &mut Vec<GameEvent>) {
        match self.session.new_round() {
            Ok(round) => {
                let round_id = self.gate.spawn(round);
                events.push(GameEvent::RoundSpawned { round_id });
            }
            Err(err) => abort(&mut self.session, &err, events),
        }
    }

    /// One lane per frame toward the correct track of the nearest row
    fn autopilot_steer(&self) -> Option<Steer> {
        let target = self.gate.next_unjudged()?.round.correct_position();
        match target.cmp(&self.lane) {
            std::cmp::Ordering::Less => Some(Steer::Left),
            std::cmp::Ordering::Greater => Some(Steer::Right),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn gate(&self) -> &CollisionGate {
        &self.gate
    }

    pub fn rows(&self) -> Vec<RowView> {
        self.gate
            .rounds()
            .iter()
            .map(|tracked| RowView {
                round_id: tracked.round.id(),
                y: tracked.offset,
                labels: tracked
                    .round
                    .slots()
                    .iter()
                    .map(|s| s.content.clone())
                    .collect(),
            })
            .collect()
    }

    pub(crate) fn detail(&self) -> SnapshotDetail {
        SnapshotDetail::SignalSlayer {
            lane: self.lane,
            rows: self.rows(),
        }
    }
}
