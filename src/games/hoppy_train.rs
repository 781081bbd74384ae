//! HoppyTrain: flap the train through the box holding the next signal
//!
//! Columns of three boxes scroll in from the right. The box the player is
//! in when a column reaches them is the answer. A correct box disappears;
//! a wrong one flashes red and then stays red.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{GameEvent, SnapshotDetail, TickInput, abort, transition_events};
use crate::box_height;
use crate::catalog::LineData;
use crate::consts::*;
use crate::error::Result;
use crate::settings::HoppyTuning;
use crate::sim::{
    CollisionGate, Direction, GateGeometry, Judgment, RoundId, SessionConfig, SessionState, Span,
};

/// How a box is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxState {
    Shown,
    /// Correct pick, removed from the column
    Hidden,
    /// Wrong pick, frames left in the flash
    Flashing(u32),
    Red,
}

/// One drawable box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxView {
    pub round_id: RoundId,
    /// Top-left corner in canvas coordinates
    pub pos: Vec2,
    pub label: String,
    pub state: BoxState,
}

#[derive(Debug, Clone)]
struct Mark {
    round_id: RoundId,
    position: usize,
    state: BoxState,
}

impl Mark {
    fn for_judgment(judgment: &Judgment) -> Self {
        Self {
            round_id: judgment.round_id,
            position: judgment.position,
            state: if judgment.correct {
                BoxState::Hidden
            } else {
                BoxState::Flashing(FLASH_FRAMES)
            },
        }
    }
}

fn geometry() -> GateGeometry {
    GateGeometry {
        band: Span::new(PLAYER_X - PLAYER_SIZE / 2.0, PLAYER_X + PLAYER_SIZE / 2.0),
        visible: Span::new(0.0, CANVAS_WIDTH),
        extent: BOX_WIDTH,
        direction: Direction::Backward,
    }
}

#[derive(Debug, Clone)]
pub struct HoppyTrain {
    session: SessionState,
    tuning: HoppyTuning,
    gate: CollisionGate,
    /// Top-left corner of the player
    player: Vec2,
    vel_y: f32,
    marks: Vec<Mark>,
}

impl HoppyTrain {
    pub fn loading(line: &str, config: SessionConfig, tuning: HoppyTuning) -> Self {
        Self {
            session: SessionState::loading(line, config),
            tuning,
            gate: CollisionGate::new(geometry()),
            player: Vec2::new(
                PLAYER_X - PLAYER_SIZE / 2.0,
                (CANVAS_HEIGHT - PLAYER_SIZE) / 2.0,
            ),
            vel_y: 0.0,
            marks: Vec::new(),
        }
    }

    pub fn provide(&mut self, data: LineData) -> Result<Vec<GameEvent>> {
        self.session.provide_catalog(data)?;
        let mut events = Vec::new();
        self.spawn_column(&mut events);
        Ok(events)
    }

    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.session.phase().is_terminal() {
            return events;
        }

        let flap = input.flap || (input.autoplay && self.autopilot_flap());
        self.step_player(flap);
        if !self.session.is_playing() {
            return events;
        }

        self.gate.tick(self.tuning.box_speed);
        self.age_marks();
        for id in self.gate.purge() {
            self.marks.retain(|m| m.round_id != id);
        }

        if let Some(judgment) = self.gate.check_judgment(self.player_slot()) {
            events.push(GameEvent::Judged {
                round_id: judgment.round_id,
                position: judgment.position,
                correct: judgment.correct,
                content: judgment.content.clone(),
            });
            self.marks.push(Mark::for_judgment(&judgment));
            let transition = self.session.resolve(&judgment);
            transition_events(&self.session, transition, &mut events);
            if self.session.is_playing() {
                self.spawn_column(&mut events);
            }
        }
        events
    }

    fn spawn_column(&mut self, events: &mut Vec<GameEvent>) {
        match self.session.new_round() {
            Ok(round) => {
                let round_id = self.gate.spawn(round);
                events.push(GameEvent::RoundSpawned { round_id });
            }
            Err(err) => abort(&mut self.session, &err, events),
        }
    }

    fn step_player(&mut self, flap: bool) {
        if flap {
            self.vel_y = self.tuning.flap_velocity;
        }
        self.vel_y += self.tuning.gravity;
        self.player.y += self.vel_y;

        if self.player.y < 0.0 {
            self.player.y = 0.0;
            self.vel_y = 0.0;
        }
        let floor = CANVAS_HEIGHT - GROUND_HEIGHT - PLAYER_SIZE;
        if self.player.y > floor {
            self.player.y = floor;
            self.vel_y = -self.vel_y * GROUND_BOUNCE;
            if self.vel_y.abs() < 1.0 {
                self.vel_y = 0.0;
            }
        }
    }

    fn age_marks(&mut self) {
        for mark in &mut self.marks {
            if let BoxState::Flashing(frames) = mark.state {
                mark.state = match frames.saturating_sub(1) {
                    0 => BoxState::Red,
                    left => BoxState::Flashing(left),
                };
            }
        }
    }

    /// Box row under the player's center
    pub fn player_slot(&self) -> usize {
        let center = self.player.y + PLAYER_SIZE / 2.0;
        ((center / box_height()).floor().max(0.0) as usize).min(BOXES_PER_COLUMN - 1)
    }

    /// Flap when below the center of the correct box and not already rising
    fn autopilot_flap(&self) -> bool {
        let Some(next) = self.gate.next_unjudged() else {
            return false;
        };
        let target = (next.round.correct_position() as f32 + 0.5) * box_height();
        let center = self.player.y + PLAYER_SIZE / 2.0;
        center > target + 10.0 && self.vel_y >= 0.0
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    /// Test hook: place the player directly
    pub fn set_player_y(&mut self, y: f32) {
        self.player.y = y;
        self.vel_y = 0.0;
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn gate(&self) -> &CollisionGate {
        &self.gate
    }

    pub fn boxes(&self) -> Vec<BoxView> {
        let height = box_height();
        let mut boxes = Vec::new();
        for tracked in self.gate.rounds() {
            let id = tracked.round.id();
            for slot in tracked.round.slots() {
                let state = self
                    .marks
                    .iter()
                    .find(|m| m.round_id == id && m.position == slot.position)
                    .map_or(BoxState::Shown, |m| m.state);
                boxes.push(BoxView {
                    round_id: id,
                    pos: Vec2::new(tracked.offset, slot.position as f32 * height),
                    label: slot.content.clone(),
                    state,
                });
            }
        }
        boxes
    }

    pub(crate) fn detail(&self) -> SnapshotDetail {
        SnapshotDetail::HoppyTrain {
            player: self.player,
            boxes: self.boxes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::GameKind;
    use crate::settings::Settings;
    use crate::sim::Phase;
    use std::collections::BTreeSet;

    fn data(answers: &[&str]) -> LineData {
        LineData {
            line: "Test Line".into(),
            answers: answers.iter().map(|s| s.to_string()).collect(),
            pool: BTreeSet::from(["X1".to_string(), "X2".to_string(), "X3".to_string()]),
            keypad: Vec::new(),
            hotspots: Vec::new(),
        }
    }

    fn game(answers: &[&str]) -> HoppyTrain {
        let settings = Settings::default();
        let mut game = HoppyTrain::loading(
            "Test Line",
            settings.session_config(GameKind::HoppyTrain, 11),
            settings.hoppy,
        );
        game.provide(data(answers)).unwrap();
        game
    }

    /// Hold the player over `slot` until the next column is judged
    fn fly_into(game: &mut HoppyTrain, slot: usize) -> Vec<GameEvent> {
        let y = (slot as f32 + 0.5) * box_height() - PLAYER_SIZE / 2.0;
        for _ in 0..2_000 {
            game.set_player_y(y);
            let events = game.tick(&TickInput::default());
            if events.iter().any(|e| matches!(e, GameEvent::Judged { .. })) {
                return events;
            }
        }
        panic!("column never reached the player");
    }

    fn correct_slot(game: &HoppyTrain) -> usize {
        game.gate().next_unjudged().unwrap().round.correct_position()
    }

    #[test]
    fn test_player_slot_follows_height() {
        let mut game = game(&["A"]);
        game.set_player_y(0.0);
        assert_eq!(game.player_slot(), 0);
        game.set_player_y(180.0);
        assert_eq!(game.player_slot(), 1);
        game.set_player_y(330.0);
        assert_eq!(game.player_slot(), 2);
    }

    #[test]
    fn test_gravity_and_ground_bounce() {
        let mut game = HoppyTrain::loading("L", SessionConfig::default(), HoppyTuning::default());
        let start = game.player().y;
        game.tick(&TickInput::default());
        assert!(game.player().y > start);

        for _ in 0..1_000 {
            game.tick(&TickInput::default());
        }
        let floor = CANVAS_HEIGHT - GROUND_HEIGHT - PLAYER_SIZE;
        assert_eq!(game.player().y, floor);

        game.tick(&TickInput {
            flap: true,
            ..Default::default()
        });
        assert!(game.player().y < floor);
    }

    #[test]
    fn test_ceiling_clamps() {
        let mut game = HoppyTrain::loading("L", SessionConfig::default(), HoppyTuning::default());
        for _ in 0..200 {
            game.tick(&TickInput {
                flap: true,
                ..Default::default()
            });
        }
        assert_eq!(game.player().y, 0.0);
    }

    #[test]
    fn test_each_column_judged_once() {
        let mut game = game(&["A", "B"]);
        let slot = correct_slot(&game);
        let events = fly_into(&mut game, slot);
        let judged = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Judged { .. }))
            .count();
        assert_eq!(judged, 1);
        assert_eq!(game.session().score(), 1);
        // the judged column is still overlapping the player for a while
        for _ in 0..30 {
            let events = game.tick(&TickInput::default());
            assert!(!events.iter().any(|e| matches!(e, GameEvent::Judged { .. })));
        }
        assert_eq!(game.session().score(), 1);
    }

    #[test]
    fn test_column_judged_at_player_right_edge() {
        let mut game = game(&["A", "B"]);
        assert_eq!(game.player().x + PLAYER_SIZE / 2.0, PLAYER_X);
        let slot = correct_slot(&game);
        let events = fly_into(&mut game, slot);
        let judged = events
            .iter()
            .find_map(|e| match e {
                GameEvent::Judged { round_id, .. } => Some(*round_id),
                _ => None,
            })
            .unwrap();
        let column = game
            .gate()
            .rounds()
            .iter()
            .find(|t| t.round.id() == judged)
            .unwrap();
        let right_edge = PLAYER_X + PLAYER_SIZE / 2.0;
        assert!(column.offset <= right_edge);
        assert!(column.offset > right_edge - game.tuning.box_speed);
    }

    #[test]
    fn test_wrong_box_flashes_then_stays_red() {
        let mut game = game(&["A", "B"]);
        let wrong = (correct_slot(&game) + 1) % BOXES_PER_COLUMN;
        fly_into(&mut game, wrong);
        assert_eq!(game.session().health(), MAX_HEALTH - 1);
        assert_eq!(game.session().phase(), Phase::Playing);
        assert_eq!(game.session().current_target().unwrap(), "A");

        let state = |game: &HoppyTrain| {
            game.boxes()
                .into_iter()
                .find(|b| b.state != BoxState::Shown)
                .map(|b| b.state)
        };
        assert_eq!(state(&game), Some(BoxState::Flashing(FLASH_FRAMES)));
        for _ in 0..FLASH_FRAMES {
            game.tick(&TickInput::default());
        }
        assert_eq!(state(&game), Some(BoxState::Red));
    }

    #[test]
    fn test_new_column_after_each_judgment() {
        let mut game = game(&["A", "B"]);
        let slot = correct_slot(&game);
        let events = fly_into(&mut game, slot);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RoundSpawned { .. })));
        assert_eq!(game.gate().len(), 2);
        assert_eq!(game.gate().next_unjudged().unwrap().round.target(), "B");
    }

    #[test]
    fn test_three_misses_end_the_game() {
        let mut game = game(&["A"]);
        for _ in 0..MAX_HEALTH {
            let wrong = (correct_slot(&game) + 1) % BOXES_PER_COLUMN;
            fly_into(&mut game, wrong);
        }
        assert_eq!(game.session().phase(), Phase::GameOver);
        assert!(game.session().result().is_some());
    }

    #[test]
    fn test_passed_columns_are_purged() {
        let mut game = game(&["A", "B", "C"]);
        let slot = correct_slot(&game);
        fly_into(&mut game, slot);
        let first = game.gate().rounds()[0].round.id();
        for _ in 0..200 {
            game.tick(&TickInput::default());
        }
        assert!(game.gate().rounds().iter().all(|t| t.round.id() != first));
        assert!(game.boxes().iter().all(|b| b.round_id != first));
    }

    #[test]
    fn test_undersized_pool_aborts() {
        let settings = Settings::default();
        let mut game = HoppyTrain::loading(
            "Test Line",
            settings.session_config(GameKind::HoppyTrain, 1),
            settings.hoppy,
        );
        let mut small = data(&["A"]);
        small.pool = BTreeSet::from(["X1".to_string()]);
        let events = game.provide(small).unwrap();
        assert!(matches!(events[0], GameEvent::Aborted { .. }));
        assert_eq!(game.session().phase(), Phase::Aborted);
    }
}
