//! RememberBee: type each signal number in order from memory

use super::{GameEvent, Key, SnapshotDetail, TickInput, abort, transition_events};
use crate::catalog::LineData;
use crate::error::Result;
use crate::sim::{Judgment, Round, SessionConfig, SessionState};

/// Longest entry the keypad accepts
const MAX_ENTRY: usize = 8;

#[derive(Debug, Clone)]
pub struct RememberBee {
    session: SessionState,
    /// Single-slot round for the current target
    round: Option<Round>,
    entry: String,
}

impl RememberBee {
    pub fn loading(line: &str, config: SessionConfig) -> Self {
        Self {
            session: SessionState::loading(line, config),
            round: None,
            entry: String::new(),
        }
    }

    /// Plays the keypad form of the line's answers
    pub fn provide(&mut self, data: LineData) -> Result<Vec<GameEvent>> {
        self.session.provide_catalog(data.keypad_view())?;
        let mut events = Vec::new();
        self.next_round(&mut events);
        Ok(events)
    }

    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.session.is_playing() {
            return events;
        }
        let key = if input.autoplay {
            self.autopilot_key()
        } else {
            input.key
        };
        if let Some(key) = key {
            self.press(key, &mut events);
        }
        events
    }

    fn press(&mut self, key: Key, events: &mut Vec<GameEvent>) {
        match key {
            Key::Digit(d) if d <= 9 => {
                if self.entry.len() < MAX_ENTRY {
                    self.entry.push(char::from(b'0' + d));
                    events.push(GameEvent::EntryChanged {
                        entry: self.entry.clone(),
                    });
                }
            }
            Key::Digit(_) => {}
            Key::Clear => {
                self.entry.clear();
                events.push(GameEvent::EntryChanged {
                    entry: String::new(),
                });
            }
            Key::Submit => self.submit(events),
        }
    }

    fn submit(&mut self, events: &mut Vec<GameEvent>) {
        if self.entry.is_empty() {
            return;
        }
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if !round.mark_judged() {
            return;
        }
        let expected = round.target().to_string();
        let entry = std::mem::take(&mut self.entry);
        let judgment = Judgment {
            round_id: round.id(),
            position: round.correct_position(),
            correct: entry == expected,
            content: entry,
        };
        log::debug!(
            "entered '{}' for '{}' ({})",
            judgment.content,
            expected,
            if judgment.correct { "correct" } else { "wrong" }
        );
        events.push(GameEvent::Judged {
            round_id: judgment.round_id,
            position: judgment.position,
            correct: judgment.correct,
            content: judgment.content.clone(),
        });
        if !judgment.correct {
            events.push(GameEvent::Revealed { expected });
        }
        events.push(GameEvent::EntryChanged {
            entry: String::new(),
        });

        let transition = self.session.resolve(&judgment);
        transition_events(&self.session, transition, events);
        if self.session.is_playing() {
            self.next_round(events);
        } else {
            self.round = None;
        }
    }

    fn next_round(&mut self, events: &mut Vec<GameEvent>) {
        match self.session.new_round() {
            Ok(round) => {
                events.push(GameEvent::RoundSpawned {
                    round_id: round.id(),
                });
                self.round = Some(round);
            }
            Err(err) => {
                self.round = None;
                abort(&mut self.session, &err, events);
            }
        }
    }

    /// Type the target one digit per frame, then submit
    fn autopilot_key(&self) -> Option<Key> {
        let target = self.round.as_ref()?.target();
        if !target.starts_with(self.entry.as_str()) {
            return Some(Key::Clear);
        }
        match target[self.entry.len()..].bytes().next() {
            Some(b) if b.is_ascii_digit() => Some(Key::Digit(b - b'0')),
            Some(_) => None,
            None => Some(Key::Submit),
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub(crate) fn detail(&self) -> SnapshotDetail {
        SnapshotDetail::RememberBee {
            entry: self.entry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_HEALTH;
    use crate::games::GameKind;
    use crate::settings::Settings;
    use crate::sim::Phase;
    use std::collections::BTreeSet;

    fn game() -> RememberBee {
        let data = LineData {
            line: "Blue Line North East".into(),
            answers: vec!["O2RA".into(), "O2LB".into(), "O046".into()],
            pool: BTreeSet::new(),
            keypad: vec!["2".into(), "046".into()],
            hotspots: Vec::new(),
        };
        let config = Settings::default().session_config(GameKind::RememberBee, 3);
        let mut game = RememberBee::loading(&data.line, config);
        game.provide(data).unwrap();
        game
    }

    fn type_in(game: &mut RememberBee, text: &str) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for b in text.bytes() {
            events.extend(game.tick(&key(Key::Digit(b - b'0'))));
        }
        events.extend(game.tick(&key(Key::Submit)));
        events
    }

    fn key(key: Key) -> TickInput {
        TickInput {
            key: Some(key),
            ..Default::default()
        }
    }

    #[test]
    fn test_plays_keypad_form() {
        let game = game();
        assert_eq!(game.session().sequence().answers(), ["2", "046"]);
        assert_eq!(game.session().current_target().unwrap(), "2");
    }

    #[test]
    fn test_entry_editing() {
        let mut game = game();
        let events = game.tick(&key(Key::Digit(4)));
        assert_eq!(events, vec![GameEvent::EntryChanged { entry: "4".into() }]);
        game.tick(&key(Key::Digit(12)));
        assert_eq!(game.entry(), "4");
        game.tick(&key(Key::Clear));
        assert_eq!(game.entry(), "");
        // empty submit is ignored
        assert!(game.tick(&key(Key::Submit)).is_empty());
    }

    #[test]
    fn test_correct_sequence_wins() {
        let mut game = game();
        let events = type_in(&mut game, "2");
        assert!(events.iter().any(|e| matches!(e, GameEvent::Judged { correct: true, .. })));
        let events = type_in(&mut game, "046");
        assert!(events.contains(&GameEvent::Victory { score: 2 }));
        assert_eq!(game.session().phase(), Phase::Victory);
        assert_eq!(game.session().health(), MAX_HEALTH);
    }

    #[test]
    fn test_wrong_answer_reveals_and_restarts() {
        let mut game = game();
        type_in(&mut game, "2");
        let events = type_in(&mut game, "46");
        assert!(events.contains(&GameEvent::Revealed {
            expected: "046".into()
        }));
        assert!(events.contains(&GameEvent::Restarted));
        assert_eq!(game.session().score(), 0);
        assert_eq!(game.session().health(), MAX_HEALTH - 1);
        assert_eq!(game.session().current_target().unwrap(), "2");
        assert_eq!(game.entry(), "");
    }

    #[test]
    fn test_out_of_hearts() {
        let mut game = game();
        for _ in 0..MAX_HEALTH {
            type_in(&mut game, "9");
        }
        assert_eq!(game.session().phase(), Phase::GameOver);
        assert!(game.tick(&key(Key::Digit(2))).is_empty());
    }

    #[test]
    fn test_autoplay_types_target() {
        let mut game = game();
        let autoplay = TickInput {
            autoplay: true,
            ..Default::default()
        };
        game.tick(&autoplay);
        assert_eq!(game.entry(), "2");
        game.tick(&autoplay);
        assert_eq!(game.session().score(), 1);
    }
}
