//! SchemaPro: find each signal on the track schematic
//!
//! Signals are asked for page by page, in a seeded random order within each
//! page. Finding the last signal on a page turns to the next one. A wrong
//! click costs a heart and the same signal is asked for again.

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use super::{GameEvent, SnapshotDetail, TickInput, abort, transition_events};
use crate::catalog::{Hotspot, LineData};
use crate::error::Result;
use crate::sim::{Judgment, Round, SessionConfig, SessionState};

#[derive(Debug, Clone)]
pub struct SchemaPro {
    session: SessionState,
    /// Hotspots in solve order
    hotspots: Vec<Hotspot>,
    round: Option<Round>,
    seed: u64,
}

/// Keeps the page order independent of the round generator's draws
const SHUFFLE_SALT: u64 = 0x5348_454d_4121;

impl SchemaPro {
    pub fn loading(line: &str, config: SessionConfig) -> Self {
        Self {
            session: SessionState::loading(line, config),
            hotspots: Vec::new(),
            round: None,
            seed: config.seed,
        }
    }

    pub fn provide(&mut self, data: LineData) -> Result<Vec<GameEvent>> {
        let mut view = data.schema_view();
        shuffle_pages(&mut view.hotspots, self.seed ^ SHUFFLE_SALT);
        view.answers = view.hotspots.iter().map(|h| h.code.clone()).collect();
        let hotspots = view.hotspots.clone();
        self.session.provide_catalog(view)?;
        self.hotspots = hotspots;

        let mut events = Vec::new();
        if let Some(page) = self.page() {
            events.push(GameEvent::PageTurned { page });
        }
        self.next_round(&mut events);
        Ok(events)
    }

    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.session.is_playing() {
            return events;
        }
        let click = if input.autoplay {
            self.current().map(|h| h.hitbox.center())
        } else {
            input.click
        };
        if let Some(point) = click {
            self.click(point, &mut events);
        }
        events
    }

    fn click(&mut self, point: Vec2, events: &mut Vec<GameEvent>) {
        let Some(hotspot) = self.current() else {
            return;
        };
        let hit = hotspot.hitbox.contains(point);
        let page = hotspot.page;
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if !round.mark_judged() {
            return;
        }
        let judgment = Judgment {
            round_id: round.id(),
            position: round.correct_position(),
            correct: hit,
            content: round.target().to_string(),
        };
        log::debug!(
            "click at ({}, {}) for '{}' ({})",
            point.x,
            point.y,
            judgment.content,
            if hit { "hit" } else { "miss" }
        );
        events.push(GameEvent::Judged {
            round_id: judgment.round_id,
            position: judgment.position,
            correct: judgment.correct,
            content: judgment.content.clone(),
        });

        let transition = self.session.resolve(&judgment);
        transition_events(&self.session, transition, events);
        if !self.session.is_playing() {
            self.round = None;
            return;
        }
        if let Some(next) = self.page().filter(|next| *next != page) {
            events.push(GameEvent::PageTurned { page: next });
        }
        self.next_round(events);
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

    /// Hotspot the player is asked for
    pub fn current(&self) -> Option<&Hotspot> {
        if !self.session.is_playing() {
            return None;
        }
        self.hotspots.get(self.session.sequence().cursor())
    }

    /// Page on screen
    pub fn page(&self) -> Option<u32> {
        self.current().map(|h| h.page)
    }

    /// Hotspots already found, for overlay labels
    pub fn found(&self) -> &[Hotspot] {
        let solved = self.session.sequence().cursor().min(self.hotspots.len());
        &self.hotspots[..solved]
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub(crate) fn detail(&self) -> SnapshotDetail {
        SnapshotDetail::SchemaPro {
            page: self.page(),
            prompt: self.current().map(|h| h.code.clone()),
            found: self.found().to_vec(),
        }
    }
}

/// Shuffle each run of same-page hotspots in place; pages stay in order
fn shuffle_pages(hotspots: &mut [Hotspot], seed: u64) {
    let mut rng = Pcg32::seed_from_u64(seed);
    for page in hotspots.chunk_by_mut(|a, b| a.page == b.page) {
        page.shuffle(&mut rng);
    }
}
