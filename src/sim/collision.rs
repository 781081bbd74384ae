//! Collision gate for rounds that scroll past the player
//!
//! Rounds move along one axis. A round can be judged while its span overlaps
//! the judgment band (the player's window), and it is judged at most once no
//! matter how many frames it spends there. The `judged` flag lives on the
//! round itself, so purging a round also drops its dedup state.

use serde::{Deserialize, Serialize};

use super::round::{Judgment, Round, RoundId};

/// Direction all rounds travel in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Coordinates increase (rows falling down the screen)
    Forward,
    /// Coordinates decrease (columns scrolling left)
    Backward,
}

/// Closed interval on the travel axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: f32,
    pub end: f32,
}

impl Span {
    pub fn new(start: f32, end: f32) -> Self {
        debug_assert!(start <= end, "span start after end");
        Self { start, end }
    }

    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.end >= other.start && self.start <= other.end
    }
}

/// Fixed geometry of a gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateGeometry {
    /// Where the player can judge a round
    pub band: Span,
    /// Visible area; rounds that leave it on the far side are purged
    pub visible: Span,
    /// Length of a round along the travel axis
    pub extent: f32,
    pub direction: Direction,
}

impl GateGeometry {
    /// Offset at which a new round enters, just outside the near edge
    pub fn entry_offset(&self) -> f32 {
        match self.direction {
            Direction::Forward => self.visible.start - self.extent,
            Direction::Backward => self.visible.end,
        }
    }
}

/// A round plus its position on the travel axis
#[derive(Debug, Clone, Serialize)]
pub struct TrackedRound {
    pub round: Round,
    /// Lowest coordinate covered by the round
    pub offset: f32,
}

impl TrackedRound {
    pub fn span(&self, extent: f32) -> Span {
        Span::new(self.offset, self.offset + extent)
    }
}

/// Tracks moving rounds and emits one judgment per round
#[derive(Debug, Clone, Serialize)]
pub struct CollisionGate {
    geometry: GateGeometry,
    /// Creation order
    rounds: Vec<TrackedRound>,
}

impl CollisionGate {
    pub fn new(geometry: GateGeometry) -> Self {
        Self {
            geometry,
            rounds: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &GateGeometry {
        &self.geometry
    }

    /// Start tracking a round at the entry edge
    pub fn spawn(&mut self, round: Round) -> RoundId {
        let offset = self.geometry.entry_offset();
        self.spawn_at(round, offset)
    }

    /// Start tracking a round at an explicit offset
    pub fn spawn_at(&mut self, round: Round, offset: f32) -> RoundId {
        let id = round.id();
        debug_assert!(
            self.rounds.last().is_none_or(|r| r.round.id() < id),
            "rounds must be spawned in creation order"
        );
        self.rounds.push(TrackedRound { round, offset });
        id
    }

    /// Move every round `distance` along the travel direction
    pub fn tick(&mut self, distance: f32) {
        let delta = match self.geometry.direction {
            Direction::Forward => distance,
            Direction::Backward => -distance,
        };
        for tracked in &mut self.rounds {
            tracked.offset += delta;
        }
    }

    /// Judge the first unjudged round in the band using the player's slot
    ///
    /// Returns None when no unjudged round overlaps the band, or when the
    /// player's slot does not exist in that round.
    pub fn check_judgment(&mut self, slot: usize) -> Option<Judgment> {
        let band = self.geometry.band;
        let extent = self.geometry.extent;
        let tracked = self
            .rounds
            .iter_mut()
            .find(|t| !t.round.is_judged() && t.span(extent).overlaps(&band))?;
        let judgment = tracked.round.judge(slot)?;
        log::debug!(
            "round {:?} judged at slot {} ({})",
            judgment.round_id,
            judgment.position,
            if judgment.correct { "correct" } else { "wrong" }
        );
        Some(judgment)
    }

    /// Drop rounds whose trailing edge has left the far side of the visible area
    pub fn purge(&mut self) -> Vec<RoundId> {
        let visible = self.geometry.visible;
        let extent = self.geometry.extent;
        let direction = self.geometry.direction;
        let mut purged = Vec::new();
        self.rounds.retain(|t| {
            let gone = match direction {
                Direction::Forward => t.offset > visible.end,
                Direction::Backward => t.offset + extent < visible.start,
            };
            if gone {
                purged.push(t.round.id());
            }
            !gone
        });
        purged
    }

    /// Stop tracking a round (e.g. a row collected by the player)
    pub fn remove(&mut self, id: RoundId) -> Option<Round> {
        let index = self.rounds.iter().position(|t| t.round.id() == id)?;
        Some(self.rounds.remove(index).round)
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }

    pub fn rounds(&self) -> &[TrackedRound] {
        &self.rounds
    }

    /// First round the player has not judged yet
    pub fn next_unjudged(&self) -> Option<&TrackedRound> {
        self.rounds.iter().find(|t| !t.round.is_judged())
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }
}
