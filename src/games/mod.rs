//! Game adapters
//!
//! Each game owns a `SessionState` and turns per-frame input into
//! judgments. Nothing here draws; the UI layer reads `Snapshot`s and
//! `GameEvent`s.

pub mod hoppy_train;
pub mod remember_bee;
pub mod schema_pro;
pub mod signal_slayer;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::catalog::LineData;
use crate::error::Result;
use crate::settings::Settings;
use crate::sim::{MissPolicy, Phase, RoundId, SessionResult, SessionState, Transition};

pub use hoppy_train::HoppyTrain;
pub use remember_bee::RememberBee;
pub use schema_pro::SchemaPro;
pub use signal_slayer::SignalSlayer;

/// The games, in unlock order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameKind {
    HoppyTrain,
    RememberBee,
    SchemaPro,
    SignalSlayer,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::HoppyTrain,
        GameKind::RememberBee,
        GameKind::SchemaPro,
        GameKind::SignalSlayer,
    ];

    /// Level index of this game on every line
    pub fn index(&self) -> usize {
        match self {
            GameKind::HoppyTrain => 0,
            GameKind::RememberBee => 1,
            GameKind::SchemaPro => 2,
            GameKind::SignalSlayer => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameKind::HoppyTrain => "HoppyTrain",
            GameKind::RememberBee => "RememberBee",
            GameKind::SchemaPro => "SchemaPro",
            GameKind::SignalSlayer => "SignalSlayer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameKind::HoppyTrain => "Flap through the box with the next signal",
            GameKind::RememberBee => "Type the signals in order from memory",
            GameKind::SchemaPro => "Find each signal on the schematic",
            GameKind::SignalSlayer => "Steer the train onto the right signal",
        }
    }

    /// HoppyTrain and SchemaPro cost a heart and keep going; SignalSlayer
    /// ends on the first miss; RememberBee starts the sequence over
    pub fn miss_policy(&self) -> MissPolicy {
        match self {
            GameKind::HoppyTrain => MissPolicy::ContinueOnMiss,
            GameKind::RememberBee => MissPolicy::RestartOnMiss,
            GameKind::SchemaPro => MissPolicy::ContinueOnMiss,
            GameKind::SignalSlayer => MissPolicy::EndOnMiss,
        }
    }

    /// Wrong choices shown next to the right one
    pub fn distractors(&self) -> usize {
        match self {
            GameKind::HoppyTrain => crate::consts::BOXES_PER_COLUMN - 1,
            GameKind::SignalSlayer => crate::consts::TRACKS - 1,
            GameKind::RememberBee | GameKind::SchemaPro => 0,
        }
    }
}

/// Lane change for SignalSlayer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Steer {
    Left,
    Right,
}

/// RememberBee keypad keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Digit(u8),
    Clear,
    Submit,
}

/// Input commands for a single frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickInput {
    /// Flap (HoppyTrain)
    pub flap: bool,
    /// Change lane (SignalSlayer)
    pub steer: Option<Steer>,
    /// Keypad press (RememberBee)
    pub key: Option<Key>,
    /// Click in schematic coordinates (SchemaPro)
    pub click: Option<Vec2>,
    /// Start over after a loss
    pub restart: bool,
    /// Demo mode - the game plays itself
    pub autoplay: bool,
}

/// Things that happened during a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundSpawned {
        round_id: RoundId,
    },
    Judged {
        round_id: RoundId,
        position: usize,
        correct: bool,
        content: String,
    },
    /// Wrong keypad answer; the expected value is shown
    Revealed {
        expected: String,
    },
    EntryChanged {
        entry: String,
    },
    PageTurned {
        page: u32,
    },
    Restarted,
    Victory {
        score: u32,
    },
    GameOver {
        score: u32,
    },
    /// Line data cannot support the game
    Aborted {
        reason: String,
    },
}

/// Push the events that follow a transition
pub(crate) fn transition_events(
    session: &SessionState,
    transition: Transition,
    events: &mut Vec<GameEvent>,
) {
    match transition {
        Transition::Victory => events.push(GameEvent::Victory {
            score: session.score(),
        }),
        Transition::GameOver => events.push(GameEvent::GameOver {
            score: session.score(),
        }),
        Transition::Restarted => events.push(GameEvent::Restarted),
        Transition::Advanced | Transition::Missed | Transition::Ignored => {}
    }
}

/// Abort the session and report why
pub(crate) fn abort(session: &mut SessionState, err: &crate::EngineError, events: &mut Vec<GameEvent>) {
    session.abort(err.to_string());
    events.push(GameEvent::Aborted {
        reason: err.to_string(),
    });
}

/// What the UI layer needs to draw a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub kind: GameKind,
    pub line: String,
    pub phase: Phase,
    pub score: u32,
    pub health: u32,
    pub max_health: u32,
    /// Answers found so far
    pub solved: usize,
    pub total: usize,
    pub detail: SnapshotDetail,
}

/// Per-game drawable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotDetail {
    HoppyTrain {
        player: Vec2,
        boxes: Vec<hoppy_train::BoxView>,
    },
    SignalSlayer {
        lane: usize,
        rows: Vec<signal_slayer::RowView>,
    },
    RememberBee {
        entry: String,
    },
    SchemaPro {
        page: Option<u32>,
        prompt: Option<String>,
        found: Vec<crate::catalog::Hotspot>,
    },
}

fn snapshot_of(kind: GameKind, session: &SessionState, detail: SnapshotDetail) -> Snapshot {
    Snapshot {
        kind,
        line: session.line().to_string(),
        phase: session.phase(),
        score: session.score(),
        health: session.health(),
        max_health: session.max_health(),
        solved: session.sequence().cursor(),
        total: session.sequence().len(),
        detail,
    }
}

/// Any of the four games
#[derive(Debug, Clone)]
pub enum Game {
    HoppyTrain(HoppyTrain),
    RememberBee(RememberBee),
    SchemaPro(SchemaPro),
    SignalSlayer(SignalSlayer),
}

impl Game {
    /// Start a game with its line data at hand
    pub fn new(kind: GameKind, data: LineData, settings: &Settings, seed: u64) -> Result<Self> {
        let mut game = Self::loading(kind, &data.line, settings, seed);
        game.provide(data)?;
        Ok(game)
    }

    /// Start a game whose line data is still loading
    pub fn loading(kind: GameKind, line: &str, settings: &Settings, seed: u64) -> Self {
        let config = settings.session_config(kind, seed);
        match kind {
            GameKind::HoppyTrain => Game::HoppyTrain(HoppyTrain::loading(line, config, settings.hoppy)),
            GameKind::RememberBee => Game::RememberBee(RememberBee::loading(line, config)),
            GameKind::SchemaPro => Game::SchemaPro(SchemaPro::loading(line, config)),
            GameKind::SignalSlayer => {
                Game::SignalSlayer(SignalSlayer::loading(line, config, settings.slayer))
            }
        }
    }

    /// Hand over line data (the ready transition)
    pub fn provide(&mut self, data: LineData) -> Result<Vec<GameEvent>> {
        match self {
            Game::HoppyTrain(g) => g.provide(data),
            Game::RememberBee(g) => g.provide(data),
            Game::SchemaPro(g) => g.provide(data),
            Game::SignalSlayer(g) => g.provide(data),
        }
    }

    /// Advance one frame
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        match self {
            Game::HoppyTrain(g) => g.tick(input),
            Game::RememberBee(g) => g.tick(input),
            Game::SchemaPro(g) => g.tick(input),
            Game::SignalSlayer(g) => g.tick(input),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Game::HoppyTrain(_) => GameKind::HoppyTrain,
            Game::RememberBee(_) => GameKind::RememberBee,
            Game::SchemaPro(_) => GameKind::SchemaPro,
            Game::SignalSlayer(_) => GameKind::SignalSlayer,
        }
    }

    pub fn session(&self) -> &SessionState {
        match self {
            Game::HoppyTrain(g) => g.session(),
            Game::RememberBee(g) => g.session(),
            Game::SchemaPro(g) => g.session(),
            Game::SignalSlayer(g) => g.session(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let detail = match self {
            Game::HoppyTrain(g) => g.detail(),
            Game::RememberBee(g) => g.detail(),
            Game::SchemaPro(g) => g.detail(),
            Game::SignalSlayer(g) => g.detail(),
        };
        snapshot_of(self.kind(), self.session(), detail)
    }

    /// Session result, once the game is over
    pub fn result(&self) -> Option<SessionResult> {
        self.session().result()
    }
}
