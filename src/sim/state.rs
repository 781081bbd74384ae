//! Session state machine
//!
//! `Loading → Playing ⇄ RoundResolved → Victory | GameOver`, plus `Aborted`
//! when the line's data cannot support a round. One state machine drives all
//! four games; the games differ only in their `MissPolicy`.

use serde::{Deserialize, Serialize};

use super::round::{Judgment, Round, RoundGenerator, RoundId};
use super::sequence::ChallengeSequence;
use crate::catalog::LineData;
use crate::consts::MAX_HEALTH;
use crate::error::{EngineError, Result};

/// What a wrong answer does to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissPolicy {
    /// Lose a heart and keep going on the same target
    ContinueOnMiss,
    /// Lose a heart and end the session
    EndOnMiss,
    /// Lose a heart and start the sequence over with the score cleared
    RestartOnMiss,
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for catalog data; rounds cannot be generated yet
    Loading,
    /// Active gameplay
    Playing,
    /// Every answer found
    Victory,
    /// Out of hearts, or a miss under `EndOnMiss`
    GameOver,
    /// The line's data cannot support a round
    Aborted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Victory | Phase::GameOver | Phase::Aborted)
    }
}

/// Result of resolving one judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Correct answer, more to go
    Advanced,
    /// Wrong answer, same target
    Missed,
    /// Wrong answer, sequence started over
    Restarted,
    Victory,
    GameOver,
    /// Judgment arrived while the session could not take it
    Ignored,
}

/// Per-session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub policy: MissPolicy,
    pub max_health: u32,
    /// Wrong choices per round
    pub distractors: usize,
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: MissPolicy::ContinueOnMiss,
            max_health: MAX_HEALTH,
            distractors: 2,
            seed: 0,
        }
    }
}

/// How a finished session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Victory,
    GameOver,
    Aborted { reason: String },
}

/// Returned to the caller once a session is terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub line: String,
    pub outcome: SessionOutcome,
    pub score: u32,
    pub health: u32,
    /// Rounds resolved over the whole session
    pub judged: u32,
}

impl SessionResult {
    pub fn won(&self) -> bool {
        self.outcome == SessionOutcome::Victory
    }
}

/// Score, health and progress for one play-through of one line
#[derive(Debug, Clone)]
pub struct SessionState {
    line: String,
    config: SessionConfig,
    data: Option<LineData>,
    sequence: ChallengeSequence,
    generator: RoundGenerator,
    score: u32,
    health: u32,
    phase: Phase,
    judged: u32,
    last_resolved: Option<RoundId>,
    abort_reason: Option<String>,
}

impl SessionState {
    /// Start a session with catalog data already at hand
    pub fn new(data: LineData, config: SessionConfig) -> Result<Self> {
        let mut state = Self::loading(data.line.clone(), config);
        state.provide_catalog(data)?;
        Ok(state)
    }

    /// Start a session whose catalog data is still on its way
    pub fn loading(line: impl Into<String>, config: SessionConfig) -> Self {
        let line = line.into();
        Self {
            sequence: ChallengeSequence::new(line.clone(), Vec::new()),
            line,
            config,
            data: None,
            generator: RoundGenerator::new(config.seed),
            score: 0,
            health: config.max_health,
            phase: Phase::Loading,
            judged: 0,
            last_resolved: None,
            abort_reason: None,
        }
    }

    /// Ready transition: `Loading → Playing`
    pub fn provide_catalog(&mut self, data: LineData) -> Result<()> {
        if data.answers.is_empty() {
            return Err(EngineError::EmptySequence { line: data.line });
        }
        debug_assert_eq!(self.phase, Phase::Loading, "catalog provided twice");
        if self.phase != Phase::Loading {
            return Ok(());
        }
        log::info!(
            "session ready for '{}' ({} signals, {} distractors in pool)",
            data.line,
            data.answers.len(),
            data.pool.len()
        );
        self.line = data.line.clone();
        self.sequence = ChallengeSequence::new(data.line.clone(), data.answers.clone());
        self.data = Some(data);
        self.phase = Phase::Playing;
        Ok(())
    }

    /// Generate the round for the current target
    pub fn new_round(&mut self) -> Result<Round> {
        let data = self.data.as_ref().ok_or(EngineError::CatalogNotReady)?;
        self.generator
            .generate_for(&self.sequence, &data.pool, self.config.distractors)
    }

    /// Apply a judgment to score, health and phase
    pub fn resolve(&mut self, judgment: &Judgment) -> Transition {
        if self.phase != Phase::Playing {
            debug_assert!(
                !self.phase.is_terminal(),
                "judgment after the session ended ({:?})",
                self.phase
            );
            return match self.phase {
                Phase::Victory => Transition::Victory,
                Phase::GameOver => Transition::GameOver,
                _ => Transition::Ignored,
            };
        }
        if self.last_resolved.is_some_and(|last| judgment.round_id <= last) {
            debug_assert!(false, "round {:?} resolved twice", judgment.round_id);
            return Transition::Ignored;
        }
        self.last_resolved = Some(judgment.round_id);
        self.judged += 1;

        if judgment.correct {
            self.score += 1;
            self.sequence.advance();
            if self.sequence.is_complete() {
                self.phase = Phase::Victory;
                log::info!("'{}' complete with score {}", self.line, self.score);
                return Transition::Victory;
            }
            return Transition::Advanced;
        }

        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.phase = Phase::GameOver;
            log::info!("'{}' out of hearts at score {}", self.line, self.score);
            return Transition::GameOver;
        }
        match self.config.policy {
            MissPolicy::ContinueOnMiss => Transition::Missed,
            MissPolicy::EndOnMiss => {
                self.phase = Phase::GameOver;
                log::info!("'{}' ended on a miss at score {}", self.line, self.score);
                Transition::GameOver
            }
            MissPolicy::RestartOnMiss => {
                self.score = 0;
                self.sequence =
                    ChallengeSequence::new(self.line.clone(), self.sequence.answers().to_vec());
                Transition::Restarted
            }
        }
    }

    /// Abort after an invariant violation (e.g. an undersized distractor pool)
    pub fn abort(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("session for '{}' aborted: {}", self.line, reason);
        self.phase = Phase::Aborted;
        self.abort_reason = Some(reason);
    }

    /// Full reset for a new play-through of the same line
    ///
    /// Keeps the RNG stream going so the new session gets fresh rounds.
    pub fn restart(&mut self) {
        self.sequence = ChallengeSequence::new(self.line.clone(), self.sequence.answers().to_vec());
        self.score = 0;
        self.health = self.config.max_health;
        self.judged = 0;
        self.abort_reason = None;
        self.phase = if self.data.is_some() {
            Phase::Playing
        } else {
            Phase::Loading
        };
    }

    /// Session result, once terminal
    pub fn result(&self) -> Option<SessionResult> {
        let outcome = match self.phase {
            Phase::Victory => SessionOutcome::Victory,
            Phase::GameOver => SessionOutcome::GameOver,
            Phase::Aborted => SessionOutcome::Aborted {
                reason: self.abort_reason.clone().unwrap_or_default(),
            },
            Phase::Loading | Phase::Playing => return None,
        };
        Some(SessionResult {
            line: self.line.clone(),
            outcome,
            score: self.score,
            health: self.health,
            judged: self.judged,
        })
    }

    /// The answer the player has to find next
    pub fn current_target(&self) -> Result<&str> {
        if self.phase == Phase::Loading {
            return Err(EngineError::CatalogNotReady);
        }
        self.sequence.current()
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.config.max_health
    }

    pub fn policy(&self) -> MissPolicy {
        self.config.policy
    }

    pub fn sequence(&self) -> &ChallengeSequence {
        &self.sequence
    }

    pub fn data(&self) -> Option<&LineData> {
        self.data.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }
}
