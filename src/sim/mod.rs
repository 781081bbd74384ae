//! Sequential challenge engine
//!
//! All gameplay rules live here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (sorted pools, rounds in creation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod distractor;
pub mod round;
pub mod sequence;
pub mod state;

pub use collision::{CollisionGate, Direction, GateGeometry, Span, TrackedRound};
pub use distractor::{DistractorPicker, sample_distractors};
pub use round::{Judgment, Round, RoundGenerator, RoundId, Slot};
pub use sequence::ChallengeSequence;
pub use state::{
    MissPolicy, Phase, SessionConfig, SessionOutcome, SessionResult, SessionState, Transition,
};
