//! Rounds: one presented set of choices with exactly one correct slot

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::distractor::DistractorPicker;
use super::sequence::ChallengeSequence;
use crate::error::Result;

/// Session-scoped round identifier (monotonic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(pub u64);

/// One choice inside a round (a box, a track, a keypad prompt)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Signal code shown to the player
    pub content: String,
    pub is_correct: bool,
    /// Position within the round (0..k)
    pub position: usize,
}

/// A generated set of choices
///
/// Immutable once generated except for `judged`, which flips once. Built
/// only by `RoundGenerator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Round {
    id: RoundId,
    slots: Vec<Slot>,
    judged: bool,
}

impl Round {
    pub fn id(&self) -> RoundId {
        self.id
    }

    /// Slots ordered by position
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, position: usize) -> Option<&Slot> {
        self.slots.get(position)
    }

    /// Position of the correct slot
    pub fn correct_position(&self) -> usize {
        self.slots
            .iter()
            .position(|s| s.is_correct)
            .unwrap_or_default()
    }

    /// The answer this round was generated for (empty for a round without slots)
    pub fn target(&self) -> &str {
        self.slot(self.correct_position())
            .map_or("", |slot| slot.content.as_str())
    }

    pub fn is_judged(&self) -> bool {
        self.judged
    }

    /// Flip `judged`; returns false if it was already set
    pub(crate) fn mark_judged(&mut self) -> bool {
        !std::mem::replace(&mut self.judged, true)
    }

    /// Judge the slot at `position` (None if the position does not exist)
    pub(crate) fn judge(&mut self, position: usize) -> Option<Judgment> {
        let slot = self.slots.get(position)?;
        let judgment = Judgment {
            round_id: self.id,
            position,
            correct: slot.is_correct,
            content: slot.content.clone(),
        };
        if !self.mark_judged() {
            debug_assert!(false, "round {:?} judged twice", self.id);
            return None;
        }
        Some(judgment)
    }
}

/// The verdict on one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub round_id: RoundId,
    /// Slot the player picked
    pub position: usize,
    pub correct: bool,
    /// Content of the picked slot
    pub content: String,
}

/// Builds rounds with a seeded RNG and monotonic ids
#[derive(Debug, Clone)]
pub struct RoundGenerator {
    rng: Pcg32,
    picker: DistractorPicker,
    next_id: u64,
}

/// Offset between the placement stream and the distractor stream
const PICKER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

impl RoundGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            picker: DistractorPicker::new(seed ^ PICKER_SEED_SALT),
            next_id: 1,
        }
    }

    /// Allocate a new round ID
    pub fn next_round_id(&mut self) -> RoundId {
        let id = RoundId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Build a round of `distractors.len() + 1` slots
    ///
    /// The correct slot lands on a uniformly random position; distractors
    /// fill the rest in shuffled order.
    pub fn generate(&mut self, answer: &str, mut distractors: Vec<String>) -> Round {
        let k = distractors.len() + 1;
        let correct_pos = self.rng.random_range(0..k);
        distractors.shuffle(&mut self.rng);

        let mut wrong = distractors.into_iter();
        let slots = (0..k)
            .map(|position| {
                if position == correct_pos {
                    Slot {
                        content: answer.to_string(),
                        is_correct: true,
                        position,
                    }
                } else {
                    Slot {
                        content: wrong.next().unwrap_or_default(),
                        is_correct: false,
                        position,
                    }
                }
            })
            .collect();

        Round {
            id: self.next_round_id(),
            slots,
            judged: false,
        }
    }

    /// Build a round for the sequence's current answer with `distractors`
    /// wrong choices drawn from `pool`
    pub fn generate_for(
        &mut self,
        sequence: &ChallengeSequence,
        pool: &BTreeSet<String>,
        distractors: usize,
    ) -> Result<Round> {
        let answer = sequence.current()?;
        let wrong = self.picker.pick(pool, &[answer], distractors)?;
        Ok(self.generate(answer, wrong))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generate_places_one_correct_slot() {
        let mut generator = RoundGenerator::new(3);
        let round = generator.generate("O2RA", strings(&["O2RX", "O2LC"]));
        assert_eq!(round.slots().len(), 3);
        assert_eq!(round.slots().iter().filter(|s| s.is_correct).count(), 1);
        assert_eq!(round.target(), "O2RA");
        for (i, slot) in round.slots().iter().enumerate() {
            assert_eq!(slot.position, i);
        }
        assert!(!round.is_judged());
    }

    #[test]
    fn test_slotless_round_has_empty_target() {
        let mut round = Round {
            id: RoundId(1),
            slots: Vec::new(),
            judged: false,
        };
        assert_eq!(round.target(), "");
        assert_eq!(round.correct_position(), 0);
        assert!(round.judge(0).is_none());
        assert!(!round.is_judged());
    }

    #[test]
    fn test_round_ids_are_monotonic() {
        let mut generator = RoundGenerator::new(3);
        let a = generator.generate("A", Vec::new());
        let b = generator.generate("B", Vec::new());
        let c = generator.generate("C", Vec::new());
        assert!(a.id() < b.id());
        assert!(b.id() < c.id());
    }

    #[test]
    fn test_correct_position_varies() {
        let mut generator = RoundGenerator::new(11);
        let positions: BTreeSet<usize> = (0..64)
            .map(|_| {
                generator
                    .generate("O046", strings(&["O047", "O090"]))
                    .correct_position()
            })
            .collect();
        assert_eq!(positions.len(), 3, "every position should come up");
    }

    #[test]
    fn test_judge_flips_once() {
        let mut generator = RoundGenerator::new(5);
        let mut round = generator.generate("O089", strings(&["O090"]));
        let correct = round.correct_position();
        let judgment = round.judge(correct).unwrap();
        assert!(judgment.correct);
        assert_eq!(judgment.content, "O089");
        assert!(round.is_judged());
        assert!(!round.mark_judged());
    }

    #[test]
    fn test_judge_unknown_position() {
        let mut generator = RoundGenerator::new(5);
        let mut round = generator.generate("O089", Vec::new());
        assert!(round.judge(4).is_none());
        assert!(!round.is_judged());
    }

    #[test]
    fn test_generate_for_uses_current_answer() {
        let mut generator = RoundGenerator::new(9);
        let mut seq = ChallengeSequence::new("Blue Line North East", strings(&["O2RA", "O046"]));
        seq.advance();
        let pool: BTreeSet<String> = strings(&["O046", "O047", "O090", "O124"]).into_iter().collect();
        let round = generator.generate_for(&seq, &pool, 2).unwrap();
        assert_eq!(round.target(), "O046");
        assert!(
            round
                .slots()
                .iter()
                .filter(|s| !s.is_correct)
                .all(|s| s.content != "O046")
        );
    }

    #[test]
    fn test_generate_for_surfaces_small_pool() {
        let mut generator = RoundGenerator::new(9);
        let seq = ChallengeSequence::new("Green Line West", strings(&["M2LBX"]));
        let pool: BTreeSet<String> = strings(&["M416"]).into_iter().collect();
        assert!(matches!(
            generator.generate_for(&seq, &pool, 2),
            Err(EngineError::InsufficientDistractors { available: 1, requested: 2 })
        ));
    }

    proptest! {
        #[test]
        fn prop_exactly_one_correct_slot(
            answer in "[A-Z][0-9]{1,4}",
            distractors in proptest::collection::btree_set("[a-z][0-9]{1,4}", 0..6),
            seed in any::<u64>(),
        ) {
            let mut generator = RoundGenerator::new(seed);
            let round = generator.generate(&answer, distractors.iter().cloned().collect());
            prop_assert_eq!(round.slots().len(), distractors.len() + 1);
            let correct: Vec<&Slot> = round.slots().iter().filter(|s| s.is_correct).collect();
            prop_assert_eq!(correct.len(), 1);
            prop_assert_eq!(&correct[0].content, &answer);
            let wrong: BTreeSet<String> = round
                .slots()
                .iter()
                .filter(|s| !s.is_correct)
                .map(|s| s.content.clone())
                .collect();
            prop_assert_eq!(wrong, distractors);
        }
    }
}
