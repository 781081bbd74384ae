//! Ordered answers for one line and the player's position in them

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// The signals a player must identify, in solve order
///
/// The cursor only moves forward. A session that needs to start over builds
/// a fresh sequence instead of rewinding this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSequence {
    line: String,
    answers: Vec<String>,
    cursor: usize,
}

impl ChallengeSequence {
    pub fn new(line: impl Into<String>, answers: Vec<String>) -> Self {
        Self {
            line: line.into(),
            answers,
            cursor: 0,
        }
    }

    /// The answer the player has to find next
    pub fn current(&self) -> Result<&str> {
        self.answers
            .get(self.cursor)
            .map(String::as_str)
            .ok_or_else(|| EngineError::SequenceExhausted {
                line: self.line.clone(),
            })
    }

    /// Move to the next answer
    pub fn advance(&mut self) {
        debug_assert!(!self.is_complete(), "advance past the end of '{}'", self.line);
        self.cursor = (self.cursor + 1).min(self.answers.len());
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.answers.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answers still to be found, including the current one
    pub fn remaining(&self) -> usize {
        self.answers.len() - self.cursor
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }
}
