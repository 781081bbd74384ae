//! Signal data for each line
//!
//! The engine only consumes derived views (`LineData`): the ordered answer
//! sequence and the unordered distractor pool. Where those come from is the
//! `SignalCatalog`'s business:
//! - `StaticCatalog`: builtin fallback data, always available
//! - `RecordCatalog`: rows exported by the signals backend

pub mod builtin;
pub mod record;

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SCHEMA_CLICK_RADIUS;
use crate::error::{EngineError, Result};
use crate::settings::FetchPolicy;

pub use builtin::StaticCatalog;
pub use record::{RecordCatalog, SignalRecord};

/// Source of per-line signal data
pub trait SignalCatalog {
    /// Lines this catalog knows about, in display order
    fn lines(&self) -> Vec<String>;

    /// Correct signals in required solve order
    fn answer_sequence(&self, line: &str) -> Result<Vec<String>>;

    /// Valid wrong answers for a line
    fn distractor_pool(&self, line: &str) -> Result<BTreeSet<String>>;

    /// Answers in the form a numeric keypad can enter
    fn keypad_sequence(&self, line: &str) -> Result<Vec<String>> {
        Ok(keypad_form(&self.answer_sequence(line)?))
    }

    /// Clickable signal locations on schematic pages
    fn hotspots(&self, _line: &str) -> Result<Vec<Hotspot>> {
        Ok(Vec::new())
    }
}

/// Digits of each answer, skipping answers without digits and repeats
///
/// `O2RA, O2LB, O046` becomes `2, 046`.
pub fn keypad_form(answers: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for answer in answers {
        let digits: String = answer.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() || out.last() == Some(&digits) {
            continue;
        }
        out.push(digits);
    }
    out
}

/// Where a signal sits on a schematic page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Hitbox {
    /// Top-left corner and size
    Rect { origin: Vec2, size: Vec2 },
    /// Matched within `SCHEMA_CLICK_RADIUS` of the point
    Point { center: Vec2 },
}

impl Hitbox {
    pub fn point(x: f32, y: f32) -> Self {
        Hitbox::Point {
            center: Vec2::new(x, y),
        }
    }

    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Hitbox::Rect {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Point a player should aim at
    pub fn center(&self) -> Vec2 {
        match *self {
            Hitbox::Rect { origin, size } => origin + size / 2.0,
            Hitbox::Point { center } => center,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            Hitbox::Rect { origin, size } => {
                point.cmpge(origin).all() && point.cmple(origin + size).all()
            }
            Hitbox::Point { center } => point.distance(center) < SCHEMA_CLICK_RADIUS,
        }
    }
}

/// A clickable signal on a schematic page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub code: String,
    /// 1-based page number
    pub page: u32,
    pub hitbox: Hitbox,
}

/// Everything a session needs to know about one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub line: String,
    pub answers: Vec<String>,
    pub pool: BTreeSet<String>,
    #[serde(default)]
    pub keypad: Vec<String>,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

impl LineData {
    /// Read every view of `line` from a catalog
    pub fn load(catalog: &dyn SignalCatalog, line: &str) -> Result<Self> {
        Ok(Self {
            line: line.to_string(),
            answers: catalog.answer_sequence(line)?,
            pool: catalog.distractor_pool(line)?,
            keypad: catalog.keypad_sequence(line)?,
            hotspots: catalog.hotspots(line)?,
        })
    }

    /// Same line with the keypad answers as the sequence
    pub fn keypad_view(&self) -> LineData {
        LineData {
            answers: self.keypad.clone(),
            ..self.clone()
        }
    }

    /// Same line with hotspots (ordered by page) as the sequence
    pub fn schema_view(&self) -> LineData {
        let mut hotspots = self.hotspots.clone();
        hotspots.sort_by_key(|h| h.page);
        LineData {
            answers: hotspots.iter().map(|h| h.code.clone()).collect(),
            hotspots,
            ..self.clone()
        }
    }
}

/// Catalog data plus whether it came from the fallback
#[derive(Debug, Clone)]
pub struct Loaded {
    pub data: LineData,
    /// True when the primary catalog failed and builtin data is in use
    pub degraded: bool,
}

/// Load a line from `primary`, retrying per `policy`, then from `fallback`
pub fn load_with_fallback(
    primary: &dyn SignalCatalog,
    fallback: &dyn SignalCatalog,
    line: &str,
    policy: &FetchPolicy,
) -> Result<Loaded> {
    let attempts = policy.retries + 1;
    let mut last_error = None;
    for attempt in 1..=attempts {
        match LineData::load(primary, line) {
            Ok(data) => {
                return Ok(Loaded {
                    data,
                    degraded: false,
                });
            }
            Err(err) => {
                log::warn!(
                    "catalog fetch for '{}' failed (attempt {}/{}): {}",
                    line,
                    attempt,
                    attempts,
                    err
                );
                let retryable = !matches!(err, EngineError::UnknownLine(_));
                last_error = Some(err);
                if !retryable {
                    break;
                }
            }
        }
    }

    let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
    match LineData::load(fallback, line) {
        Ok(data) => {
            log::warn!("using builtin signals for '{}' (degraded)", line);
            Ok(Loaded {
                data,
                degraded: true,
            })
        }
        Err(fallback_err) => Err(EngineError::CatalogUnavailable {
            line: line.to_string(),
            reason: format!("{reason}; fallback: {fallback_err}"),
        }),
    }
}
