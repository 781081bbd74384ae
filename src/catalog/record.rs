//! Catalog built from signal rows exported by the backend
//!
//! Accepts the `{"signals": [...]}` payload of `GET /api/signals`. SQLite
//! hands booleans back as 0/1 and pages as text or numbers, so both shapes
//! are accepted.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use super::{Hitbox, Hotspot, SignalCatalog};
use crate::consts::SCHEMA_HITBOX_SIZE;
use crate::error::{EngineError, Result};

/// One row of the signals table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub prefix: Option<String>,
    pub number: String,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub correct: bool,
    pub line: String,
    #[serde(default, deserialize_with = "flexible_text")]
    pub page: Option<String>,
    #[serde(default)]
    pub hitbox_x: Option<f32>,
    #[serde(default)]
    pub hitbox_y: Option<f32>,
    #[serde(default)]
    pub hitbox_width: Option<f32>,
    #[serde(default)]
    pub hitbox_height: Option<f32>,
}

impl SignalRecord {
    /// Full signal code: prefix + number + suffix
    pub fn code(&self) -> String {
        format!(
            "{}{}{}",
            self.prefix.as_deref().unwrap_or_default(),
            self.number,
            self.suffix.as_deref().unwrap_or_default()
        )
    }

    /// Schematic location, if the row has a numeric page and a position
    ///
    /// `hitbox_x`/`hitbox_y` is the top-left corner; a missing or zero side
    /// falls back to `SCHEMA_HITBOX_SIZE`.
    pub fn hotspot(&self) -> Option<Hotspot> {
        let page = self.page.as_deref()?.trim().parse::<u32>().ok()?;
        let side = |value: Option<f32>| {
            value
                .filter(|v| *v > 0.0)
                .unwrap_or(SCHEMA_HITBOX_SIZE)
        };
        let hitbox = Hitbox::rect(
            self.hitbox_x?,
            self.hitbox_y?,
            side(self.hitbox_width),
            side(self.hitbox_height),
        );
        Some(Hotspot {
            code: self.code(),
            page,
            hitbox,
        })
    }
}

fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flex {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flex::deserialize(deserializer)? {
        Flex::Bool(b) => b,
        Flex::Int(i) => i != 0,
    })
}

fn flexible_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flex {
        Text(String),
        Int(i64),
    }
    Ok(Option::<Flex>::deserialize(deserializer)?.map(|flex| match flex {
        Flex::Text(s) => s,
        Flex::Int(i) => i.to_string(),
    }))
}

#[derive(Deserialize)]
struct SignalsPayload {
    #[serde(default)]
    signals: Vec<SignalRecord>,
}

/// Catalog over backend rows; row id order is solve order
#[derive(Debug, Clone, Default)]
pub struct RecordCatalog {
    records: Vec<SignalRecord>,
}

impl RecordCatalog {
    pub fn new(mut records: Vec<SignalRecord>) -> Self {
        records.sort_by_key(|r| r.id);
        Self { records }
    }

    /// Parse a `{"signals": [...]}` payload
    pub fn from_json(json: &str) -> Result<Self> {
        let payload: SignalsPayload = serde_json::from_str(json)?;
        log::info!("loaded {} signal records", payload.signals.len());
        Ok(Self::new(payload.signals))
    }

    pub fn records(&self) -> &[SignalRecord] {
        &self.records
    }

    fn for_line(&self, line: &str) -> Result<impl Iterator<Item = &SignalRecord>> {
        if !self.records.iter().any(|r| r.line == line) {
            return Err(EngineError::UnknownLine(line.to_string()));
        }
        Ok(self.records.iter().filter(move |r| r.line == line))
    }
}

impl SignalCatalog for RecordCatalog {
    fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for record in &self.records {
            if !lines.contains(&record.line) {
                lines.push(record.line.clone());
            }
        }
        lines
    }

    fn answer_sequence(&self, line: &str) -> Result<Vec<String>> {
        Ok(self
            .for_line(line)?
            .filter(|r| r.correct)
            .map(SignalRecord::code)
            .collect())
    }

    fn distractor_pool(&self, line: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .for_line(line)?
            .filter(|r| !r.correct)
            .map(SignalRecord::code)
            .collect())
    }

    fn hotspots(&self, line: &str) -> Result<Vec<Hotspot>> {
        let mut hotspots: Vec<Hotspot> = self
            .for_line(line)?
            .filter(|r| r.correct)
            .filter_map(SignalRecord::hotspot)
            .collect();
        hotspots.sort_by_key(|h| h.page);
        Ok(hotspots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const PAYLOAD: &str = r#"{
        "signals": [
            {"id": 3, "prefix": "O", "number": "046", "suffix": null, "correct": 1,
             "line": "Blue Line North East", "page": "2",
             "hitbox_x": 124, "hitbox_y": 268, "hitbox_width": 20, "hitbox_height": 12},
            {"id": 1, "prefix": "O", "number": "2", "suffix": "RA", "correct": true,
             "line": "Blue Line North East", "page": 1, "hitbox_x": 91, "hitbox_y": 310},
            {"id": 2, "prefix": "O", "number": "2", "suffix": "RX", "correct": 0,
             "line": "Blue Line North East", "page": null},
            {"id": 4, "prefix": "O", "number": "047", "correct": false,
             "line": "Blue Line North East"},
            {"id": 5, "number": "154", "correct": 1, "line": "Blue Line South East", "page": "test"}
        ]
    }"#;

    #[test]
    fn test_parse_payload() {
        let catalog = RecordCatalog::from_json(PAYLOAD).unwrap();
        assert_eq!(catalog.records().len(), 5);
        assert_eq!(catalog.records()[0].id, 1);
        assert_eq!(
            catalog.lines(),
            vec!["Blue Line North East", "Blue Line South East"]
        );
    }

    #[test]
    fn test_views() {
        let catalog = RecordCatalog::from_json(PAYLOAD).unwrap();
        assert_eq!(
            catalog.answer_sequence("Blue Line North East").unwrap(),
            vec!["O2RA", "O046"]
        );
        let pool = catalog.distractor_pool("Blue Line North East").unwrap();
        assert_eq!(pool, BTreeSet::from(["O2RX".to_string(), "O047".to_string()]));
        assert_eq!(
            catalog.keypad_sequence("Blue Line North East").unwrap(),
            vec!["2", "046"]
        );
        assert_eq!(
            catalog.answer_sequence("Blue Line South East").unwrap(),
            vec!["154"]
        );
    }

    #[test]
    fn test_hotspots() {
        let catalog = RecordCatalog::from_json(PAYLOAD).unwrap();
        let hotspots = catalog.hotspots("Blue Line North East").unwrap();
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].code, "O2RA");
        assert_eq!(hotspots[0].hitbox, Hitbox::rect(91.0, 310.0, 20.0, 20.0));
        assert_eq!(hotspots[1].page, 2);
        assert_eq!(hotspots[1].hitbox, Hitbox::rect(124.0, 268.0, 20.0, 12.0));
        // "test" is not a schematic page
        assert!(catalog.hotspots("Blue Line South East").unwrap().is_empty());
    }

    #[test]
    fn test_backend_hitbox_is_top_left_rect() {
        let row = |width: Option<f32>, height: Option<f32>| SignalRecord {
            id: 1,
            prefix: None,
            number: "7".into(),
            suffix: None,
            correct: true,
            line: "L".into(),
            page: Some("1".into()),
            hitbox_x: Some(100.0),
            hitbox_y: Some(100.0),
            hitbox_width: width,
            hitbox_height: height,
        };

        let bare = row(None, None).hotspot().unwrap().hitbox;
        assert!(bare.contains(Vec2::new(115.0, 115.0)));
        assert!(bare.contains(Vec2::new(120.0, 120.0)));
        assert!(!bare.contains(Vec2::new(85.0, 100.0)));
        assert_eq!(bare.center(), Vec2::new(110.0, 110.0));

        let wide = row(Some(60.0), None).hotspot().unwrap().hitbox;
        assert!(wide.contains(Vec2::new(150.0, 105.0)));
        assert!(!wide.contains(Vec2::new(150.0, 125.0)));

        let zero = row(Some(0.0), Some(0.0)).hotspot().unwrap().hitbox;
        assert_eq!(zero, Hitbox::rect(100.0, 100.0, 20.0, 20.0));
    }

    #[test]
    fn test_unknown_line() {
        let catalog = RecordCatalog::from_json(PAYLOAD).unwrap();
        assert!(matches!(
            catalog.distractor_pool("Green Line East"),
            Err(EngineError::UnknownLine(_))
        ));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            RecordCatalog::from_json("{\"signals\": 5}"),
            Err(EngineError::Json(_))
        ));
    }
}
