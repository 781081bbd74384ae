//! Engine settings
//!
//! Persisted as JSON in LocalStorage on the web; native builds read the same
//! JSON from wherever the caller keeps it.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;
use crate::games::GameKind;
use crate::sim::SessionConfig;

/// Which builtin signal tables to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SignalSet {
    /// Every signal on the line
    #[default]
    Full,
    /// First few signals per line, for quick runs
    Test,
}

impl SignalSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSet::Full => "Full",
            SignalSet::Test => "Test",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" | "production" => Some(SignalSet::Full),
            "test" | "testing" => Some(SignalSet::Test),
            _ => None,
        }
    }
}

/// Bounds for remote catalog and progress requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Per-request timeout
    pub timeout_ms: u32,
    /// Extra attempts after the first failure
    pub retries: u32,
    /// Pause between attempts
    pub retry_delay_ms: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retries: 2,
            retry_delay_ms: 1_000,
        }
    }
}

/// HoppyTrain tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoppyTuning {
    pub gravity: f32,
    pub flap_velocity: f32,
    pub box_speed: f32,
    pub max_health: u32,
}

impl Default for HoppyTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            flap_velocity: FLAP_VELOCITY,
            box_speed: BOX_SPEED,
            max_health: MAX_HEALTH,
        }
    }
}

/// SignalSlayer tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlayerTuning {
    pub row_speed: f32,
    pub max_health: u32,
}

impl Default for SlayerTuning {
    fn default() -> Self {
        Self {
            row_speed: ROW_SPEED,
            max_health: MAX_HEALTH,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub signal_set: SignalSet,

    // === Backend ===
    /// Signals/progress API; empty means play offline on builtin data
    pub api_base_url: String,
    pub fetch: FetchPolicy,

    // === Games ===
    pub hoppy: HoppyTuning,
    pub slayer: SlayerTuning,
    pub recall_max_health: u32,
    pub schema_max_health: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signal_set: SignalSet::Full,
            api_base_url: String::new(),
            fetch: FetchPolicy::default(),
            hoppy: HoppyTuning::default(),
            slayer: SlayerTuning::default(),
            recall_max_health: MAX_HEALTH,
            schema_max_health: MAX_HEALTH,
        }
    }
}

impl Settings {
    /// Create settings for a signal set
    pub fn from_signal_set(signal_set: SignalSet) -> Self {
        Self {
            signal_set,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// True when a signals backend is configured
    pub fn online(&self) -> bool {
        !self.api_base_url.trim().is_empty()
    }

    /// Session tuning for one game
    pub fn session_config(&self, kind: GameKind, seed: u64) -> SessionConfig {
        let max_health = match kind {
            GameKind::HoppyTrain => self.hoppy.max_health,
            GameKind::SignalSlayer => self.slayer.max_health,
            GameKind::RememberBee => self.recall_max_health,
            GameKind::SchemaPro => self.schema_max_health,
        };
        SessionConfig {
            policy: kind.miss_policy(),
            max_health: max_health.max(1),
            distractors: kind.distractors(),
            seed,
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "trolley_games_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring stored settings: {}", err),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<()> {
        let failed = |reason: String| crate::error::EngineError::Storage {
            key: Self::STORAGE_KEY.to_string(),
            reason,
        };
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| failed("LocalStorage unavailable".into()))?;
        storage
            .set_item(Self::STORAGE_KEY, &self.to_json()?)
            .map_err(|err| failed(format!("{:?}", err)))?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MissPolicy;

    #[test]
    fn test_signal_set_names() {
        assert_eq!(SignalSet::from_str("TEST"), Some(SignalSet::Test));
        assert_eq!(SignalSet::from_str("production"), Some(SignalSet::Full));
        assert_eq!(SignalSet::from_str("other"), None);
        assert_eq!(SignalSet::Test.as_str(), "Test");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"signal_set":"Test","fetch":{"retries":5}}"#).unwrap();
        assert_eq!(settings.signal_set, SignalSet::Test);
        assert_eq!(settings.fetch.retries, 5);
        assert_eq!(settings.fetch.timeout_ms, 10_000);
        assert_eq!(settings.hoppy, HoppyTuning::default());
        assert!(!settings.online());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::from_signal_set(SignalSet::Test);
        settings.api_base_url = "http://localhost:3001".into();
        let parsed = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(parsed, settings);
        assert!(parsed.online());
    }

    #[test]
    fn test_session_config_per_game() {
        let mut settings = Settings::default();
        settings.slayer.max_health = 0;
        let hoppy = settings.session_config(GameKind::HoppyTrain, 7);
        assert_eq!(hoppy.policy, MissPolicy::ContinueOnMiss);
        assert_eq!(hoppy.distractors, 2);
        assert_eq!(hoppy.seed, 7);
        let slayer = settings.session_config(GameKind::SignalSlayer, 7);
        assert_eq!(slayer.policy, MissPolicy::EndOnMiss);
        assert_eq!(slayer.max_health, 1, "at least one heart");
        let bee = settings.session_config(GameKind::RememberBee, 7);
        assert_eq!(bee.policy, MissPolicy::RestartOnMiss);
        assert_eq!(bee.distractors, 0);
    }
}
