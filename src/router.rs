//! Where to go after a session ends
//!
//! Victory unlocks the next game on the line and moves on to it; a loss
//! retries the same game; an aborted session returns to the menu.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::games::GameKind;
use crate::progress::{ProgressReporter, ProgressStore, is_unlocked};
use crate::sim::{SessionOutcome, SessionResult};

/// Screen to show next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Menu,
    Play { game: GameKind, line: String },
}

/// Level routing for one signed-in user
#[derive(Debug)]
pub struct Router<S> {
    user: String,
    reporter: ProgressReporter<S>,
    /// line -> highest level seen this session
    known: BTreeMap<String, u32>,
}

impl<S: ProgressStore> Router<S> {
    pub fn new(user: impl Into<String>, store: S) -> Self {
        Self {
            user: user.into(),
            reporter: ProgressReporter::new(store),
            known: BTreeMap::new(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Unlocked level on a line
    pub fn level(&self, line: &str) -> u32 {
        let stored = self.reporter.level(&self.user, line);
        stored.max(self.known.get(line).copied().unwrap_or(0))
    }

    /// Re-read a line's level from the store
    pub fn refresh(&mut self, line: &str) -> u32 {
        let level = self.level(line);
        self.known.insert(line.to_string(), level);
        level
    }

    /// Take a level learned elsewhere (e.g. the backend); never lowers it
    pub fn note_level(&mut self, line: &str, level: u32) -> u32 {
        let level = level.max(self.level(line));
        self.known.insert(line.to_string(), level);
        level
    }

    pub fn is_unlocked(&self, game: GameKind, line: &str) -> bool {
        is_unlocked(self.level(line), game.index())
    }

    /// Games on a line with their lock state, for the menu
    pub fn menu(&self, line: &str) -> Vec<(GameKind, bool)> {
        let level = self.level(line);
        GameKind::ALL
            .into_iter()
            .map(|game| (game, is_unlocked(level, game.index())))
            .collect()
    }

    /// Route for a menu pick; locked games stay on the menu
    pub fn select(&self, game: GameKind, line: &str) -> Route {
        if self.is_unlocked(game, line) {
            Route::Play {
                game,
                line: line.to_string(),
            }
        } else {
            log::info!("{} is locked on '{}'", game.name(), line);
            Route::Menu
        }
    }

    /// Record the session and pick the next screen
    pub fn finish(&mut self, game: GameKind, result: &SessionResult) -> Route {
        let line = result.line.clone();
        match &result.outcome {
            SessionOutcome::Victory => {
                let unlocked = game.index() as u32 + 1;
                if unlocked > self.level(&line) {
                    self.known.insert(line.clone(), unlocked);
                    self.reporter.report(&self.user, &line, unlocked);
                }
                match GameKind::from_index(game.index() + 1) {
                    Some(next) => Route::Play { game: next, line },
                    None => {
                        log::info!("'{}' cleared every game on '{}'", self.user, line);
                        Route::Menu
                    }
                }
            }
            SessionOutcome::GameOver => Route::Play { game, line },
            SessionOutcome::Aborted { reason } => {
                log::warn!("{} on '{}' aborted: {}", game.name(), line, reason);
                Route::Menu
            }
        }
    }

    /// Retry progress writes that failed earlier
    pub fn flush(&mut self) -> usize {
        self.reporter.retry_pending()
    }

    pub fn reporter(&self) -> &ProgressReporter<S> {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut ProgressReporter<S> {
        &mut self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::LocalProgress;

    const LINE: &str = "Green Line East";

    fn result(outcome: SessionOutcome) -> SessionResult {
        SessionResult {
            line: LINE.into(),
            outcome,
            score: 3,
            health: 2,
            judged: 4,
        }
    }

    #[test]
    fn test_fresh_user_has_first_game_only() {
        let router = Router::new("ana", LocalProgress::new());
        let menu = router.menu(LINE);
        assert_eq!(menu[0], (GameKind::HoppyTrain, true));
        assert!(menu[1..].iter().all(|(_, open)| !open));
        assert_eq!(router.select(GameKind::SchemaPro, LINE), Route::Menu);
    }

    #[test]
    fn test_victory_unlocks_and_moves_on() {
        let mut router = Router::new("ana", LocalProgress::new());
        let route = router.finish(GameKind::HoppyTrain, &result(SessionOutcome::Victory));
        assert_eq!(
            route,
            Route::Play {
                game: GameKind::RememberBee,
                line: LINE.into()
            }
        );
        assert_eq!(router.level(LINE), 1);
        assert_eq!(router.reporter().store().level("ana", LINE).unwrap(), 1);
        assert!(router.is_unlocked(GameKind::RememberBee, LINE));
    }

    #[test]
    fn test_replaying_early_game_keeps_higher_level() {
        let mut progress = LocalProgress::new();
        progress.set_level("ana", LINE, 3).unwrap();
        let mut router = Router::new("ana", progress);
        router.finish(GameKind::HoppyTrain, &result(SessionOutcome::Victory));
        assert_eq!(router.level(LINE), 3);
    }

    #[test]
    fn test_last_game_returns_to_menu() {
        let mut progress = LocalProgress::new();
        progress.set_level("ana", LINE, 3).unwrap();
        let mut router = Router::new("ana", progress);
        let route = router.finish(GameKind::SignalSlayer, &result(SessionOutcome::Victory));
        assert_eq!(route, Route::Menu);
        assert_eq!(router.level(LINE), 4);
        assert!(router.menu(LINE).iter().all(|(_, open)| *open));
    }

    #[test]
    fn test_loss_retries_same_game() {
        let mut router = Router::new("ana", LocalProgress::new());
        let route = router.finish(GameKind::HoppyTrain, &result(SessionOutcome::GameOver));
        assert_eq!(
            route,
            Route::Play {
                game: GameKind::HoppyTrain,
                line: LINE.into()
            }
        );
        assert_eq!(router.level(LINE), 0);
    }

    #[test]
    fn test_abort_goes_to_menu() {
        let mut router = Router::new("ana", LocalProgress::new());
        let route = router.finish(
            GameKind::SignalSlayer,
            &result(SessionOutcome::Aborted {
                reason: "pool too small".into(),
            }),
        );
        assert_eq!(route, Route::Menu);
    }

    #[test]
    fn test_refresh_reads_store() {
        let mut router = Router::new("bo", LocalProgress::new());
        router
            .reporter_mut()
            .store_mut()
            .set_level("bo", LINE, 2)
            .unwrap();
        assert_eq!(router.refresh(LINE), 2);
        assert!(router.is_unlocked(GameKind::SchemaPro, LINE));
    }

    #[test]
    fn test_noted_level_only_raises() {
        let mut router = Router::new("bo", LocalProgress::new());
        assert_eq!(router.note_level(LINE, 2), 2);
        assert!(router.is_unlocked(GameKind::SchemaPro, LINE));
        assert_eq!(router.note_level(LINE, 1), 2);
        assert_eq!(router.level(LINE), 2);
        assert_eq!(router.level("Other Line"), 0);
    }
}
