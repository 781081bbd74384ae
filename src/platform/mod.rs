//! Platform layer
//!
//! `Driver` is the frame loop shared by every front end: it feeds input to
//! the current game, collects events, and asks the router where to go once
//! the session ends. The browser binding in `web` wraps it in an
//! animation-frame loop; the native binary runs it headless.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::catalog::{LineData, SignalCatalog};
use crate::error::Result;
use crate::games::{Game, GameEvent, GameKind, Snapshot, TickInput};
use crate::progress::ProgressStore;
use crate::router::{Route, Router};
use crate::settings::Settings;

/// Runs games one frame at a time and follows routes between them
#[derive(Debug)]
pub struct Driver<S> {
    settings: Settings,
    game: Game,
    router: Router<S>,
    input: TickInput,
    events: Vec<GameEvent>,
    route: Option<Route>,
    seed: u64,
    frame: u64,
}

impl<S: ProgressStore> Driver<S> {
    /// Start `kind` on `line`; the game waits in `Loading` until `provide`
    pub fn new(kind: GameKind, line: &str, settings: Settings, router: Router<S>, seed: u64) -> Self {
        log::info!("starting {} on '{}' (seed {})", kind.name(), line, seed);
        Self {
            game: Game::loading(kind, line, &settings, seed),
            settings,
            router,
            input: TickInput::default(),
            events: Vec::new(),
            route: None,
            seed,
            frame: 0,
        }
    }

    /// Hand line data to the current game
    pub fn provide(&mut self, data: LineData) -> Result<()> {
        let events = self.game.provide(data)?;
        self.events.extend(events);
        Ok(())
    }

    /// Input for the next frame
    pub fn set_input(&mut self, input: TickInput) {
        self.input = input;
    }

    /// Advance one frame; returns the route once the session has ended
    pub fn step(&mut self) -> Option<&Route> {
        if self.route.is_none() {
            let events = self.game.tick(&self.input);
            self.events.extend(events);
            self.frame += 1;

            // Clear one-shot inputs after processing
            self.input.flap = false;
            self.input.steer = None;
            self.input.key = None;
            self.input.click = None;
            self.input.restart = false;

            if let Some(result) = self.game.result() {
                log::info!(
                    "{} on '{}' ended after {} frames: {:?} (score {})",
                    self.game.kind().name(),
                    result.line,
                    self.frame,
                    result.outcome,
                    result.score
                );
                self.route = Some(self.router.finish(self.game.kind(), &result));
            }
        }
        self.route.as_ref()
    }

    /// Start the game the route points at, loading its line from `catalog`
    ///
    /// Returns false when the route leads back to the menu.
    pub fn follow(&mut self, catalog: &dyn SignalCatalog) -> Result<bool> {
        let Some(Route::Play { game, line }) = self.route.clone() else {
            return Ok(false);
        };
        let data = LineData::load(catalog, &line)?;
        self.start(game, &line);
        self.provide(data)?;
        Ok(true)
    }

    /// Replace the current game with a fresh one in `Loading`
    pub fn start(&mut self, kind: GameKind, line: &str) {
        self.seed = self.seed.wrapping_add(1);
        log::info!("starting {} on '{}' (seed {})", kind.name(), line, self.seed);
        self.game = Game::loading(kind, line, &self.settings, self.seed);
        self.route = None;
        self.frame = 0;
        self.input.restart = false;
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.game.snapshot()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn router(&self) -> &Router<S> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router<S> {
        &mut self.router
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings for games started from now on; the running game keeps its own
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }
}
