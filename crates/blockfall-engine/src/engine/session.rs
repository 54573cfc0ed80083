use std::rc::Rc;

use crate::{ConfigError, RectBoard, ShapeCatalog};

use super::{
    config::GameConfig,
    controller::Controller,
    game_match::{Match, MatchEvent},
    input::{InputRepeater, Intent},
    manifest::{Manifest, SessionServices},
    rules::RuleSet,
};

/// Host-facing facade over a [`Match`].
///
/// Owns the configuration, the key repeater and the match. Key presses and
/// releases go through the [`InputRepeater`]; [`tick`](Self::tick) first
/// delivers every due repeat and only then runs gravity, so intents always
/// resolve against the pre-gravity board.
///
/// # Example
///
/// ```
/// use blockfall_engine::{GameConfig, GameSession, Intent, Manifest, PieceSeed};
///
/// let config = GameConfig {
///     seed: Some(PieceSeed::from(1)),
///     ..GameConfig::default()
/// };
/// let mut session = GameSession::new(config, &Manifest::default()).unwrap();
///
/// session.press(Intent::HardDrop, 0);
/// session.tick(16);
///
/// assert_eq!(session.game().progression().locked_pieces(), 1);
/// ```
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    catalog: Rc<dyn ShapeCatalog>,
    rules: Rc<dyn RuleSet>,
    repeater: InputRepeater,
    game: Match,
}

impl GameSession {
    /// Builds a session from the implementations named by `manifest`.
    pub fn new(config: GameConfig, manifest: &Manifest) -> Result<Self, ConfigError> {
        let services = manifest.build(&config)?;
        Self::from_services(config, services)
    }

    /// Builds a session around already constructed collaborators.
    pub fn from_services(
        config: GameConfig,
        services: SessionServices,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let SessionServices {
            catalog,
            rules,
            generator,
        } = services;
        let board = RectBoard::new(config.board.cols, config.board.rows)?;
        let controller = Controller::new(Rc::clone(&catalog), Rc::clone(&rules));
        let game = Match::new(Box::new(board), controller, generator, &config)?;
        Ok(Self {
            repeater: InputRepeater::new(config.input),
            config,
            catalog,
            rules,
            game,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn game(&self) -> &Match {
        &self.game
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = MatchEvent> + '_ {
        self.game.drain_events()
    }

    /// Handles a key press at `now_ms`.
    ///
    /// Pausing bypasses the repeater. Other intents are dropped unless the
    /// match is active.
    pub fn press(&mut self, intent: Intent, now_ms: u64) {
        if intent == Intent::TogglePause {
            self.toggle_pause();
            return;
        }
        if !self.game.phase().is_active() {
            return;
        }
        if !intent.is_repeatable() {
            self.game.apply(intent);
            return;
        }
        if let Some(fired) = self.repeater.hold(intent, true, now_ms) {
            self.game.apply(fired);
        }
    }

    /// Handles a key release at `now_ms`.
    pub fn release(&mut self, intent: Intent, now_ms: u64) {
        if intent.is_repeatable() {
            self.repeater.hold(intent, false, now_ms);
        }
    }

    /// Runs one frame: due key repeats, then gravity.
    pub fn tick(&mut self, now_ms: u64) {
        for intent in self.repeater.due(now_ms) {
            self.game.apply(intent);
        }
        self.game.update(now_ms);
    }

    /// Pauses or resumes the match and releases every held key.
    pub fn toggle_pause(&mut self) {
        self.game.toggle_pause();
        self.repeater.clear();
    }

    /// Starts a new game on a fresh board.
    ///
    /// The rule set, shape catalog and piece generator carry over.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        let board = RectBoard::new(self.config.board.cols, self.config.board.rows)?;
        let controller = Controller::new(Rc::clone(&self.catalog), Rc::clone(&self.rules));
        self.game.reset(Box::new(board), controller, &self.config)?;
        self.repeater.clear();
        Ok(())
    }
}
