//! Game policy and orchestration on top of the [`core`](crate::core) types.
//!
//! - [`RuleSet`] - gravity curve, scoring and rotation kicks ([`DefaultRuleSet`])
//! - [`PieceGenerator`] - upcoming piece kinds ([`SevenBag`], [`UniformGenerator`])
//! - [`Controller`] - stateless move/rotate/drop attempts against a board
//! - [`ProgressionTracker`] - score, level, lines and lock statistics
//! - [`InputRepeater`] - DAS/ARR scheduling of held keys
//! - [`Match`] - the state machine tying everything together
//! - [`GameSession`] - host facade: input routing, pause and reset
//! - [`GameConfig`] and [`Manifest`] - immutable settings and the static
//!   registry of pluggable implementations
//!
//! # Game Flow
//!
//! 1. Resolve a [`Manifest`] into rule set, shape catalog and generator
//! 2. The match spawns a piece from its preview queue at the top center
//! 3. The host delivers intents, then calls `update` with the current time
//! 4. A piece locks on hard drop or when a downward step is blocked; full
//!    lines are cleared and scored
//! 5. Repeat until a spawn is blocked (top-out)
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{GameConfig, GameSession, Intent, Manifest, MatchEvent};
//!
//! let mut session = GameSession::new(GameConfig::default(), &Manifest::default()).unwrap();
//!
//! let mut now = 0;
//! while !session.game().is_game_over() {
//!     session.press(Intent::HardDrop, now);
//!     session.tick(now);
//!     now += 16;
//! }
//!
//! assert!(session.drain_events().any(|event| event == MatchEvent::ToppedOut));
//! ```

pub use self::{
    config::*, controller::*, game_match::*, generator::*, input::*, manifest::*,
    progression::*, rules::*, session::*,
};

mod config;
mod controller;
mod game_match;
mod generator;
mod input;
mod manifest;
mod progression;
mod rules;
mod session;
