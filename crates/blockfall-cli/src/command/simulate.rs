use std::path::PathBuf;

use blockfall_engine::{GameSession, Intent, Manifest, Match, MatchEvent, PieceSeed};
use rand::{Rng as _, SeedableRng as _, seq::IndexedRandom as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::util::Output;

use super::SetupArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    #[clap(flatten)]
    setup: SetupArg,
    /// Number of games to play; the session is reset after each top-out
    #[arg(long, default_value_t = 1)]
    games: usize,
    /// Maximum number of frames per game
    #[arg(long, default_value_t = 36_000)]
    frames: u64,
    /// Duration of one frame in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Piece generator seed as 32 hex digits (overrides the configuration)
    #[arg(long)]
    seed: Option<PieceSeed>,
    /// Seed of the random input driver
    #[arg(long, default_value_t = 0)]
    driver_seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    manifest: Manifest,
    seed: Option<PieceSeed>,
    frame_ms: u64,
    games: Vec<GameSummary>,
}

#[derive(Debug, Serialize)]
struct GameSummary {
    frames: u64,
    elapsed_ms: u64,
    score: u64,
    level: u32,
    lines: u32,
    locked_pieces: u64,
    line_clears: [u64; 5],
    level_ups: u32,
    game_over: bool,
}

impl GameSummary {
    fn new(game: &Match, frames: u64, elapsed_ms: u64, level_ups: u32) -> Self {
        let progression = game.progression();
        Self {
            frames,
            elapsed_ms,
            score: progression.score(),
            level: progression.level(),
            lines: progression.lines(),
            locked_pieces: progression.locked_pieces(),
            line_clears: *progression.line_clear_counter(),
            level_ups,
            game_over: game.is_game_over(),
        }
    }
}

/// Random key presser that holds repeatable keys for a while before
/// releasing them.
#[derive(Debug)]
struct InputDriver {
    rng: Pcg32,
    held: Vec<(Intent, u64)>,
}

impl InputDriver {
    const PRESS_PROBABILITY: f64 = 0.15;
    const MAX_HOLD_MS: u64 = 400;
    const INTENTS: [Intent; 6] = [
        Intent::MoveLeft,
        Intent::MoveRight,
        Intent::SoftDrop,
        Intent::RotateCw,
        Intent::RotateCcw,
        Intent::HardDrop,
    ];

    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            held: Vec::new(),
        }
    }

    fn drive(&mut self, session: &mut GameSession, now_ms: u64) {
        self.held.retain(|&(intent, release_ms)| {
            if release_ms > now_ms {
                return true;
            }
            session.release(intent, now_ms);
            false
        });

        if !self.rng.random_bool(Self::PRESS_PROBABILITY) {
            return;
        }
        let Some(&intent) = Self::INTENTS.choose(&mut self.rng) else {
            return;
        };
        if self.held.iter().any(|&(held, _)| held == intent) {
            return;
        }
        session.press(intent, now_ms);
        if intent.is_repeatable() {
            let hold_ms = self.rng.random_range(0..=Self::MAX_HOLD_MS);
            self.held.push((intent, now_ms + hold_ms));
        }
    }

    /// Forgets held keys after the session released them itself.
    fn forget_held(&mut self) {
        self.held.clear();
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        setup,
        games,
        frames,
        frame_ms,
        seed,
        driver_seed,
        output,
    } = arg;

    let (mut config, manifest) = setup.load()?;
    if let Some(seed) = seed {
        config.seed = Some(*seed);
    }
    let mut session = GameSession::new(config, &manifest)?;
    let mut driver = InputDriver::new(*driver_seed);

    let mut summaries = Vec::with_capacity(*games);
    let mut now_ms = 0;
    for game_index in 0..*games {
        if game_index > 0 {
            session.reset()?;
            driver.forget_held();
        }

        let start_ms = now_ms;
        let mut played_frames = 0;
        let mut level_ups = 0;
        while played_frames < *frames && !session.game().is_game_over() {
            driver.drive(&mut session, now_ms);
            session.tick(now_ms);
            for event in session.drain_events() {
                match event {
                    MatchEvent::LevelUp { level } => {
                        level_ups += 1;
                        log::info!("game {game_index}: reached level {level}");
                    }
                    MatchEvent::ToppedOut => {
                        log::info!("game {game_index}: topped out at {now_ms} ms");
                    }
                    MatchEvent::PieceLocked { .. } => {}
                }
            }
            played_frames += 1;
            now_ms += frame_ms;
        }

        let summary = GameSummary::new(session.game(), played_frames, now_ms - start_ms, level_ups);
        log::info!(
            "game {game_index}: score {}, lines {}, pieces {}",
            summary.score,
            summary.lines,
            summary.locked_pieces
        );
        summaries.push(summary);
    }

    let summary = SimulationSummary {
        manifest,
        seed: session.config().seed,
        frame_ms: *frame_ms,
        games: summaries,
    };
    Output::save_json(&summary, output.clone())
}
