//! Deterministic rules-and-state engine for a falling-block puzzle game.
//!
//! The crate is split in two layers:
//!
//! - [`core`](crate::core) - value types and geometry: pieces, shape catalogs and boards
//! - [`engine`](crate::engine) - policy and orchestration: rule sets, piece generators, the
//!   move/rotate/drop controller, progression, input auto-repeat and the
//!   [`Match`] state machine
//!
//! Hosts usually drive a [`GameSession`], which owns the configuration, the
//! input repeater and the current match.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Rejected configuration detected while building engine components.
///
/// These errors only happen at construction time. Once a [`Match`] exists,
/// every game path is infallible and rejected moves are plain `None` results.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("shape catalog has no piece kinds")]
    EmptyCatalog,
    #[display("piece kind {kind} is defined more than once")]
    DuplicateKind { kind: PieceKind },
    #[display("piece kind {kind} has no rotation states")]
    NoRotations { kind: PieceKind },
    #[display("piece generator produces kind {kind}, which is not in the shape catalog")]
    UnknownKind { kind: PieceKind },
    #[display("piece kind {kind} rotation {rotation} has {count} cells, expected 4")]
    WrongCellCount {
        kind: PieceKind,
        rotation: usize,
        count: usize,
    },
    #[display("invalid board size {cols}x{rows}")]
    InvalidBoardSize { cols: usize, rows: usize },
    #[display("spawn row {spawn_row} is outside a board of {rows} rows")]
    SpawnRowOutOfBounds { spawn_row: usize, rows: usize },
    #[display("lookahead depth must be at least 1")]
    ZeroLookahead,
    #[display("level acceleration must be in (0, 1], got {accel}")]
    InvalidAcceleration { accel: f64 },
    #[display("invalid fall interval of {interval_ms} ms at level {level}")]
    InvalidFallInterval { level: u32, interval_ms: u64 },
    #[display("fall interval increases at level {level}")]
    IncreasingFallInterval { level: u32 },
}
