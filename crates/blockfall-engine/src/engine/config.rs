use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, PieceKind, Rgb};

use super::generator::PieceSeed;

/// Immutable game configuration.
///
/// Built once (usually deserialized from JSON, with every field optional) and
/// passed by reference to each component that needs it.
///
/// # Example
///
/// ```
/// use blockfall_engine::GameConfig;
///
/// let config: GameConfig =
///     serde_json::from_str(r#"{ "board": { "cols": 8 }, "timing": { "min_fall_ms": 100 } }"#)
///         .unwrap();
///
/// assert_eq!(config.board.cols, 8);
/// assert_eq!(config.board.rows, 22);
/// assert_eq!(config.timing.min_fall_ms, 100);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub timing: TimingConfig,
    pub input: InputConfig,
    pub scoring: ScoreTable,
    pub palette: Palette,
    /// Seed for the piece generator; random when absent.
    pub seed: Option<PieceSeed>,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board.validate()?;
        self.timing.validate()
    }
}

/// Board geometry and spawn placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    pub cols: usize,
    pub rows: usize,
    /// Row of the spawn origin; the column is always `cols / 2`.
    pub spawn_row: usize,
    /// Number of upcoming pieces kept in the preview queue.
    pub lookahead: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cols: 10,
            rows: 22,
            spawn_row: 0,
            lookahead: 5,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            cols,
            rows,
            spawn_row,
            lookahead,
        } = *self;
        if cols == 0 || rows == 0 || i32::try_from(cols.max(rows)).is_err() {
            return Err(ConfigError::InvalidBoardSize { cols, rows });
        }
        if spawn_row >= rows {
            return Err(ConfigError::SpawnRowOutOfBounds { spawn_row, rows });
        }
        if lookahead == 0 {
            return Err(ConfigError::ZeroLookahead);
        }
        Ok(())
    }
}

/// Gravity curve parameters.
///
/// The fall interval at level `n` is `max(min_fall_ms, round(base_fall_ms * level_accel^n))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub base_fall_ms: u64,
    pub level_accel: f64,
    pub min_fall_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_fall_ms: 800,
            level_accel: 0.9,
            min_fall_ms: 60,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let accel = self.level_accel;
        if !accel.is_finite() || accel <= 0.0 || accel > 1.0 {
            return Err(ConfigError::InvalidAcceleration { accel });
        }
        if self.min_fall_ms == 0 {
            return Err(ConfigError::InvalidFallInterval {
                level: 0,
                interval_ms: self.min_fall_ms,
            });
        }
        if self.base_fall_ms < self.min_fall_ms {
            return Err(ConfigError::InvalidFallInterval {
                level: 0,
                interval_ms: self.base_fall_ms,
            });
        }
        Ok(())
    }
}

/// Delayed auto shift and auto repeat timings, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Delay before a held horizontal move starts repeating.
    pub das_ms: u64,
    /// Repeat interval of horizontal moves and other repeatable actions.
    pub arr_ms: u64,
    /// Repeat interval of a held soft drop, including the first repeat.
    pub soft_drop_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            das_ms: 160,
            arr_ms: 40,
            soft_drop_ms: 30,
        }
    }
}

/// Points awarded per simultaneous line count, before the level multiplier.
///
/// Line counts without an entry (including 0 and anything above the largest
/// entry) award nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreTable(BTreeMap<u32, u64>);

impl Default for ScoreTable {
    fn default() -> Self {
        Self(BTreeMap::from([(1, 40), (2, 100), (3, 300), (4, 1200)]))
    }
}

impl FromIterator<(u32, u64)> for ScoreTable {
    fn from_iter<T: IntoIterator<Item = (u32, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ScoreTable {
    #[must_use]
    pub fn points(&self, cleared_lines: u32) -> u64 {
        self.0.get(&cleared_lines).copied().unwrap_or(0)
    }
}

/// Color assigned to each piece kind on spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    #[serde(rename = "I")]
    pub i: Rgb,
    #[serde(rename = "O")]
    pub o: Rgb,
    #[serde(rename = "S")]
    pub s: Rgb,
    #[serde(rename = "Z")]
    pub z: Rgb,
    #[serde(rename = "J")]
    pub j: Rgb,
    #[serde(rename = "L")]
    pub l: Rgb,
    #[serde(rename = "T")]
    pub t: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            i: Rgb(80, 227, 230),
            o: Rgb(223, 217, 36),
            s: Rgb(80, 230, 123),
            z: Rgb(230, 80, 80),
            j: Rgb(36, 95, 223),
            l: Rgb(223, 173, 36),
            t: Rgb(158, 36, 223),
        }
    }
}

impl Palette {
    #[must_use]
    pub fn color(&self, kind: PieceKind) -> Rgb {
        match kind {
            PieceKind::I => self.i,
            PieceKind::O => self.o,
            PieceKind::S => self.s,
            PieceKind::Z => self.z,
            PieceKind::J => self.j,
            PieceKind::L => self.l,
            PieceKind::T => self.t,
        }
    }
}
