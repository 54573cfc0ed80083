use std::fmt;

use crate::{ConfigError, PieceKind};

use super::config::{ScoreTable, TimingConfig};

/// Number of levels probed by [`validate_rule_set`].
const PROBED_LEVELS: u32 = 30;

/// Game policy: gravity curve, scoring and rotation kicks.
pub trait RuleSet: fmt::Debug {
    /// Milliseconds between gravity steps at `level`.
    ///
    /// Must be positive and non-increasing in `level`.
    fn fall_interval_ms(&self, level: u32) -> u64;

    /// Points awarded for clearing `cleared_lines` lines at once at `level`.
    fn score(&self, cleared_lines: u32, level: u32) -> u64;

    /// Horizontal offsets tried, in order, after rotating `kind` from
    /// `from_rotation` to `to_rotation`. The first offset whose candidate is
    /// valid wins.
    fn kick_table(&self, kind: PieceKind, from_rotation: usize, to_rotation: usize) -> &[i32];
}

/// Probes the gravity curve of an arbitrary rule set.
///
/// Rejects non-positive intervals and intervals that grow with the level.
pub fn validate_rule_set(rules: &dyn RuleSet) -> Result<(), ConfigError> {
    let mut previous = u64::MAX;
    for level in 0..PROBED_LEVELS {
        let interval_ms = rules.fall_interval_ms(level);
        if interval_ms == 0 {
            return Err(ConfigError::InvalidFallInterval { level, interval_ms });
        }
        if interval_ms > previous {
            return Err(ConfigError::IncreasingFallInterval { level });
        }
        previous = interval_ms;
    }
    Ok(())
}

/// Geometric gravity decay, table scoring and naive horizontal kicks.
///
/// # Example
///
/// ```
/// use blockfall_engine::{DefaultRuleSet, RuleSet};
///
/// let rules = DefaultRuleSet::default();
///
/// assert_eq!(rules.fall_interval_ms(0), 800);
/// assert_eq!(rules.fall_interval_ms(1), 720);
/// assert_eq!(rules.score(3, 2), 900);
/// assert_eq!(rules.score(5, 2), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultRuleSet {
    timing: TimingConfig,
    scores: ScoreTable,
}

impl DefaultRuleSet {
    /// Kick offsets shared by every kind and rotation transition.
    pub const KICKS: [i32; 5] = [0, -1, 1, -2, 2];

    pub fn new(timing: TimingConfig, scores: ScoreTable) -> Result<Self, ConfigError> {
        timing.validate()?;
        let rules = Self { timing, scores };
        validate_rule_set(&rules)?;
        Ok(rules)
    }
}

impl RuleSet for DefaultRuleSet {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn fall_interval_ms(&self, level: u32) -> u64 {
        let TimingConfig {
            base_fall_ms,
            level_accel,
            min_fall_ms,
        } = self.timing;
        let exponent = i32::try_from(level).unwrap_or(i32::MAX);
        let scaled = (base_fall_ms as f64 * level_accel.powi(exponent)).round();
        u64::max(min_fall_ms, scaled as u64)
    }

    fn score(&self, cleared_lines: u32, level: u32) -> u64 {
        self.scores
            .points(cleared_lines)
            .saturating_mul(u64::from(level) + 1)
    }

    fn kick_table(&self, _kind: PieceKind, _from_rotation: usize, _to_rotation: usize) -> &[i32] {
        &Self::KICKS
    }
}
