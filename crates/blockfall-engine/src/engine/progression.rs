use super::rules::RuleSet;

/// Lines needed per level.
const LINES_PER_LEVEL: u32 = 10;

/// Score, level and line bookkeeping for one match.
///
/// Tracks:
///
/// - **Score**: points earned from line clears, scaled by the level at the
///   time of the clear
/// - **Level**: derived from total lines cleared (1 level per 10 lines)
/// - **Lines**: total lines cleared
/// - **Locked pieces**: total number of pieces written into the board
/// - **Line clear distribution**: count of locks by simultaneous clears
///
/// Score, level and lines never decrease.
///
/// # Example
///
/// ```
/// use blockfall_engine::{DefaultRuleSet, ProgressionTracker};
///
/// let rules = DefaultRuleSet::default();
/// let mut progression = ProgressionTracker::new();
///
/// assert!(!progression.on_lines_cleared(4, &rules));
/// assert!(!progression.on_lines_cleared(4, &rules));
/// assert!(progression.on_lines_cleared(2, &rules));
///
/// assert_eq!(progression.lines(), 10);
/// assert_eq!(progression.level(), 1);
/// assert_eq!(progression.score(), 1200 + 1200 + 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionTracker {
    score: u64,
    level: u32,
    lines: u32,
    locked_pieces: u64,
    line_clear_counter: [u64; 5],
}

impl ProgressionTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            level: 0,
            lines: 0,
            locked_pieces: 0,
            line_clear_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Always `lines / 10`.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn lines(&self) -> u32 {
        self.lines
    }

    #[must_use]
    pub const fn locked_pieces(&self) -> u64 {
        self.locked_pieces
    }

    /// Returns a histogram of locks by cleared line count.
    ///
    /// Index `n` counts locks that cleared `n` lines; the last bucket also
    /// collects anything larger.
    #[must_use]
    pub const fn line_clear_counter(&self) -> &[u64; 5] {
        &self.line_clear_counter
    }

    /// Awards `rules.score(n, level)` for `n` simultaneously cleared lines.
    ///
    /// Does nothing when `n` is 0. Returns `true` iff the level increased.
    pub fn on_lines_cleared(&mut self, n: u32, rules: &dyn RuleSet) -> bool {
        if n == 0 {
            return false;
        }
        let before = self.level;
        self.score = self.score.saturating_add(rules.score(n, before));
        self.lines = self.lines.saturating_add(n);
        self.level = self.lines / LINES_PER_LEVEL;
        self.level > before
    }

    /// Records a lock regardless of whether it cleared anything.
    pub fn on_piece_locked(&mut self, cleared_lines: u32) {
        self.locked_pieces += 1;
        let last = self.line_clear_counter.len() - 1;
        let bucket = usize::try_from(cleared_lines).map_or(last, |n| n.min(last));
        self.line_clear_counter[bucket] += 1;
    }
}

#[cfg(test)]
mod tests {
    use crate::{DefaultRuleSet, ScoreTable, TimingConfig};

    use super::*;

    #[test]
    fn test_zero_lines_is_noop() {
        let rules = DefaultRuleSet::default();
        let mut progression = ProgressionTracker::new();

        assert!(!progression.on_lines_cleared(0, &rules));
        assert_eq!(progression, ProgressionTracker::new());
    }

    #[test]
    fn test_level_from_lines() {
        let rules = DefaultRuleSet::default();
        let mut progression = ProgressionTracker::new();
        for _ in 0..9 {
            progression.on_lines_cleared(3, &rules);
        }

        assert_eq!(progression.lines(), 27);
        assert_eq!(progression.level(), 2);
    }

    #[test]
    fn test_level_up_reported_exactly_once() {
        let rules = DefaultRuleSet::default();
        let mut progression = ProgressionTracker::new();
        for _ in 0..9 {
            assert!(!progression.on_lines_cleared(1, &rules));
        }
        assert_eq!(progression.level(), 0);

        assert!(progression.on_lines_cleared(1, &rules));
        assert_eq!(progression.level(), 1);
        assert!(!progression.on_lines_cleared(1, &rules));
        assert_eq!(progression.level(), 1);
    }

    #[test]
    fn test_score_uses_level_before_clear() {
        let rules = DefaultRuleSet::default();
        let mut progression = ProgressionTracker::new();
        for _ in 0..9 {
            progression.on_lines_cleared(1, &rules);
        }
        assert_eq!(progression.score(), 9 * 40);

        // The 10th line scores at level 0, the 11th at level 1.
        progression.on_lines_cleared(1, &rules);
        assert_eq!(progression.score(), 10 * 40);
        progression.on_lines_cleared(1, &rules);
        assert_eq!(progression.score(), 10 * 40 + 80);
    }

    #[test]
    fn test_unscored_clear_still_counts_lines() {
        let scores: ScoreTable = [(1, 10)].into_iter().collect();
        let rules = DefaultRuleSet::new(TimingConfig::default(), scores).unwrap();
        let mut progression = ProgressionTracker::new();

        progression.on_lines_cleared(3, &rules);
        assert_eq!(progression.score(), 0);
        assert_eq!(progression.lines(), 3);
    }

    #[test]
    fn test_piece_lock_histogram() {
        let mut progression = ProgressionTracker::new();
        for cleared in [0, 0, 1, 4, 2, 6] {
            progression.on_piece_locked(cleared);
        }

        assert_eq!(progression.locked_pieces(), 6);
        assert_eq!(progression.line_clear_counter(), &[2, 1, 1, 0, 2]);
    }
}
