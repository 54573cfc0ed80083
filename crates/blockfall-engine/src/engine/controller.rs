use std::rc::Rc;

use crate::{Board, PieceBlocks, PieceState, ShapeCatalog};

use super::rules::RuleSet;

/// Result of writing a piece into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    /// The piece at the position it was locked.
    pub piece: PieceState,
    pub cleared_lines: u32,
    /// `RuleSet::score(cleared_lines, level)`, or 0 when nothing was cleared.
    pub score_delta: u64,
}

/// Stateless move/rotate/drop logic.
///
/// The controller never keeps a board or a piece: every attempt receives the
/// board to test against and returns a new piece value, leaving the input
/// piece untouched when the attempt is rejected.
#[derive(Debug, Clone)]
pub struct Controller {
    catalog: Rc<dyn ShapeCatalog>,
    rules: Rc<dyn RuleSet>,
}

impl Controller {
    #[must_use]
    pub fn new(catalog: Rc<dyn ShapeCatalog>, rules: Rc<dyn RuleSet>) -> Self {
        Self { catalog, rules }
    }

    #[must_use]
    pub fn catalog(&self) -> &dyn ShapeCatalog {
        &*self.catalog
    }

    #[must_use]
    pub fn rules(&self) -> &dyn RuleSet {
        &*self.rules
    }

    #[must_use]
    pub fn blocks(&self, piece: &PieceState) -> PieceBlocks {
        piece.blocks(&*self.catalog)
    }

    /// Returns the translated piece if the board accepts it.
    #[must_use]
    pub fn try_move(
        &self,
        board: &dyn Board,
        piece: PieceState,
        dx: i32,
        dy: i32,
    ) -> Option<PieceState> {
        let candidate = piece.moved(dx, dy);
        board.valid(&self.blocks(&candidate)).then_some(candidate)
    }

    /// Rotates by `dr` (positive is clockwise) and returns the first kicked
    /// candidate the board accepts.
    #[must_use]
    pub fn try_rotate(&self, board: &dyn Board, piece: PieceState, dr: i32) -> Option<PieceState> {
        let rotated = piece.rotated(dr, self.catalog.rotations(piece.kind()));
        let kicks = self
            .rules
            .kick_table(piece.kind(), piece.rotation(), rotated.rotation());
        let found = kicks
            .iter()
            .map(|&dx| rotated.moved(dx, 0))
            .find(|candidate| board.valid(&self.blocks(candidate)));
        if found.is_none() {
            log::trace!(
                "rotation of {} from {} to {} rejected",
                piece.kind(),
                piece.rotation(),
                rotated.rotation()
            );
        }
        found
    }

    /// The piece moved to its resting position, as a hard drop would leave it.
    #[must_use]
    pub fn drop_position(&self, board: &dyn Board, piece: PieceState) -> PieceState {
        let dy = board.drop_distance(&self.blocks(&piece));
        piece.moved(0, dy)
    }

    /// Locks the piece where it is.
    pub fn lock(&self, board: &mut dyn Board, piece: PieceState, level: u32) -> LockOutcome {
        let cleared = board.lock(&self.blocks(&piece));
        let cleared_lines = u32::try_from(cleared).unwrap_or(u32::MAX);
        let score_delta = if cleared_lines > 0 {
            self.rules.score(cleared_lines, level)
        } else {
            0
        };
        LockOutcome {
            piece,
            cleared_lines,
            score_delta,
        }
    }

    /// Drops the piece to its resting position and locks it there.
    pub fn hard_drop_and_lock(
        &self,
        board: &mut dyn Board,
        piece: PieceState,
        level: u32,
    ) -> LockOutcome {
        let dropped = self.drop_position(board, piece);
        self.lock(board, dropped, level)
    }
}
