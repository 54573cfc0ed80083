use std::collections::VecDeque;

use arrayvec::ArrayVec;

use crate::{
    Board, ConfigError, Coord, PieceBlocks, PieceKind, PieceState, validate_catalog,
};

use super::{
    config::{GameConfig, Palette},
    controller::{Controller, LockOutcome},
    generator::PieceGenerator,
    input::Intent,
    progression::ProgressionTracker,
    rules::validate_rule_set,
};

/// Externally observable state of a [`Match`].
///
/// Spawning and locking happen synchronously inside a single call, so they
/// never appear as a resting phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MatchPhase {
    Active,
    Paused,
    /// Terminal until the match is reset.
    GameOver,
}

/// Notification for collaborators that react to game progress (sound,
/// overlays) without polling internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    PieceLocked {
        kind: PieceKind,
        cleared_lines: u32,
        score_delta: u64,
    },
    LevelUp {
        level: u32,
    },
    ToppedOut,
}

/// Core state machine: current piece, preview queue, gravity timer and
/// game-over handling.
///
/// The host drives a match with a monotonic millisecond clock passed to
/// [`update`](Self::update) once per frame, and with discrete intents
/// delivered before `update` in the same frame. At most one gravity step
/// happens per `update` call.
///
/// The gravity anchor is unset at start, after resuming and after a reset;
/// the next `update` only records its timestamp, so time spent before the
/// first frame or while paused never counts toward a fall. The timer is not
/// anchored at 0: a first `update(now)` with `now` past the fall interval
/// still does not move the piece.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
///
/// use blockfall_engine::{
///     Controller, DefaultRuleSet, GameConfig, Match, RectBoard, SevenBag, ShapeTable,
/// };
///
/// let config = GameConfig::default();
/// let catalog = Rc::new(ShapeTable::classic());
/// let controller = Controller::new(catalog.clone(), Rc::new(DefaultRuleSet::default()));
/// let board = RectBoard::new(config.board.cols, config.board.rows).unwrap();
/// let generator = SevenBag::new(&*catalog);
///
/// let mut game = Match::new(Box::new(board), controller, Box::new(generator), &config).unwrap();
///
/// game.update(0);
/// game.move_left();
/// game.hard_drop();
///
/// assert_eq!(game.progression().locked_pieces(), 1);
/// assert_eq!(game.next_kinds().count(), 5);
/// assert!(game.piece_view().is_some());
/// ```
#[derive(Debug)]
pub struct Match {
    board: Box<dyn Board>,
    controller: Controller,
    generator: Box<dyn PieceGenerator>,
    progression: ProgressionTracker,
    palette: Palette,
    spawn: Coord,
    lookahead: usize,
    queue: VecDeque<PieceKind>,
    current: Option<PieceState>,
    phase: MatchPhase,
    last_fall_ms: Option<u64>,
    events: Vec<MatchEvent>,
}

impl Match {
    /// Assembles a match and spawns its first piece.
    ///
    /// Fails if the catalog or rule set is malformed, or if the spawn
    /// placement does not fit the board. A spawn that collides with
    /// pre-filled cells is not an error: the match starts in
    /// [`MatchPhase::GameOver`].
    pub fn new(
        board: Box<dyn Board>,
        controller: Controller,
        generator: Box<dyn PieceGenerator>,
        config: &GameConfig,
    ) -> Result<Self, ConfigError> {
        let spawn = check_assembly(&*board, &controller, &*generator, config)?;
        let mut game = Self {
            board,
            controller,
            generator,
            progression: ProgressionTracker::new(),
            palette: config.palette.clone(),
            spawn,
            lookahead: config.board.lookahead,
            queue: VecDeque::with_capacity(config.board.lookahead + 1),
            current: None,
            phase: MatchPhase::Active,
            last_fall_ms: None,
            events: Vec::new(),
        };
        game.spawn_next();
        Ok(game)
    }

    /// Discards all per-game state and starts over on a fresh board.
    ///
    /// The piece generator is kept and continues its sequence.
    pub fn reset(
        &mut self,
        board: Box<dyn Board>,
        controller: Controller,
        config: &GameConfig,
    ) -> Result<(), ConfigError> {
        self.spawn = check_assembly(&*board, &controller, &*self.generator, config)?;
        self.board = board;
        self.controller = controller;
        self.progression = ProgressionTracker::new();
        self.palette = config.palette.clone();
        self.lookahead = config.board.lookahead;
        self.queue.clear();
        self.current = None;
        self.phase = MatchPhase::Active;
        self.last_fall_ms = None;
        self.events.clear();
        log::debug!("match reset");
        self.spawn_next();
        Ok(())
    }

    #[must_use]
    pub fn board(&self) -> &dyn Board {
        &*self.board
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[must_use]
    pub fn progression(&self) -> &ProgressionTracker {
        &self.progression
    }

    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase.is_game_over()
    }

    #[must_use]
    pub fn current_piece(&self) -> Option<&PieceState> {
        self.current.as_ref()
    }

    /// Upcoming kinds, next first.
    pub fn next_kinds(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }

    /// Absolute cells of the current piece, if any.
    #[must_use]
    pub fn piece_view(&self) -> Option<PieceBlocks> {
        self.current.map(|piece| self.controller.blocks(&piece))
    }

    /// Cells the current piece would occupy after a hard drop.
    #[must_use]
    pub fn ghost_blocks(&self) -> ArrayVec<Coord, 4> {
        let Some(blocks) = self.piece_view() else {
            return ArrayVec::new();
        };
        let dy = self.board.drop_distance(&blocks);
        blocks.translated(0, dy).cells().iter().copied().collect()
    }

    /// Removes and returns the events recorded since the last call.
    pub fn drain_events(&mut self) -> impl Iterator<Item = MatchEvent> + '_ {
        self.events.drain(..)
    }

    /// Gravity tick.
    pub fn update(&mut self, now_ms: u64) {
        let Some(piece) = self.active_piece() else {
            return;
        };
        let Some(last_fall_ms) = self.last_fall_ms else {
            self.last_fall_ms = Some(now_ms);
            return;
        };
        let interval = self
            .controller
            .rules()
            .fall_interval_ms(self.progression.level());
        if now_ms.saturating_sub(last_fall_ms) < interval {
            return;
        }
        self.fall_or_lock(piece);
        self.last_fall_ms = Some(now_ms);
    }

    pub fn move_left(&mut self) {
        self.shift(-1);
    }

    pub fn move_right(&mut self) {
        self.shift(1);
    }

    /// Moves the piece down one row, locking it if it cannot move.
    pub fn soft_drop_step(&mut self) {
        if let Some(piece) = self.active_piece() {
            self.fall_or_lock(piece);
        }
    }

    pub fn rotate_cw(&mut self) {
        self.rotate(1);
    }

    pub fn rotate_ccw(&mut self) {
        self.rotate(-1);
    }

    pub fn hard_drop(&mut self) {
        let Some(piece) = self.active_piece() else {
            return;
        };
        let outcome =
            self.controller
                .hard_drop_and_lock(&mut *self.board, piece, self.progression.level());
        self.complete_lock(outcome);
    }

    /// Flips between active and paused. Has no effect after game over.
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            MatchPhase::Active => {
                log::debug!("paused");
                MatchPhase::Paused
            }
            MatchPhase::Paused => {
                log::debug!("resumed");
                self.last_fall_ms = None;
                MatchPhase::Active
            }
            MatchPhase::GameOver => MatchPhase::GameOver,
        };
    }

    /// Dispatches an intent to the matching method.
    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft => self.move_left(),
            Intent::MoveRight => self.move_right(),
            Intent::SoftDrop => self.soft_drop_step(),
            Intent::RotateCw => self.rotate_cw(),
            Intent::RotateCcw => self.rotate_ccw(),
            Intent::HardDrop => self.hard_drop(),
            Intent::TogglePause => self.toggle_pause(),
        }
    }

    fn active_piece(&self) -> Option<PieceState> {
        if self.phase.is_active() {
            self.current
        } else {
            None
        }
    }

    fn shift(&mut self, dx: i32) {
        let Some(piece) = self.active_piece() else {
            return;
        };
        if let Some(moved) = self.controller.try_move(&*self.board, piece, dx, 0) {
            self.current = Some(moved);
        }
    }

    fn rotate(&mut self, dr: i32) {
        let Some(piece) = self.active_piece() else {
            return;
        };
        if let Some(rotated) = self.controller.try_rotate(&*self.board, piece, dr) {
            self.current = Some(rotated);
        }
    }

    fn fall_or_lock(&mut self, piece: PieceState) {
        if let Some(moved) = self.controller.try_move(&*self.board, piece, 0, 1) {
            self.current = Some(moved);
            return;
        }
        let outcome = self
            .controller
            .lock(&mut *self.board, piece, self.progression.level());
        self.complete_lock(outcome);
    }

    fn complete_lock(&mut self, outcome: LockOutcome) {
        let LockOutcome {
            piece,
            cleared_lines,
            score_delta,
        } = outcome;
        log::debug!(
            "locked {} at ({}, {}) clearing {cleared_lines} lines",
            piece.kind(),
            piece.x(),
            piece.y()
        );
        self.current = None;
        self.progression.on_piece_locked(cleared_lines);
        let leveled_up = self
            .progression
            .on_lines_cleared(cleared_lines, self.controller.rules());
        self.events.push(MatchEvent::PieceLocked {
            kind: piece.kind(),
            cleared_lines,
            score_delta,
        });
        if leveled_up {
            let level = self.progression.level();
            log::debug!("level up to {level}");
            self.events.push(MatchEvent::LevelUp { level });
        }
        self.spawn_next();
    }

    fn fill_queue(&mut self) {
        while self.queue.len() < self.lookahead {
            self.queue.push_back(self.generator.next());
        }
    }

    fn spawn_next(&mut self) {
        self.fill_queue();
        let kind = self
            .queue
            .pop_front()
            .unwrap_or_else(|| self.generator.next());
        self.fill_queue();

        let (x, y) = self.spawn;
        let piece = PieceState::new(kind, x, y, self.palette.color(kind));
        if self.board.valid(&self.controller.blocks(&piece)) {
            log::debug!("spawned {kind} at ({x}, {y})");
            self.current = Some(piece);
        } else {
            log::debug!("spawn of {kind} blocked; game over");
            self.current = None;
            self.phase = MatchPhase::GameOver;
            self.events.push(MatchEvent::ToppedOut);
        }
    }
}

/// Validates the pieces a match is assembled from and returns the spawn
/// origin.
fn check_assembly(
    board: &dyn Board,
    controller: &Controller,
    generator: &dyn PieceGenerator,
    config: &GameConfig,
) -> Result<Coord, ConfigError> {
    validate_catalog(controller.catalog())?;
    validate_rule_set(controller.rules())?;
    if let Some(&kind) = generator
        .kinds()
        .iter()
        .find(|&&kind| controller.catalog().rotations(kind) == 0)
    {
        return Err(ConfigError::UnknownKind { kind });
    }

    let (cols, rows) = (board.cols(), board.rows());
    let spawn_row = config.board.spawn_row;
    if spawn_row >= rows {
        return Err(ConfigError::SpawnRowOutOfBounds { spawn_row, rows });
    }
    if config.board.lookahead == 0 {
        return Err(ConfigError::ZeroLookahead);
    }
    let x = i32::try_from(cols / 2).map_err(|_| ConfigError::InvalidBoardSize { cols, rows })?;
    let y = i32::try_from(spawn_row).map_err(|_| ConfigError::InvalidBoardSize { cols, rows })?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{DefaultRuleSet, RectBoard, Rgb, SevenBag, ShapeTable};

    use super::*;

    const GRAY: Rgb = Rgb(200, 200, 200);

    #[derive(Debug)]
    struct Scripted {
        kinds: Vec<PieceKind>,
        index: usize,
    }

    impl PieceGenerator for Scripted {
        fn kinds(&self) -> &[PieceKind] {
            &self.kinds
        }

        fn next(&mut self) -> PieceKind {
            let kind = self.kinds[self.index % self.kinds.len()];
            self.index += 1;
            kind
        }
    }

    fn scripted(kinds: &[PieceKind]) -> Box<dyn PieceGenerator> {
        Box::new(Scripted {
            kinds: kinds.to_vec(),
            index: 0,
        })
    }

    fn controller() -> Controller {
        Controller::new(
            Rc::new(ShapeTable::classic()),
            Rc::new(DefaultRuleSet::default()),
        )
    }

    fn new_match(board: RectBoard, kinds: &[PieceKind]) -> Match {
        Match::new(
            Box::new(board),
            controller(),
            scripted(kinds),
            &GameConfig::default(),
        )
        .unwrap()
    }

    fn empty_match(kinds: &[PieceKind]) -> Match {
        new_match(RectBoard::new(10, 22).unwrap(), kinds)
    }

    fn position(game: &Match) -> (i32, i32) {
        let piece = game.current_piece().unwrap();
        (piece.x(), piece.y())
    }

    #[test]
    fn test_spawn_position_and_queue() {
        use PieceKind::*;
        let game = empty_match(&[T, I, O, S, Z, J, L]);

        let piece = game.current_piece().unwrap();
        assert_eq!(piece.kind(), T);
        assert_eq!((piece.x(), piece.y(), piece.rotation()), (5, 0, 0));
        assert_eq!(piece.color(), Palette::default().t);
        assert_eq!(game.next_kinds().collect::<Vec<_>>(), [I, O, S, Z, J]);
        assert!(game.phase().is_active());
    }

    #[test]
    fn test_gravity_steps_once_per_interval() {
        let mut game = empty_match(&[PieceKind::T]);

        game.update(0);
        game.update(799);
        assert_eq!(position(&game), (5, 0));
        game.update(800);
        assert_eq!(position(&game), (5, 1));
        game.update(1599);
        assert_eq!(position(&game), (5, 1));
        // Several elapsed intervals still move a single row.
        game.update(5000);
        assert_eq!(position(&game), (5, 2));
    }

    #[test]
    fn test_first_update_only_anchors_gravity() {
        let mut game = empty_match(&[PieceKind::T]);

        game.update(5000);
        assert_eq!(position(&game), (5, 0));
        game.update(5800);
        assert_eq!(position(&game), (5, 1));
    }

    #[test]
    fn test_pause_freezes_gravity_without_catch_up() {
        let mut game = empty_match(&[PieceKind::T]);
        game.update(0);

        game.toggle_pause();
        assert!(game.is_paused());
        game.update(5000);
        game.move_left();
        game.rotate_cw();
        game.hard_drop();
        assert_eq!(position(&game), (5, 0));
        assert_eq!(game.current_piece().unwrap().rotation(), 0);

        game.toggle_pause();
        assert!(!game.is_paused());
        game.update(6000);
        game.update(6799);
        assert_eq!(position(&game), (5, 0));
        game.update(6800);
        assert_eq!(position(&game), (5, 1));
    }

    #[test]
    fn test_intents_move_and_rotate() {
        let mut game = empty_match(&[PieceKind::T]);

        game.move_left();
        game.move_left();
        assert_eq!(position(&game), (3, 0));
        game.move_right();
        assert_eq!(position(&game), (4, 0));

        // Vertical T states reach one row above the origin.
        game.rotate_cw();
        assert_eq!(game.current_piece().unwrap().rotation(), 0);
        game.apply(Intent::SoftDrop);
        assert_eq!(position(&game), (4, 1));

        game.rotate_cw();
        assert_eq!(game.current_piece().unwrap().rotation(), 1);
        game.rotate_ccw();
        game.rotate_ccw();
        assert_eq!(game.current_piece().unwrap().rotation(), 3);
        assert_eq!(position(&game), (4, 1));
    }

    #[test]
    fn test_hard_drop_locks_and_spawns_next() {
        use PieceKind::*;
        let mut game = empty_match(&[T, O]);

        game.hard_drop();

        assert_eq!(game.board().cell(5, 21), Some(Palette::default().t));
        assert_eq!(game.current_piece().unwrap().kind(), O);
        assert_eq!(game.progression().locked_pieces(), 1);
        assert_eq!(
            game.drain_events().collect::<Vec<_>>(),
            [MatchEvent::PieceLocked {
                kind: T,
                cleared_lines: 0,
                score_delta: 0,
            }]
        );
        assert_eq!(game.drain_events().count(), 0);
    }

    #[test]
    fn test_blocked_soft_drop_locks() {
        let board = RectBoard::new(4, 3).unwrap();
        let mut game = new_match(board, &[PieceKind::O]);

        game.soft_drop_step();
        assert_eq!(position(&game), (2, 1));
        game.soft_drop_step();
        // The piece locked and the next spawn collides with it.
        assert!(game.is_game_over());
        assert_eq!(game.progression().locked_pieces(), 1);
    }

    #[test]
    fn test_blocked_gravity_step_locks() {
        let board = RectBoard::new(4, 4).unwrap();
        let mut game = new_match(board, &[PieceKind::O]);

        game.update(0);
        game.update(800);
        game.update(1600);
        assert_eq!(position(&game), (2, 2));
        game.update(2400);

        assert_eq!(game.progression().locked_pieces(), 1);
        assert_eq!(position(&game), (2, 0));
        assert_eq!(game.board().cell(2, 3), Some(Palette::default().o));
    }

    #[test]
    fn test_line_clear_scores() {
        let board = RectBoard::from_pattern(
            &[
                "....", //
                "....", //
                "....", //
                "....", //
                "##..", //
                "##..", //
            ],
            GRAY,
        )
        .unwrap();
        let mut game = new_match(board, &[PieceKind::O]);

        game.hard_drop();

        assert_eq!(game.progression().lines(), 2);
        assert_eq!(game.progression().score(), 100);
        assert_eq!(game.board().cell(0, 5), None);
        assert_eq!(
            game.drain_events().next(),
            Some(MatchEvent::PieceLocked {
                kind: PieceKind::O,
                cleared_lines: 2,
                score_delta: 100,
            })
        );
    }

    #[test]
    fn test_level_up_event() {
        let mut rows = vec!["...", "..."];
        rows.extend(["#.."; 10]);
        let board = RectBoard::from_pattern(&rows, GRAY).unwrap();
        let mut game = new_match(board, &[PieceKind::O]);

        for _ in 0..5 {
            game.hard_drop();
        }

        assert_eq!(game.progression().lines(), 10);
        assert_eq!(game.progression().level(), 1);
        assert_eq!(game.progression().score(), 500);
        let level_ups: Vec<_> = game
            .drain_events()
            .filter(|event| matches!(event, MatchEvent::LevelUp { .. }))
            .collect();
        assert_eq!(level_ups, [MatchEvent::LevelUp { level: 1 }]);
        // The faster curve applies from now on.
        assert_eq!(
            game.controller().rules().fall_interval_ms(game.progression().level()),
            720
        );
    }

    #[test]
    fn test_top_out_on_first_spawn() {
        let board = RectBoard::from_pattern(&["..#.", "...."], GRAY).unwrap();
        let mut game = new_match(board, &[PieceKind::O]);

        assert!(game.is_game_over());
        assert!(game.piece_view().is_none());
        assert!(game.ghost_blocks().is_empty());
        assert_eq!(
            game.drain_events().collect::<Vec<_>>(),
            [MatchEvent::ToppedOut]
        );

        // Terminal: nothing changes.
        game.toggle_pause();
        game.update(10_000);
        game.hard_drop();
        assert!(game.is_game_over());
        assert_eq!(game.progression().locked_pieces(), 0);
    }

    #[test]
    fn test_ghost_blocks() {
        let game = empty_match(&[PieceKind::T]);

        let mut ghost = game.ghost_blocks().to_vec();
        ghost.sort_unstable();
        assert_eq!(ghost, [(4, 20), (5, 20), (5, 21), (6, 20)]);

        let view = game.piece_view().unwrap();
        assert_eq!(view.kind(), PieceKind::T);
        assert_eq!(view.cells(), &[(4, 0), (5, 0), (6, 0), (5, 1)]);
    }

    #[test]
    fn test_reset_after_game_over() {
        let board = RectBoard::new(4, 3).unwrap();
        let mut game = new_match(board, &[PieceKind::O]);
        game.hard_drop();
        assert!(game.is_game_over());

        game.reset(
            Box::new(RectBoard::new(4, 3).unwrap()),
            controller(),
            &GameConfig::default(),
        )
        .unwrap();

        assert!(game.phase().is_active());
        assert_eq!(game.progression(), &ProgressionTracker::new());
        assert_eq!(position(&game), (2, 0));
        assert_eq!(game.drain_events().count(), 0);
    }

    #[test]
    fn test_rejects_spawn_row_outside_board() {
        let mut config = GameConfig::default();
        config.board.spawn_row = 5;
        let result = Match::new(
            Box::new(RectBoard::new(4, 5).unwrap()),
            controller(),
            scripted(&[PieceKind::O]),
            &config,
        );

        assert_eq!(
            result.err(),
            Some(ConfigError::SpawnRowOutOfBounds {
                spawn_row: 5,
                rows: 5,
            })
        );
    }

    #[test]
    fn test_rejects_generator_kind_missing_from_catalog() {
        let o_only = ShapeTable::new([(
            PieceKind::O,
            vec![vec![(0, 0), (1, 0), (0, 1), (1, 1)]],
        )])
        .unwrap();
        let controller = Controller::new(Rc::new(o_only), Rc::new(DefaultRuleSet::default()));
        let result = Match::new(
            Box::new(RectBoard::new(10, 22).unwrap()),
            controller,
            Box::new(SevenBag::new(&ShapeTable::classic())),
            &GameConfig::default(),
        );

        assert!(matches!(
            result.err(),
            Some(ConfigError::UnknownKind { kind }) if kind != PieceKind::O
        ));
    }

    #[test]
    fn test_reset_rejects_catalog_missing_generator_kind() {
        let mut game = empty_match(&[PieceKind::I, PieceKind::O]);
        let o_only = ShapeTable::new([(
            PieceKind::O,
            vec![vec![(0, 0), (1, 0), (0, 1), (1, 1)]],
        )])
        .unwrap();
        let controller = Controller::new(Rc::new(o_only), Rc::new(DefaultRuleSet::default()));
        let result = game.reset(
            Box::new(RectBoard::new(10, 22).unwrap()),
            controller,
            &GameConfig::default(),
        );

        assert_eq!(
            result,
            Err(ConfigError::UnknownKind {
                kind: PieceKind::I
            })
        );
    }
}
