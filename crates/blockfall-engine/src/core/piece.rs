use serde::{Deserialize, Serialize};

use super::shape::ShapeCatalog;

/// Absolute board coordinate `(x, y)`.
///
/// `(0, 0)` is the top-left cell; `y` grows downward. Coordinates are signed
/// so that candidate positions left of or above the board can be expressed
/// and rejected by [`Board::valid`](super::board::Board::valid).
pub type Coord = (i32, i32);

/// An RGB color, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Enum representing the type of piece.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// Every piece kind, in declaration order.
    pub const ALL: [PieceKind; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('S'), Some(PieceKind::S));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

/// A falling piece: kind, origin, rotation state and color.
///
/// Pieces are immutable values. [`moved`](Self::moved) and
/// [`rotated`](Self::rotated) return new instances, so validity checks never
/// have side effects on the piece being tested.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceKind, PieceState, Rgb};
///
/// let piece = PieceState::new(PieceKind::T, 5, 0, Rgb(160, 0, 240));
/// let moved = piece.moved(-1, 1);
/// assert_eq!((moved.x(), moved.y()), (4, 1));
///
/// // Rotation wraps modulo the kind's rotation-state count.
/// assert_eq!(piece.rotated(-1, 4).rotation(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceState {
    kind: PieceKind,
    x: i32,
    y: i32,
    rotation: usize,
    color: Rgb,
}

impl PieceState {
    /// Creates a piece in its spawn rotation (0) at the given origin.
    #[must_use]
    pub const fn new(kind: PieceKind, x: i32, y: i32, color: Rgb) -> Self {
        Self {
            kind,
            x,
            y,
            rotation: 0,
            color,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub const fn rotation(&self) -> usize {
        self.rotation
    }

    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    #[must_use]
    pub const fn moved(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Rotates by `dr` steps (positive is clockwise), wrapping modulo
    /// `rotation_count`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn rotated(self, dr: i32, rotation_count: usize) -> Self {
        let count = rotation_count.max(1) as i64;
        let rotation = (self.rotation as i64 + i64::from(dr)).rem_euclid(count) as usize;
        Self { rotation, ..self }
    }

    /// Resolves the piece's four absolute cells through the catalog.
    #[must_use]
    pub fn blocks(&self, catalog: &dyn ShapeCatalog) -> PieceBlocks {
        let offsets = catalog.offsets(self.kind, self.rotation);
        PieceBlocks {
            kind: self.kind,
            color: self.color,
            cells: offsets.map(|(dx, dy)| (self.x + dx, self.y + dy)),
        }
    }
}

/// The four absolute cells of a piece, together with its kind and color.
///
/// This is the single value type exchanged between the controller, boards
/// and rendering collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceBlocks {
    kind: PieceKind,
    color: Rgb,
    cells: [Coord; 4],
}

impl PieceBlocks {
    #[must_use]
    pub const fn new(kind: PieceKind, color: Rgb, cells: [Coord; 4]) -> Self {
        Self { kind, color, cells }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn color(&self) -> Rgb {
        self.color
    }

    #[must_use]
    pub const fn cells(&self) -> &[Coord; 4] {
        &self.cells
    }

    #[must_use]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            cells: self.cells.map(|(x, y)| (x + dx, y + dy)),
            ..*self
        }
    }
}
