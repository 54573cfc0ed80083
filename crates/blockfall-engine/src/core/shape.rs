use std::fmt;

use crate::ConfigError;

use super::piece::PieceKind;

/// Cell offset `(dx, dy)` relative to a piece origin.
pub type CellOffset = (i32, i32);

/// Source of piece geometry: which kinds exist and how each rotation state
/// lays out its four cells.
///
/// Rotation states are pre-authored tables rather than computed by matrix
/// rotation, so asymmetric or irregular rotation behavior is expressible.
pub trait ShapeCatalog: fmt::Debug {
    /// Piece kinds provided by this catalog.
    fn kinds(&self) -> &[PieceKind];

    /// Number of rotation states for `kind`.
    fn rotations(&self, kind: PieceKind) -> usize;

    /// The four cell offsets of `kind` in rotation state `rotation`.
    ///
    /// `rotation` is normalized modulo [`rotations`](Self::rotations) before
    /// lookup.
    fn offsets(&self, kind: PieceKind, rotation: usize) -> [CellOffset; 4];
}

/// Checks the structural invariants of an arbitrary catalog.
///
/// Every catalog must provide at least one kind, and every kind at least one
/// rotation state. The four-cell invariant is enforced by the
/// [`ShapeCatalog::offsets`] signature.
pub fn validate_catalog(catalog: &dyn ShapeCatalog) -> Result<(), ConfigError> {
    let kinds = catalog.kinds();
    if kinds.is_empty() {
        return Err(ConfigError::EmptyCatalog);
    }
    for (i, &kind) in kinds.iter().enumerate() {
        if kinds[..i].contains(&kind) {
            return Err(ConfigError::DuplicateKind { kind });
        }
        if catalog.rotations(kind) == 0 {
            return Err(ConfigError::NoRotations { kind });
        }
    }
    Ok(())
}

/// Table-backed [`ShapeCatalog`].
///
/// Built from per-kind lists of rotation states; construction fails if any
/// kind has no rotation state or any state does not have exactly 4 cells.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceKind, ShapeCatalog, ShapeTable};
///
/// let catalog = ShapeTable::classic();
/// assert_eq!(catalog.kinds().len(), 7);
/// assert_eq!(catalog.rotations(PieceKind::O), 4);
///
/// // Rotation indices wrap.
/// assert_eq!(
///     catalog.offsets(PieceKind::T, 5),
///     catalog.offsets(PieceKind::T, 1),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ShapeTable {
    kinds: Vec<PieceKind>,
    states: [Vec<[CellOffset; 4]>; PieceKind::LEN],
}

impl ShapeTable {
    pub fn new<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (PieceKind, Vec<Vec<CellOffset>>)>,
    {
        let mut kinds = Vec::new();
        let mut states: [Vec<[CellOffset; 4]>; PieceKind::LEN] = Default::default();

        for (kind, rotations) in entries {
            if kinds.contains(&kind) {
                return Err(ConfigError::DuplicateKind { kind });
            }
            if rotations.is_empty() {
                return Err(ConfigError::NoRotations { kind });
            }
            let mut table = Vec::with_capacity(rotations.len());
            for (rotation, cells) in rotations.into_iter().enumerate() {
                let count = cells.len();
                let cells: [CellOffset; 4] = cells
                    .try_into()
                    .map_err(|_| ConfigError::WrongCellCount {
                        kind,
                        rotation,
                        count,
                    })?;
                table.push(cells);
            }
            kinds.push(kind);
            states[kind.index()] = table;
        }

        if kinds.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self { kinds, states })
    }

    /// The single-file table: four explicit states per kind, including the
    /// redundant ones for O, S and Z.
    #[must_use]
    pub fn classic() -> Self {
        Self::from_static(&CLASSIC_SHAPES)
    }

    /// SRS-style table with the I-piece pivoting off-center and a single
    /// state for O.
    #[must_use]
    pub fn srs() -> Self {
        Self::from_static(&SRS_SHAPES)
    }

    fn from_static(table: &[(PieceKind, &[[CellOffset; 4]])]) -> Self {
        let mut kinds = Vec::with_capacity(table.len());
        let mut states: [Vec<[CellOffset; 4]>; PieceKind::LEN] = Default::default();
        for &(kind, rotations) in table {
            kinds.push(kind);
            states[kind.index()] = rotations.to_vec();
        }
        Self { kinds, states }
    }
}

impl ShapeCatalog for ShapeTable {
    fn kinds(&self) -> &[PieceKind] {
        &self.kinds
    }

    fn rotations(&self, kind: PieceKind) -> usize {
        self.states[kind.index()].len()
    }

    fn offsets(&self, kind: PieceKind, rotation: usize) -> [CellOffset; 4] {
        let states = &self.states[kind.index()];
        assert!(!states.is_empty(), "piece kind {kind} is not in the catalog");
        states[rotation % states.len()]
    }
}

type StaticShapes = [(PieceKind, &'static [[CellOffset; 4]]); PieceKind::LEN];

#[rustfmt::skip]
const CLASSIC_SHAPES: StaticShapes = [
    (PieceKind::I, &[
        [(-1, 0), (0, 0), (1, 0), (2, 0)],
        [(1, -1), (1, 0), (1, 1), (1, 2)],
        [(-1, 1), (0, 1), (1, 1), (2, 1)],
        [(0, -1), (0, 0), (0, 1), (0, 2)],
    ]),
    (PieceKind::J, &[
        [(-1, 0), (0, 0), (1, 0), (-1, 1)],
        [(0, -1), (0, 0), (0, 1), (1, -1)],
        [(-1, 0), (0, 0), (1, 0), (1, -1)],
        [(0, -1), (0, 0), (0, 1), (-1, 1)],
    ]),
    (PieceKind::L, &[
        [(-1, 0), (0, 0), (1, 0), (1, 1)],
        [(0, -1), (0, 0), (0, 1), (1, 1)],
        [(-1, -1), (-1, 0), (0, 0), (1, 0)],
        [(-1, -1), (0, -1), (0, 0), (0, 1)],
    ]),
    (PieceKind::O, &[
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
    ]),
    (PieceKind::S, &[
        [(-1, 1), (0, 1), (0, 0), (1, 0)],
        [(0, -1), (0, 0), (1, 0), (1, 1)],
        [(-1, 1), (0, 1), (0, 0), (1, 0)],
        [(0, -1), (0, 0), (1, 0), (1, 1)],
    ]),
    (PieceKind::T, &[
        [(-1, 0), (0, 0), (1, 0), (0, 1)],
        [(0, -1), (0, 0), (0, 1), (1, 0)],
        [(-1, 0), (0, 0), (1, 0), (0, -1)],
        [(0, -1), (0, 0), (0, 1), (-1, 0)],
    ]),
    (PieceKind::Z, &[
        [(-1, 0), (0, 0), (0, 1), (1, 1)],
        [(1, -1), (1, 0), (0, 0), (0, 1)],
        [(-1, 0), (0, 0), (0, 1), (1, 1)],
        [(1, -1), (1, 0), (0, 0), (0, 1)],
    ]),
];

#[rustfmt::skip]
const SRS_SHAPES: StaticShapes = [
    (PieceKind::I, &[
        [(-1, 0), (0, 0), (1, 0), (2, 0)],
        [(1, -1), (1, 0), (1, 1), (1, 2)],
        [(-1, 1), (0, 1), (1, 1), (2, 1)],
        [(0, -1), (0, 0), (0, 1), (0, 2)],
    ]),
    (PieceKind::O, &[
        [(0, 0), (1, 0), (0, 1), (1, 1)],
    ]),
    (PieceKind::T, &[
        [(0, 0), (-1, 0), (1, 0), (0, 1)],
        [(0, 0), (0, -1), (0, 1), (1, 0)],
        [(0, 0), (-1, 0), (1, 0), (0, -1)],
        [(0, 0), (0, -1), (0, 1), (-1, 0)],
    ]),
    (PieceKind::S, &[
        [(0, 0), (1, 0), (-1, 1), (0, 1)],
        [(0, 0), (0, -1), (1, 0), (1, 1)],
    ]),
    (PieceKind::Z, &[
        [(0, 0), (-1, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, -1)],
    ]),
    (PieceKind::J, &[
        [(0, 0), (-1, 0), (1, 0), (-1, 1)],
        [(0, 0), (0, -1), (0, 1), (1, 1)],
        [(0, 0), (-1, 0), (1, 0), (1, -1)],
        [(0, 0), (0, -1), (0, 1), (-1, -1)],
    ]),
    (PieceKind::L, &[
        [(0, 0), (1, 0), (-1, 0), (1, 1)],
        [(0, 0), (0, -1), (0, 1), (1, -1)],
        [(0, 0), (1, 0), (-1, 0), (-1, -1)],
        [(0, 0), (0, -1), (0, 1), (1, 1)],
    ]),
];
