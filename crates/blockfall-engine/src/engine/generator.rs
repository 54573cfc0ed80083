use std::{
    fmt::{self, Write as _},
    str::FromStr,
};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::{IndexedRandom as _, SliceRandom as _},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{PieceKind, ShapeCatalog};

/// Randomizer producing the kind of each upcoming piece.
pub trait PieceGenerator: fmt::Debug {
    /// Every kind this generator can produce.
    fn kinds(&self) -> &[PieceKind];

    fn next(&mut self) -> PieceKind;
}

/// Seed for deterministic piece generation.
///
/// This is a 128-bit (16-byte) seed used to initialize the random number
/// generator of a [`PieceGenerator`]. Using the same seed produces the same
/// sequence of pieces, which makes sessions reproducible for debugging and
/// testing.
///
/// Serialized as a 32-character hex string.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceGenerator as _, PieceSeed, SevenBag, ShapeTable};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let catalog = ShapeTable::classic();
///
/// let mut a = SevenBag::with_seed(&catalog, seed);
/// let mut b = SevenBag::with_seed(&catalog, seed);
/// assert_eq!(a.next(), b.next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl From<u128> for PieceSeed {
    fn from(value: u128) -> Self {
        Self(value.to_be_bytes())
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse::<Self>().map_err(serde::de::Error::custom)
    }
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseSeedError::InvalidLength { len: s.len() });
        }
        let num = u128::from_str_radix(s, 16).map_err(|e| ParseSeedError::InvalidDigits {
            text: s.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self(num.to_be_bytes()))
    }
}

/// Error parsing a [`PieceSeed`] from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseSeedError {
    #[display("invalid hex: expected 32 characters, got {len}")]
    InvalidLength { len: usize },
    #[display("invalid hex: {text} ({reason})")]
    InvalidDigits { text: String, reason: String },
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// 7-bag randomizer.
///
/// The pool starts empty. Whenever it runs out it is refilled with one copy
/// of every kind in the catalog and shuffled, then kinds are drawn by
/// removal. Every kind therefore appears exactly once per refill cycle.
/// Nothing prevents the last kind of one cycle from matching the first kind
/// of the next.
#[derive(Debug, Clone)]
pub struct SevenBag {
    rng: Pcg32,
    kinds: Vec<PieceKind>,
    pool: Vec<PieceKind>,
}

impl SevenBag {
    /// Creates a bag over the catalog's kinds with a random seed.
    #[must_use]
    pub fn new(catalog: &dyn ShapeCatalog) -> Self {
        Self::with_seed(catalog, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(catalog: &dyn ShapeCatalog, seed: PieceSeed) -> Self {
        let kinds = catalog.kinds().to_vec();
        Self {
            rng: Pcg32::from_seed(seed.0),
            pool: Vec::with_capacity(kinds.len()),
            kinds,
        }
    }

    /// Number of kinds left before the next refill.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    fn refill(&mut self) {
        self.pool.extend_from_slice(&self.kinds);
        self.pool.shuffle(&mut self.rng);
    }
}

impl PieceGenerator for SevenBag {
    fn kinds(&self) -> &[PieceKind] {
        &self.kinds
    }

    fn next(&mut self) -> PieceKind {
        if self.pool.is_empty() {
            self.refill();
        }
        self.pool
            .pop()
            .expect("shape catalog should provide at least one kind")
    }
}

/// Memoryless randomizer: every draw picks a kind uniformly.
#[derive(Debug, Clone)]
pub struct UniformGenerator {
    rng: Pcg32,
    kinds: Vec<PieceKind>,
}

impl UniformGenerator {
    #[must_use]
    pub fn new(catalog: &dyn ShapeCatalog) -> Self {
        Self::with_seed(catalog, rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(catalog: &dyn ShapeCatalog, seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
            kinds: catalog.kinds().to_vec(),
        }
    }
}

impl PieceGenerator for UniformGenerator {
    fn kinds(&self) -> &[PieceKind] {
        &self.kinds
    }

    fn next(&mut self) -> PieceKind {
        *self
            .kinds
            .choose(&mut self.rng)
            .expect("shape catalog should provide at least one kind")
    }
}

#[cfg(test)]
mod tests {
    use crate::ShapeTable;

    use super::*;

    fn draw(generator: &mut dyn PieceGenerator, n: usize) -> Vec<PieceKind> {
        (0..n).map(|_| generator.next()).collect()
    }

    #[test]
    fn test_each_cycle_contains_every_kind_once() {
        let catalog = ShapeTable::classic();
        let mut bag = SevenBag::with_seed(&catalog, PieceSeed::from(0x1234_5678_9abc_def0));

        for _ in 0..20 {
            let mut cycle = draw(&mut bag, PieceKind::LEN);
            cycle.sort();
            assert_eq!(cycle, PieceKind::ALL);
            assert_eq!(bag.remaining(), 0);
        }
    }

    #[test]
    fn test_no_spacing_guarantee_across_cycles() {
        // Some seed must produce the same kind at the end of one cycle and
        // the start of the next.
        let catalog = ShapeTable::classic();
        let repeated = (0..500_u128).any(|seed| {
            let mut bag = SevenBag::with_seed(&catalog, PieceSeed::from(seed));
            let pieces = draw(&mut bag, 2 * PieceKind::LEN);
            pieces[PieceKind::LEN - 1] == pieces[PieceKind::LEN]
        });
        assert!(repeated);
    }

    #[test]
    fn test_bag_follows_catalog_kinds() {
        let catalog = ShapeTable::new([
            (PieceKind::O, vec![vec![(0, 0), (1, 0), (0, 1), (1, 1)]]),
            (PieceKind::I, vec![vec![(-1, 0), (0, 0), (1, 0), (2, 0)]]),
        ])
        .unwrap();
        let mut bag = SevenBag::with_seed(&catalog, PieceSeed::from(7));

        for _ in 0..10 {
            let mut cycle = draw(&mut bag, 2);
            cycle.sort();
            assert_eq!(cycle, [PieceKind::I, PieceKind::O]);
        }
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let catalog = ShapeTable::classic();
        let seed = PieceSeed::from(0x1122_3344_5566_7788_99aa_bbcc_ddee_ff00);

        let mut a = SevenBag::with_seed(&catalog, seed);
        let mut b = SevenBag::with_seed(&catalog, seed);
        assert_eq!(draw(&mut a, 30), draw(&mut b, 30));

        let mut a = UniformGenerator::with_seed(&catalog, seed);
        let mut b = UniformGenerator::with_seed(&catalog, seed);
        assert_eq!(draw(&mut a, 30), draw(&mut b, 30));
    }

    #[test]
    fn test_uniform_draws_from_catalog() {
        let catalog = ShapeTable::srs();
        let mut generator = UniformGenerator::with_seed(&catalog, PieceSeed::from(99));
        for kind in draw(&mut generator, 100) {
            assert!(catalog.kinds().contains(&kind));
        }
    }

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = PieceSeed::from(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210);
            let serialized = serde_json::to_string(&seed).unwrap();

            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");

            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
        }

        #[test]
        fn test_known_value_all_zeros() {
            let serialized = serde_json::to_string(&PieceSeed::from(0)).unwrap();
            assert_eq!(serialized, "\"00000000000000000000000000000000\"");
        }

        #[test]
        fn test_deserialize_uppercase_hex() {
            let json = "\"0123456789ABCDEFFEDCBA9876543210\"";
            let deserialized: PieceSeed = serde_json::from_str(json).unwrap();
            assert_eq!(
                deserialized,
                PieceSeed::from(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210)
            );
        }

        #[test]
        fn test_error_invalid_length_or_digits() {
            for json in [
                "\"\"",
                "\"0123456789abcdef0123456789abcde\"",
                "\"0123456789abcdef0123456789abcdef0\"",
                "\"ghijklmnopqrstuvwxyzghijklmnopqr\"",
            ] {
                let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{json}: {err}");
            }
        }

        #[test]
        fn test_parse_from_str() {
            let seed: PieceSeed = "000000000000000000000000000000ff".parse().unwrap();
            assert_eq!(seed, PieceSeed::from(255));
            assert_eq!(
                "ff".parse::<PieceSeed>(),
                Err(ParseSeedError::InvalidLength { len: 2 })
            );
        }

        #[test]
        fn test_serialize_deserialize_preserves_piece_generation() {
            let catalog = ShapeTable::classic();
            let seed: PieceSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let restored: PieceSeed = serde_json::from_str(&serialized).unwrap();

            let mut a = SevenBag::with_seed(&catalog, seed);
            let mut b = SevenBag::with_seed(&catalog, restored);
            assert_eq!(draw(&mut a, 20), draw(&mut b, 20));
        }
    }
}
