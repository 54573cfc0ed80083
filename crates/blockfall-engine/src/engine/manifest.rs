use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ShapeCatalog, ShapeTable, validate_catalog};

use super::{
    config::GameConfig,
    generator::{PieceGenerator, SevenBag, UniformGenerator},
    rules::{DefaultRuleSet, RuleSet},
};

/// Built-in rule sets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum RuleSetId {
    #[default]
    #[display("default")]
    Default,
}

/// Built-in shape catalogs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeCatalogId {
    #[default]
    #[display("classic")]
    Classic,
    #[display("srs")]
    Srs,
}

/// Built-in piece generators.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorId {
    #[default]
    #[display("seven-bag")]
    SevenBag,
    #[display("uniform")]
    Uniform,
}

/// Names the rule set, shape catalog and piece generator of a session.
///
/// Identifiers are resolved once through [`Manifest::build`]; unknown names
/// are rejected when the manifest is parsed.
///
/// # Example
///
/// ```
/// use blockfall_engine::{GameConfig, GeneratorId, Manifest, ShapeCatalogId};
///
/// let manifest: Manifest =
///     serde_json::from_str(r#"{ "shapes": "srs", "generator": "uniform" }"#).unwrap();
/// assert_eq!(manifest.shapes, ShapeCatalogId::Srs);
/// assert_eq!(manifest.generator, GeneratorId::Uniform);
///
/// let services = manifest.build(&GameConfig::default()).unwrap();
/// assert_eq!(services.catalog.kinds().len(), 7);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    pub rules: RuleSetId,
    pub shapes: ShapeCatalogId,
    pub generator: GeneratorId,
}

/// The pluggable collaborators of a session, resolved from a [`Manifest`].
#[derive(Debug)]
pub struct SessionServices {
    pub catalog: Rc<dyn ShapeCatalog>,
    pub rules: Rc<dyn RuleSet>,
    pub generator: Box<dyn PieceGenerator>,
}

impl Manifest {
    /// Instantiates the named implementations.
    ///
    /// The generator is seeded from `config.seed` when present, and from
    /// the thread RNG otherwise.
    pub fn build(&self, config: &GameConfig) -> Result<SessionServices, ConfigError> {
        let catalog: Rc<dyn ShapeCatalog> = match self.shapes {
            ShapeCatalogId::Classic => Rc::new(ShapeTable::classic()),
            ShapeCatalogId::Srs => Rc::new(ShapeTable::srs()),
        };
        validate_catalog(&*catalog)?;

        let rules: Rc<dyn RuleSet> = match self.rules {
            RuleSetId::Default => Rc::new(DefaultRuleSet::new(
                config.timing.clone(),
                config.scoring.clone(),
            )?),
        };

        let generator: Box<dyn PieceGenerator> = match (self.generator, config.seed) {
            (GeneratorId::SevenBag, Some(seed)) => Box::new(SevenBag::with_seed(&*catalog, seed)),
            (GeneratorId::SevenBag, None) => Box::new(SevenBag::new(&*catalog)),
            (GeneratorId::Uniform, Some(seed)) => {
                Box::new(UniformGenerator::with_seed(&*catalog, seed))
            }
            (GeneratorId::Uniform, None) => Box::new(UniformGenerator::new(&*catalog)),
        };

        log::debug!(
            "resolved manifest: rules={}, shapes={}, generator={}",
            self.rules,
            self.shapes,
            self.generator
        );
        Ok(SessionServices {
            catalog,
            rules,
            generator,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{PieceKind, PieceSeed, TimingConfig};

    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest: Manifest = serde_json::from_str("{}").unwrap();

        assert_eq!(manifest, Manifest::default());
        assert_eq!(manifest.rules, RuleSetId::Default);
        assert_eq!(manifest.shapes, ShapeCatalogId::Classic);
        assert_eq!(manifest.generator, GeneratorId::SevenBag);
    }

    #[test]
    fn test_identifiers_round_trip_through_display() {
        for (id, name) in [
            (ShapeCatalogId::Classic, "classic"),
            (ShapeCatalogId::Srs, "srs"),
        ] {
            assert_eq!(id.to_string(), name);
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{name}\""));
        }
        assert_eq!(GeneratorId::SevenBag.to_string(), "seven-bag");
        assert_eq!(
            serde_json::from_str::<GeneratorId>("\"seven-bag\"").unwrap(),
            GeneratorId::SevenBag
        );
    }

    #[test]
    fn test_unknown_identifier_is_rejected() {
        assert!(serde_json::from_str::<Manifest>(r#"{ "shapes": "pentomino" }"#).is_err());
        assert!(serde_json::from_str::<Manifest>(r#"{ "rules": "nes" }"#).is_err());
        assert!(serde_json::from_str::<Manifest>(r#"{ "sound": "on" }"#).is_err());
    }

    #[test]
    fn test_build_selects_catalog() {
        let config = GameConfig::default();

        let srs = Manifest {
            shapes: ShapeCatalogId::Srs,
            ..Manifest::default()
        }
        .build(&config)
        .unwrap();
        assert_eq!(srs.catalog.rotations(PieceKind::O), 1);

        let classic = Manifest::default().build(&config).unwrap();
        assert_eq!(classic.catalog.rotations(PieceKind::O), 4);
    }

    #[test]
    fn test_build_uses_config_timing_and_scoring() {
        let mut config = GameConfig::default();
        config.timing.base_fall_ms = 1000;
        config.scoring = [(1, 7)].into_iter().collect();

        let services = Manifest::default().build(&config).unwrap();
        assert_eq!(services.rules.fall_interval_ms(0), 1000);
        assert_eq!(services.rules.score(1, 0), 7);
    }

    #[test]
    fn test_build_rejects_bad_timing() {
        let config = GameConfig {
            timing: TimingConfig {
                min_fall_ms: 0,
                ..TimingConfig::default()
            },
            ..GameConfig::default()
        };
        assert!(Manifest::default().build(&config).is_err());
    }

    #[test]
    fn test_seeded_build_is_deterministic() {
        let config = GameConfig {
            seed: Some(PieceSeed::from(42)),
            ..GameConfig::default()
        };
        for generator in [GeneratorId::SevenBag, GeneratorId::Uniform] {
            let manifest = Manifest {
                generator,
                ..Manifest::default()
            };
            let mut a = manifest.build(&config).unwrap().generator;
            let mut b = manifest.build(&config).unwrap().generator;
            for _ in 0..20 {
                assert_eq!(a.next(), b.next());
            }
        }
    }
}
