#![deny(warnings)]

//! Core catalog models and invariants for the planet harvesting engine.
//!
//! This crate defines the serializable catalog the engine is configured with
//! (materials, collector types, planet name parts) together with the
//! [`DecayLaw`] value type and validation helpers that guarantee basic
//! invariants before any planet is explored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a material, e.g. "iron", "helium3".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub String);

impl MaterialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MaterialId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a collector type, e.g. "drill".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectorTypeId(pub String);

impl CollectorTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CollectorTypeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectorTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Law describing how a deposit depletes as epochs elapse.
///
/// Every law is non-increasing in the epoch. Only [`DecayLaw::Linear`] can
/// report a negative quantity, and callers must stay inside the domain where
/// it is non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DecayLawRepr", into = "DecayLawRepr")]
pub enum DecayLaw {
    /// `initial - epoch * factor`, factor > 0.
    Linear(f64),
    /// `initial * factor^epoch`, factor in [0, 1).
    Geometric(f64),
    /// `initial * exp(-epoch / factor)`, factor > 0.
    Exponential(f64),
}

impl DecayLaw {
    pub fn linear(factor: f64) -> Result<Self, CatalogError> {
        Self::Linear(factor).validated()
    }

    pub fn geometric(factor: f64) -> Result<Self, CatalogError> {
        Self::Geometric(factor).validated()
    }

    pub fn exponential(factor: f64) -> Result<Self, CatalogError> {
        Self::Exponential(factor).validated()
    }

    /// Build a law from its catalog name ("linear", "geometric", "exponential").
    pub fn from_name(name: &str, factor: f64) -> Result<Self, CatalogError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Self::linear(factor),
            "geometric" => Self::geometric(factor),
            "exponential" => Self::exponential(factor),
            _ => Err(CatalogError::UnknownDecayLaw(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::Geometric(_) => "geometric",
            Self::Exponential(_) => "exponential",
        }
    }

    pub fn factor(&self) -> f64 {
        match *self {
            Self::Linear(f) | Self::Geometric(f) | Self::Exponential(f) => f,
        }
    }

    /// Check the factor against the range the law is defined for.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let ok = match *self {
            Self::Linear(f) | Self::Exponential(f) => f.is_finite() && f > 0.0,
            Self::Geometric(f) => (0.0..1.0).contains(&f),
        };
        if ok {
            Ok(())
        } else {
            Err(CatalogError::InvalidDecayFactor {
                law: self.name(),
                factor: self.factor(),
            })
        }
    }

    fn validated(self) -> Result<Self, CatalogError> {
        self.validate()?;
        Ok(self)
    }

    /// Quantity left after `epoch` epochs from an `initial` quantity.
    pub fn remaining(&self, initial: f64, epoch: u64) -> f64 {
        let x = epoch as f64;
        match *self {
            Self::Linear(f) => initial - x * f,
            Self::Geometric(f) => initial * f.powf(x),
            Self::Exponential(f) => initial * (-x / f).exp(),
        }
    }
}

/// Wire shape of a decay law: `{ law: "linear", factor: 10.0 }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecayLawRepr {
    pub law: String,
    pub factor: f64,
}

impl TryFrom<DecayLawRepr> for DecayLaw {
    type Error = CatalogError;

    fn try_from(repr: DecayLawRepr) -> Result<Self, Self::Error> {
        Self::from_name(&repr.law, repr.factor)
    }
}

impl From<DecayLaw> for DecayLawRepr {
    fn from(law: DecayLaw) -> Self {
        Self {
            law: law.name().to_string(),
            factor: law.factor(),
        }
    }
}

/// Engine-wide tuning shared by every factory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Wall-clock seconds in one epoch at speed 1 (default: one hour).
    #[serde(default = "default_epoch_unit_secs")]
    pub epoch_unit_secs: u64,
    /// Bounds of the multiplier drawn once per resource to perturb its units.
    #[serde(default = "default_units_multiplier")]
    pub units_multiplier: [f64; 2],
}

fn default_epoch_unit_secs() -> u64 {
    3600
}

fn default_units_multiplier() -> [f64; 2] {
    [0.45, 0.55]
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            epoch_unit_secs: default_epoch_unit_secs(),
            units_multiplier: default_units_multiplier(),
        }
    }
}

/// A harvestable material as described by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// Display name.
    pub name: String,
    /// Lowest planet tier this material may appear on.
    pub min_tier: u32,
    /// Money earned per harvested unit.
    pub unit_price: Decimal,
    /// Experience earned per harvested unit.
    pub unit_xp: f64,
    /// Base quantity of a deposit at tier 0.
    pub init_units: f64,
    /// Per-tier multiplier applied to `init_units`.
    pub tier_units_upscale: f64,
    /// Decay law name.
    pub decay_function: String,
    /// Decay law factor.
    pub decay_factor: f64,
    /// Balancing delay in hours, carried for the service layer.
    #[serde(default)]
    pub balancing_delay: u32,
}

impl MaterialSpec {
    pub fn decay_law(&self) -> Result<DecayLaw, CatalogError> {
        DecayLaw::from_name(&self.decay_function, self.decay_factor)
    }
}

/// A collector machine type as described by the catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectorSpec {
    /// Display name.
    pub name: String,
    /// Purchase price.
    pub init_price: Decimal,
    /// Epochs per epoch unit at relative tier 0.
    pub init_speed: f64,
    /// Speed multiplier per relative tier.
    pub upgrade_upscale: f64,
    /// Price of the first upgrade.
    pub upgrade_init_price: Decimal,
    /// Upgrade price multiplier per tier.
    pub upgrade_price_upscale: f64,
    /// Cost of one epoch of harvesting at relative tier 0.
    pub cost_of_use: Decimal,
    /// Cost multiplier per relative tier.
    pub cost_of_use_price_upscale: f64,
    /// Materials this collector can harvest, with the minimum collector tier.
    pub resources: BTreeMap<MaterialId, u32>,
}

impl CollectorSpec {
    /// Minimum collector tier needed for `material`, or `None` if not allowed.
    pub fn min_tier_for(&self, material: &str) -> Option<u32> {
        self.resources.get(material).copied()
    }
}

/// Parts combined into planet names ("name modifier").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlanetNames {
    pub names: Vec<String>,
    pub modifiers: Vec<String>,
}

/// The full catalog the engine is configured with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub engine: EngineSettings,
    pub materials: BTreeMap<MaterialId, MaterialSpec>,
    pub collectors: BTreeMap<CollectorTypeId, CollectorSpec>,
    pub planet_names: PlanetNames,
}

impl Catalog {
    /// Parse and validate a catalog from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            serde_yaml::from_str(text).map_err(|e| CatalogError::Parse(e.to_string()))?;
        validate_catalog(&catalog)?;
        Ok(catalog)
    }

    pub fn material(&self, id: &str) -> Result<&MaterialSpec, CatalogError> {
        self.materials
            .get(id)
            .ok_or_else(|| CatalogError::UnknownMaterial(id.to_string()))
    }

    pub fn collector(&self, id: &str) -> Result<&CollectorSpec, CatalogError> {
        self.collectors
            .get(id)
            .ok_or_else(|| CatalogError::UnknownCollector(id.to_string()))
    }
}

/// Validation errors for catalog invariants.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Factor outside the range the decay law is defined for.
    #[error("invalid {law} decay factor: {factor}")]
    InvalidDecayFactor { law: &'static str, factor: f64 },
    /// Decay law name not recognized.
    #[error("unknown decay law: {0}")]
    UnknownDecayLaw(String),
    /// Material id absent from the catalog.
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    /// Collector type id absent from the catalog.
    #[error("unknown collector type: {0}")]
    UnknownCollector(String),
    /// Numeric field must be finite and within range.
    #[error("invalid numeric value for {0}")]
    InvalidNumber(String),
    /// Monetary value must be non-negative.
    #[error("negative monetary value for {0}")]
    NegativeMoney(String),
    /// Planet names or modifiers list is empty.
    #[error("planet name pool is empty")]
    EmptyNamePool,
    /// Epoch unit must be at least one second.
    #[error("epoch unit must be > 0 seconds")]
    InvalidEpochUnit,
    /// Units multiplier bounds must be finite, positive and ordered.
    #[error("invalid units multiplier range [{0}, {1}]")]
    InvalidMultiplierRange(f64, f64),
    /// YAML could not be parsed into a catalog.
    #[error("catalog parse error: {0}")]
    Parse(String),
}

fn check_positive(value: f64, field: impl fmt::Display) -> Result<(), CatalogError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidNumber(field.to_string()))
    }
}

fn check_money(value: Decimal, field: impl fmt::Display) -> Result<(), CatalogError> {
    if value < Decimal::ZERO {
        return Err(CatalogError::NegativeMoney(field.to_string()));
    }
    Ok(())
}

/// Validate engine-wide settings.
pub fn validate_engine_settings(s: &EngineSettings) -> Result<(), CatalogError> {
    if s.epoch_unit_secs == 0 {
        return Err(CatalogError::InvalidEpochUnit);
    }
    let [low, high] = s.units_multiplier;
    if !(low.is_finite() && high.is_finite()) || low <= 0.0 || low > high {
        return Err(CatalogError::InvalidMultiplierRange(low, high));
    }
    Ok(())
}

/// Validate a material entry.
pub fn validate_material(id: &MaterialId, m: &MaterialSpec) -> Result<(), CatalogError> {
    m.decay_law()?;
    check_money(m.unit_price, format_args!("{id}.unit_price"))?;
    if !m.unit_xp.is_finite() || m.unit_xp < 0.0 {
        return Err(CatalogError::InvalidNumber(format!("{id}.unit_xp")));
    }
    check_positive(m.init_units, format_args!("{id}.init_units"))?;
    check_positive(m.tier_units_upscale, format_args!("{id}.tier_units_upscale"))?;
    Ok(())
}

/// Validate a collector type, including references to known materials.
pub fn validate_collector(
    id: &CollectorTypeId,
    c: &CollectorSpec,
    materials: &BTreeMap<MaterialId, MaterialSpec>,
) -> Result<(), CatalogError> {
    check_money(c.init_price, format_args!("{id}.init_price"))?;
    check_money(c.upgrade_init_price, format_args!("{id}.upgrade_init_price"))?;
    check_money(c.cost_of_use, format_args!("{id}.cost_of_use"))?;
    check_positive(c.init_speed, format_args!("{id}.init_speed"))?;
    check_positive(c.upgrade_upscale, format_args!("{id}.upgrade_upscale"))?;
    check_positive(
        c.upgrade_price_upscale,
        format_args!("{id}.upgrade_price_upscale"),
    )?;
    check_positive(
        c.cost_of_use_price_upscale,
        format_args!("{id}.cost_of_use_price_upscale"),
    )?;
    for material in c.resources.keys() {
        if !materials.contains_key(material) {
            return Err(CatalogError::UnknownMaterial(material.0.clone()));
        }
    }
    Ok(())
}

/// Validate the whole catalog, including cross-references.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), CatalogError> {
    validate_engine_settings(&catalog.engine)?;
    for (id, m) in &catalog.materials {
        validate_material(id, m)?;
    }
    for (id, c) in &catalog.collectors {
        validate_collector(id, c, &catalog.materials)?;
    }
    let names = &catalog.planet_names;
    if names.names.is_empty() || names.modifiers.is_empty() {
        return Err(CatalogError::EmptyNamePool);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CATALOG: &str = r#"
engine:
  epoch_unit_secs: 3600
materials:
  iron:
    name: Iron
    min_tier: 0
    unit_price: "2.00"
    unit_xp: 1.5
    init_units: 100
    tier_units_upscale: 1.2
    decay_function: linear
    decay_factor: 10
  helium3:
    name: Helium-3
    min_tier: 2
    unit_price: "12.50"
    unit_xp: 4
    init_units: 40
    tier_units_upscale: 1.1
    decay_function: exponential
    decay_factor: 24
collectors:
  drill:
    name: Drill
    init_price: "100"
    init_speed: 1
    upgrade_upscale: 1.5
    upgrade_init_price: "50"
    upgrade_price_upscale: 2
    cost_of_use: "0.50"
    cost_of_use_price_upscale: 1.1
    resources:
      iron: 0
planet_names:
  names: [Kepler, Vega]
  modifiers: [Prime, Minor]
"#;

    #[test]
    fn shipped_catalog_is_valid() {
        let catalog =
            Catalog::from_yaml_str(include_str!("../../../assets/catalog.yaml")).unwrap();
        assert_eq!(catalog.engine.units_multiplier, [0.45, 0.55]);
        assert!(catalog.materials.len() >= 5);
        for spec in catalog.collectors.values() {
            assert!(!spec.resources.is_empty());
        }
        assert!(catalog.material("helium3").unwrap().balancing_delay > 0);
    }

    #[test]
    fn linear_law_points() {
        let law = DecayLaw::linear(10.0).unwrap();
        assert_eq!(law.remaining(100.0, 0), 100.0);
        assert_eq!(law.remaining(100.0, 5), 50.0);
        assert_eq!(law.remaining(100.0, 10), 0.0);
        assert!(law.remaining(100.0, 11) < 0.0);
    }

    #[test]
    fn geometric_law_points() {
        let law = DecayLaw::geometric(0.5).unwrap();
        assert_eq!(law.remaining(100.0, 1), 50.0);
        assert_eq!(law.remaining(100.0, 2), 25.0);
    }

    #[test]
    fn exponential_law_points() {
        let law = DecayLaw::exponential(10.0).unwrap();
        assert!((law.remaining(100.0, 10) - 36.7879).abs() < 1e-3);
    }

    #[test]
    fn invalid_factors_rejected() {
        assert!(matches!(
            DecayLaw::linear(0.0),
            Err(CatalogError::InvalidDecayFactor { law: "linear", .. })
        ));
        assert!(DecayLaw::geometric(1.0).is_err());
        assert!(DecayLaw::geometric(-0.1).is_err());
        assert!(DecayLaw::exponential(-2.0).is_err());
        assert!(DecayLaw::linear(f64::NAN).is_err());
        assert!(DecayLaw::geometric(0.0).is_ok());
    }

    #[test]
    fn unknown_law_rejected() {
        assert_eq!(
            DecayLaw::from_name("quadratic", 2.0),
            Err(CatalogError::UnknownDecayLaw("quadratic".to_string()))
        );
        assert_eq!(
            DecayLaw::from_name("Linear", 2.0),
            Ok(DecayLaw::Linear(2.0))
        );
    }

    #[test]
    fn decay_law_serde_validates() {
        let s = serde_json::to_string(&DecayLaw::Geometric(0.25)).unwrap();
        let back: DecayLaw = serde_json::from_str(&s).unwrap();
        assert_eq!(back, DecayLaw::Geometric(0.25));
        let bad: Result<DecayLaw, _> = serde_json::from_str(r#"{"law":"geometric","factor":2.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn catalog_parses_and_validates() {
        let catalog = Catalog::from_yaml_str(CATALOG).unwrap();
        assert_eq!(catalog.engine.epoch_unit_secs, 3600);
        assert_eq!(catalog.engine.units_multiplier, [0.45, 0.55]);
        let iron = catalog.material("iron").unwrap();
        assert_eq!(iron.unit_price, Decimal::new(200, 2));
        assert_eq!(iron.decay_law().unwrap(), DecayLaw::Linear(10.0));
        let drill = catalog.collector("drill").unwrap();
        assert_eq!(drill.min_tier_for("iron"), Some(0));
        assert_eq!(drill.min_tier_for("helium3"), None);
        assert_eq!(
            catalog.material("gold").unwrap_err(),
            CatalogError::UnknownMaterial("gold".to_string())
        );
    }

    #[test]
    fn catalog_rejects_bad_decay() {
        let text = CATALOG.replace("decay_factor: 10", "decay_factor: -1");
        assert!(matches!(
            Catalog::from_yaml_str(&text),
            Err(CatalogError::InvalidDecayFactor { .. })
        ));
    }

    #[test]
    fn catalog_rejects_unknown_collector_material() {
        let text = CATALOG.replace("      iron: 0", "      gold: 0");
        assert_eq!(
            Catalog::from_yaml_str(&text).unwrap_err(),
            CatalogError::UnknownMaterial("gold".to_string())
        );
    }

    #[test]
    fn catalog_rejects_empty_names() {
        let text = CATALOG.replace("[Kepler, Vega]", "[]");
        assert_eq!(
            Catalog::from_yaml_str(&text).unwrap_err(),
            CatalogError::EmptyNamePool
        );
    }

    #[test]
    fn engine_settings_validation() {
        let mut s = EngineSettings::default();
        assert!(validate_engine_settings(&s).is_ok());
        s.epoch_unit_secs = 0;
        assert_eq!(
            validate_engine_settings(&s),
            Err(CatalogError::InvalidEpochUnit)
        );
        s.epoch_unit_secs = 60;
        s.units_multiplier = [0.6, 0.4];
        assert!(validate_engine_settings(&s).is_err());
    }

    proptest! {
        #[test]
        fn geometric_never_negative(f in 0.0f64..0.999, init in 0.0f64..1e6, epoch in 0u64..10_000) {
            let law = DecayLaw::geometric(f).unwrap();
            prop_assert!(law.remaining(init, epoch) >= 0.0);
        }

        #[test]
        fn exponential_never_negative(f in 0.01f64..1e4, init in 0.0f64..1e6, epoch in 0u64..10_000) {
            let law = DecayLaw::exponential(f).unwrap();
            prop_assert!(law.remaining(init, epoch) >= 0.0);
        }

        #[test]
        fn laws_are_non_increasing(f in 0.01f64..0.99, init in 1.0f64..1e6, epoch in 0u64..5_000) {
            for law in [DecayLaw::Linear(f), DecayLaw::Geometric(f), DecayLaw::Exponential(f)] {
                prop_assert!(law.remaining(init, epoch + 1) <= law.remaining(init, epoch));
            }
        }
    }
}
