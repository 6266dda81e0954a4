//! Error types for the harvesting engine.

use harvest_core::{CatalogError, MaterialId};
use harvest_econ::EconError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using [`HarvestError`].
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Every failure the engine can report. None of them leave an entity
/// partially mutated.
#[derive(Debug, Error, PartialEq)]
pub enum HarvestError {
    /// Catalog lookup or decay law construction failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Balancing curve evaluation failed.
    #[error(transparent)]
    Econ(#[from] EconError),

    /// Resource requested below the material's floor tier.
    #[error("{material} cannot exist below tier {min_tier} (requested {tier})")]
    TierBelowMinimum {
        material: MaterialId,
        tier: u32,
        min_tier: u32,
    },

    /// A collection must advance at least one epoch.
    #[error("cannot collect {0} epochs")]
    NotCollectable(u64),

    /// No feasible non-negative epoch advance remains.
    #[error("{0} is exhausted")]
    ResourceExhausted(MaterialId),

    /// Material not in the collector's allow-list.
    #[error("{collector} cannot harvest {material}")]
    IncompatibleResource { collector: String, material: MaterialId },

    /// Collector tier too low for the resource.
    #[error("collector must be tier {required} to harvest {material} (currently {tier})")]
    InsufficientTier {
        material: MaterialId,
        tier: u32,
        required: u32,
    },

    /// Operation needs a bound resource.
    #[error("no resource installed")]
    NoResourceInstalled,

    /// Collector already holds a resource.
    #[error("collector already has {0} installed")]
    CollectorOccupied(MaterialId),

    /// Resource already bound to another collector.
    #[error("{0} is already being harvested")]
    ResourceInUse(MaterialId),

    /// Collection requested before the collector was ever started.
    #[error("collector has to be started before collecting")]
    NotStarted,

    /// Collector is already harvesting.
    #[error("collector is already running")]
    AlreadyRunning,

    /// No collection has happened since install.
    #[error("nothing collected yet")]
    NoCollectionYet,

    /// Auto-stop must allow at least one epoch.
    #[error("auto stop must be >= 1, got {0}")]
    InvalidAutoStop(u64),

    /// Planet resources were already generated.
    #[error("resources already spawned on {0}")]
    ResourcesAlreadySpawned(String),

    /// Balance does not cover a purchase.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// Planet id already owned by the company.
    #[error("planet {0} already exists")]
    DuplicatePlanet(String),

    /// Planet id not owned by the company.
    #[error("unknown planet: {0}")]
    UnknownPlanet(String),

    /// Collector id not owned by the company.
    #[error("unknown collector: {0}")]
    UnknownCollector(u64),
}
