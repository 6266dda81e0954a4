//! Planets and the factory that explores them.

use crate::error::{HarvestError, Result};
use crate::names::NameAllocator;
use crate::resource::{Resource, ResourceHandle, ResourceSnapshot};
use harvest_core::Catalog;
use harvest_econ as econ;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;
use tracing::{debug, info};

/// Planet identifier, e.g. "KE0001".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlanetId(pub String);

impl Borrow<str> for PlanetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id made of the first two letters of `name` and a zero-padded sequence.
pub fn planet_id(name: &str, sequence: u32) -> PlanetId {
    let mut prefix: String = name
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    while prefix.chars().count() < 2 {
        prefix.push('X');
    }
    PlanetId(format!("{prefix}{sequence:04}"))
}

/// A tier-scoped planet owning the deposits spawned on it.
#[derive(Debug)]
pub struct Planet {
    id: PlanetId,
    name: String,
    tier: u32,
    resources: Vec<ResourceHandle>,
    spawned: bool,
}

impl Planet {
    /// An empty planet; call [`Planet::spawn_resources`] once to populate it.
    pub fn new(id: PlanetId, name: impl Into<String>, tier: u32) -> Self {
        Self {
            id,
            name: name.into(),
            tier,
            resources: Vec::new(),
            spawned: false,
        }
    }

    /// Rebuild a planet from persisted deposits.
    pub fn restore(
        id: PlanetId,
        name: impl Into<String>,
        tier: u32,
        resources: Vec<Resource>,
    ) -> Self {
        let spawned = !resources.is_empty();
        Self {
            id,
            name: name.into(),
            tier,
            resources: resources.into_iter().map(ResourceHandle::new).collect(),
            spawned,
        }
    }

    pub fn id(&self) -> &PlanetId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn resources(&self) -> &[ResourceHandle] {
        &self.resources
    }

    /// Deposit of `material` on this planet, if one spawned.
    pub fn resource(&self, material: &str) -> Option<&ResourceHandle> {
        self.resources
            .iter()
            .find(|r| r.lock().material_id().as_str() == material)
    }

    /// Roll every catalog material against this planet's tier.
    ///
    /// Runs at most once per planet; the planet is left untouched on error.
    pub fn spawn_resources<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Result<usize> {
        if self.spawned {
            return Err(HarvestError::ResourcesAlreadySpawned(self.id.0.clone()));
        }
        let spawned = self.roll(catalog, rng)?;
        self.spawned = true;
        Ok(spawned)
    }

    /// Spawn resources on a planet persisted without any.
    pub fn backfill_resources<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Result<usize> {
        if !self.resources.is_empty() {
            return Ok(0);
        }
        let spawned = self.roll(catalog, rng)?;
        self.spawned = true;
        Ok(spawned)
    }

    fn roll<R: Rng + ?Sized>(&mut self, catalog: &Catalog, rng: &mut R) -> Result<usize> {
        let mut fresh = Vec::new();
        for (material, spec) in &catalog.materials {
            let p = econ::spawn_probability(self.tier, spec.min_tier);
            if p <= 0.0 {
                continue;
            }
            if p >= 1.0 || rng.gen_bool(p) {
                let resource =
                    Resource::new(material.clone(), spec, self.tier, &catalog.engine, &mut *rng)?;
                debug!(planet = %self.id, %material, units = resource.initial_units(), "resource spawned");
                fresh.push(ResourceHandle::new(resource));
            }
        }
        let count = fresh.len();
        self.resources.extend(fresh);
        Ok(count)
    }

    pub fn snapshot(&self) -> Result<PlanetSnapshot> {
        let resources = self
            .resources
            .iter()
            .map(ResourceHandle::snapshot)
            .collect::<Result<Vec<_>>>()?;
        Ok(PlanetSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            tier: self.tier,
            resources,
        })
    }
}

/// Plain view of a planet for the service layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanetSnapshot {
    pub id: PlanetId,
    pub name: String,
    pub tier: u32,
    pub resources: Vec<ResourceSnapshot>,
}

/// Mints planets: owns the name supply, the id sequence and a seeded RNG.
#[derive(Debug)]
pub struct PlanetFactory<'c> {
    catalog: &'c Catalog,
    names: NameAllocator,
    rng: ChaCha8Rng,
    sequence: u32,
}

impl<'c> PlanetFactory<'c> {
    pub fn new(catalog: &'c Catalog, seed: u64) -> Result<Self> {
        Ok(Self {
            catalog,
            names: NameAllocator::new(&catalog.planet_names, seed)?,
            rng: ChaCha8Rng::seed_from_u64(seed.rotate_left(32) ^ 0x5eed),
            sequence: 0,
        })
    }

    /// Continue numbering after `sequence` ids were already issued.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Create a new planet of `tier` with its resources spawned.
    pub fn explore(&mut self, tier: u32) -> Result<Planet> {
        let name = self.names.next_name();
        self.sequence = self.sequence.saturating_add(1);
        let mut planet = Planet::new(planet_id(&name, self.sequence), name, tier);
        let count = planet.spawn_resources(self.catalog, &mut self.rng)?;
        info!(planet = %planet.id, name = %planet.name, tier, resources = count, "planet explored");
        Ok(planet)
    }
}
