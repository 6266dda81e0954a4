//! Depletable deposits of one material on one planet.

use crate::error::{HarvestError, Result};
use harvest_core::{CatalogError, DecayLaw, EngineSettings, MaterialId, MaterialSpec};
use harvest_econ as econ;
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Outcome of advancing a resource by some epochs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Harvest {
    /// Epochs the caller asked for.
    pub requested: u64,
    /// Epochs actually applied, at most `requested`.
    pub epochs: u64,
    /// Units harvested by this step.
    pub units: f64,
}

impl Harvest {
    /// True when the deposit could not absorb every requested epoch.
    pub fn is_clamped(&self) -> bool {
        self.epochs < self.requested
    }
}

/// A deposit bound to a decay law and an epoch counter.
///
/// Invariant: `decay_law.remaining(initial_units, epoch) >= 0`.
#[derive(Clone, Debug)]
pub struct Resource {
    material_id: MaterialId,
    name: String,
    tier: u32,
    unit_price: Decimal,
    unit_xp: f64,
    initial_units: f64,
    decay_law: DecayLaw,
    epoch: u64,
    installed: bool,
}

fn check_tier(material_id: &MaterialId, spec: &MaterialSpec, tier: u32) -> Result<()> {
    if tier < spec.min_tier {
        return Err(HarvestError::TierBelowMinimum {
            material: material_id.clone(),
            tier,
            min_tier: spec.min_tier,
        });
    }
    Ok(())
}

impl Resource {
    /// Create a fresh deposit at `tier`, drawing its size multiplier from `rng`.
    pub fn new<R: Rng + ?Sized>(
        material_id: MaterialId,
        spec: &MaterialSpec,
        tier: u32,
        settings: &EngineSettings,
        rng: &mut R,
    ) -> Result<Self> {
        check_tier(&material_id, spec, tier)?;
        let multiplier = econ::draw_units_multiplier(rng, settings.units_multiplier)?;
        let initial_units =
            econ::initial_units(spec.init_units, spec.tier_units_upscale, tier, multiplier);
        Self::restore(material_id, spec, tier, initial_units, 0)
    }

    /// Rebuild a deposit from persisted values.
    pub fn restore(
        material_id: MaterialId,
        spec: &MaterialSpec,
        tier: u32,
        initial_units: f64,
        epoch: u64,
    ) -> Result<Self> {
        check_tier(&material_id, spec, tier)?;
        let decay_law = spec.decay_law()?;
        if !(initial_units.is_finite() && initial_units >= 0.0) {
            return Err(CatalogError::InvalidNumber(format!("{material_id}.initial_units")).into());
        }
        let resource = Self {
            material_id,
            name: spec.name.clone(),
            tier,
            unit_price: spec.unit_price,
            unit_xp: spec.unit_xp,
            initial_units,
            decay_law,
            epoch,
            installed: false,
        };
        if resource.units_left() < 0.0 {
            return Err(HarvestError::ResourceExhausted(resource.material_id));
        }
        Ok(resource)
    }

    pub fn material_id(&self) -> &MaterialId {
        &self.material_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn unit_xp(&self) -> f64 {
        self.unit_xp
    }

    pub fn initial_units(&self) -> f64 {
        self.initial_units
    }

    pub fn decay_law(&self) -> DecayLaw {
        self.decay_law
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a collector currently holds this deposit.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub(crate) fn set_installed(&mut self, installed: bool) {
        self.installed = installed;
    }

    pub fn units_left(&self) -> f64 {
        self.decay_law.remaining(self.initial_units, self.epoch)
    }

    pub fn units_collected(&self) -> f64 {
        self.initial_units - self.units_left()
    }

    pub fn xp_collected(&self) -> f64 {
        self.units_collected() * self.unit_xp
    }

    pub fn money_collected(&self) -> Result<Decimal> {
        Ok(econ::worth(self.unit_price, self.units_collected())?)
    }

    fn feasible(&self, k: u64) -> bool {
        self.decay_law
            .remaining(self.initial_units, self.epoch.saturating_add(k))
            >= 0.0
    }

    /// Advance the deposit by up to `n` epochs.
    ///
    /// Applies the largest `k <= n` that keeps the remaining quantity
    /// non-negative, so an oversized request is clamped rather than rejected.
    pub fn collect(&mut self, n: u64) -> Result<Harvest> {
        if n == 0 {
            return Err(HarvestError::NotCollectable(n));
        }
        if !self.feasible(0) {
            return Err(HarvestError::ResourceExhausted(self.material_id.clone()));
        }
        // Laws are non-increasing in the epoch, so feasibility is monotone in k.
        let k = if self.feasible(n) {
            n
        } else {
            let (mut lo, mut hi) = (0u64, n);
            while hi - lo > 1 {
                let mid = lo + (hi - lo) / 2;
                if self.feasible(mid) {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            lo
        };
        let before = self.units_collected();
        self.epoch = self.epoch.saturating_add(k);
        let units = self.units_collected() - before;
        debug!(
            material = %self.material_id,
            requested = n,
            applied = k,
            units,
            "resource advanced"
        );
        Ok(Harvest {
            requested: n,
            epochs: k,
            units,
        })
    }

    pub fn snapshot(&self) -> Result<ResourceSnapshot> {
        Ok(ResourceSnapshot {
            material_id: self.material_id.clone(),
            name: self.name.clone(),
            tier: self.tier,
            decay_law: self.decay_law,
            epoch: self.epoch,
            initial_units: self.initial_units,
            units_left: self.units_left(),
            units_collected: self.units_collected(),
            xp_collected: self.xp_collected(),
            money_collected: self.money_collected()?,
            installed: self.installed,
        })
    }
}

/// Plain view of a resource for the service layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub material_id: MaterialId,
    pub name: String,
    pub tier: u32,
    pub decay_law: DecayLaw,
    pub epoch: u64,
    pub initial_units: f64,
    pub units_left: f64,
    pub units_collected: f64,
    pub xp_collected: f64,
    pub money_collected: Decimal,
    pub installed: bool,
}

/// Shared, lockable handle to a resource owned by a planet.
///
/// The planet keeps one handle in its list; an installed collector keeps a
/// clone. All mutation goes through [`ResourceHandle::lock`].
#[derive(Clone, Debug)]
pub struct ResourceHandle(Arc<Mutex<Resource>>);

impl ResourceHandle {
    pub fn new(resource: Resource) -> Self {
        Self(Arc::new(Mutex::new(resource)))
    }

    pub fn lock(&self) -> MutexGuard<'_, Resource> {
        self.0.lock()
    }

    pub fn material_id(&self) -> MaterialId {
        self.lock().material_id().clone()
    }

    pub fn snapshot(&self) -> Result<ResourceSnapshot> {
        self.lock().snapshot()
    }

    /// True if both handles point at the same deposit.
    pub fn same_as(&self, other: &ResourceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
