//! Upgradable machines that harvest one resource at a time.
//!
//! A collector moves through three states:
//!
//! - `Idle`: no resource bound
//! - `Stopped`: resource installed, not harvesting
//! - `Running`: harvesting session open
//!
//! Elapsed wall-clock time only counts while running. Every operation takes
//! the current time as a parameter; nothing here reads a clock.

use crate::error::{HarvestError, Result};
use crate::resource::{Harvest, Resource, ResourceHandle};
use chrono::{DateTime, Utc};
use harvest_core::{Catalog, CollectorSpec, CollectorTypeId, MaterialId};
use harvest_econ as econ;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

/// Lifecycle state derived from the collector's fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorState {
    Idle,
    Stopped,
    Running,
}

/// Result of one call to [`ResourceCollector::collect`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Collection {
    pub at: DateTime<Utc>,
    pub harvest: Harvest,
    /// Cost of the epochs actually applied.
    pub cost: Decimal,
}

impl Collection {
    fn empty(at: DateTime<Utc>) -> Self {
        Self {
            at,
            harvest: Harvest::default(),
            cost: Decimal::ZERO,
        }
    }
}

/// Units, money and experience derived from one or more collections.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectionDetail {
    pub units_collected: f64,
    pub units_left: f64,
    pub cost: Decimal,
    pub raw_worth: Decimal,
    pub net_worth: Decimal,
    pub xp_earned: f64,
}

impl CollectionDetail {
    fn new(resource: &Resource, units: f64, cost: Decimal) -> Result<Self> {
        let raw_worth = econ::worth(resource.unit_price(), units)?;
        Ok(Self {
            units_collected: units,
            units_left: resource.units_left(),
            cost,
            raw_worth,
            net_worth: econ::net_worth(raw_worth, cost),
            xp_earned: units * resource.unit_xp(),
        })
    }
}

#[derive(Debug)]
struct Binding {
    resource: ResourceHandle,
    material: MaterialId,
    /// Tier the collector is measured against: the deposit's own tier, never
    /// below the allow-list minimum for its material.
    base_tier: u32,
}

/// A harvesting machine of one catalog type.
#[derive(Debug)]
pub struct ResourceCollector {
    collector_type: CollectorTypeId,
    spec: CollectorSpec,
    epoch_unit_secs: u64,
    tier: u32,
    auto_stop: Option<u64>,
    started_at: Option<DateTime<Utc>>,
    last_collected_at: Option<DateTime<Utc>>,
    epochs_total: u64,
    units_total: f64,
    cost_total: Decimal,
    last_collection: Option<Collection>,
    binding: Option<Binding>,
}

impl ResourceCollector {
    pub fn new(catalog: &Catalog, collector_type: &str, tier: u32) -> Result<Self> {
        let spec = catalog.collector(collector_type)?.clone();
        Ok(Self {
            collector_type: CollectorTypeId::new(collector_type),
            spec,
            epoch_unit_secs: catalog.engine.epoch_unit_secs,
            tier,
            auto_stop: None,
            started_at: None,
            last_collected_at: None,
            epochs_total: 0,
            units_total: 0.0,
            cost_total: Decimal::ZERO,
            last_collection: None,
            binding: None,
        })
    }

    pub fn collector_type(&self) -> &CollectorTypeId {
        &self.collector_type
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn auto_stop(&self) -> Option<u64> {
        self.auto_stop
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn last_collected_at(&self) -> Option<DateTime<Utc>> {
        self.last_collected_at
    }

    pub fn epochs_total(&self) -> u64 {
        self.epochs_total
    }

    pub fn last_collection(&self) -> Option<&Collection> {
        self.last_collection.as_ref()
    }

    pub fn resource(&self) -> Option<&ResourceHandle> {
        self.binding.as_ref().map(|b| &b.resource)
    }

    /// Material of the bound resource.
    pub fn material(&self) -> Option<&MaterialId> {
        self.binding.as_ref().map(|b| &b.material)
    }

    pub fn state(&self) -> CollectorState {
        match (&self.binding, self.started_at) {
            (None, _) => CollectorState::Idle,
            (Some(_), None) => CollectorState::Stopped,
            (Some(_), Some(_)) => CollectorState::Running,
        }
    }

    /// Cap the epochs a single collection may advance; `None` is unbounded.
    pub fn set_auto_stop(&mut self, cap: Option<u64>) -> Result<()> {
        if let Some(c) = cap {
            if c < 1 {
                return Err(HarvestError::InvalidAutoStop(c));
            }
        }
        self.auto_stop = cap;
        Ok(())
    }

    /// Bind `resource` to this collector.
    ///
    /// The caller must not hold the resource lock.
    pub fn install(&mut self, resource: &ResourceHandle) -> Result<()> {
        if let Some(b) = &self.binding {
            return Err(HarvestError::CollectorOccupied(b.material.clone()));
        }
        let mut r = resource.lock();
        let material = r.material_id().clone();
        let min_tier = self.spec.min_tier_for(material.as_str()).ok_or_else(|| {
            HarvestError::IncompatibleResource {
                collector: self.spec.name.clone(),
                material: material.clone(),
            }
        })?;
        if self.tier < min_tier || r.tier() > self.tier {
            return Err(HarvestError::InsufficientTier {
                material,
                tier: self.tier,
                required: min_tier.max(r.tier()),
            });
        }
        if r.is_installed() {
            return Err(HarvestError::ResourceInUse(material));
        }
        let base_tier = min_tier.max(r.tier());
        r.set_installed(true);
        drop(r);
        info!(collector = %self.collector_type, %material, tier = self.tier, "collector installed");
        self.binding = Some(Binding {
            resource: resource.clone(),
            material,
            base_tier,
        });
        Ok(())
    }

    /// Detach the bound resource after flushing pending progress.
    ///
    /// Lifetime counters and the cached collection are cleared.
    pub fn uninstall(&mut self, now: DateTime<Utc>) -> Result<ResourceHandle> {
        if self.binding.is_none() {
            return Err(HarvestError::NoResourceInstalled);
        }
        self.stop(now)?;
        if self.last_collected_at.is_some() {
            self.collect(now)?;
        }
        let binding = self
            .binding
            .take()
            .ok_or(HarvestError::NoResourceInstalled)?;
        binding.resource.lock().set_installed(false);
        self.started_at = None;
        self.last_collected_at = None;
        self.epochs_total = 0;
        self.units_total = 0.0;
        self.cost_total = Decimal::ZERO;
        self.last_collection = None;
        info!(collector = %self.collector_type, material = %binding.material, "collector uninstalled");
        Ok(binding.resource)
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.state() {
            CollectorState::Idle => Err(HarvestError::NoResourceInstalled),
            CollectorState::Running => Err(HarvestError::AlreadyRunning),
            CollectorState::Stopped => {
                self.started_at = Some(now);
                self.last_collected_at = Some(now);
                debug!(collector = %self.collector_type, %now, "collector started");
                Ok(())
            }
        }
    }

    /// Close the harvesting session, collecting once more first.
    ///
    /// Returns the final collection, or `None` if the collector was not running.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Option<Collection>> {
        match self.state() {
            CollectorState::Idle => Err(HarvestError::NoResourceInstalled),
            CollectorState::Stopped => Ok(None),
            CollectorState::Running => {
                let last = self.collect(now)?;
                self.started_at = None;
                debug!(collector = %self.collector_type, %now, "collector stopped");
                Ok(Some(last))
            }
        }
    }

    /// Convert time elapsed since the last collection into harvested units.
    ///
    /// When no whole epoch has elapsed nothing changes, so fractional
    /// progress keeps accruing until the next call.
    pub fn collect(&mut self, now: DateTime<Utc>) -> Result<Collection> {
        let binding = self
            .binding
            .as_ref()
            .ok_or(HarvestError::NoResourceInstalled)?;
        let last = self.last_collected_at.ok_or(HarvestError::NotStarted)?;
        if self.started_at.is_none() {
            return Ok(Collection::empty(now));
        }
        let elapsed_secs = (now - last).num_milliseconds() as f64 / 1000.0;
        let mut requested = econ::elapsed_epochs(self.speed()?, elapsed_secs, self.epoch_unit_secs);
        if let Some(cap) = self.auto_stop {
            requested = requested.min(cap);
        }
        if requested == 0 {
            return Ok(Collection::empty(now));
        }
        // priced before the resource advances
        self.cost(requested)?;
        let harvest = binding.resource.lock().collect(requested)?;
        let cost = self.cost(harvest.epochs)?;
        let collection = Collection {
            at: now,
            harvest,
            cost,
        };
        self.epochs_total = self.epochs_total.saturating_add(harvest.epochs);
        self.units_total += harvest.units;
        self.cost_total += cost;
        self.last_collected_at = Some(now);
        self.last_collection = Some(collection.clone());
        debug!(
            collector = %self.collector_type,
            requested,
            applied = harvest.epochs,
            units = harvest.units,
            %cost,
            "collected"
        );
        Ok(collection)
    }

    fn binding(&self) -> Result<&Binding> {
        self.binding.as_ref().ok_or(HarvestError::NoResourceInstalled)
    }

    /// Collector tier above the tier of the bound deposit.
    pub fn relative_tier(&self) -> Result<u32> {
        Ok(self.tier.saturating_sub(self.binding()?.base_tier))
    }

    /// Epochs per epoch unit on the bound resource.
    pub fn speed(&self) -> Result<f64> {
        Ok(econ::speed(
            self.spec.init_speed,
            self.spec.upgrade_upscale,
            self.relative_tier()?,
        ))
    }

    /// Cost of harvesting `epochs` epochs on the bound resource.
    pub fn cost(&self, epochs: u64) -> Result<Decimal> {
        Ok(econ::cost_of_use(
            self.spec.cost_of_use,
            self.spec.cost_of_use_price_upscale,
            self.relative_tier()?,
            epochs,
        )?)
    }

    pub fn next_upgrade_cost(&self) -> Result<Decimal> {
        Ok(econ::upgrade_cost(
            self.spec.upgrade_init_price,
            self.spec.upgrade_price_upscale,
            self.tier,
        )?)
    }

    /// Raise the tier by one. Paying for it is up to the caller.
    pub fn upgrade(&mut self) {
        self.tier = self.tier.saturating_add(1);
        debug!(collector = %self.collector_type, tier = self.tier, "collector upgraded");
    }

    pub fn last_collection_detail(&self) -> Result<CollectionDetail> {
        let last = self
            .last_collection
            .as_ref()
            .ok_or(HarvestError::NoCollectionYet)?;
        let binding = self.binding()?;
        let resource = binding.resource.lock();
        CollectionDetail::new(&resource, last.harvest.units, last.cost)
    }

    /// Totals since the resource was installed.
    pub fn total_collection_detail(&self) -> Result<CollectionDetail> {
        let binding = self.binding()?;
        let resource = binding.resource.lock();
        CollectionDetail::new(&resource, self.units_total, self.cost_total)
    }

    pub fn snapshot(&self) -> Result<CollectorSnapshot> {
        let speed = match self.binding {
            Some(_) => Some(self.speed()?),
            None => None,
        };
        Ok(CollectorSnapshot {
            collector_type: self.collector_type.clone(),
            name: self.spec.name.clone(),
            tier: self.tier,
            state: self.state(),
            resource: self.material().cloned(),
            speed,
            next_upgrade_cost: self.next_upgrade_cost()?,
            auto_stop: self.auto_stop,
            epochs_total: self.epochs_total,
            started_at: self.started_at,
            last_collected_at: self.last_collected_at,
        })
    }
}

/// Plain view of a collector for the service layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectorSnapshot {
    pub collector_type: CollectorTypeId,
    pub name: String,
    pub tier: u32,
    pub state: CollectorState,
    pub resource: Option<MaterialId>,
    pub speed: Option<f64>,
    pub next_upgrade_cost: Decimal,
    pub auto_stop: Option<u64>,
    pub epochs_total: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_collected_at: Option<DateTime<Utc>>,
}
