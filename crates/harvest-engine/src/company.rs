//! Player companies: the aggregate that owns planets, collectors and money.

use crate::collector::{CollectionDetail, ResourceCollector};
use crate::error::{HarvestError, Result};
use crate::planet::{Planet, PlanetFactory, PlanetId};
use crate::shared::SharedCollector;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Company-scoped collector identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectorId(pub u64);

impl fmt::Display for CollectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub struct Company {
    name: String,
    owner: String,
    joined_at: DateTime<Utc>,
    balance: Decimal,
    tier: u32,
    planets: BTreeMap<PlanetId, Planet>,
    collectors: BTreeMap<CollectorId, SharedCollector>,
    next_collector: u64,
}

impl Company {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        joined_at: DateTime<Utc>,
        balance: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            joined_at,
            balance,
            tier: 0,
            planets: BTreeMap::new(),
            collectors: BTreeMap::new(),
            next_collector: 1,
        }
    }

    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }

    pub fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    pub fn is_bankrupt(&self) -> bool {
        self.balance <= Decimal::ZERO
    }

    /// Mint a planet at `tier` (the company tier by default) and keep it.
    pub fn explore(&mut self, factory: &mut PlanetFactory<'_>, tier: Option<u32>) -> Result<&Planet> {
        let planet = factory.explore(tier.unwrap_or(self.tier))?;
        let id = planet.id().clone();
        if self.planets.contains_key(&id) {
            return Err(HarvestError::DuplicatePlanet(id.0));
        }
        info!(company = %self.name, planet = %id, "planet acquired");
        Ok(self.planets.entry(id).or_insert(planet))
    }

    /// Keep `planet`, replacing any previous planet with the same id.
    pub fn add_planet(&mut self, planet: Planet) -> Option<Planet> {
        self.planets.insert(planet.id().clone(), planet)
    }

    /// Give up a planet; collectors harvesting its deposits are uninstalled first.
    pub fn remove_planet(&mut self, id: &str, now: DateTime<Utc>) -> Result<Planet> {
        let planet = self
            .planets
            .get(id)
            .ok_or_else(|| HarvestError::UnknownPlanet(id.to_string()))?;
        for collector in self.collectors.values() {
            let bound_here = collector.read(|c| {
                c.resource()
                    .is_some_and(|r| planet.resources().iter().any(|p| p.same_as(r)))
            });
            if bound_here {
                collector.with(|c| c.uninstall(now))?;
            }
        }
        self.planets
            .remove(id)
            .ok_or_else(|| HarvestError::UnknownPlanet(id.to_string()))
    }

    pub fn planet(&self, id: &str) -> Result<&Planet> {
        self.planets
            .get(id)
            .ok_or_else(|| HarvestError::UnknownPlanet(id.to_string()))
    }

    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.values()
    }

    /// Planets whose name matches exactly; names are not unique.
    pub fn planets_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Planet> + 'a {
        self.planets.values().filter(move |p| p.name() == name)
    }

    pub fn add_collector(&mut self, collector: ResourceCollector) -> CollectorId {
        let id = CollectorId(self.next_collector);
        self.next_collector += 1;
        info!(company = %self.name, collector = %id, kind = %collector.collector_type(), "collector added");
        self.collectors.insert(id, SharedCollector::new(collector));
        id
    }

    pub fn collector(&self, id: CollectorId) -> Result<&SharedCollector> {
        self.collectors
            .get(&id)
            .ok_or(HarvestError::UnknownCollector(id.0))
    }

    pub fn collectors(&self) -> impl Iterator<Item = (CollectorId, &SharedCollector)> {
        self.collectors.iter().map(|(id, c)| (*id, c))
    }

    /// Drop a collector, releasing its resource first.
    pub fn remove_collector(&mut self, id: CollectorId, now: DateTime<Utc>) -> Result<SharedCollector> {
        let collector = self.collector(id)?;
        if collector.read(|c| c.resource().is_some()) {
            collector.with(|c| c.uninstall(now))?;
        }
        self.collectors
            .remove(&id)
            .ok_or(HarvestError::UnknownCollector(id.0))
    }

    /// Collectors currently bound to a deposit of `material`.
    pub fn collectors_harvesting(&self, material: &str) -> Vec<CollectorId> {
        self.collectors
            .iter()
            .filter(|(_, c)| c.read(|c| c.material().is_some_and(|m| m.as_str() == material)))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Credit the net worth of a collection.
    pub fn settle(&mut self, detail: &CollectionDetail) {
        self.balance += detail.net_worth;
    }

    /// Pay for and apply one tier upgrade.
    pub fn buy_upgrade(&mut self, id: CollectorId) -> Result<u32> {
        let collector = self.collector(id)?.clone();
        let price = collector.read(|c| c.next_upgrade_cost())?;
        if price > self.balance {
            return Err(HarvestError::InsufficientFunds {
                required: price,
                available: self.balance,
            });
        }
        self.balance -= price;
        let tier = collector.with(|c| {
            c.upgrade();
            c.tier()
        });
        info!(company = %self.name, collector = %id, tier, %price, "upgrade bought");
        Ok(tier)
    }

    /// Collect on one collector and settle the result.
    ///
    /// Returns `None` when no whole epoch elapsed.
    pub fn harvest(&mut self, id: CollectorId, now: DateTime<Utc>) -> Result<Option<CollectionDetail>> {
        let detail = self.collector(id)?.with(|c| -> Result<Option<CollectionDetail>> {
            if c.collect(now)?.harvest.epochs == 0 {
                return Ok(None);
            }
            c.last_collection_detail().map(Some)
        })?;
        if let Some(d) = &detail {
            self.settle(d);
        }
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, catalog};

    fn company(balance: i64) -> Company {
        Company::new("Deep Core", "ada", at(0), Decimal::new(balance, 0)).with_tier(2)
    }

    #[test]
    fn explore_and_lookup() {
        let catalog = catalog();
        let mut factory = PlanetFactory::new(&catalog, 9).unwrap();
        let mut co = company(100);
        let id = co.explore(&mut factory, None).unwrap().id().clone();
        let planet = co.planet(&id.0).unwrap();
        assert_eq!(planet.tier(), 2);
        let name = planet.name().to_string();
        assert_eq!(co.planets_named(&name).count(), 1);
        let low = co.explore(&mut factory, Some(0)).unwrap();
        assert_eq!(low.tier(), 0);
        assert_eq!(co.planets().count(), 2);
        assert_eq!(
            co.planet("ZZ9999").unwrap_err(),
            HarvestError::UnknownPlanet("ZZ9999".into())
        );
    }

    #[test]
    fn harvest_settles_net_worth() {
        let catalog = catalog();
        let mut factory = PlanetFactory::new(&catalog, 9).unwrap();
        let mut co = company(100);
        let pid = co.explore(&mut factory, None).unwrap().id().clone();
        let cobalt = co.planet(&pid.0).unwrap().resource("cobalt").unwrap().clone();

        let id = co.add_collector(ResourceCollector::new(&catalog, "drill", 2).unwrap());
        co.collector(id)
            .unwrap()
            .with(|c| c.install(&cobalt).and_then(|_| c.start(at(0))))
            .unwrap();
        assert_eq!(co.harvest(id, at(0)).unwrap(), None);
        let detail = co.harvest(id, at(3)).unwrap().unwrap();
        assert_eq!(detail.net_worth, Decimal::new(5250, 2));
        assert_eq!(co.balance(), Decimal::new(15250, 2));
        assert_eq!(co.collectors_harvesting("cobalt"), vec![id]);
        assert!(co.collectors_harvesting("iron").is_empty());
        assert_eq!(co.collector(id).unwrap().last_detail(), Some(detail));
    }

    #[test]
    fn explore_rejects_a_taken_id() {
        let catalog = catalog();
        let mut first = PlanetFactory::new(&catalog, 9).unwrap();
        let mut second = PlanetFactory::new(&catalog, 9).unwrap();
        let mut co = company(100);
        let id = co.explore(&mut first, None).unwrap().id().clone();
        assert_eq!(
            co.explore(&mut second, None).unwrap_err(),
            HarvestError::DuplicatePlanet(id.0.clone())
        );
        assert_eq!(co.planets().count(), 1);
        assert!(co.explore(&mut second, None).is_ok());
        assert_eq!(co.planets().count(), 2);
    }

    #[test]
    fn harvest_settles_its_own_collection() {
        let catalog = catalog();
        let mut factory = PlanetFactory::new(&catalog, 9).unwrap();
        let mut co = company(0);
        let pid = co.explore(&mut factory, None).unwrap().id().clone();
        let cobalt = co.planet(&pid.0).unwrap().resource("cobalt").unwrap().clone();
        let id = co.add_collector(ResourceCollector::new(&catalog, "drill", 2).unwrap());
        let other = co.collector(id).unwrap().clone();
        other
            .with(|c| c.install(&cobalt).and_then(|_| c.start(at(0))))
            .unwrap();

        let (settled, elsewhere) = std::thread::scope(|s| {
            let side = s.spawn(move || {
                (1..=20)
                    .step_by(2)
                    .map(|h| other.collect(at(h)).unwrap().harvest.units)
                    .sum::<f64>()
            });
            let mut settled = 0.0;
            for h in (2..=20).step_by(2) {
                if let Some(d) = co.harvest(id, at(h)).unwrap() {
                    settled += d.units_collected;
                }
            }
            (settled, side.join().unwrap())
        });
        assert_eq!(settled + elsewhere, 100.0);
        assert_eq!(cobalt.lock().units_left(), 0.0);
    }

    #[test]
    fn upgrades_cost_money() {
        let catalog = catalog();
        let mut co = company(120);
        let id = co.add_collector(ResourceCollector::new(&catalog, "drill", 0).unwrap());
        assert_eq!(co.buy_upgrade(id).unwrap(), 1);
        assert_eq!(co.balance(), Decimal::new(70, 0));
        assert_eq!(
            co.buy_upgrade(id).unwrap_err(),
            HarvestError::InsufficientFunds {
                required: Decimal::new(100, 0),
                available: Decimal::new(70, 0),
            }
        );
        assert_eq!(co.collector(id).unwrap().read(|c| c.tier()), 1);
        assert_eq!(
            co.buy_upgrade(CollectorId(42)).unwrap_err(),
            HarvestError::UnknownCollector(42)
        );
    }

    #[test]
    fn bankrupt_at_zero() {
        let mut co = company(0);
        assert!(co.is_bankrupt());
        co.credit(Decimal::new(1, 2));
        assert!(!co.is_bankrupt());
    }

    #[test]
    fn removing_releases_resources() {
        let catalog = catalog();
        let mut factory = PlanetFactory::new(&catalog, 4).unwrap();
        let mut co = company(0);
        let pid = co.explore(&mut factory, None).unwrap().id().clone();
        let cobalt = co.planet(&pid.0).unwrap().resource("cobalt").unwrap().clone();

        let a = co.add_collector(ResourceCollector::new(&catalog, "drill", 2).unwrap());
        co.collector(a).unwrap().with(|c| c.install(&cobalt)).unwrap();
        co.remove_collector(a, at(1)).unwrap();
        assert!(!cobalt.lock().is_installed());
        assert!(co.collector(a).is_err());

        let b = co.add_collector(ResourceCollector::new(&catalog, "drill", 2).unwrap());
        assert_ne!(a, b);
        co.collector(b).unwrap().with(|c| c.install(&cobalt)).unwrap();
        let planet = co.remove_planet(&pid.0, at(2)).unwrap();
        assert_eq!(planet.id(), &pid);
        assert!(!cobalt.lock().is_installed());
        assert!(co.collector(b).unwrap().read(|c| c.resource().is_none()));
        assert!(co.planet(&pid.0).is_err());
    }
}
