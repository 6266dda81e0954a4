#![deny(warnings)]
//! Stateful harvesting engine: depletable resources on procedurally generated
//! planets, upgradable collectors that turn elapsed time into units, and the
//! companies that own both.
//!
//! Concurrency: every `Resource` and every `ResourceCollector` sits behind its
//! own mutex. A collector locks its resource only while holding its own lock,
//! never the other way around, so collections on distinct collectors run in
//! parallel and concurrent collections on one collector serialize.
//!
//! Nothing in this crate reads a clock; callers pass `now` explicitly.

pub mod collector;
pub mod company;
pub mod error;
pub mod names;
pub mod planet;
pub mod resource;
pub mod shared;

#[cfg(test)]
mod testing;

pub use collector::{
    Collection, CollectionDetail, CollectorSnapshot, CollectorState, ResourceCollector,
};
pub use company::{CollectorId, Company};
pub use error::{HarvestError, Result};
pub use harvest_core::{Catalog, MaterialId};
pub use names::NameAllocator;
pub use planet::{planet_id, Planet, PlanetFactory, PlanetId, PlanetSnapshot};
pub use resource::{Harvest, Resource, ResourceHandle, ResourceSnapshot};
pub use shared::SharedCollector;
