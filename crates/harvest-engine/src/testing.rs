//! Shared fixtures for unit tests.

use chrono::{DateTime, Duration, Utc};
use harvest_core::Catalog;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub fn catalog() -> Catalog {
    Catalog::from_yaml_str(include_str!("../tests/fixtures/catalog.yaml")).unwrap()
}

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Fixed origin plus `hours`.
pub fn at(hours: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::hours(hours)
}
