//! Planet name supply.
//!
//! Names are every `"{name} {modifier}"` pair from the catalog, handed out in
//! a seeded shuffled order. Once the pool runs dry it is reshuffled, so names
//! are collision-resistant but not globally unique.

use crate::error::Result;
use harvest_core::{CatalogError, PlanetNames};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Shuffled, reproducible sequence of planet names with an explicit cursor.
#[derive(Clone, Debug)]
pub struct NameAllocator {
    pool: Vec<String>,
    cursor: usize,
    rng: ChaCha8Rng,
}

impl NameAllocator {
    pub fn new(parts: &PlanetNames, seed: u64) -> Result<Self> {
        if parts.names.is_empty() || parts.modifiers.is_empty() {
            return Err(CatalogError::EmptyNamePool.into());
        }
        let mut pool = Vec::with_capacity(parts.names.len() * parts.modifiers.len());
        for name in &parts.names {
            for modifier in &parts.modifiers {
                pool.push(format!("{name} {modifier}"));
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        pool.shuffle(&mut rng);
        Ok(Self {
            pool,
            cursor: 0,
            rng,
        })
    }

    /// Number of distinct names in one cycle.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Names left before the next reshuffle.
    pub fn remaining(&self) -> usize {
        self.pool.len() - self.cursor
    }

    pub fn next_name(&mut self) -> String {
        if self.cursor == self.pool.len() {
            self.reshuffle();
        }
        let name = self.pool[self.cursor].clone();
        self.cursor += 1;
        name
    }

    fn reshuffle(&mut self) {
        let last = self.pool.last().cloned();
        self.pool.shuffle(&mut self.rng);
        // no back-to-back repeat across the cycle boundary
        if self.pool.len() > 1 && self.pool.first() == last.as_ref() {
            let end = self.pool.len() - 1;
            self.pool.swap(0, end);
        }
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use std::collections::BTreeSet;

    fn parts() -> PlanetNames {
        PlanetNames {
            names: vec!["Kepler".into(), "Vega".into(), "Tau".into()],
            modifiers: vec!["Prime".into(), "Minor".into()],
        }
    }

    #[test]
    fn one_cycle_has_no_repeats() {
        let mut names = NameAllocator::new(&parts(), 3).unwrap();
        assert_eq!(names.pool_size(), 6);
        let drawn: BTreeSet<String> = (0..6).map(|_| names.next_name()).collect();
        assert_eq!(drawn.len(), 6);
        assert!(drawn.contains("Vega Minor"));
        assert_eq!(names.remaining(), 0);
    }

    #[test]
    fn reshuffles_when_exhausted() {
        let mut names = NameAllocator::new(&parts(), 3).unwrap();
        let mut previous = String::new();
        for _ in 0..60 {
            let name = names.next_name();
            assert_ne!(name, previous);
            previous = name;
        }
        assert!(names.remaining() < names.pool_size());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = NameAllocator::new(&parts(), 42).unwrap();
        let mut b = NameAllocator::new(&parts(), 42).unwrap();
        for _ in 0..20 {
            assert_eq!(a.next_name(), b.next_name());
        }
    }

    #[test]
    fn empty_pool_rejected() {
        let empty = PlanetNames {
            names: vec![],
            modifiers: vec!["Prime".into()],
        };
        assert_eq!(
            NameAllocator::new(&empty, 1).unwrap_err(),
            HarvestError::Catalog(CatalogError::EmptyNamePool)
        );
    }
}
