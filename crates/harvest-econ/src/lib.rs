#![deny(warnings)]

//! Balancing curves for planet harvesting.
//!
//! This module provides validated utilities for:
//! - Collector speed, cost of use and upgrade pricing by tier
//! - Converting elapsed wall-clock time into whole epochs
//! - Scaling deposit sizes by tier with a seeded, bounded perturbation
//! - Resource spawn probability and the money value of harvested units

use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Money is rounded to cents.
pub const MONEY_DP: u32 = 2;

/// Errors produced by balancing helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Bounds must be finite, positive and ordered.
    #[error("invalid range [{0}, {1}]")]
    InvalidRange(f64, f64),
    /// Monetary values must be non-negative.
    #[error("invalid price or cost value")]
    InvalidPrice,
    /// Numeric conversion to decimal failed.
    #[error("non-finite numeric conversion")]
    NonFinite,
}

fn tier_factor(upscale: f64, tier: u32) -> Result<Decimal, EconError> {
    let f = upscale.powf(tier as f64);
    if !(f.is_finite() && f >= 0.0) {
        return Err(EconError::NonFinite);
    }
    Decimal::from_f64(f).ok_or(EconError::NonFinite)
}

/// Harvesting speed in epochs per epoch unit.
///
/// speed = init_speed * upgrade_upscale^relative_tier
///
/// Example:
/// assert_eq!(speed(1.0, 2.0, 3), 8.0);
pub fn speed(init_speed: f64, upgrade_upscale: f64, relative_tier: u32) -> f64 {
    init_speed * upgrade_upscale.powf(relative_tier as f64)
}

/// Cost of harvesting `epochs` epochs.
///
/// cost = cost_of_use * upscale^relative_tier * epochs, rounded to cents.
pub fn cost_of_use(
    cost_of_use: Decimal,
    upscale: f64,
    relative_tier: u32,
    epochs: u64,
) -> Result<Decimal, EconError> {
    if cost_of_use < Decimal::ZERO {
        return Err(EconError::InvalidPrice);
    }
    let per_epoch = cost_of_use
        .checked_mul(tier_factor(upscale, relative_tier)?)
        .ok_or(EconError::NonFinite)?;
    let total = per_epoch
        .checked_mul(Decimal::from(epochs))
        .ok_or(EconError::NonFinite)?;
    Ok(total.round_dp(MONEY_DP))
}

/// Price of upgrading a collector currently at `tier` to `tier + 1`.
///
/// Example:
/// let p = upgrade_cost(Decimal::new(50, 0), 2.0, 3).unwrap();
/// assert_eq!(p, Decimal::new(400, 0));
pub fn upgrade_cost(init_price: Decimal, upscale: f64, tier: u32) -> Result<Decimal, EconError> {
    if init_price < Decimal::ZERO {
        return Err(EconError::InvalidPrice);
    }
    let price = init_price
        .checked_mul(tier_factor(upscale, tier)?)
        .ok_or(EconError::NonFinite)?;
    Ok(price.round_dp(MONEY_DP))
}

/// Whole epochs elapsed over `elapsed_secs` at `speed`, floored.
///
/// Negative or non-finite inputs yield 0; the result saturates at u64::MAX.
pub fn elapsed_epochs(speed: f64, elapsed_secs: f64, epoch_unit_secs: u64) -> u64 {
    if epoch_unit_secs == 0 || !(speed.is_finite() && elapsed_secs.is_finite()) {
        return 0;
    }
    let epochs = (speed * elapsed_secs / epoch_unit_secs as f64).floor();
    if epochs <= 0.0 {
        return 0;
    }
    if epochs >= u64::MAX as f64 {
        return u64::MAX;
    }
    epochs as u64
}

/// Units in a fresh deposit: base * upscale^tier * multiplier.
pub fn initial_units(base: f64, tier_upscale: f64, tier: u32, multiplier: f64) -> f64 {
    base * tier_upscale.powf(tier as f64) * multiplier
}

/// Draw the per-deposit multiplier uniformly within `[low, high]`.
///
/// The draw happens once when a deposit is created and is frozen thereafter.
pub fn draw_units_multiplier<R: Rng + ?Sized>(
    rng: &mut R,
    [low, high]: [f64; 2],
) -> Result<f64, EconError> {
    if !(low.is_finite() && high.is_finite()) || low <= 0.0 || low > high {
        return Err(EconError::InvalidRange(low, high));
    }
    if low == high {
        return Ok(low);
    }
    Ok(rng.gen_range(low..=high))
}

/// Probability that a material with `min_tier` spawns on a planet of `planet_tier`.
///
/// Certain at the material's own tier, impossible below it, and
/// 1 / (3 * gap) above it.
pub fn spawn_probability(planet_tier: u32, min_tier: u32) -> f64 {
    match planet_tier.checked_sub(min_tier) {
        None => 0.0,
        Some(0) => 1.0,
        Some(gap) => 1.0 / (3.0 * gap as f64),
    }
}

/// Money value of `units` harvested at `unit_price`, rounded to cents.
pub fn worth(unit_price: Decimal, units: f64) -> Result<Decimal, EconError> {
    if unit_price < Decimal::ZERO {
        return Err(EconError::InvalidPrice);
    }
    if !units.is_finite() {
        return Err(EconError::NonFinite);
    }
    let u = Decimal::from_f64(units).ok_or(EconError::NonFinite)?;
    let total = unit_price.checked_mul(u).ok_or(EconError::NonFinite)?;
    Ok(total.round_dp(MONEY_DP))
}

/// Worth left once the harvesting cost is paid.
pub fn net_worth(raw_worth: Decimal, cost: Decimal) -> Decimal {
    raw_worth - cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn speed_scales_by_relative_tier() {
        assert_eq!(speed(1.0, 2.0, 0), 1.0);
        assert_eq!(speed(1.0, 2.0, 3), 8.0);
        assert_eq!(speed(0.5, 1.5, 2), 1.125);
    }

    #[test]
    fn cost_of_use_basic() {
        let c = cost_of_use(Decimal::new(250, 2), 2.0, 0, 3).unwrap();
        assert_eq!(c, Decimal::new(750, 2));
        let c = cost_of_use(Decimal::new(250, 2), 2.0, 1, 3).unwrap();
        assert_eq!(c, Decimal::new(1500, 2));
        assert_eq!(
            cost_of_use(Decimal::new(1, 0), 2.0, 0, 0).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            cost_of_use(Decimal::new(-1, 0), 2.0, 0, 1),
            Err(EconError::InvalidPrice)
        );
    }

    #[test]
    fn upgrade_cost_grows_with_tier() {
        let p0 = upgrade_cost(Decimal::new(50, 0), 2.0, 0).unwrap();
        let p3 = upgrade_cost(Decimal::new(50, 0), 2.0, 3).unwrap();
        assert_eq!(p0, Decimal::new(50, 0));
        assert_eq!(p3, Decimal::new(400, 0));
    }

    #[test]
    fn overflowing_money_is_an_error() {
        // 50 * 2^91 is past the largest Decimal
        assert_eq!(
            upgrade_cost(Decimal::new(50, 0), 2.0, 91),
            Err(EconError::NonFinite)
        );
        assert_eq!(
            upgrade_cost(Decimal::new(50, 0), 2.0, 200),
            Err(EconError::NonFinite)
        );
        assert_eq!(
            cost_of_use(Decimal::new(250, 2), 2.0, 95, 1),
            Err(EconError::NonFinite)
        );
        assert_eq!(worth(Decimal::MAX, 2.0), Err(EconError::NonFinite));
    }

    #[test]
    fn elapsed_epochs_floors() {
        assert_eq!(elapsed_epochs(1.0, 3.0 * 3600.0, 3600), 3);
        assert_eq!(elapsed_epochs(1.0, 3599.0, 3600), 0);
        assert_eq!(elapsed_epochs(2.0, 5400.0, 3600), 3);
        assert_eq!(elapsed_epochs(1.0, -10.0, 3600), 0);
        assert_eq!(elapsed_epochs(f64::NAN, 10.0, 3600), 0);
        assert_eq!(elapsed_epochs(1.0, 10.0, 0), 0);
    }

    #[test]
    fn multiplier_is_seeded_and_bounded() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let m1 = draw_units_multiplier(&mut a, [0.45, 0.55]).unwrap();
        let m2 = draw_units_multiplier(&mut b, [0.45, 0.55]).unwrap();
        assert_eq!(m1, m2);
        assert!((0.45..=0.55).contains(&m1));
        assert_eq!(draw_units_multiplier(&mut a, [1.0, 1.0]).unwrap(), 1.0);
        assert!(draw_units_multiplier(&mut a, [0.6, 0.5]).is_err());
        assert!(draw_units_multiplier(&mut a, [0.0, 0.5]).is_err());
    }

    #[test]
    fn spawn_probability_by_gap() {
        assert_eq!(spawn_probability(2, 2), 1.0);
        assert_eq!(spawn_probability(1, 2), 0.0);
        assert!((spawn_probability(3, 2) - 1.0 / 3.0).abs() < 1e-12);
        assert!((spawn_probability(5, 2) - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn worth_rounds_to_cents() {
        assert_eq!(worth(Decimal::new(2, 0), 30.0).unwrap(), Decimal::new(60, 0));
        assert_eq!(
            worth(Decimal::new(150, 2), 1.0 / 3.0).unwrap(),
            Decimal::new(50, 2)
        );
        assert_eq!(worth(Decimal::ONE, f64::INFINITY), Err(EconError::NonFinite));
        assert_eq!(
            net_worth(Decimal::new(60, 0), Decimal::new(750, 2)),
            Decimal::new(5250, 2)
        );
    }

    proptest! {
        #[test]
        fn speed_monotonic_in_tier(base in 0.1f64..10.0, up in 1.0f64..3.0, tier in 0u32..20) {
            prop_assert!(speed(base, up, tier + 1) >= speed(base, up, tier));
        }

        #[test]
        fn elapsed_epochs_monotonic_in_time(s in 0.1f64..10.0, secs in 0.0f64..1e7) {
            prop_assert!(elapsed_epochs(s, secs + 3600.0, 3600) >= elapsed_epochs(s, secs, 3600));
        }

        #[test]
        fn cost_additive_in_epochs(cents in 0i64..100_000, a in 0u64..1_000, b in 0u64..1_000) {
            let base = Decimal::new(cents, 2);
            let ca = cost_of_use(base, 1.0, 0, a).unwrap();
            let cb = cost_of_use(base, 1.0, 0, b).unwrap();
            let cab = cost_of_use(base, 1.0, 0, a + b).unwrap();
            prop_assert_eq!(ca + cb, cab);
        }
    }
}
