#![deny(warnings)]

//! Headless driver: explores a planet, puts a collector to work and prints
//! what it harvested as JSON.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use harvest_core::Catalog;
use harvest_engine::{Company, PlanetFactory, ResourceCollector, ResourceHandle};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CATALOG: &str = include_str!("../../../assets/catalog.yaml");

struct Args {
    catalog: Option<String>,
    tier: u32,
    hours: u32,
    seed: u64,
}

fn parse_args() -> Args {
    let mut args = Args {
        catalog: None,
        tier: 1,
        hours: 24,
        seed: 42,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--catalog" => args.catalog = it.next(),
            "--tier" => args.tier = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.tier),
            "--hours" => args.hours = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.hours),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.seed),
            _ => {}
        }
    }
    args
}

fn load_catalog(path: Option<&str>) -> Result<Catalog> {
    let text = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading catalog {p}"))?,
        None => DEFAULT_CATALOG.to_string(),
    };
    Catalog::from_yaml_str(&text).context("invalid catalog")
}

/// First collector type, at `tier`, that accepts one of `resources`.
fn equip(
    catalog: &Catalog,
    tier: u32,
    resources: &[ResourceHandle],
) -> Result<Option<ResourceCollector>> {
    for kind in catalog.collectors.keys() {
        for resource in resources {
            let mut collector = ResourceCollector::new(catalog, kind.as_str(), tier)?;
            if collector.install(resource).is_ok() {
                return Ok(Some(collector));
            }
        }
    }
    Ok(None)
}

/// `RUST_LOG`-style directives, or `info` when unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_SHA"),
        built = env!("BUILD_DATE"),
        tier = args.tier,
        hours = args.hours,
        seed = args.seed,
        "starting harvest-cli"
    );

    let catalog = load_catalog(args.catalog.as_deref())?;
    let start = Utc::now();
    let mut factory = PlanetFactory::new(&catalog, args.seed)?;
    let mut company =
        Company::new("Prospector", "cli", start, Decimal::new(1_000, 0)).with_tier(args.tier);

    let planet_id = company.explore(&mut factory, None)?.id().clone();
    let resources = company.planet(&planet_id.0)?.resources().to_vec();
    let Some(collector) = equip(&catalog, args.tier, &resources)? else {
        let planet = company.planet(&planet_id.0)?.snapshot()?;
        println!("{}", serde_json::to_string_pretty(&planet)?);
        bail!("no collector type can harvest planet {planet_id}");
    };

    let id = company.add_collector(collector);
    let shared = company.collector(id)?.clone();
    shared.with(|c| c.start(start))?;
    let mut collections = 0u32;
    for hour in 1..=i64::from(args.hours) {
        if company.harvest(id, start + Duration::hours(hour))?.is_some() {
            collections += 1;
        }
    }
    let end = start + Duration::hours(i64::from(args.hours));
    shared.with(|c| c.stop(end))?;

    let report = serde_json::json!({
        "company": company.name(),
        "balance": company.balance(),
        "bankrupt": company.is_bankrupt(),
        "collections": collections,
        "planet": company.planet(&planet_id.0)?.snapshot()?,
        "collector": shared.read(|c| c.snapshot())?,
        "total": shared.read(|c| c.total_collection_detail())?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
