//! Basic usage of the read-through cache with a view composer.

use cache_compose::{
    backend::InMemoryBackend, error::Result, CacheConfig, CachePolicy, Composer,
    ReadThroughCache, ViewData,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug)]
struct SalesReport {
    region: String,
    orders: u64,
    revenue: f64,
}

/// Composer that "queries" a slow reporting database.
struct SalesReportComposer;

impl Composer for SalesReportComposer {
    type Output = Vec<SalesReport>;

    fn output_variable(&self) -> &str {
        "sales_report"
    }

    fn policy(&self) -> CachePolicy {
        CachePolicy::new().with_tags(["reports"]).with_ttl_minutes(15)
    }

    async fn produce(&self) -> Result<Vec<SalesReport>> {
        println!("  [DB] Building sales report");
        Ok(vec![
            SalesReport {
                region: "emea".to_string(),
                orders: 1_204,
                revenue: 98_112.50,
            },
            SalesReport {
                region: "apac".to_string(),
                orders: 877,
                revenue: 71_020.00,
            },
        ])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== cache-compose - Basic Example ===\n");

    let cache = ReadThroughCache::new(InMemoryBackend::new())
        .with_config(CacheConfig::from_env()?.with_ttl_minutes(60));

    println!("1. First compose (cache miss):");
    let mut view = ViewData::new();
    cache.compose(&SalesReportComposer, &mut view).await?;
    println!("   ✓ Bound {} variable(s)\n", view.len());

    println!("2. Second compose (cache hit, no DB call):");
    let mut view = ViewData::new();
    cache.compose(&SalesReportComposer, &mut view).await?;
    if let Some(reports) = view.get_as::<Vec<SalesReport>>("sales_report")? {
        for r in reports {
            println!("   ✓ {}: {} orders, ${:.2}", r.region, r.orders, r.revenue);
        }
    }
    println!();

    println!("3. Flush the reports tag and compose again:");
    cache.flush_tags(["reports"]).await?;
    let mut view = ViewData::new();
    cache.compose(&SalesReportComposer, &mut view).await?;
    println!();

    println!("4. One-off resolve with the builder, caching disabled:");
    let visitors: u64 = cache
        .builder("live_visitors")
        .disabled()
        .execute(|| async { Ok(318) })
        .await?;
    println!("   ✓ Live visitors: {}\n", visitors);

    println!("=== Example Complete ===\n");
    Ok(())
}
