//! Expiring Map demo
//!
//! Loads configuration from the environment, then walks both map variants
//! through a short expiry cycle while logging what happens.

use std::sync::Arc;
use std::thread;

use anyhow::Context;
use chrono::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expiring_map::{BoundedLookAheadMap, ExpiringOrderedMap, MapConfig};

fn main() -> anyhow::Result<()> {
    // Defaults to "debug" for this crate, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expiring_map=debug,expiring_map_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MapConfig::from_env();
    info!(
        "Configuration loaded: default_ttl_secs={:?}, lookahead={}",
        config.default_ttl_secs, config.lookahead
    );

    let map = Arc::new(ExpiringOrderedMap::from_config(&config));
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..25 {
                    map.insert(format!("worker{worker}:{i}"), i);
                }
            })
        })
        .collect();
    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("insert worker panicked"))?;
    }
    info!("Inserted {} entries from 4 threads", map.len());

    map.insert_with_ttl("short-lived".to_string(), -1, Some(Duration::milliseconds(50)));
    map.expire_at("worker0:0", expiring_map::map::now())
        .context("worker0:0 should still be live")?;
    thread::sleep(std::time::Duration::from_millis(100));
    info!(
        "After expiry: len={}, stats={:?}",
        map.len(),
        map.stats()
    );

    let bounded = BoundedLookAheadMap::with_lookahead(
        Some(Duration::milliseconds(50)),
        config.lookahead,
    );
    bounded.update([("a", 1), ("b", 2), ("c", 3)]);
    thread::sleep(std::time::Duration::from_millis(100));
    bounded.insert("d", 4);
    info!(
        "Bounded map after one write: stored={}, keys={:?}",
        bounded.stats().stored_entries,
        bounded.keys()
    );

    if let Err(err) = bounded.set_ttl("d", Duration::seconds(1)) {
        info!("Bounded map rejected set_ttl: {}", err);
    }

    Ok(())
}
