// Startup seeding: bring the store up to date with the player feed.

use anyhow::{Context, Result};
use spirit11_cricket::ingest::IngestOptions;
use spirit11_cricket::model::Dataset;
use tracing::{info, warn};

use crate::db::Database;
use crate::feed::{self, FeedSource};

/// What `ensure_seeded` did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store already held players and no refresh was requested.
    AlreadySeeded,
    /// The feed was imported, replacing whatever was stored.
    Imported { players: usize },
    /// The feed produced nothing; stored data (if any) was left alone.
    FeedEmpty,
}

/// Import the feed when the store is empty or `force` is set.
///
/// An empty feed never wipes stored players, so a fetch failure during a
/// refresh keeps the last good roster.
pub async fn ensure_seeded(
    db: &Database,
    source: &dyn FeedSource,
    options: IngestOptions,
    force: bool,
) -> Result<SeedOutcome> {
    if !force && !db.is_empty()? {
        info!("Store already seeded, skipping feed import");
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let dataset = feed::load_dataset(source, options).await;
    if dataset.is_empty() {
        warn!("Player feed from {} produced no players", source.describe());
        return Ok(SeedOutcome::FeedEmpty);
    }

    db.replace_dataset(&dataset)
        .context("failed to store ingested players")?;
    info!("Imported {} players from {}", dataset.len(), source.describe());

    Ok(SeedOutcome::Imported {
        players: dataset.len(),
    })
}

/// Seed if needed, then read the full roster back from the store.
pub async fn load_roster(
    db: &Database,
    source: &dyn FeedSource,
    options: IngestOptions,
    force: bool,
) -> Result<Dataset> {
    ensure_seeded(db, source, options, force).await?;
    db.load_dataset().context("failed to load stored players")
}
