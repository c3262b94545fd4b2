// Spirit11 entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout stays machine-readable)
// 2. Load config
// 3. Open database
// 4. Seed from the player feed (always with --refresh)
// 5. Print the tournament summary as JSON

use spirit11_app::app;
use spirit11_app::config;
use spirit11_app::db;
use spirit11_app::feed;

use anyhow::Context;
use spirit11_cricket::ingest::IngestOptions;
use spirit11_cricket::summary::tournament_summary;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Spirit11 starting up");

    let refresh = std::env::args().skip(1).any(|a| a == "--refresh");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    let starting_squad = config.game.new_squad();
    info!(
        "Config loaded: new squads get {} to fill {} slots",
        starting_squad.budget,
        starting_squad.capacity()
    );

    // 3. Open database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Seed
    let source = feed::from_config(&config.feed).context("failed to build feed source")?;
    let options = IngestOptions {
        strict: config.feed.strict,
    };
    let roster = app::load_roster(&db, source.as_ref(), options, refresh).await?;
    if let Some(at) = db.last_ingested_at()? {
        info!("Roster of {} players, last imported {}", roster.len(), at);
    }

    // 5. Report
    let summary = tournament_summary(&roster);
    let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
    println!("{json}");

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("spirit11_app=info,spirit11_cricket=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
