// Integration tests for the feed -> store pipeline.
//
// These exercise the library crate's public API end to end: fetching the
// feed over HTTP and from disk, seeding the store, and editing stats
// through the store.

use std::time::Duration;

use spirit11_app::app::{self, SeedOutcome};
use spirit11_app::config::GameConfig;
use spirit11_app::db::Database;
use spirit11_app::feed::{self, FeedError, FeedSource, FileFeed, HttpFeed, LoadError};
use spirit11_cricket::ingest::IngestOptions;
use spirit11_cricket::model::Role;
use spirit11_cricket::scoring::{compute_points, compute_value, is_reconciled};
use spirit11_cricket::squad::{leaderboard, Competitor};
use spirit11_cricket::summary::tournament_summary;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn fixture_feed() -> FileFeed {
    FileFeed::new(format!("{FIXTURES}/players.csv"))
}

fn test_db() -> Database {
    Database::open(":memory:").expect("in-memory database should open")
}

/// Serve a single HTTP response on a random local port and return its URL.
async fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}/players.csv")
}

// ===========================================================================
// Feed sources
// ===========================================================================

#[tokio::test]
async fn http_feed_ingests_served_csv() {
    let body = std::fs::read_to_string(format!("{FIXTURES}/players.csv")).unwrap();
    let url = serve_once("200 OK", body).await;
    let source = HttpFeed::new(url, Duration::from_secs(5)).unwrap();

    let report = feed::try_load_dataset(&source, IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(report.dataset.players.len(), 7);
    assert_eq!(report.dropped_rows(), 1);
}

#[tokio::test]
async fn http_error_status_yields_empty_dataset() {
    let url = serve_once("500 Internal Server Error", "boom".into()).await;
    let source = HttpFeed::new(url, Duration::from_secs(5)).unwrap();

    let err = feed::try_load_dataset(&source, IngestOptions::default())
        .await
        .unwrap_err();
    match err {
        LoadError::Feed(FeedError::Status { status, .. }) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected Status error, got: {other}"),
    }

    let url = serve_once("500 Internal Server Error", "boom".into()).await;
    let source = HttpFeed::new(url, Duration::from_secs(5)).unwrap();
    assert!(feed::load_dataset(&source, IngestOptions::default())
        .await
        .is_empty());
}

#[tokio::test]
async fn unreachable_host_yields_empty_dataset() {
    // Bind then drop so the port is very likely closed.
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let source = HttpFeed::new(format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
    assert!(feed::load_dataset(&source, IngestOptions::default())
        .await
        .is_empty());
}

// ===========================================================================
// Seeding and store
// ===========================================================================

#[tokio::test]
async fn seed_from_fixture_file() {
    let db = test_db();
    let source = fixture_feed();
    assert!(source.describe().ends_with("players.csv"));

    let outcome = app::ensure_seeded(&db, &source, IngestOptions::default(), false)
        .await
        .unwrap();
    assert_eq!(outcome, SeedOutcome::Imported { players: 7 });

    let roster = db.load_dataset().unwrap();
    let ids: Vec<&str> = roster.players.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5", "6", "7"]);
    assert_eq!(roster.players[5].name, "Tharindu Mendis");
    assert_eq!(roster.players[6].role, Role::Batsman);

    for player in &roster.players {
        let stats = roster.stats_for(&player.id).unwrap();
        assert!(is_reconciled(stats));
        assert_eq!(player.points, compute_points(stats));
        assert_eq!(player.value, compute_value(player.points));
    }
}

#[tokio::test]
async fn strict_seed_of_fixture_stores_nothing() {
    let db = test_db();
    let outcome = app::ensure_seeded(&db, &fixture_feed(), IngestOptions::strict(), false)
        .await
        .unwrap();
    assert_eq!(outcome, SeedOutcome::FeedEmpty);
    assert!(db.is_empty().unwrap());
}

#[tokio::test]
async fn failed_refresh_keeps_roster() {
    let db = test_db();
    app::ensure_seeded(&db, &fixture_feed(), IngestOptions::default(), false)
        .await
        .unwrap();

    let missing = FileFeed::new(format!("{FIXTURES}/does_not_exist.csv"));
    let roster = app::load_roster(&db, &missing, IngestOptions::default(), true)
        .await
        .unwrap();
    assert_eq!(roster.players.len(), 7);
}

#[tokio::test]
async fn stats_edit_flows_into_summary_and_leaderboard() {
    let db = test_db();
    let roster = app::load_roster(&db, &fixture_feed(), IngestOptions::default(), false)
        .await
        .unwrap();
    let before = roster.player("1").unwrap().points;

    let mut stats = db.stats_for("1").unwrap().unwrap();
    stats.wickets = 2;
    stats.overs_bowled = 4.0;
    stats.runs_conceded = 24;
    let reconciled = db.update_stats(stats).unwrap().unwrap();
    // 500/12 + 140/6
    assert_eq!(reconciled.points, before + 65);

    let roster = db.load_dataset().unwrap();
    let summary = tournament_summary(&roster);
    assert_eq!(summary.total_wickets, 14 + 14 + 6 + 3 + 5 + 2);

    let rules = GameConfig {
        initial_budget: 50_000_000,
        squad_size: 2,
    };
    let mut squad = rules.new_squad();
    squad.add_player(roster.player("1").unwrap()).unwrap();
    squad.add_player(roster.player("2").unwrap()).unwrap();
    let board = leaderboard([Competitor {
        user_id: "u1",
        username: "spiritx",
        squad: &squad,
    }]);
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].team_points, reconciled.points + roster.player("2").unwrap().points);
}
