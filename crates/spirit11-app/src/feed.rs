// Player feed sources and the fetch -> ingest boundary.
//
// A fetch or ingest failure is logged and turned into an empty dataset by
// `load_dataset`; callers that must tell "no data" from "fetch failed" use
// `try_load_dataset` instead.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use spirit11_cricket::ingest::{parse_feed_with, Diagnostic, IngestError, IngestOptions, IngestReport};
use spirit11_cricket::model::Dataset;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read feed file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("no feed source configured")]
    NotConfigured,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("feed ingestion failed: {0}")]
    Ingest(#[from] IngestError),
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Somewhere the raw CSV feed text can be fetched from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human-readable location for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<String, FeedError>;
}

/// Feed served over HTTP(S).
pub struct HttpFeed {
    http: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let url = url.into();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Http {
                url: url.clone(),
                source: e,
            })?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, FeedError> {
        let http_err = |e| FeedError::Http {
            url: self.url.clone(),
            source: e,
        };
        let response = self.http.get(&self.url).send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status,
            });
        }
        response.text().await.map_err(http_err)
    }
}

/// Feed read from a local file.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, FeedError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::Io {
                path: self.path.display().to_string(),
                source: e,
            })
    }
}

/// Build the configured source. A URL takes precedence over a path.
pub fn from_config(config: &FeedConfig) -> Result<Box<dyn FeedSource>, FeedError> {
    if let Some(url) = &config.url {
        return Ok(Box::new(HttpFeed::new(url.clone(), config.timeout())?));
    }
    if let Some(path) = &config.path {
        return Ok(Box::new(FileFeed::new(path)));
    }
    Err(FeedError::NotConfigured)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::FieldCount {
                line,
                expected,
                found,
            } => warn!("dropped feed line {line}: {found} fields, expected {expected}"),
            Diagnostic::Malformed { line, message } => {
                warn!("dropped feed line {line}: {message}")
            }
            Diagnostic::MissingColumn { column } => warn!("feed has no '{column}' column"),
            other => debug!("feed diagnostic: {:?}", other),
        }
    }
}

/// Fetch and ingest, surfacing failures.
pub async fn try_load_dataset(
    source: &dyn FeedSource,
    options: IngestOptions,
) -> Result<IngestReport, LoadError> {
    info!("fetching player feed from {}", source.describe());
    let text = source.fetch().await?;
    let report = parse_feed_with(&text, options)?;
    log_diagnostics(&report.diagnostics);
    Ok(report)
}

/// Fetch and ingest. Any failure is logged and yields an empty dataset.
pub async fn load_dataset(source: &dyn FeedSource, options: IngestOptions) -> Dataset {
    match try_load_dataset(source, options).await {
        Ok(report) => report.dataset,
        Err(e) => {
            warn!("failed to load player feed from {}: {}", source.describe(), e);
            Dataset::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
Name,University,Category,Total Runs,Balls Faced,Innings Played,Wickets,Overs Bowled,Runs Conceded
Kasun Perera,Colombo,Batsman,450,350,10,0,0,0
Nuwan Silva,Moratuwa,Bowler,20,30,5,10,20.0,150
Broken,Moratuwa,Bowler,1,2";

    struct StaticFeed(&'static str);

    #[async_trait]
    impl FeedSource for StaticFeed {
        fn describe(&self) -> String {
            "static".into()
        }

        async fn fetch(&self) -> Result<String, FeedError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl FeedSource for FailingFeed {
        fn describe(&self) -> String {
            "failing".into()
        }

        async fn fetch(&self) -> Result<String, FeedError> {
            Err(FeedError::Io {
                path: "nowhere".into(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"),
            })
        }
    }

    #[tokio::test]
    async fn fetch_failure_yields_empty_dataset() {
        let ds = load_dataset(&FailingFeed, IngestOptions::default()).await;
        assert!(ds.players.is_empty());
        assert!(ds.player_stats.is_empty());
    }

    #[tokio::test]
    async fn try_load_surfaces_fetch_failure() {
        let err = try_load_dataset(&FailingFeed, IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Feed(FeedError::Io { .. })));
    }

    #[tokio::test]
    async fn tolerant_load_drops_broken_row() {
        let ds = load_dataset(&StaticFeed(FEED), IngestOptions::default()).await;
        assert_eq!(ds.players.len(), 2);
        assert_eq!(ds.players[1].id, "2");
    }

    #[tokio::test]
    async fn strict_load_fails_closed() {
        let ds = load_dataset(&StaticFeed(FEED), IngestOptions::strict()).await;
        assert!(ds.is_empty());

        let err = try_load_dataset(&StaticFeed(FEED), IngestOptions::strict())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Ingest(IngestError::FieldCount { .. })));
    }

    #[tokio::test]
    async fn file_feed_reads_local_csv() {
        let path = std::env::temp_dir().join("spirit11_feed_file_test.csv");
        std::fs::write(&path, FEED).unwrap();

        let ds = load_dataset(&FileFeed::new(&path), IngestOptions::default()).await;
        assert_eq!(ds.players[0].name, "Kasun Perera");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let feed = FileFeed::new("/definitely/not/here.csv");
        assert!(matches!(feed.fetch().await, Err(FeedError::Io { .. })));
    }

    #[test]
    fn from_config_prefers_url() {
        let config = FeedConfig {
            url: Some("https://example.com/players.csv".into()),
            path: Some("players.csv".into()),
            timeout_secs: 5,
            strict: false,
        };
        let source = from_config(&config).unwrap();
        assert_eq!(source.describe(), "https://example.com/players.csv");

        let config = FeedConfig {
            url: None,
            path: Some("players.csv".into()),
            timeout_secs: 5,
            strict: false,
        };
        assert_eq!(from_config(&config).unwrap().describe(), "players.csv");

        let config = FeedConfig {
            url: None,
            path: None,
            timeout_secs: 5,
            strict: false,
        };
        assert!(matches!(from_config(&config), Err(FeedError::NotConfigured)));
    }
}
