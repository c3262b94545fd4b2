// Player feed ingestion.
//
// Reads the comma-separated tournament feed (one row per player, header row
// first) into index-correlated `Player` / `PlayerStats` collections. Ids are
// positional: the n-th retained row becomes player "n".

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::model::{Dataset, Player, PlayerStats, RawCounters, Role, PLACEHOLDER_IMAGE};
use crate::scoring::{points_breakdown, reconcile};

// ---------------------------------------------------------------------------
// Feed columns
// ---------------------------------------------------------------------------

pub const COL_NAME: &str = "Name";
pub const COL_UNIVERSITY: &str = "University";
pub const COL_CATEGORY: &str = "Category";
pub const COL_TOTAL_RUNS: &str = "Total Runs";
pub const COL_BALLS_FACED: &str = "Balls Faced";
pub const COL_INNINGS_PLAYED: &str = "Innings Played";
pub const COL_WICKETS: &str = "Wickets";
pub const COL_OVERS_BOWLED: &str = "Overs Bowled";
pub const COL_RUNS_CONCEDED: &str = "Runs Conceded";

/// Header names the feed must carry (exact, case-sensitive).
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_NAME,
    COL_UNIVERSITY,
    COL_CATEGORY,
    COL_TOTAL_RUNS,
    COL_BALLS_FACED,
    COL_INNINGS_PLAYED,
    COL_WICKETS,
    COL_OVERS_BOWLED,
    COL_RUNS_CONCEDED,
];

// ---------------------------------------------------------------------------
// Options, diagnostics, errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Fail on a field-count mismatch or a missing required column instead
    /// of dropping/defaulting.
    pub strict: bool,
}

impl IngestOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// A data-quality observation made while ingesting. Diagnostics never change
/// the produced dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Row dropped because its field count differs from the header's.
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },
    /// Row the CSV reader could not decode; dropped.
    Malformed { line: u64, message: String },
    /// Required header absent; every row gets the default for it.
    MissingColumn { column: &'static str },
    /// Numeric field that did not parse; defaulted to 0.
    UnparseableNumber {
        line: u64,
        column: &'static str,
        raw: String,
    },
    /// Category outside the role set; defaulted to Batsman.
    UnknownCategory { line: u64, raw: String },
    /// Wickets credited with a zero strike rate or economy.
    DegenerateBowling { player_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result of an ingestion pass: the dataset plus whatever was noticed on the
/// way.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub dataset: Dataset,
    pub diagnostics: Vec<Diagnostic>,
}

impl IngestReport {
    /// Number of rows dropped for field-count mismatches or decode errors.
    pub fn dropped_rows(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::FieldCount { .. } | Diagnostic::Malformed { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header position of every required column, if present.
struct Columns {
    name: Option<usize>,
    university: Option<usize>,
    category: Option<usize>,
    total_runs: Option<usize>,
    balls_faced: Option<usize>,
    innings_played: Option<usize>,
    wickets: Option<usize>,
    overs_bowled: Option<usize>,
    runs_conceded: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            name: find(COL_NAME),
            university: find(COL_UNIVERSITY),
            category: find(COL_CATEGORY),
            total_runs: find(COL_TOTAL_RUNS),
            balls_faced: find(COL_BALLS_FACED),
            innings_played: find(COL_INNINGS_PLAYED),
            wickets: find(COL_WICKETS),
            overs_bowled: find(COL_OVERS_BOWLED),
            runs_conceded: find(COL_RUNS_CONCEDED),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        let slots = [
            (COL_NAME, self.name),
            (COL_UNIVERSITY, self.university),
            (COL_CATEGORY, self.category),
            (COL_TOTAL_RUNS, self.total_runs),
            (COL_BALLS_FACED, self.balls_faced),
            (COL_INNINGS_PLAYED, self.innings_played),
            (COL_WICKETS, self.wickets),
            (COL_OVERS_BOWLED, self.overs_bowled),
            (COL_RUNS_CONCEDED, self.runs_conceded),
        ];
        slots
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| *name)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

/// Parse a counting stat. Decimal input truncates toward zero; negative,
/// non-finite and non-numeric input is rejected.
fn parse_count(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.trunc() as u32)
    })
}

fn parse_overs(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Per-row field access that records defaults into the diagnostics list.
struct RowReader<'a> {
    record: &'a StringRecord,
    line: u64,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl RowReader<'_> {
    fn text(&self, idx: Option<usize>) -> String {
        idx.and_then(|i| self.record.get(i))
            .unwrap_or_default()
            .to_string()
    }

    fn number<T: Default>(
        &mut self,
        idx: Option<usize>,
        column: &'static str,
        parse: fn(&str) -> Option<T>,
    ) -> T {
        let Some(raw) = idx.and_then(|i| self.record.get(i)) else {
            return T::default();
        };
        match parse(raw) {
            Some(v) => v,
            None => {
                self.diagnostics.push(Diagnostic::UnparseableNumber {
                    line: self.line,
                    column,
                    raw: raw.to_string(),
                });
                T::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn row_to_pair(
    id: String,
    record: &StringRecord,
    line: u64,
    cols: &Columns,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Player, PlayerStats) {
    let mut row = RowReader {
        record,
        line,
        diagnostics,
    };

    let category = row.text(cols.category);
    let role = match Role::parse(&category) {
        Some(role) => role,
        None => {
            row.diagnostics.push(Diagnostic::UnknownCategory {
                line,
                raw: category.clone(),
            });
            Role::Batsman
        }
    };

    let counters = RawCounters {
        runs: row.number(cols.total_runs, COL_TOTAL_RUNS, parse_count),
        balls_faced: row.number(cols.balls_faced, COL_BALLS_FACED, parse_count),
        innings_played: row.number(cols.innings_played, COL_INNINGS_PLAYED, parse_count),
        wickets: row.number(cols.wickets, COL_WICKETS, parse_count),
        overs_bowled: row.number(cols.overs_bowled, COL_OVERS_BOWLED, parse_overs),
        runs_conceded: row.number(cols.runs_conceded, COL_RUNS_CONCEDED, parse_count),
    };

    let reconciled = reconcile(PlayerStats::from_counters(id.clone(), counters));
    if points_breakdown(&reconciled.stats).degenerate_bowling {
        row.diagnostics.push(Diagnostic::DegenerateBowling {
            player_id: id.clone(),
        });
    }

    let player = Player {
        id,
        name: row.text(cols.name),
        university: row.text(cols.university),
        role,
        image: Some(PLACEHOLDER_IMAGE.to_string()),
        value: reconciled.value,
        points: reconciled.points,
    };

    (player, reconciled.stats)
}

/// A line holding nothing but whitespace decodes as a single empty field.
/// A line of bare delimiters is a row of empty fields, not a blank line.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).is_some_and(str::is_empty)
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Ingest feed data from any reader.
pub fn ingest_reader<R: Read>(rdr: R, options: IngestOptions) -> Result<IngestReport, IngestError> {
    // Fields are split on the delimiter only; a quote is ordinary text.
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(rdr);

    let headers = reader.headers()?.clone();
    let mut report = IngestReport::default();
    if headers.is_empty() || is_blank(&headers) {
        debug!("feed has no header row");
        return Ok(report);
    }

    let cols = Columns::from_headers(&headers);
    for column in cols.missing() {
        if options.strict {
            return Err(IngestError::MissingColumn(column));
        }
        warn!("feed is missing column '{}', defaulting it for every row", column);
        report.diagnostics.push(Diagnostic::MissingColumn { column });
    }

    let expected = headers.len();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if options.strict {
                    return Err(e.into());
                }
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                debug!("dropping undecodable row at line {}: {}", line, e);
                report.diagnostics.push(Diagnostic::Malformed {
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if is_blank(&record) {
            continue;
        }

        if record.len() != expected {
            if options.strict {
                return Err(IngestError::FieldCount {
                    line,
                    expected,
                    found: record.len(),
                });
            }
            debug!(
                "dropping row at line {}: {} fields, header has {}",
                line,
                record.len(),
                expected
            );
            report.diagnostics.push(Diagnostic::FieldCount {
                line,
                expected,
                found: record.len(),
            });
            continue;
        }

        let id = (report.dataset.players.len() + 1).to_string();
        let (player, stats) = row_to_pair(id, &record, line, &cols, &mut report.diagnostics);
        report.dataset.players.push(player);
        report.dataset.player_stats.push(stats);
    }

    info!(
        "ingested {} players ({} rows dropped, {} diagnostics)",
        report.dataset.len(),
        report.dropped_rows(),
        report.diagnostics.len()
    );
    Ok(report)
}

/// Ingest feed text with explicit options.
pub fn parse_feed_with(text: &str, options: IngestOptions) -> Result<IngestReport, IngestError> {
    ingest_reader(text.as_bytes(), options)
}

/// Tolerant ingestion: malformed rows are dropped, bad numbers become 0 and
/// unknown categories become Batsman. Never fails.
pub fn parse_feed(text: &str) -> Dataset {
    match parse_feed_with(text, IngestOptions::default()) {
        Ok(report) => report.dataset,
        Err(e) => {
            warn!("feed ingestion failed: {}", e);
            Dataset::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
