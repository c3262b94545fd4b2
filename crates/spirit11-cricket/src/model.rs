// Player and per-player statistics records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image path assigned to every ingested player until an admin uploads one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=100&width=100";

/// Best-bowling figure used when the feed carries no bowling breakdown.
pub const NO_BEST_BOWLING: &str = "0/0";

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Playing role of a cricketer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Role {
    #[default]
    Batsman,
    Bowler,
    #[serde(rename = "All-Rounder")]
    AllRounder,
    #[serde(rename = "Wicket Keeper")]
    WicketKeeper,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Batsman,
        Role::Bowler,
        Role::AllRounder,
        Role::WicketKeeper,
    ];

    /// Exact, case-sensitive match against the feed's category names.
    pub fn parse(category: &str) -> Option<Self> {
        match category {
            "Batsman" => Some(Role::Batsman),
            "Bowler" => Some(Role::Bowler),
            "All-Rounder" => Some(Role::AllRounder),
            "Wicket Keeper" => Some(Role::WicketKeeper),
            _ => None,
        }
    }

    /// Map a feed category to a role, falling back to `Batsman` for anything
    /// outside the closed set (including an empty or missing value).
    pub fn from_category(category: &str) -> Self {
        Self::parse(category).unwrap_or(Role::Batsman)
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Batsman => "Batsman",
            Role::Bowler => "Bowler",
            Role::AllRounder => "All-Rounder",
            Role::WicketKeeper => "Wicket Keeper",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Market-facing player record.
///
/// `points` and `value` are derived from the player's [`PlayerStats`] through
/// [`crate::scoring::reconcile`]; the only sanctioned way to set `value`
/// independently is [`Player::override_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub university: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub value: i64,
    pub points: i64,
}

impl Player {
    /// Admin override of the market value. The next reconcile of this
    /// player's stats restores the formula value.
    pub fn override_value(&mut self, value: i64) {
        self.value = value;
    }
}

// ---------------------------------------------------------------------------
// PlayerStats
// ---------------------------------------------------------------------------

/// Raw cumulative counters, the only authored part of a stats record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawCounters {
    pub runs: u32,
    pub balls_faced: u32,
    pub innings_played: u32,
    pub wickets: u32,
    /// Cricket notation: integer overs plus balls (0-5) in the first decimal.
    pub overs_bowled: f64,
    pub runs_conceded: u32,
}

/// Per-player statistics, correlated to a [`Player`] by `player_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub player_id: String,

    pub matches: u32,
    pub runs: u32,
    pub balls_faced: u32,
    pub innings_played: u32,
    pub wickets: u32,
    pub overs_bowled: f64,
    pub runs_conceded: u32,

    // Derived; always recomputed from the counters above.
    pub batting_strike_rate: f64,
    pub batting_average: f64,
    pub bowling_strike_rate: f64,
    pub bowling_economy: f64,

    // Not carried by the feed.
    pub catches: u32,
    pub stumpings: u32,
    pub highest_score: u32,
    pub best_bowling: String,
    pub fifties: u32,
    pub hundreds: u32,
}

impl PlayerStats {
    /// Build a record from raw counters with placeholder values for the
    /// fields the feed does not carry. Derived rates are left at zero; run
    /// the result through [`crate::scoring::reconcile`] before use.
    pub fn from_counters(player_id: impl Into<String>, counters: RawCounters) -> Self {
        Self {
            player_id: player_id.into(),
            matches: counters.innings_played,
            runs: counters.runs,
            balls_faced: counters.balls_faced,
            innings_played: counters.innings_played,
            wickets: counters.wickets,
            overs_bowled: counters.overs_bowled,
            runs_conceded: counters.runs_conceded,
            batting_strike_rate: 0.0,
            batting_average: 0.0,
            bowling_strike_rate: 0.0,
            bowling_economy: 0.0,
            catches: 0,
            stumpings: 0,
            highest_score: 0,
            best_bowling: NO_BEST_BOWLING.to_string(),
            fifties: 0,
            hundreds: 0,
        }
    }

    /// The authored counters of this record.
    pub fn counters(&self) -> RawCounters {
        RawCounters {
            runs: self.runs,
            balls_faced: self.balls_faced,
            innings_played: self.innings_played,
            wickets: self.wickets,
            overs_bowled: self.overs_bowled,
            runs_conceded: self.runs_conceded,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Players and their statistics as produced by one ingestion pass.
///
/// Freshly ingested collections are index-correlated, but anything downstream
/// may filter or sort them independently, so joins go through ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub players: Vec<Player>,
    pub player_stats: Vec<PlayerStats>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.player_stats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn stats_for(&self, player_id: &str) -> Option<&PlayerStats> {
        self.player_stats.iter().find(|s| s.player_id == player_id)
    }
}
