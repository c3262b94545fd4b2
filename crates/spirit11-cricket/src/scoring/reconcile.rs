// Single recompute path for a stats record and its player's points/value.

use super::overs::to_balls;
use super::points::{compute_points, compute_value};
use super::rates::{batting_average, batting_strike_rate, bowling_economy, bowling_strike_rate};
use crate::model::{Player, PlayerStats};

/// A stats record with current derived rates, plus the points and value
/// that follow from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub stats: PlayerStats,
    pub points: i64,
    pub value: i64,
}

impl Reconciled {
    /// Write points and value onto the owning player.
    pub fn apply_to(&self, player: &mut Player) {
        debug_assert_eq!(player.id, self.stats.player_id);
        player.points = self.points;
        player.value = self.value;
    }
}

/// Recompute every derived field of `stats` from its raw counters, then the
/// points and value. Ingestion, admin edits and persistence updates all go
/// through here so a record is never stored with stale rates.
pub fn reconcile(mut stats: PlayerStats) -> Reconciled {
    let balls_bowled = to_balls(stats.overs_bowled);

    stats.batting_strike_rate = batting_strike_rate(stats.runs, stats.balls_faced);
    stats.batting_average = batting_average(stats.runs, stats.innings_played);
    stats.bowling_strike_rate = bowling_strike_rate(balls_bowled, stats.wickets);
    stats.bowling_economy = bowling_economy(stats.runs_conceded, balls_bowled);

    let points = compute_points(&stats);
    Reconciled {
        stats,
        points,
        value: compute_value(points),
    }
}

/// Whether the derived rates of `stats` match its raw counters.
pub fn is_reconciled(stats: &PlayerStats) -> bool {
    reconcile(stats.clone()).stats == *stats
}
