// Composite points and market value formulas.

use crate::model::PlayerStats;

/// Batting and bowling contributions to a player's points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsBreakdown {
    pub batting: f64,
    pub bowling: f64,
    /// Wickets were credited but a bowling denominator (strike rate or
    /// economy) is zero. The affected term contributed nothing.
    pub degenerate_bowling: bool,
}

impl PointsBreakdown {
    /// Rounded total; halves round away from zero.
    pub fn total(&self) -> i64 {
        (self.batting + self.bowling).round() as i64
    }
}

/// `numerator / rate`, or `None` when the rate is zero.
fn inverse_term(numerator: f64, rate: f64) -> Option<f64> {
    if rate == 0.0 {
        None
    } else {
        Some(numerator / rate)
    }
}

/// Split a stats record into its points components.
///
/// Batting: `strike_rate / 5 + average * 0.8`. Bowling: nothing without
/// wickets, otherwise `500 / bowling_strike_rate + 140 / economy`, where a
/// zero denominator drops that term and sets `degenerate_bowling`.
pub fn points_breakdown(stats: &PlayerStats) -> PointsBreakdown {
    let batting = stats.batting_strike_rate / 5.0 + stats.batting_average * 0.8;

    if stats.wickets == 0 {
        return PointsBreakdown {
            batting,
            bowling: 0.0,
            degenerate_bowling: false,
        };
    }

    let strike = inverse_term(500.0, stats.bowling_strike_rate);
    let economy = inverse_term(140.0, stats.bowling_economy);
    PointsBreakdown {
        batting,
        bowling: strike.unwrap_or(0.0) + economy.unwrap_or(0.0),
        degenerate_bowling: strike.is_none() || economy.is_none(),
    }
}

/// Composite points for a stats record whose derived rates are current.
pub fn compute_points(stats: &PlayerStats) -> i64 {
    points_breakdown(stats).total()
}

/// Market value in rupees: `(9 * points + 100) * 1000`.
pub fn compute_value(points: i64) -> i64 {
    points
        .saturating_mul(9)
        .saturating_add(100)
        .saturating_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawCounters;
    use crate::scoring::reconcile;

    fn derived(counters: RawCounters) -> PlayerStats {
        reconcile(PlayerStats::from_counters("1", counters)).stats
    }

    #[test]
    fn batting_only_points_exclude_bowling() {
        let stats = derived(RawCounters {
            runs: 450,
            balls_faced: 350,
            innings_played: 10,
            ..Default::default()
        });
        let expected = (stats.batting_strike_rate / 5.0 + stats.batting_average * 0.8).round();
        assert_eq!(compute_points(&stats), expected as i64);
        assert_eq!(compute_points(&stats), 62);

        let breakdown = points_breakdown(&stats);
        assert_eq!(breakdown.bowling, 0.0);
        assert!(!breakdown.degenerate_bowling);
    }

    #[test]
    fn all_round_points() {
        // SR 66.67, avg 4.0, bowling SR 12, economy 7.5
        let stats = derived(RawCounters {
            runs: 20,
            balls_faced: 30,
            innings_played: 5,
            wickets: 10,
            overs_bowled: 20.0,
            runs_conceded: 150,
        });
        let breakdown = points_breakdown(&stats);
        assert!((breakdown.bowling - (500.0 / 12.0 + 140.0 / 7.5)).abs() < 1e-9);
        assert_eq!(compute_points(&stats), 77);
    }

    #[test]
    fn half_points_round_up() {
        // 1 run off 8 balls: strike rate 12.5, batting component exactly 2.5
        let stats = derived(RawCounters {
            runs: 1,
            balls_faced: 8,
            ..Default::default()
        });
        assert_eq!(compute_points(&stats), 3);
    }

    #[test]
    fn wickets_with_zero_economy_stay_finite() {
        // One wicket-maiden: economy 0, strike rate 6
        let stats = derived(RawCounters {
            wickets: 1,
            overs_bowled: 1.0,
            ..Default::default()
        });
        let breakdown = points_breakdown(&stats);
        assert!(breakdown.degenerate_bowling);
        assert!(breakdown.bowling.is_finite());
        assert_eq!(compute_points(&stats), 83);
    }

    #[test]
    fn wickets_without_balls_bowled_contribute_nothing() {
        let stats = derived(RawCounters {
            wickets: 2,
            ..Default::default()
        });
        let breakdown = points_breakdown(&stats);
        assert!(breakdown.degenerate_bowling);
        assert_eq!(breakdown.bowling, 0.0);
        assert_eq!(compute_points(&stats), 0);
    }

    #[test]
    fn value_formula() {
        assert_eq!(compute_value(50), 1_450_000);
        assert_eq!(compute_value(0), 100_000);
        assert_eq!(compute_value(77), 793_000);
    }

    #[test]
    fn value_is_monotonic() {
        let values: Vec<i64> = (0..200).map(compute_value).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }
}
