// Rate statistics derived from cumulative counters.
//
// Every function is total: each one guards its own denominator instead of
// letting a division by zero leak NaN or infinity into the points formula.

/// Bowling strike rate reported for a bowler with no wickets. It marks the
/// rate as undefined; it is not a measurement.
pub const NO_WICKETS_STRIKE_RATE: f64 = 999.0;

/// Runs per 100 balls faced. Zero when no balls were faced.
pub fn batting_strike_rate(runs: u32, balls_faced: u32) -> f64 {
    if balls_faced == 0 {
        return 0.0;
    }
    f64::from(runs) / f64::from(balls_faced) * 100.0
}

/// Runs per innings. Zero when no innings were played.
pub fn batting_average(runs: u32, innings_played: u32) -> f64 {
    if innings_played == 0 {
        return 0.0;
    }
    f64::from(runs) / f64::from(innings_played)
}

/// Balls bowled per wicket, or [`NO_WICKETS_STRIKE_RATE`] without wickets.
pub fn bowling_strike_rate(balls_bowled: u32, wickets: u32) -> f64 {
    if wickets == 0 {
        return NO_WICKETS_STRIKE_RATE;
    }
    f64::from(balls_bowled) / f64::from(wickets)
}

/// Runs conceded per over (six balls). Zero when no balls were bowled.
pub fn bowling_economy(runs_conceded: u32, balls_bowled: u32) -> f64 {
    if balls_bowled == 0 {
        return 0.0;
    }
    f64::from(runs_conceded) / f64::from(balls_bowled) * 6.0
}

/// Render a bowling strike rate for tables: the no-wickets sentinel becomes
/// a dash, real rates get two decimals.
pub fn display_bowling_strike_rate(rate: f64) -> String {
    if rate == NO_WICKETS_STRIKE_RATE {
        "-".to_string()
    } else {
        format!("{rate:.2}")
    }
}
