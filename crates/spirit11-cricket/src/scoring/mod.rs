// Scoring engine: overs conversion, rate statistics, points and value.

pub mod overs;
pub mod points;
pub mod rates;
pub mod reconcile;

pub use overs::to_balls;
pub use points::{compute_points, compute_value, points_breakdown, PointsBreakdown};
pub use rates::{
    batting_average, batting_strike_rate, bowling_economy, bowling_strike_rate,
    display_bowling_strike_rate, NO_WICKETS_STRIKE_RATE,
};
pub use reconcile::{is_reconciled, reconcile, Reconciled};
