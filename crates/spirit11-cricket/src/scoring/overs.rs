// Cricket overs notation -> ball count.

/// Balls in one over.
pub const BALLS_PER_OVER: u32 = 6;

/// Convert overs in cricket notation to a ball count.
///
/// The integer part counts complete overs and the first decimal digit counts
/// extra balls, so `4.3` is four overs and three balls (27 balls), not
/// `4.3 * 6`. The fractional part is scaled by ten and rounded to the nearest
/// ball; a second decimal digit is not valid notation and simply flows through
/// that rounding. Negative and non-finite input yields 0.
pub fn to_balls(overs: f64) -> u32 {
    if !overs.is_finite() || overs <= 0.0 {
        return 0;
    }
    let whole = overs.floor();
    let extra_balls = ((overs - whole) * 10.0).round();
    (whole * f64::from(BALLS_PER_OVER) + extra_balls) as u32
}
