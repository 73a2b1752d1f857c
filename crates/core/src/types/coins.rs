//! Coin arithmetic shared by the dashboard and its tests.

/// Visits bought by one coin when the server settings omit the rate.
pub const DEFAULT_VISITS_PER_COIN: i64 = 1000;

/// Coins needed to request `visits` visits at `visits_per_coin`.
///
/// Rounds up: any partial block of visits costs a whole coin. A missing or
/// non-positive rate falls back to [`DEFAULT_VISITS_PER_COIN`].
#[must_use]
pub const fn coins_needed(visits: i64, visits_per_coin: Option<i64>) -> i64 {
    let rate = match visits_per_coin {
        Some(rate) if rate > 0 => rate,
        _ => DEFAULT_VISITS_PER_COIN,
    };
    let quotient = visits / rate;
    // Truncation already rounds negative quotients up.
    if visits % rate > 0 {
        quotient + 1
    } else {
        quotient
    }
}
