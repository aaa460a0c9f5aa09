//! Time windows encoded in leaderboard identifiers.
//!
//! A leaderboard whose identifier ends in one of the recognized suffixes is
//! only writable until the window closes:
//!
//! - `...year2026`        — until the end of 2026 (UTC)
//! - `...month202607`     — until the end of July 2026
//! - `...week202631`      — until the end of ISO week 31 of 2026
//! - `...from100to200`    — until epoch 200
//!
//! Identifiers without a suffix never expire. Parsing is pure; callers
//! supply the clock.

use std::sync::LazyLock;

use chrono::{DateTime, Days, Months, NaiveDate, TimeZone, Utc, Weekday};
use regex::Regex;
use thiserror::Error;

static FROM_TO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"from(\d+)to(\d+)$").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"year(\d{4})$").unwrap());
static MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"month(\d{4})(\d{2})$").unwrap());
static WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"week(\d{4})(\d{2})$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpirationError {
    #[error("leaderboard {leaderboard} expired at epoch {expired_at}")]
    Expired { leaderboard: String, expired_at: i64 },
    #[error("malformed time window in leaderboard {leaderboard}: {reason}")]
    Malformed { leaderboard: String, reason: String },
}

/// Resolves the expiration of a leaderboard identifier against `now`.
///
/// Returns `None` for identifiers without a time suffix, the absolute
/// expiration instant for identifiers whose window is still open, and
/// [`ExpirationError::Expired`] once the window has closed.
pub fn leaderboard_expiration(
    leaderboard: &str,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, ExpirationError> {
    let Some(expires_at) = window_end(leaderboard)? else {
        return Ok(None);
    };

    if expires_at <= now {
        return Err(ExpirationError::Expired {
            leaderboard: leaderboard.to_string(),
            expired_at: expires_at.timestamp(),
        });
    }

    Ok(Some(expires_at))
}

fn window_end(leaderboard: &str) -> Result<Option<DateTime<Utc>>, ExpirationError> {
    let malformed = |reason: &str| ExpirationError::Malformed {
        leaderboard: leaderboard.to_string(),
        reason: reason.to_string(),
    };

    if let Some(caps) = FROM_TO.captures(leaderboard) {
        let end: i64 = caps[2]
            .parse()
            .map_err(|_| malformed("end epoch out of range"))?;
        let end = DateTime::from_timestamp(end, 0).ok_or_else(|| malformed("invalid end epoch"))?;
        return Ok(Some(end));
    }

    if let Some(caps) = YEAR.captures(leaderboard) {
        let year: i32 = caps[1].parse().map_err(|_| malformed("invalid year"))?;
        let end = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| malformed("invalid year"))?;
        return Ok(Some(end));
    }

    if let Some(caps) = MONTH.captures(leaderboard) {
        let year: i32 = caps[1].parse().map_err(|_| malformed("invalid year"))?;
        let month: u32 = caps[2].parse().map_err(|_| malformed("invalid month"))?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| malformed("invalid month"))?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| malformed("month out of range"))?
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();
        return Ok(Some(end));
    }

    if let Some(caps) = WEEK.captures(leaderboard) {
        let year: i32 = caps[1].parse().map_err(|_| malformed("invalid year"))?;
        let week: u32 = caps[2].parse().map_err(|_| malformed("invalid week"))?;
        let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .ok_or_else(|| malformed("invalid ISO week"))?;
        let end = start
            .checked_add_days(Days::new(7))
            .ok_or_else(|| malformed("week out of range"))?
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();
        return Ok(Some(end));
    }

    Ok(None)
}
