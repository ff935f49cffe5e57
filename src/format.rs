//! Human-facing formatting of outage timestamps.

use chrono::{DateTime, TimeZone, Utc};

const DAYS_PER_MONTH: f64 = 30.44;
const DAYS_PER_YEAR: f64 = 365.25;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// How long ago `ts` was, relative to `now`, e.g. `"3 days"` or
/// `"2 months"`. Future timestamps read `"starting soon"`.
pub fn relative_duration<Tz: TimeZone>(ts: &DateTime<Tz>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(ts);
    let minutes = elapsed.num_seconds() as f64 / 60.0;
    if minutes < 0.0 {
        return "starting soon".to_string();
    }
    if minutes < 60.0 {
        return plural(minutes as i64, "minute");
    }
    let hours = minutes / 60.0;
    if hours < 24.0 {
        return plural(hours as i64, "hour");
    }
    let days = hours / 24.0;
    if days < 30.0 {
        return plural(days as i64, "day");
    }
    let months = days / DAYS_PER_MONTH;
    if months < 12.0 {
        return plural(months as i64, "month");
    }
    format!("{:.1} years", days / DAYS_PER_YEAR)
}

/// [`relative_duration`] for optional timestamps.
pub fn relative_duration_opt<Tz: TimeZone>(
    ts: Option<&DateTime<Tz>>,
    now: DateTime<Utc>,
) -> Option<String> {
    ts.map(|ts| relative_duration(ts, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ago(d: Duration) -> String {
        let now = Utc::now();
        relative_duration(&(now - d), now)
    }

    #[test]
    fn test_future_is_starting_soon() {
        let now = Utc::now();
        assert_eq!(relative_duration(&(now + Duration::minutes(5)), now), "starting soon");
    }

    #[test]
    fn test_minutes_and_singular() {
        assert_eq!(ago(Duration::seconds(20)), "0 minutes");
        assert_eq!(ago(Duration::minutes(1)), "1 minute");
        assert_eq!(ago(Duration::minutes(59)), "59 minutes");
    }

    #[test]
    fn test_hours_days_months() {
        assert_eq!(ago(Duration::minutes(60)), "1 hour");
        assert_eq!(ago(Duration::hours(23)), "23 hours");
        assert_eq!(ago(Duration::hours(24)), "1 day");
        assert_eq!(ago(Duration::days(29)), "29 days");
        assert_eq!(ago(Duration::days(31)), "1 month");
        assert_eq!(ago(Duration::days(200)), "6 months");
    }

    #[test]
    fn test_years_have_one_decimal() {
        assert_eq!(ago(Duration::days(548)), "1.5 years");
    }

    #[test]
    fn test_offsets_are_respected() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let start = DateTime::parse_from_rfc3339("2024-03-01T05:00:00-05:00").unwrap();
        assert_eq!(relative_duration(&start, now), "2 hours");
    }

    #[test]
    fn test_optional() {
        assert_eq!(relative_duration_opt::<Utc>(None, Utc::now()), None);
    }
}
