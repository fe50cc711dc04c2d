//! Term keys: canonical period labels for bucketing
//!
//! The same functions are used to enumerate the grid and to bucket each
//! issue. A term built any other way will not find its bucket.

use chrono::{Datelike, Duration, NaiveDate};

use crate::types::{BucketOrder, Granularity};

/// Date-based period of a granularity, `None` for sprint/custom grouping
pub fn term_key(date: NaiveDate, granularity: &Granularity) -> Option<String> {
    match granularity {
        Granularity::Daily => Some(daily_key(date)),
        Granularity::Weekly => Some(weekly_key(date)),
        Granularity::Monthly => Some(monthly_key(date)),
        Granularity::Sprint | Granularity::Custom(_) => None,
    }
}

/// `YYYY-MM-DD`
pub fn daily_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD` of the Monday starting the week containing `date`
pub fn weekly_key(date: NaiveDate) -> String {
    daily_key(week_start(date))
}

/// `YYYY-MM`
pub fn monthly_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// `Sprint N`
pub fn sprint_key(number: u32) -> String {
    format!("Sprint {}", number)
}

/// Monday of the week containing `date` (Sunday goes back 6 days)
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First day of the period of `granularity` containing `date`
pub fn period_start(date: NaiveDate, granularity: &Granularity) -> NaiveDate {
    match granularity {
        Granularity::Weekly => week_start(date),
        Granularity::Monthly => date.with_day(1).unwrap_or(date),
        _ => date,
    }
}

/// Order of a date term: its digits read as a number (`2024-03` → 202403)
pub fn date_order(term: &str) -> BucketOrder {
    let digits: String = term.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<f64>() {
        Ok(n) => BucketOrder::Number(n),
        Err(_) => BucketOrder::Text(term.to_string()),
    }
}

/// Order of a sprint term
pub fn sprint_order(number: u32) -> BucketOrder {
    BucketOrder::Number(f64::from(number))
}

/// Order of a custom field value: numeric when it parses as a number
pub fn custom_order(value: &str) -> BucketOrder {
    BucketOrder::parse(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // ========== daily / monthly tests ==========

    #[test]
    fn test_daily_key() {
        assert_eq!(daily_key(date("2024-03-05")), "2024-03-05");
    }

    #[test]
    fn test_monthly_key() {
        assert_eq!(monthly_key(date("2024-01-20")), "2024-01");
    }

    // ========== weekly tests ==========

    #[test]
    fn test_weekly_sunday_goes_back_six_days() {
        assert_eq!(weekly_key(date("2024-03-03")), "2024-02-26");
    }

    #[test]
    fn test_weekly_monday_unchanged() {
        assert_eq!(weekly_key(date("2024-03-04")), "2024-03-04");
    }

    #[test]
    fn test_weekly_midweek() {
        assert_eq!(weekly_key(date("2024-03-07")), "2024-03-04");
    }

    #[test]
    fn test_weekly_crosses_year_boundary() {
        assert_eq!(weekly_key(date("2025-01-01")), "2024-12-30");
    }

    #[test]
    fn test_weekly_key_is_monday_and_stable_within_week() {
        let mut d = date("2023-12-25");
        let end = date("2024-03-31");
        while d <= end {
            let key = weekly_key(d);
            let monday = date(&key);
            assert_eq!(monday.weekday(), chrono::Weekday::Mon);
            for offset in 0..7 {
                assert_eq!(weekly_key(monday + Duration::days(offset)), key);
            }
            d += Duration::days(1);
        }
    }

    // ========== term_key tests ==========

    #[test]
    fn test_term_key_dispatch() {
        let d = date("2024-03-06");
        assert_eq!(term_key(d, &Granularity::Daily).unwrap(), "2024-03-06");
        assert_eq!(term_key(d, &Granularity::Weekly).unwrap(), "2024-03-04");
        assert_eq!(term_key(d, &Granularity::Monthly).unwrap(), "2024-03");
        assert!(term_key(d, &Granularity::Sprint).is_none());
    }

    #[test]
    fn test_sprint_key() {
        assert_eq!(sprint_key(14), "Sprint 14");
    }

    // ========== order tests ==========

    #[test]
    fn test_date_order_strips_separators() {
        assert_eq!(date_order("2024-03"), BucketOrder::Number(202403.0));
        assert_eq!(date_order("2024-03-04"), BucketOrder::Number(20240304.0));
    }

    #[test]
    fn test_date_order_sorts_chronologically_across_years() {
        assert!(date_order("2023-12-25") < date_order("2024-01-01"));
    }

    #[test]
    fn test_period_start() {
        let d = date("2024-03-07");
        assert_eq!(period_start(d, &Granularity::Daily), d);
        assert_eq!(period_start(d, &Granularity::Weekly), date("2024-03-04"));
        assert_eq!(period_start(d, &Granularity::Monthly), date("2024-03-01"));
    }
}
