//! Formatting helpers shared by both panels

use chrono::{DateTime, NaiveDate, Utc};

const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const MS_PER_DAY: f64 = 86_400_000.0;

/// Format bytes into a human-readable size with binary prefixes.
///
/// Two decimals at most, trailing zeros dropped: `1024` is `"1 KB"`,
/// `1572864` is `"1.5 MB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, BYTE_UNITS[unit])
}

/// Whole days left until `expire_at`, rounded up
pub fn days_until(expire_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (expire_at - now).num_milliseconds() as f64;
    (ms / MS_PER_DAY).ceil() as i64
}

/// How close a trash record is to being purged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryUrgency {
    Expired,
    Critical, // 5 days or less
    Warning,  // 15 days or less
    Normal,
}

impl ExpiryUrgency {
    pub fn classify(days_left: i64) -> Self {
        if days_left <= 0 {
            Self::Expired
        } else if days_left <= 5 {
            Self::Critical
        } else if days_left <= 15 {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    pub fn label(self, days_left: i64) -> String {
        match self {
            Self::Expired => "expired".to_string(),
            _ if days_left == 1 => "1 day".to_string(),
            _ => format!("{} days", days_left),
        }
    }
}

/// Name pre-filled in the create-backup form
pub fn default_backup_name(date: NaiveDate) -> String {
    format!("Backup {}", date.format("%Y-%m-%d"))
}

/// File name given to a locally downloaded dump
pub fn download_file_name(date: NaiveDate) -> String {
    format!("backup_{}.sql", date.format("%Y-%m-%d"))
}

/// Short human form of an RFC 3339 timestamp, falling back to the raw text
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_572_864), "1.5 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_bytes(1024u64.pow(4) * 3), "3 TB");
        assert_eq!(format_bytes(1024u64.pow(5)), "1024 TB");
    }

    #[test]
    fn test_format_bytes_steps_by_1024() {
        let mut previous_unit = 0;
        for power in 0..5u32 {
            let formatted = format_bytes(1024u64.pow(power));
            let unit = BYTE_UNITS.iter().position(|u| formatted.ends_with(u)).unwrap();
            assert_eq!(formatted, format!("1 {}", BYTE_UNITS[power as usize]));
            assert!(unit >= previous_unit);
            previous_unit = unit;
        }
        assert_eq!(format_bytes(1023), "1023 Bytes");
    }

    #[test]
    fn test_days_until_rounds_up() {
        assert_eq!(days_until(now() + Duration::days(5), now()), 5);
        assert_eq!(days_until(now() + Duration::days(5) + Duration::minutes(2), now()), 6);
        assert_eq!(days_until(now() + Duration::hours(1), now()), 1);
        assert_eq!(days_until(now(), now()), 0);
        assert_eq!(days_until(now() - Duration::days(2), now()), -2);
    }

    #[test]
    fn test_expiry_urgency_boundaries() {
        let exactly_five = days_until(now() + Duration::days(5), now());
        assert_eq!(ExpiryUrgency::classify(exactly_five), ExpiryUrgency::Critical);

        // 5.001 days
        let just_over = days_until(now() + Duration::milliseconds(5_001 * 86_400), now());
        assert_eq!(ExpiryUrgency::classify(just_over), ExpiryUrgency::Warning);

        assert_eq!(ExpiryUrgency::classify(0), ExpiryUrgency::Expired);
        assert_eq!(ExpiryUrgency::classify(-3), ExpiryUrgency::Expired);
        assert_eq!(ExpiryUrgency::classify(15), ExpiryUrgency::Warning);
        assert_eq!(ExpiryUrgency::classify(16), ExpiryUrgency::Normal);

        assert_eq!(ExpiryUrgency::Expired.label(-3), "expired");
        assert_eq!(ExpiryUrgency::Critical.label(1), "1 day");
        assert_eq!(ExpiryUrgency::Normal.label(20), "20 days");
    }

    #[test]
    fn test_dated_names() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(default_backup_name(date), "Backup 2026-10-19");
        assert_eq!(download_file_name(date), "backup_2026-10-19.sql");
    }

    #[test]
    fn test_format_timestamp_falls_back_to_raw() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp(""), "");
    }
}
