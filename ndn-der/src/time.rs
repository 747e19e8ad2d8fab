//! Generalized-time string codec
//!
//! DER GeneralizedTime payloads in this system use the fixed-width UTC
//! form `YYYYMMDDHHMMSSZ` (15 ASCII bytes, seconds granularity). The codec
//! converts to and from milliseconds since the Unix epoch; sub-second
//! precision is truncated on format.

use crate::error::{NdnError, NdnResult};

const MSEC_PER_SEC: u64 = 1000;
const SEC_PER_DAY: u64 = 86400;

/// Format a millisecond Unix timestamp as `YYYYMMDDHHMMSSZ`
pub fn format_generalized_time(msec: u64) -> String {
    let secs = msec / MSEC_PER_SEC;
    let days = (secs / SEC_PER_DAY) as i64;
    let rem = secs % SEC_PER_DAY;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}Z",
        year,
        month,
        day,
        rem / 3600,
        rem % 3600 / 60,
        rem % 60
    )
}

/// Parse a `YYYYMMDDHHMMSSZ` payload into a millisecond Unix timestamp
///
/// # Error Handling
/// Returns error on a wrong length, a missing trailing 'Z', non-digit
/// characters, out-of-range calendar or clock fields, or a date before the
/// Unix epoch.
pub fn parse_generalized_time(value: &str) -> NdnResult<u64> {
    let bytes = value.as_bytes();
    if bytes.len() != 15 || bytes[14] != b'Z' {
        return Err(NdnError::DerDecoding(format!(
            "Unsupported GeneralizedTime format \"{}\"",
            value
        )));
    }

    let year = parse_digits(bytes, 0, 4)?;
    let month = parse_digits(bytes, 4, 2)? as u32;
    let day = parse_digits(bytes, 6, 2)? as u32;
    let hour = parse_digits(bytes, 8, 2)?;
    let minute = parse_digits(bytes, 10, 2)?;
    let second = parse_digits(bytes, 12, 2)?;

    if !(1..=12).contains(&month) {
        return Err(NdnError::DerDecoding(format!(
            "GeneralizedTime month {} out of range",
            month
        )));
    }
    if day < 1 || day > days_in_month(year as i64, month) {
        return Err(NdnError::DerDecoding(format!(
            "GeneralizedTime day {} out of range",
            day
        )));
    }
    if hour > 23 || minute > 59 || second > 59 {
        return Err(NdnError::DerDecoding(format!(
            "GeneralizedTime clock {:02}:{:02}:{:02} out of range",
            hour, minute, second
        )));
    }

    let days = days_from_civil(year as i64, month, day);
    if days < 0 {
        return Err(NdnError::DerDecoding(format!(
            "GeneralizedTime \"{}\" is before the Unix epoch",
            value
        )));
    }

    let secs = days as u64 * SEC_PER_DAY + hour * 3600 + minute * 60 + second;
    Ok(secs * MSEC_PER_SEC)
}

fn parse_digits(bytes: &[u8], start: usize, count: usize) -> NdnResult<u64> {
    let mut value = 0u64;
    for &byte in &bytes[start..start + count] {
        if !byte.is_ascii_digit() {
            return Err(NdnError::DerDecoding(
                "GeneralizedTime contains a non-digit character".to_string(),
            ));
        }
        value = value * 10 + (byte - b'0') as u64;
    }
    Ok(value)
}

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// Days since 1970-01-01 for a proleptic-Gregorian civil date
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146097 + doe - 719468
}

/// Civil date (year, month, day) for days since 1970-01-01
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (if month <= 2 { y + 1 } else { y }, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_timestamps() {
        assert_eq!(format_generalized_time(0), "19700101000000Z");
        // 2013-12-31 23:59:59 UTC
        assert_eq!(format_generalized_time(1388534399000), "20131231235959Z");
        // 2000-02-29 12:00:00 UTC (leap day of a multiple-of-400 year)
        assert_eq!(format_generalized_time(951825600000), "20000229120000Z");
    }

    #[test]
    fn test_parse_known_strings() {
        assert_eq!(parse_generalized_time("19700101000000Z").unwrap(), 0);
        assert_eq!(
            parse_generalized_time("20131231235959Z").unwrap(),
            1388534399000
        );
    }

    #[test]
    fn test_round_trip_truncates_milliseconds() {
        let msec = 1388534399123u64;
        let formatted = format_generalized_time(msec);
        assert_eq!(parse_generalized_time(&formatted).unwrap(), 1388534399000);
    }

    #[test]
    fn test_round_trip_many_values() {
        for msec in [
            0u64,
            1000,
            86_399_000,
            86_400_000,
            951_825_600_000,
            1_388_534_399_000,
            4_102_444_800_000, // 2100-01-01, a non-leap century year
        ] {
            let formatted = format_generalized_time(msec);
            assert_eq!(parse_generalized_time(&formatted).unwrap(), msec);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_generalized_time("").is_err());
        assert!(parse_generalized_time("20131231235959").is_err());
        assert!(parse_generalized_time("2013123123595Z").is_err());
        assert!(parse_generalized_time("20131231 35959Z").is_err());
        assert!(parse_generalized_time("20131331235959Z").is_err());
        assert!(parse_generalized_time("20130230235959Z").is_err());
        assert!(parse_generalized_time("20131231245959Z").is_err());
        assert!(parse_generalized_time("19691231235959Z").is_err());
    }
}
