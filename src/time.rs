use chrono::Duration;
use serde::Serializer;

use crate::error::RaceError;

/// Parse an elapsed race time.
///
/// Accepted forms: "h:mm:ss", "mm:ss" or plain seconds, each optionally
/// followed by a fractional part ("1:02:03.5"). Components after the first
/// must be below 60.
pub fn parse_time(s: &str) -> Result<Duration, RaceError> {
    let s = s.trim();
    let invalid = || RaceError::InvalidTime(s.to_string());

    if s.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };

    let parts: Vec<&str> = whole.split(':').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    let mut seconds: i64 = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: i64 = part.parse().map_err(|_| invalid())?;
        if i > 0 && value >= 60 {
            return Err(invalid());
        }
        seconds = seconds
            .checked_mul(60)
            .and_then(|s| s.checked_add(value))
            .ok_or_else(invalid)?;
    }

    let millis = match fraction {
        None => 0,
        Some(f) => {
            if f.is_empty() || f.len() > 3 || !f.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let padded = format!("{:0<3}", f);
            padded.parse::<i64>().map_err(|_| invalid())?
        }
    };

    let total_ms = seconds
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)?;
    Ok(Duration::milliseconds(total_ms))
}

/// Parse a duration given in configuration: either a race time ("2:36:00")
/// or a humantime expression ("2h 36m").
pub fn parse_config_time(s: &str) -> Result<Duration, RaceError> {
    if let Ok(t) = parse_time(s) {
        return Ok(t);
    }
    let std_duration =
        humantime::parse_duration(s.trim()).map_err(|_| RaceError::InvalidTime(s.to_string()))?;
    Duration::from_std(std_duration).map_err(|_| RaceError::InvalidTime(s.to_string()))
}

/// Format as "h:mm:ss", adding a trimmed fractional part only when present.
pub fn format_time(t: Duration) -> String {
    let total_ms = t.num_milliseconds();
    let sign = if total_ms < 0 { "-" } else { "" };
    let total_ms = total_ms.abs();

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    if millis == 0 {
        format!("{}{}:{:02}:{:02}", sign, hours, minutes, seconds)
    } else {
        let fraction = format!("{:03}", millis);
        format!(
            "{}{}:{:02}:{:02}.{}",
            sign,
            hours,
            minutes,
            seconds,
            fraction.trim_end_matches('0')
        )
    }
}

/// Format an optional time, using "-" when unknown.
pub fn format_optional_time(t: Option<Duration>) -> String {
    t.map(format_time).unwrap_or_else(|| "-".to_string())
}

/// Divide `numerator` milliseconds by `denominator` and round to the nearest
/// whole second, halves rounding up.
pub fn round_ratio_to_second(numerator: i64, denominator: i64) -> Duration {
    let scaled = denominator * 1000;
    let seconds = (2 * numerator + scaled).div_euclid(2 * scaled);
    Duration::seconds(seconds)
}

pub(crate) fn serialize_optional_time<S: Serializer>(
    t: &Option<Duration>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match t {
        Some(t) => s.serialize_some(&format_time(*t)),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours_minutes_seconds() {
        assert_eq!(parse_time("1:02:03").unwrap(), Duration::seconds(3723));
    }

    #[test]
    fn test_parse_minutes_seconds() {
        assert_eq!(parse_time("43:12").unwrap(), Duration::seconds(43 * 60 + 12));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        assert_eq!(parse_time("0:00:01.5").unwrap(), Duration::milliseconds(1500));
        assert_eq!(parse_time("10.25").unwrap(), Duration::milliseconds(10_250));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_time("").is_err());
        assert!(parse_time("1:2:3:4").is_err());
        assert!(parse_time("1:75:00").is_err());
        assert!(parse_time("ab:00").is_err());
        assert!(parse_time("1:00:00.").is_err());
        assert!(parse_time("?").is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_times() {
        assert_eq!(
            parse_time("999999999999999999:00:00"),
            Err(RaceError::InvalidTime("999999999999999999:00:00".to_string()))
        );
        assert!(parse_time("9223372036854775807").is_err());
        assert!(parse_config_time("999999999999999999:00:00").is_err());
    }

    #[test]
    fn test_parse_config_time_humantime() {
        assert_eq!(parse_config_time("2h 36m").unwrap(), Duration::seconds(9360));
        assert_eq!(parse_config_time("2:36:00").unwrap(), Duration::seconds(9360));
        assert!(parse_config_time("soon").is_err());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Duration::seconds(3723)), "1:02:03");
        assert_eq!(format_time(Duration::zero()), "0:00:00");
        assert_eq!(format_time(Duration::milliseconds(61_500)), "0:01:01.5");
    }

    #[test]
    fn test_format_optional_time() {
        assert_eq!(format_optional_time(None), "-");
        assert_eq!(format_optional_time(Some(Duration::seconds(60))), "0:01:00");
    }

    #[test]
    fn test_round_ratio_half_up() {
        // 1500ms / 1 -> 2s
        assert_eq!(round_ratio_to_second(1500, 1), Duration::seconds(2));
        // 1499ms / 1 -> 1s
        assert_eq!(round_ratio_to_second(1499, 1), Duration::seconds(1));
        // 5000ms / 2 = 2.5s -> 3s
        assert_eq!(round_ratio_to_second(5000, 2), Duration::seconds(3));
    }
}
