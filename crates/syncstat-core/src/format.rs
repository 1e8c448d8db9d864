use num_format::{Locale, ToFormattedString};

pub const NOT_AVAILABLE: &str = "N/A";

const SECONDS_PER_DAY: u64 = 86_400;

// 2^63; anything at or past it does not fit an i64.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn whole_seconds(seconds: f64) -> Option<i64> {
    let whole = seconds.trunc();
    (whole.is_finite() && whole.abs() < I64_LIMIT).then_some(whole as i64)
}

/// Renders whole seconds as `H:MM:SS`, prefixed with `D day(s), ` once the
/// value reaches a day. Fractions are truncated; non-finite input and values
/// beyond the `i64` range are `N/A`.
pub fn format_seconds(seconds: f64) -> String {
    let Some(whole) = whole_seconds(seconds) else {
        return NOT_AVAILABLE.to_string();
    };

    let sign = if whole < 0 { "-" } else { "" };
    let total = whole.unsigned_abs();
    let days = total / SECONDS_PER_DAY;
    let rem = total % SECONDS_PER_DAY;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);

    match days {
        0 => format!("{sign}{clock}"),
        1 => format!("{sign}1 day, {clock}"),
        _ => format!("{sign}{days} days, {clock}"),
    }
}

pub fn format_optional_seconds(seconds: Option<f64>) -> String {
    seconds.map_or_else(|| NOT_AVAILABLE.to_string(), format_seconds)
}

/// `D days, H:MM:SS (Ns)`, used for totals.
pub fn format_duration_total(seconds: f64) -> String {
    match whole_seconds(seconds) {
        Some(whole) => format!("{} ({whole}s)", format_seconds(seconds)),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Signed duration delta: `+0:01:40 (+100s)`.
pub fn format_signed_duration(delta: f64) -> String {
    let Some(whole) = whole_seconds(delta) else {
        return NOT_AVAILABLE.to_string();
    };
    let sign = if delta < 0.0 { "-" } else { "+" };
    let magnitude = whole.unsigned_abs();
    format!(
        "{sign}{} ({sign}{magnitude}s)",
        format_seconds(delta.abs())
    )
}

pub fn format_count(value: i64) -> String {
    value.to_formatted_string(&Locale::en)
}

pub fn format_signed_count(value: i64) -> String {
    if value < 0 {
        value.to_formatted_string(&Locale::en)
    } else {
        format!("+{}", value.to_formatted_string(&Locale::en))
    }
}

pub fn format_fixed(value: f64) -> String {
    format!("{value:.2}")
}

pub fn format_signed_fixed(value: f64) -> String {
    format!("{value:+.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seconds_is_bare_clock() {
        assert_eq!(format_seconds(0.0), "0:00:00");
    }

    #[test]
    fn out_of_range_seconds_are_not_available() {
        assert_eq!(format_seconds(-1e300), "N/A");
        assert_eq!(format_seconds(1e19), "N/A");
        assert_eq!(format_duration_total(-1e300), "N/A");
        assert_eq!(format_signed_duration(f64::MAX), "N/A");
        assert_eq!(format_seconds(-90.5), "-0:01:30");
        assert_eq!(format_seconds(-9.2e18), "-106481481481481 days, 11:33:20");
    }

    #[test]
    fn missing_seconds_are_not_available() {
        assert_eq!(format_seconds(f64::NAN), "N/A");
        assert_eq!(format_optional_seconds(None), "N/A");
    }

    #[test]
    fn days_are_pluralised() {
        assert_eq!(format_seconds(86_400.0), "1 day, 0:00:00");
        assert_eq!(format_seconds(2.0 * 86_400.0 + 3723.9), "2 days, 1:02:03");
    }

    #[test]
    fn signed_duration_carries_sign_twice() {
        assert_eq!(format_signed_duration(100.0), "+0:01:40 (+100s)");
        assert_eq!(format_signed_duration(-3600.0), "-1:00:00 (-3600s)");
    }

    #[test]
    fn counts_use_thousands_separators() {
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_signed_count(5000), "+5,000");
        assert_eq!(format_signed_count(-5000), "-5,000");
        assert_eq!(format_signed_fixed(5.0), "+5.00");
    }
}
