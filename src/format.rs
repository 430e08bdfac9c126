//! Display formatting for money and durations. Pure functions, no state.

/// Compact suffixes, largest first.
const SUFFIXES: [(f64, &str); 6] = [
    (1e18, "Qi"),
    (1e15, "Qa"),
    (1e12, "T"),
    (1e9, "B"),
    (1e6, "M"),
    (1e3, "K"),
];

/// Values at or above this are shown in exponent notation.
const EXPONENT_THRESHOLD: f64 = 1e21;

/// Compact display: `999`, `1.5K`, `12.3M`, `4.0Qa`, `1.23e21`.
///
/// The decimal is truncated rather than rounded so the display never shows
/// more than the player actually has.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }
    if n < 1_000.0 {
        return (n.floor() as u64).to_string();
    }
    if n >= EXPONENT_THRESHOLD {
        return format!("{:.2e}", n);
    }
    for (scale, suffix) in SUFFIXES {
        if n >= scale {
            let scaled = (n / scale * 10.0).floor() / 10.0;
            return format!("{:.1}{}", scaled, suffix);
        }
    }
    (n.floor() as u64).to_string()
}

/// Inverse of [`format_number`] (and of [`format_with_commas`]).
///
/// Accepts plain numbers, comma grouping, exponent notation and the compact
/// suffixes in any letter case. Returns `None` for anything else.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (sign, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed),
    };
    let body: String = body
        .chars()
        .filter(|c| *c != ',')
        .collect::<String>()
        .to_ascii_lowercase();
    if body.is_empty() {
        return None;
    }

    for (scale, suffix) in SUFFIXES {
        if let Some(num) = body.strip_suffix(suffix.to_ascii_lowercase().as_str()) {
            let value: f64 = num.trim_end().parse().ok()?;
            return finite(sign * value * scale);
        }
    }
    finite(sign * body.parse::<f64>().ok()?)
}

fn finite(n: f64) -> Option<f64> {
    n.is_finite().then_some(n)
}

/// Grouped digits with at most one decimal: `1,234,567`, `12.5`.
pub fn format_with_commas(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_with_commas(-n));
    }
    let int_part = n.floor() as u64;
    let frac = n - int_part as f64;

    let s = int_part.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    let result: String = result.chars().rev().collect();

    let tenth = (frac * 10.0).floor() as u8;
    if tenth > 0 {
        format!("{}.{}", result, tenth)
    } else {
        result
    }
}

/// Human duration with the two most significant units: `2d 3h`, `1h 5m`, `4m 10s`, `9s`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let days = total / 86_400;
    let hours = total % 86_400 / 3_600;
    let minutes = total % 3_600 / 60;
    let secs = total % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_are_plain_integers() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(11.0), "11");
        assert_eq!(format_number(999.9), "999");
    }

    #[test]
    fn suffixes() {
        assert_eq!(format_number(1_000.0), "1.0K");
        assert_eq!(format_number(1_500.0), "1.5K");
        assert_eq!(format_number(2_345_678.0), "2.3M");
        assert_eq!(format_number(7e9), "7.0B");
        assert_eq!(format_number(3.2e12), "3.2T");
        assert_eq!(format_number(4e15), "4.0Qa");
        assert_eq!(format_number(5e18), "5.0Qi");
    }

    #[test]
    fn truncates_instead_of_rounding() {
        // 999,999 must not display as 1000.0K
        assert_eq!(format_number(999_999.0), "999.9K");
    }

    #[test]
    fn huge_values_use_exponent() {
        assert_eq!(format_number(1.234e21), "1.23e21");
    }

    #[test]
    fn negative_and_non_finite() {
        assert_eq!(format_number(-1_500.0), "-1.5K");
        assert_eq!(format_number(f64::NAN), "0");
        assert_eq!(format_number(f64::INFINITY), "0");
    }

    #[test]
    fn parse_suffixes_any_case() {
        assert_eq!(parse_number("1.5K"), Some(1_500.0));
        assert_eq!(parse_number("1.5k"), Some(1_500.0));
        assert_eq!(parse_number("2qa"), Some(2e15));
        assert_eq!(parse_number(" 3 M "), Some(3e6));
        assert_eq!(parse_number("-4B"), Some(-4e9));
    }

    #[test]
    fn parse_plain_grouped_and_exponent() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_number("1.23e21"), Some(1.23e21));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("cookies"), None);
        assert_eq!(parse_number("K"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn commas() {
        assert_eq!(format_with_commas(0.0), "0");
        assert_eq!(format_with_commas(1234.0), "1,234");
        assert_eq!(format_with_commas(1234567.0), "1,234,567");
        assert_eq!(format_with_commas(12.5), "12.5");
        assert_eq!(format_with_commas(-1234.0), "-1,234");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(9.7), "9s");
        assert_eq!(format_duration(250.0), "4m 10s");
        assert_eq!(format_duration(3_900.0), "1h 5m");
        assert_eq!(format_duration(2.0 * 86_400.0 + 3.0 * 3_600.0), "2d 3h");
        assert_eq!(format_duration(-5.0), "0s");
    }
}
