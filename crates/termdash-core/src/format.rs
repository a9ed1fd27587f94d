//! Fixed-width text formatting for progress labels.
//!
//! Every formatter produces output of stable width for values in its normal
//! range, so labels do not jitter as values change between frames.

use std::time::Duration;

const BINARY_PREFIXES: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Format `value` with a 1024-based prefix followed by `unit`.
///
/// The number is right-aligned in `width` columns with as many decimals as
/// fit. Values without a prefix are padded with two spaces so columns line up
/// with prefixed ones.
///
/// ```
/// use termdash_core::format::format_binary_unit;
///
/// assert_eq!(format_binary_unit(1536.0, "B", 4), "1.50 KiB");
/// assert_eq!(format_binary_unit(512.0, "B/s", 4), " 512   B/s");
/// ```
pub fn format_binary_unit(value: f64, unit: &str, width: usize) -> String {
    let mut value = if value.is_finite() { value.max(0.0) } else { 0.0 };
    let mut prefix = BINARY_PREFIXES[0];
    for candidate in BINARY_PREFIXES {
        prefix = candidate;
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
    }

    let digits = match value {
        v if v < 10.0 => 1,
        v if v < 100.0 => 2,
        v if v < 1000.0 => 3,
        _ => 4,
    };
    let precision = width.saturating_sub(digits + 1);
    let pad = if prefix.is_empty() { "  " } else { prefix };
    format!("{value:>width$.precision$} {pad}{unit}")
}

/// Format a duration as `H:MM:SS`, or `--:--:--` when undetermined.
///
/// ```
/// use std::time::Duration;
/// use termdash_core::format::format_duration;
///
/// assert_eq!(format_duration(Some(Duration::from_secs(3725))), "1:02:05");
/// assert_eq!(format_duration(None), "--:--:--");
/// ```
pub fn format_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return "--:--:--".to_owned();
    };
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Format a percentage as a right-aligned integer, e.g. ` 42%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:>3.0}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_unit_prefixes() {
        assert_eq!(format_binary_unit(0.0, "B", 4), "0.00   B");
        assert_eq!(format_binary_unit(1024.0, "B", 4), "1.00 KiB");
        assert_eq!(format_binary_unit(10.0 * 1024.0 * 1024.0, "B", 4), "10.0 MiB");
        assert_eq!(format_binary_unit(300.0 * 1024.0 * 1024.0 * 1024.0, "B", 4), " 300 GiB");
    }

    #[test]
    fn test_binary_unit_rejects_garbage() {
        assert_eq!(format_binary_unit(f64::NAN, "B", 4), "0.00   B");
        assert_eq!(format_binary_unit(-5.0, "B", 4), "0.00   B");
    }

    #[test]
    fn test_duration() {
        assert_eq!(format_duration(Some(Duration::ZERO)), "0:00:00");
        assert_eq!(format_duration(Some(Duration::from_millis(59_900))), "0:00:59");
        assert_eq!(format_duration(Some(Duration::from_secs(36_000))), "10:00:00");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(format_percentage(0.0), "  0%");
        assert_eq!(format_percentage(42.4), " 42%");
        assert_eq!(format_percentage(100.0), "100%");
    }
}
