//! Readout text for loop, hover and zoom values.

const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Format seconds as `mm:ss:cc`, prefixed with `hh:` past the first hour.
///
/// Hundredths are truncated, not rounded.
pub fn time_text(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00:00".to_string();
    }
    let total_cs = (seconds * 100.0 + 1e-9).floor() as u64;
    let whole = total_cs / 100;
    let hundredths = total_cs % 100;
    let hours = whole / SECONDS_PER_HOUR;
    let minutes = (whole % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = whole % SECONDS_PER_MINUTE;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}:{hundredths:02}")
    } else {
        format!("{minutes:02}:{secs:02}:{hundredths:02}")
    }
}

/// Magnification for a zoom factor, e.g. `2x` or `3.33x`.
pub fn zoom_text(factor: f64) -> String {
    if !factor.is_finite() || factor <= 0.0 {
        return "1x".to_string();
    }
    let rounded = format!("{:.2}", 1.0 / factor);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}x")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_text_truncates_hundredths() {
        assert_eq!(time_text(0.0), "00:00:00");
        assert_eq!(time_text(1.239), "00:01:23");
        assert_eq!(time_text(75.5), "01:15:50");
        assert_eq!(time_text(-3.0), "00:00:00");
    }

    #[test]
    fn time_text_shows_hours_only_when_needed() {
        assert_eq!(time_text(3_599.99), "59:59:99");
        assert_eq!(time_text(3_661.05), "01:01:01:05");
    }

    #[test]
    fn zoom_text_drops_trailing_zeros() {
        assert_eq!(zoom_text(1.0), "1x");
        assert_eq!(zoom_text(0.5), "2x");
        assert_eq!(zoom_text(0.4), "2.5x");
        assert_eq!(zoom_text(0.3), "3.33x");
        assert_eq!(zoom_text(0.0), "1x");
    }
}
