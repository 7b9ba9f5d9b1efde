// @module: Clock-style time formatting

/// Formats a seconds value as `HH:MM:SS.mmm`.
///
/// Negative (and non-finite) input is clamped to zero. Hours are not
/// wrapped, so very long recordings print more than two hour digits.
pub fn format_time(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

// @converts: Milliseconds to fractional seconds
pub fn ms_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

// @converts: Fractional seconds to whole milliseconds, clamping negatives to zero
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Formats a millisecond timestamp through [`format_time`].
pub fn format_ms(ms: u64) -> String {
    format_time(ms_to_seconds(ms))
}
