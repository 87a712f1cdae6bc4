//! Size conversions and rounding.
//!
//! Every reported size and duration is rounded to two decimal places, so all
//! components share these helpers to stay consistent with each other.

/// Bytes in one mebibyte (the "MB" used throughout reports)
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Bytes in one gibibyte (the "GB" used throughout reports)
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a byte count to mebibytes, rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MB)
}

/// Convert a byte count to gibibytes, rounded to two decimals.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_GB)
}

/// Whole-number percentage of `current` out of `total`.
///
/// An empty total reports 0 rather than dividing by zero.
pub fn percentage(current: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((current as f64 / total as f64) * 100.0).round() as u32
}
