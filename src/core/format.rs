//! Human-readable byte formatting.

/// 1024-based unit ladder. Anything at or above a tebibyte stays in TB.
const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count as a human-readable unit string.
///
/// Values under 1 KB render as whole bytes (`"512 B"`); everything larger
/// carries two decimals (`"10.00 MB"`). The output is part of the alert
/// message contract, so changing it changes alert identities.
#[must_use]
#[allow(clippy::cast_precision_loss)] // sizes far below 2^52 in practice
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::format_size;

    #[test]
    fn bytes_render_whole() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn larger_units_carry_two_decimals() {
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.00 MB");
        assert_eq!(format_size(11 * 1024 * 1024), "11.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn tebibytes_do_not_overflow_the_ladder() {
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024 * 1024), "2048.00 TB");
    }
}
