//! Units formatting and conversion utilities
//!
//! Human-readable sizes, latencies and throughput for the run summary.

use std::time::Duration;

/// Format bytes into human-readable size with appropriate units
///
/// # Examples
/// ```
/// use gridbench::util::units::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.0 KiB");
/// assert_eq!(format_bytes(4194304), "4.0 MiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Calculate throughput in MiB/s
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use gridbench::util::units::calculate_throughput_mbps;
///
/// let throughput = calculate_throughput_mbps(1048576, Duration::from_secs(1));
/// assert!((throughput - 1.0).abs() < 0.01);
/// ```
pub fn calculate_throughput_mbps(bytes: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    let megabytes = bytes as f64 / 1_048_576.0;
    megabytes / duration.as_secs_f64()
}

/// Format throughput value with appropriate units
///
/// # Examples
/// ```
/// use gridbench::util::units::format_throughput;
///
/// assert_eq!(format_throughput(1024.0), "1.0 GiB/s");
/// assert_eq!(format_throughput(1.5), "1.5 MiB/s");
/// ```
pub fn format_throughput(mbps: f64) -> String {
    if mbps >= 1024.0 {
        format!("{:.1} GiB/s", mbps / 1024.0)
    } else if mbps >= 1.0 {
        format!("{:.1} MiB/s", mbps)
    } else {
        format!("{:.1} KiB/s", mbps * 1024.0)
    }
}

/// Format latency with millisecond precision above 1ms
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use gridbench::util::units::format_latency;
///
/// assert_eq!(format_latency(Duration::from_millis(5)), "5.00ms");
/// assert_eq!(format_latency(Duration::from_micros(500)), "500μs");
/// ```
pub fn format_latency(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1000 {
        format!("{:.2}ms", micros as f64 / 1000.0)
    } else {
        format!("{}μs", micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(100), "100 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1073741824), "1.0 GiB");
    }

    #[test]
    fn test_throughput() {
        assert_eq!(calculate_throughput_mbps(1024, Duration::ZERO), 0.0);
        let t = calculate_throughput_mbps(10 * 1_048_576, Duration::from_secs(2));
        assert!((t - 5.0).abs() < 1e-9);
        assert_eq!(format_throughput(0.5), "512.0 KiB/s");
        assert_eq!(format_throughput(2048.0), "2.0 GiB/s");
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(Duration::from_micros(1500)), "1.50ms");
        assert_eq!(format_latency(Duration::from_micros(999)), "999μs");
        assert_eq!(format_latency(Duration::ZERO), "0μs");
    }
}
