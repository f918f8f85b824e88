use std::sync::atomic::{AtomicU64, Ordering};

// ─── Process memory ──────────────────────────────────────────────

/// Source of process memory figures, in bytes.
pub trait ProcessMetrics: Send + Sync {
    fn current_bytes(&self) -> u64;
    fn peak_bytes(&self) -> u64;
}

/// Highest resident size seen by `SystemMetrics` in this process.
static HIGH_WATER: AtomicU64 = AtomicU64::new(0);

/// Reads the live process through `memory-stats`.
///
/// Peak usage comes from the kernel's `VmHWM` where the platform exposes it,
/// otherwise from the highest value this type has observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMetrics;

impl ProcessMetrics for SystemMetrics {
    fn current_bytes(&self) -> u64 {
        let rss = memory_stats::memory_stats()
            .map(|s| s.physical_mem as u64)
            .unwrap_or(0);
        HIGH_WATER.fetch_max(rss, Ordering::Relaxed);
        rss
    }

    fn peak_bytes(&self) -> u64 {
        let observed = HIGH_WATER.load(Ordering::Relaxed);
        read_vm_hwm().map_or(observed, |hwm| hwm.max(observed))
    }
}

#[cfg(target_os = "linux")]
fn read_vm_hwm() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

#[cfg(not(target_os = "linux"))]
fn read_vm_hwm() -> Option<u64> {
    None
}

/// Constant figures, for tests and for hosts that sample memory themselves.
#[derive(Debug, Clone, Copy)]
pub struct FixedMetrics {
    pub current: u64,
    pub peak: u64,
}

impl ProcessMetrics for FixedMetrics {
    fn current_bytes(&self) -> u64 {
        self.current
    }

    fn peak_bytes(&self) -> u64 {
        self.peak
    }
}

// ─── Formatting ──────────────────────────────────────────────────

const SIZE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Human-readable size in 1024-based units, two decimals at most
/// (`2621440` → `"2.5 MB"`).
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Milliseconds with two decimals and `,` thousands separators
/// (`1234.5` → `"1,234.50"`). Negative and non-finite input shows as zero.
pub fn format_millis(ms: f64) -> String {
    let ms = if ms.is_finite() { ms.max(0.0) } else { 0.0 };
    let fixed = format!("{ms:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2_621_440), "2.5 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn sizes_round_to_two_places() {
        // 1234567 / 1024^2 = 1.1773...
        assert_eq!(format_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn millis_have_two_decimals_and_grouping() {
        assert_eq!(format_millis(0.0), "0.00");
        assert_eq!(format_millis(12.3456), "12.35");
        assert_eq!(format_millis(1234.5), "1,234.50");
        assert_eq!(format_millis(1_234_567.0), "1,234,567.00");
    }

    #[test]
    fn millis_clamp_negative_and_non_finite_to_zero() {
        assert_eq!(format_millis(-3.0), "0.00");
        assert_eq!(format_millis(f64::INFINITY), "0.00");
        assert_eq!(format_millis(f64::NEG_INFINITY), "0.00");
        assert_eq!(format_millis(f64::NAN), "0.00");
    }

    #[test]
    fn system_peak_is_at_least_current() {
        let metrics = SystemMetrics;
        let current = metrics.current_bytes();
        assert!(metrics.peak_bytes() >= current);
    }
}
