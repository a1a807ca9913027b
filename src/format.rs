//! Human-readable byte counts.

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
const TB_INDEX: usize = 4;

/// Formats a byte count with base-1024 units (e.g. "1.5 KB", "2.00 TB").
///
/// One decimal below TB, two from TB upward. Values past the PB range stay in PB.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && unit < UNITS.len() - 1 {
        scaled /= 1024;
        unit += 1;
    }

    let value = bytes as f64 / 1024f64.powi(unit as i32);
    let precision = if unit >= TB_INDEX { 2 } else { 1 };
    format!("{value:.precision$} {}", UNITS[unit])
}
