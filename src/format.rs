//! Display formatting helpers shared by the views.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary units, e.g. `1.00 MB`.
///
/// Zero renders as `0 B`. Anything else picks the largest unit that keeps the
/// value at or above one (capped at TB) and prints two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

/// Shorten `s` to at most `n` characters, ending in `…` when cut.
pub fn truncate(s: &str, n: usize) -> String {
    if s.chars().count() <= n {
        return s.to_string();
    }

    let mut out: String = s.chars().take(n.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Hex colour for one of the fixed text colour classes used by the filter chips.
pub fn tailwind_color(class_name: &str) -> &'static str {
    match class_name {
        "text-blue-500" => "#3B82F6",
        "text-green-500" => "#22C55E",
        "text-yellow-500" => "#EAB308",
        "text-red-500" => "#EF4444",
        "text-orange-400" => "#FB923C",
        "text-gray-500" => "#6B7280",
        _ => "#6B7280",
    }
}

/// Colour used for a chip that has been switched off.
pub const INACTIVE_CHIP_COLOR: &str = "#9CA3AF";
