const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB"];
const THRESHOLD: f64 = 1000.0;

/// Formats a byte count with decimal units and three significant digits,
/// e.g. `85312512` becomes `"85.3 MB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes < THRESHOLD as u64 {
        return format!("{} {}", bytes, UNITS[0]);
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    // Rounding can carry into the next unit, e.g. 999_999 B is "1 MB".
    let mut decimals = significant_decimals(size);
    if round_to(size, decimals) >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
        decimals = significant_decimals(size);
    }

    let mut number = format!("{:.*}", decimals, size);
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{} {}", number, UNITS[unit_index])
}

fn significant_decimals(size: f64) -> usize {
    if size >= 100.0 {
        0
    } else if size >= 10.0 {
        1
    } else {
        2
    }
}

fn round_to(size: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (size * factor).round() / factor
}
