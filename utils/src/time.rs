//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Format a duration in seconds using its two largest units, e.g. `2h 5m`.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }
    let mut parts = Vec::with_capacity(2);
    let mut rest = secs;
    for (size, suffix) in UNITS {
        let count = rest / size;
        rest %= size;
        if count > 0 || !parts.is_empty() {
            parts.push(format!("{count}{suffix}"));
        }
        if parts.len() == 2 {
            break;
        }
    }
    parts.join(" ")
}
