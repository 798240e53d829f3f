pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = ms / 3_600_000;
        let mins = (ms % 3_600_000) / 60_000;
        format!("{}h {}m", hours, mins)
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // avoid -0.0 leaking into serialized output
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn format_score(score: f64) -> String {
    format!("{:.1}/100", score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.5s");
        assert_eq!(format_duration(125_000), "2m 5s");
        assert_eq!(format_duration(3_900_000), "1h 5m");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666, 2), 66.67);
        assert_eq!(round_to(42.25, 1), 42.3);
        assert_eq!(round_to(0.8333, 3), 0.833);
        assert_eq!(round_to(-0.0001, 2), 0.0);
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(72.456), "72.5/100");
    }
}
