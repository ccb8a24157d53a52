/// Formats a distance for display: whole metres below one kilometre,
/// kilometres with one decimal from there on.
pub fn format_distance(metres: f64) -> String {
    if metres < 1000.0 {
        format!("{}m", metres.round())
    } else {
        format!("{:.1}km", metres / 1000.0)
    }
}

/// Travel time in whole minutes, never below one.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round().max(1.0);
    format!("{} min", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(42.4), "42m");
        assert_eq!(format_distance(999.0), "999m");
        assert_eq!(format_distance(1000.0), "1.0km");
        assert_eq!(format_distance(2345.0), "2.3km");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(10.0), "1 min");
        assert_eq!(format_duration(600.0), "10 min");
    }
}
