/// Parse a `m:ss` player clock into seconds.
///
/// Exactly two colon-separated fields. Each field is an optionally signed
/// integer read up to its first non-digit; an unreadable field counts as 0.
/// Any other shape, or a result too large to represent, is 0.
pub fn parse_time_string(text: &str) -> f64 {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 2 {
        return 0.0;
    }
    let total = leading_int(parts[0]) * 60.0 + leading_int(parts[1]);
    if total.is_finite() {
        total
    } else {
        0.0
    }
}

fn leading_int(field: &str) -> f64 {
    let field = field.trim_start();
    let (sign, rest) = match field.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, field.strip_prefix('+').unwrap_or(field)),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse::<f64>().map_or(0.0, |v| sign * v)
}

/// Render seconds as `m:ss`; missing or non-finite values render as `--:--`.
pub fn format_time(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() => {
            let s = s.max(0.0);
            let minutes = (s / 60.0).floor() as u64;
            let rest = (s % 60.0).floor() as u64;
            format!("{}:{:02}", minutes, rest)
        }
        _ => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_clock() {
        assert_eq!(parse_time_string("3:07"), 187.0);
        assert_eq!(parse_time_string("0:00"), 0.0);
        assert_eq!(parse_time_string("12:59"), 779.0);
    }

    #[test]
    fn test_parse_malformed_is_zero() {
        assert_eq!(parse_time_string(""), 0.0);
        assert_eq!(parse_time_string("abc"), 0.0);
        assert_eq!(parse_time_string("1:2:3"), 0.0);
        assert_eq!(parse_time_string("45"), 0.0);
    }

    #[test]
    fn test_parse_lenient_fields() {
        // Field without leading digits reads as 0, trailing junk is ignored
        assert_eq!(parse_time_string("1:xx"), 60.0);
        assert_eq!(parse_time_string(" 2:05s"), 125.0);
    }

    #[test]
    fn test_parse_signed_fields() {
        assert_eq!(parse_time_string("-1:30"), -30.0);
        assert_eq!(parse_time_string("+2:05"), 125.0);
        assert_eq!(parse_time_string("-:30"), 30.0);
    }

    #[test]
    fn test_parse_long_digit_runs_do_not_overflow() {
        assert_eq!(parse_time_string("999999999999999999:00"), 1e18 * 60.0);
        let huge = format!("{}:00", "9".repeat(400));
        assert_eq!(parse_time_string(&huge), 0.0);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Some(187.0)), "3:07");
        assert_eq!(format_time(Some(59.9)), "0:59");
        assert_eq!(format_time(Some(0.0)), "0:00");
        assert_eq!(format_time(None), "--:--");
        assert_eq!(format_time(Some(f64::NAN)), "--:--");
    }
}
