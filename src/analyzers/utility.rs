/// Share of earnings kept after the marketplace deduction.
pub const AFTER_TAX_RATE: f64 = 0.85;

/// Parses a cell as a finite number. Blank, non-numeric, and infinite values yield `None`.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Average per item. Returns 0.0 when there are no items.
pub fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

pub fn after_tax(total: f64) -> f64 {
    total * AFTER_TAX_RATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("10"), Some(10.0));
        assert_eq!(parse_value(" 2.5 "), Some(2.5));
        assert_eq!(parse_value("-1"), Some(-1.0));
        assert_eq!(parse_value("bad"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("inf"), None);
        assert_eq!(parse_value("NaN"), None);
    }

    #[test]
    fn test_average_with_zero_count() {
        assert_eq!(average(10.0, 0), 0.0);
    }

    #[test]
    fn test_average_normal_values() {
        assert_eq!(average(15.0, 1), 15.0);
        assert_eq!(average(10.0, 4), 2.5);
    }

    #[test]
    fn test_after_tax() {
        assert_eq!(after_tax(100.0), 85.0);
        assert_eq!(after_tax(0.0), 0.0);
    }
}
