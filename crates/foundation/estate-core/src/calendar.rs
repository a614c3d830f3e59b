//! Month labels for the prediction form

/// English month names, indexed by `month - 1`
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Name of a 1-based month, `None` outside 1..=12
pub fn month_name(month: u32) -> Option<&'static str> {
    match month {
        1..=12 => Some(MONTH_NAMES[(month - 1) as usize]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(6), Some("June"));
        assert_eq!(month_name(12), Some("December"));
    }

    #[test]
    fn test_month_out_of_range() {
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}
