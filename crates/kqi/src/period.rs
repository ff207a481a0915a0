//! Period label format.
//!
//! Latest-period selection compares `periode` strings lexicographically,
//! which only matches chronological order for zero-padded, year-first
//! labels. The aggregator logs labels outside these shapes but still
//! compares them.

/// Whether `periode` is one of `YYYY`, `YYYY-Qn`, `YYYY-Sn`, `YYYY-MM` or
/// `YYYY-MM-DD`.
pub fn is_sortable_period(periode: &str) -> bool {
    let mut parts = periode.split('-');
    let Some(year) = parts.next() else {
        return false;
    };
    if !is_digits(year, 4) {
        return false;
    }
    let rest: Vec<&str> = parts.collect();
    match rest.as_slice() {
        [] => true,
        [sub] => is_sub_year(sub),
        [month, day] => in_range(month, 1, 12) && in_range(day, 1, 31),
        _ => false,
    }
}

fn is_sub_year(sub: &str) -> bool {
    if let Some(q) = sub.strip_prefix('Q') {
        return in_range_1(q, 4);
    }
    if let Some(s) = sub.strip_prefix('S') {
        return in_range_1(s, 2);
    }
    in_range(sub, 1, 12)
}

fn in_range_1(digit: &str, max: u32) -> bool {
    is_digits(digit, 1) && digit.parse::<u32>().map(|n| (1..=max).contains(&n)).unwrap_or(false)
}

fn in_range(two_digits: &str, min: u32, max: u32) -> bool {
    is_digits(two_digits, 2)
        && two_digits
            .parse::<u32>()
            .map(|n| (min..=max).contains(&n))
            .unwrap_or(false)
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_year_first_labels() {
        for p in ["2024", "2024-Q1", "2024-Q4", "2024-S2", "2024-07", "2024-12-31"] {
            assert!(is_sortable_period(p), "{p}");
        }
    }

    #[test]
    fn rejects_ambiguous_labels() {
        for p in ["", "Q1-2024", "2024-Q5", "2024-S3", "2024-7", "2024-13", "07/2024", "24-Q1", "2024-01-01-01"] {
            assert!(!is_sortable_period(p), "{p}");
        }
    }
}
