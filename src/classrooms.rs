use itertools::Itertools;
use std::collections::BTreeSet;

/// Smallest synthesized pool when no classrooms are listed.
pub const MIN_SYNTHESIZED_ROOMS: usize = 5;

/// First run of decimal digits in `identifier`. Runs too long for `u64`
/// saturate.
pub fn first_number(identifier: &str) -> Option<u64> {
    let start = identifier.find(|c: char| c.is_ascii_digit())?;
    let digits: String = identifier[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some(digits.parse().unwrap_or(u64::MAX))
}

pub fn sort_key(identifier: &str) -> u64 {
    first_number(identifier).unwrap_or(0)
}

/// Numeric sort on the embedded number; ties keep input order.
pub fn sort_pool(raw: &[String]) -> Vec<String> {
    let mut pool = raw.to_vec();
    pool.sort_by_key(|id| sort_key(id));
    pool
}

pub fn synthesize_pool(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("Room {n}")).collect()
}

/// The sorted round-robin pool. Listed identifiers win; otherwise
/// `total` rooms are synthesized, or max(5, distinct subjects).
pub fn classroom_pool(raw: &[String], total: Option<u32>, subjects: &[String]) -> Vec<String> {
    if !raw.is_empty() {
        return sort_pool(raw);
    }
    let count = match total.filter(|t| *t > 0) {
        Some(total) => total as usize,
        None => MIN_SYNTHESIZED_ROOMS.max(subjects.iter().unique().count()),
    };
    synthesize_pool(count)
}

/// Break periods from text such as `"After P2, 5"`; tokens split on `,`
/// or `;`, and each contributes its first number.
pub fn parse_breaks(text: &str) -> BTreeSet<u32> {
    text.split([',', ';'])
        .filter_map(first_number)
        .filter_map(|n| u32::try_from(n).ok())
        .collect()
}
