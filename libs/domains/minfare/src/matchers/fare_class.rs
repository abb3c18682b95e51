//! Fare class wildcard grammar.
//!
//! A fare class name may carry one wildcard, written `-` or `*`, standing for
//! any sequence of characters (possibly empty). Both spellings are
//! equivalent, so `*ABC` and `-ABC` denote the same pattern.

const WILDCARD: char = '-';

fn normalize(name: &str) -> String {
    name.trim().replace('*', "-")
}

/// Literal prefix and suffix around the wildcard, if the name has one
fn split_pattern(name: &str) -> Option<(&str, &str)> {
    name.split_once(WILDCARD)
}

fn pattern_matches_literal(pattern: &str, literal: &str) -> bool {
    match split_pattern(pattern) {
        Some((prefix, suffix)) => {
            literal.len() >= prefix.len() + suffix.len()
                && literal.starts_with(prefix)
                && literal.ends_with(suffix)
        }
        None => pattern == literal,
    }
}

fn compatible(a: &str, b: &str, f: fn(&str, &str) -> bool) -> bool {
    f(a, b) || f(b, a)
}

/// Whether the fare class `fbr` satisfies the table fare class `rec2`.
///
/// A blank `rec2` matches anything. Two patterns match when their literal
/// prefixes and suffixes are compatible, i.e. some name satisfies both.
pub fn match_fare_class(fbr: &str, rec2: &str) -> bool {
    let rec2 = normalize(rec2);
    if rec2.is_empty() {
        return true;
    }
    let fbr = normalize(fbr);
    if fbr == rec2 {
        return true;
    }

    match (split_pattern(&fbr), split_pattern(&rec2)) {
        (None, None) => false,
        (None, Some(_)) => pattern_matches_literal(&rec2, &fbr),
        (Some(_), None) => pattern_matches_literal(&fbr, &rec2),
        (Some((fbr_prefix, fbr_suffix)), Some((rec2_prefix, rec2_suffix))) => {
            compatible(fbr_prefix, rec2_prefix, |a, b| a.starts_with(b))
                && compatible(fbr_suffix, rec2_suffix, |a, b| a.ends_with(b))
        }
    }
}

/// Whether a match of `fbr` against `rec2` depends on the wildcard of the
/// `fbr` side, in which case the matched row only conditionally applies.
/// A blank `rec2` matches unconditionally.
pub fn is_fare_class_name_conditional(fbr: &str, rec2: &str) -> bool {
    let normalized_fbr = normalize(fbr);
    let normalized_rec2 = normalize(rec2);
    !normalized_rec2.is_empty()
        && match_fare_class(fbr, rec2)
        && normalized_fbr != normalized_rec2
        && normalized_fbr.contains(WILDCARD)
}
