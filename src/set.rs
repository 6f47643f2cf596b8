use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::MAX_RANGE_SPAN;

static RANGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)-([0-9]+)").unwrap());
static INTEGER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Sorted, deduplicated integers read from text like `"1-3, 6"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntegerSet {
    values: Vec<u64>,
    display: String,
}

impl IntegerSet {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeSet::new();

        for caps in RANGE_PATTERN.captures_iter(text) {
            let (Ok(lo), Ok(hi)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
                warn!("dropping range {:?}: bound out of range", &caps[0]);
                continue;
            };
            if lo > hi {
                continue;
            }
            if hi - lo >= MAX_RANGE_SPAN {
                warn!("dropping range {:?}: wider than {MAX_RANGE_SPAN}", &caps[0]);
                continue;
            }
            values.extend(lo..=hi);
        }

        let rest = RANGE_PATTERN.replace_all(text, " ");
        for m in INTEGER_PATTERN.find_iter(&rest) {
            match m.as_str().parse::<u64>() {
                Ok(x) => {
                    values.insert(x);
                }
                Err(_) => warn!("dropping integer {:?}: out of range", m.as_str()),
            }
        }

        Self {
            values: values.into_iter().collect(),
            display: format!(" {{{text}}}"),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn contains(&self, value: u64) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    /// Number of members a die with `sides` faces can actually show.
    #[must_use]
    pub fn count_reachable(&self, sides: u32) -> usize {
        let lo = self.values.partition_point(|&x| x < 1);
        let hi = self.values.partition_point(|&x| x <= u64::from(sides));
        hi - lo
    }

    /// Label suffix, `" {<original text>}"`.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl FromStr for IntegerSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for IntegerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[must_use]
pub fn parse_integer_set(text: &str) -> IntegerSet {
    IntegerSet::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_and_integers() {
        let set = parse_integer_set("4-6, 9");
        assert_eq!(set.values(), &[4, 5, 6, 9]);
        assert_eq!(set.display(), " {4-6, 9}");
    }

    #[test]
    fn inverted_range_is_dropped() {
        assert!(parse_integer_set("9-4").is_empty());
        assert_eq!(parse_integer_set("9-4, 2").values(), &[2]);
    }

    #[test]
    fn duplicates_collapse_and_sort() {
        let set = parse_integer_set("7 3 1-4 3,2-2 7");
        assert_eq!(set.values(), &[1, 2, 3, 4, 7]);
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn range_bounds_are_not_reread_as_integers() {
        let set = parse_integer_set("10-12");
        assert_eq!(set.values(), &[10, 11, 12]);
        assert!(!set.contains(1));
    }

    #[test]
    fn garbage_yields_empty_set() {
        for text in ["", "abc", "-", ",,", "x-y"] {
            assert!(parse_integer_set(text).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn oversized_input_is_dropped() {
        assert!(parse_integer_set("1-99999999999").is_empty());
        assert!(parse_integer_set("123456789012345678901234567890").is_empty());
    }

    #[test]
    fn reachable_members_ignore_zero_and_faces_past_sides() {
        let set = parse_integer_set("0, 1, 2, 5, 8");
        assert_eq!(set.count_reachable(6), 3);
        assert_eq!(set.count_reachable(1), 1);
        assert_eq!(set.count_reachable(20), 4);
    }
}
