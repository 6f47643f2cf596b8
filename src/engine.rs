use std::fmt::{self, Display};
use std::rc::Rc;
use std::str::FromStr;

use ahash::AHashMap;
use log::{debug, trace};

use crate::dice::{DiceSpec, DieGroup};
use crate::pmf::{self, binomial, combine_max, combine_min, combine_sum, convolve, prob_in_set};
use crate::set::IntegerSet;
use crate::stats::Stats;
use crate::{Error, Result, ENGINE_CACHE_CAPACITY};

/// Statistic taken over every die in a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
    /// Number of dice landing in an [`IntegerSet`].
    InSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistKind {
    Pdf,
    Cdf,
    Ccdf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub kind: DistKind,
    pub aggregate: Aggregate,
    pub values: Vec<f64>,
    /// x of `values[0]`.
    pub start_x: i64,
    pub label: String,
    pub y_axis_label: &'static str,
    pub y_axis_max: Option<f64>,
    pub stats: Stats,
}

/// Memoizing front end for [`compute_distribution`].
///
/// Holds at most `capacity` PMFs; once full, the cache is emptied before the
/// next new PMF is stored.
#[derive(Debug)]
pub struct Engine {
    cache: AHashMap<CacheKey, Rc<Vec<f64>>>,
    capacity: usize,
}

type CacheKey = (Aggregate, Vec<DieGroup>, Vec<u64>);

impl Aggregate {
    /// x of index 0 in this aggregate's PMF.
    #[must_use]
    pub fn start_x(self, dice: &DiceSpec) -> i64 {
        match self {
            Aggregate::Sum => i64::try_from(dice.min_roll()).unwrap_or(i64::MAX),
            Aggregate::Min | Aggregate::Max => 1,
            Aggregate::InSet => 0,
        }
    }

    /// Per-die fold step; count-in-set works per group instead.
    fn combinator(self) -> Option<fn(&[f64], u32) -> Vec<f64>> {
        match self {
            Aggregate::Sum => Some(combine_sum),
            Aggregate::Min => Some(combine_min),
            Aggregate::Max => Some(combine_max),
            Aggregate::InSet => None,
        }
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Aggregate::Sum => "Sum",
            Aggregate::Min => "Min",
            Aggregate::Max => "Max",
            Aggregate::InSet => "InSet",
        })
    }
}

impl FromStr for Aggregate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregate::Sum),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            "inset" => Ok(Aggregate::InSet),
            _ => Err(Error::UnknownAggregate(s.to_owned())),
        }
    }
}

impl DistKind {
    #[must_use]
    pub fn y_axis_label(self) -> &'static str {
        match self {
            DistKind::Pdf => "Pr(X=x)",
            DistKind::Cdf => "Pr(X≤x)",
            DistKind::Ccdf => "Pr(X≥x)",
        }
    }

    #[must_use]
    pub fn y_axis_max(self) -> Option<f64> {
        match self {
            DistKind::Pdf => None,
            DistKind::Cdf | DistKind::Ccdf => Some(1.0),
        }
    }

    /// Derives this kind's values from a PMF.
    #[must_use]
    pub fn apply(self, pmf: &[f64]) -> Vec<f64> {
        match self {
            DistKind::Pdf => pmf.to_vec(),
            DistKind::Cdf => pmf::cdf(pmf),
            DistKind::Ccdf => pmf::ccdf(pmf),
        }
    }
}

impl FromStr for DistKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(DistKind::Pdf),
            "cdf" => Ok(DistKind::Cdf),
            "ccdf" => Ok(DistKind::Ccdf),
            _ => Err(Error::UnknownDistKind(s.to_owned())),
        }
    }
}

/// PMF of `aggregate` over `dice`, indexed from [`Aggregate::start_x`].
///
/// `set` is only read for [`Aggregate::InSet`], where a missing set counts as
/// empty. An empty pool gives an empty PMF.
#[must_use]
pub fn compute_pmf(aggregate: Aggregate, dice: &DiceSpec, set: Option<&IntegerSet>) -> Vec<f64> {
    debug!("computing {aggregate} pmf of {dice}");
    let Some(combine) = aggregate.combinator() else {
        let empty = IntegerSet::default();
        return count_in_set(dice, set.unwrap_or(&empty));
    };
    let mut sides = dice.dice();
    let Some(first) = sides.next() else {
        return Vec::new();
    };
    sides.fold(pmf::uniform(first), |acc, s| {
        trace!("{aggregate}: folding d{s} into support of {}", acc.len());
        combine(&acc, s)
    })
}

fn count_in_set(dice: &DiceSpec, set: &IntegerSet) -> Vec<f64> {
    let mut groups = dice.groups().iter().map(|g| {
        let pr = prob_in_set(g.sides, set);
        trace!("InSet: {g} hits with probability {pr}");
        binomial(g.count, pr)
    });
    let Some(first) = groups.next() else {
        return Vec::new();
    };
    groups.fold(first, |acc, b| convolve(&acc, &b))
}

/// Parses both texts and builds the requested distribution.
///
/// Returns `None` when there is nothing to plot: no dice in `dice_text`, or a
/// count-in-set request whose set is missing or empty.
#[must_use]
pub fn compute_distribution(
    kind: DistKind,
    aggregate: Aggregate,
    dice_text: &str,
    set_text: Option<&str>,
) -> Option<Distribution> {
    let (dice, set) = prepare(aggregate, dice_text, set_text)?;
    let pmf = compute_pmf(aggregate, &dice, set.as_ref());
    Some(Distribution::new(kind, aggregate, &dice, set.as_ref(), &pmf))
}

/// [`compute_distribution`] with kind and aggregate given by name, e.g.
/// `"ccdf"` and `"max"`.
pub fn compute_distribution_by_name(
    kind: &str,
    aggregate: &str,
    dice_text: &str,
    set_text: Option<&str>,
) -> Result<Option<Distribution>> {
    Ok(compute_distribution(
        kind.parse()?,
        aggregate.parse()?,
        dice_text,
        set_text,
    ))
}

fn prepare(
    aggregate: Aggregate,
    dice_text: &str,
    set_text: Option<&str>,
) -> Option<(DiceSpec, Option<IntegerSet>)> {
    let dice = DiceSpec::parse(dice_text);
    if dice.is_empty() {
        debug!("no dice in {dice_text:?}, nothing to compute");
        return None;
    }
    if aggregate != Aggregate::InSet {
        return Some((dice, None));
    }
    let set = IntegerSet::parse(set_text?);
    if set.is_empty() {
        debug!("empty set in {set_text:?}, nothing to compute");
        return None;
    }
    Some((dice, Some(set)))
}

impl Distribution {
    #[must_use]
    pub fn new(
        kind: DistKind,
        aggregate: Aggregate,
        dice: &DiceSpec,
        set: Option<&IntegerSet>,
        pmf: &[f64],
    ) -> Self {
        let start_x = aggregate.start_x(dice);
        let suffix = match (aggregate, set) {
            (Aggregate::InSet, Some(set)) => set.display(),
            _ => "",
        };
        Self {
            kind,
            aggregate,
            values: kind.apply(pmf),
            start_x,
            label: format!("{aggregate}({dice}{suffix})"),
            y_axis_label: kind.y_axis_label(),
            y_axis_max: kind.y_axis_max(),
            stats: Stats::of(start_x, pmf),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(x, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        (self.start_x..).zip(self.values.iter().copied())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_capacity(ENGINE_CACHE_CAPACITY)
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: AHashMap::new(),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Same result as [`compute_distribution`]; PMFs are reused across calls
    /// with the same aggregate, dice and set.
    pub fn distribution(
        &mut self,
        kind: DistKind,
        aggregate: Aggregate,
        dice_text: &str,
        set_text: Option<&str>,
    ) -> Option<Distribution> {
        let (dice, set) = prepare(aggregate, dice_text, set_text)?;
        let key = (
            aggregate,
            dice.groups().to_vec(),
            set.as_ref().map(|s| s.values().to_vec()).unwrap_or_default(),
        );
        let pmf = match self.cache.get(&key) {
            Some(pmf) => {
                debug!("cache hit for {aggregate}({dice})");
                Rc::clone(pmf)
            }
            None => {
                if self.cache.len() >= self.capacity {
                    debug!("cache full at {} entries, clearing", self.cache.len());
                    self.cache.clear();
                }
                let pmf = Rc::new(compute_pmf(aggregate, &dice, set.as_ref()));
                self.cache.insert(key, Rc::clone(&pmf));
                pmf
            }
        };
        Some(Distribution::new(kind, aggregate, &dice, set.as_ref(), &pmf))
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::parse_dice;

    const EPS: f64 = 1e-9;

    fn pdf(aggregate: Aggregate, dice: &str) -> Distribution {
        compute_distribution(DistKind::Pdf, aggregate, dice, None).unwrap()
    }

    #[test]
    fn two_d6_sum() {
        let d = pdf(Aggregate::Sum, "2d6");
        assert_eq!(d.len(), 11);
        assert_eq!(d.start_x, 2);
        assert_eq!(d.label, "Sum(2d6)");
        assert_eq!(d.y_axis_label, "Pr(X=x)");
        assert_eq!(d.y_axis_max, None);
        assert!((d.values[5] - 6.0 / 36.0).abs() < EPS);
        for i in 0..d.len() {
            assert!((d.values[i] - d.values[d.len() - 1 - i]).abs() < EPS);
        }
    }

    #[test]
    fn sum_label_and_range() {
        let d = pdf(Aggregate::Sum, "3d6 + d20");
        assert_eq!(d.label, "Sum(3d6, 1d20)");
        assert_eq!(d.start_x, 4);
        assert_eq!(d.points().last().unwrap().0, 38);
    }

    #[test]
    fn max_of_one_die_is_uniform() {
        let d = pdf(Aggregate::Max, "1d6");
        assert_eq!(d.values, pmf::uniform(6));
        assert_eq!(d.start_x, 1);
        assert_eq!(pdf(Aggregate::Min, "d6").values, pmf::uniform(6));
    }

    #[test]
    fn min_and_max_supports() {
        assert_eq!(pdf(Aggregate::Max, "1d4, 1d10").len(), 10);
        assert_eq!(pdf(Aggregate::Min, "1d4, 1d10").len(), 4);
    }

    #[test]
    fn count_in_set_is_binomial() {
        let d = compute_distribution(DistKind::Pdf, Aggregate::InSet, "3d6", Some("1-2")).unwrap();
        assert_eq!(d.start_x, 0);
        assert_eq!(d.label, "InSet(3d6 {1-2})");
        let expected = [8.0 / 27.0, 12.0 / 27.0, 6.0 / 27.0, 1.0 / 27.0];
        for (a, e) in d.values.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{a} vs {e}");
        }
    }

    #[test]
    fn count_in_set_across_groups() {
        // d2 hits on 1 half the time, d4 hits on 1 a quarter of the time
        let d = compute_distribution(DistKind::Pdf, Aggregate::InSet, "d2 d4", Some("1")).unwrap();
        let expected = [0.375, 0.5, 0.125];
        for (a, e) in d.values.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{a} vs {e}");
        }
    }

    #[test]
    fn kinds_share_offset() {
        let cdf = compute_distribution(DistKind::Cdf, Aggregate::Sum, "2d4", None).unwrap();
        let ccdf = compute_distribution(DistKind::Ccdf, Aggregate::Sum, "2d4", None).unwrap();
        assert_eq!(cdf.start_x, ccdf.start_x);
        assert_eq!(cdf.y_axis_label, "Pr(X≤x)");
        assert_eq!(ccdf.y_axis_label, "Pr(X≥x)");
        assert_eq!(cdf.y_axis_max, Some(1.0));
        assert!((cdf.values.last().unwrap() - 1.0).abs() < EPS);
        assert!((ccdf.values[0] - 1.0).abs() < EPS);
        assert_eq!(cdf.stats, ccdf.stats);
    }

    #[test]
    fn nothing_to_plot() {
        let none = |aggregate, dice, set| {
            compute_distribution(DistKind::Pdf, aggregate, dice, set).is_none()
        };
        assert!(none(Aggregate::Sum, "", None));
        assert!(none(Aggregate::Max, "no dice", None));
        assert!(none(Aggregate::InSet, "3d6", None));
        assert!(none(Aggregate::InSet, "3d6", Some("")));
        assert!(none(Aggregate::InSet, "3d6", Some("9-4")));
    }

    #[test]
    fn set_is_ignored_outside_count_in_set() {
        let d = compute_distribution(DistKind::Pdf, Aggregate::Sum, "1d4", Some("1")).unwrap();
        assert_eq!(d.label, "Sum(1d4)");
    }

    #[test]
    fn set_beyond_every_face_gives_zero_hits() {
        let d = compute_distribution(DistKind::Pdf, Aggregate::InSet, "2d6", Some("7-9")).unwrap();
        assert_eq!(d.values, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn names_parse() {
        assert_eq!("SUM".parse::<Aggregate>().unwrap(), Aggregate::Sum);
        assert_eq!("InSet".parse::<Aggregate>().unwrap(), Aggregate::InSet);
        assert_eq!(" ccdf ".parse::<DistKind>().unwrap(), DistKind::Ccdf);
        assert!(matches!(
            "avg".parse::<Aggregate>(),
            Err(Error::UnknownAggregate(name)) if name == "avg"
        ));
        assert!(matches!(
            "pmf".parse::<DistKind>(),
            Err(Error::UnknownDistKind(_))
        ));
    }

    #[test]
    fn by_name() {
        let d = compute_distribution_by_name("cdf", "min", "2d6", None)
            .unwrap()
            .unwrap();
        assert_eq!(d.kind, DistKind::Cdf);
        assert_eq!(d.aggregate, Aggregate::Min);
        assert!(compute_distribution_by_name("pdf", "sum", "", None)
            .unwrap()
            .is_none());
        assert!(compute_distribution_by_name("pdf", "mean", "2d6", None).is_err());
    }

    #[test]
    fn large_sum_has_no_negative_mass() {
        let pdf = pdf(Aggregate::Sum, "100d6");
        assert_eq!(pdf.len(), 501);
        assert!(pdf.values.iter().all(|&p| p >= 0.0));

        let ccdf = compute_distribution(DistKind::Ccdf, Aggregate::Sum, "100d6", None).unwrap();
        assert!(ccdf.values.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(*ccdf.values.last().unwrap() >= 0.0);
    }

    #[test]
    fn oversized_dice_give_nothing_to_plot() {
        for dice in ["d4000000000", "4000000000d6"] {
            for aggregate in [Aggregate::Sum, Aggregate::Max, Aggregate::InSet] {
                let d = compute_distribution(DistKind::Pdf, aggregate, dice, Some("1"));
                assert!(d.is_none(), "{aggregate}({dice})");
            }
        }
    }

    #[test]
    fn empty_pool_pmf() {
        assert!(compute_pmf(Aggregate::Sum, &parse_dice(""), None).is_empty());
        assert!(compute_pmf(Aggregate::InSet, &parse_dice(""), None).is_empty());
    }

    #[test]
    fn engine_reuses_pmfs() {
        let mut engine = Engine::new();
        let a = engine.distribution(DistKind::Pdf, Aggregate::Sum, "3d6", None).unwrap();
        let b = engine.distribution(DistKind::Cdf, Aggregate::Sum, "3D6", None).unwrap();
        assert_eq!(engine.cache_len(), 1);
        assert_eq!(a.start_x, b.start_x);
        assert_eq!(b, compute_distribution(DistKind::Cdf, Aggregate::Sum, "3d6", None).unwrap());

        engine.distribution(DistKind::Pdf, Aggregate::InSet, "3d6", Some("1")).unwrap();
        engine.distribution(DistKind::Pdf, Aggregate::InSet, "3d6", Some("1, 2")).unwrap();
        assert_eq!(engine.cache_len(), 3);
        assert!(engine.distribution(DistKind::Pdf, Aggregate::Sum, "", None).is_none());
        assert_eq!(engine.cache_len(), 3);

        engine.clear();
        assert_eq!(engine.cache_len(), 0);
    }

    #[test]
    fn engine_cache_is_bounded() {
        let mut engine = Engine::with_capacity(2);
        assert_eq!(engine.capacity(), 2);
        for dice in ["1d4", "2d4", "3d4", "4d4", "5d4"] {
            let d = engine.distribution(DistKind::Pdf, Aggregate::Sum, dice, None).unwrap();
            assert_eq!(d, pdf(Aggregate::Sum, dice));
            assert!(engine.cache_len() <= 2);
        }
        assert_eq!(Engine::new().capacity(), ENGINE_CACHE_CAPACITY);
    }
}
