//! Brute-force enumeration of every individual roll in a pool.
//!
//! Exponential in the number of dice, so only usable for small pools, but the
//! probabilities are exact rationals and make a reference for the fast engine.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;
use num::rational::Ratio;
use num::traits::{One, Zero};
use num::{BigUint, ToPrimitive};

use crate::dice::DiceSpec;
use crate::engine::Aggregate;
use crate::set::IntegerSet;
use crate::{Error, Result, EXACT_MAX_OUTCOMES};

type Count = BigUint;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExactPmf {
    start_x: i64,
    counts: Vec<Count>,
    denom: Count,
}

impl ExactPmf {
    #[must_use]
    pub fn start_x(&self) -> i64 {
        self.start_x
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of equally likely rolls enumerated.
    #[must_use]
    pub fn denom(&self) -> &Count {
        &self.denom
    }

    #[must_use]
    pub fn probabilities(&self) -> Vec<Ratio<Count>> {
        self.counts
            .iter()
            .map(|c| Ratio::new(c.clone(), self.denom.clone()))
            .collect()
    }

    pub fn to_f64(&self) -> Result<Vec<f64>> {
        self.probabilities()
            .iter()
            .map(|r| r.to_f64().ok_or(Error::Overflow))
            .collect()
    }
}

/// Enumerates `aggregate` over every roll of `dice`.
///
/// Indexing matches [`crate::compute_pmf`]. Fails when the pool has more than
/// [`EXACT_MAX_OUTCOMES`] rolls.
pub fn enumerate(
    aggregate: Aggregate,
    dice: &DiceSpec,
    set: Option<&IntegerSet>,
) -> Result<ExactPmf> {
    let start_x = aggregate.start_x(dice);
    let sides = dice.dice().collect_vec();
    if sides.is_empty() {
        return Ok(ExactPmf {
            start_x,
            counts: Vec::new(),
            denom: Count::one(),
        });
    }

    let total = sides
        .iter()
        .try_fold(1u64, |acc, &s| acc.checked_mul(u64::from(s)))
        .filter(|&n| n <= EXACT_MAX_OUTCOMES)
        .ok_or(Error::TooManyOutcomes(EXACT_MAX_OUTCOMES))?;
    debug!("enumerating {total} rolls of {dice}");

    let empty = IntegerSet::default();
    let set = set.unwrap_or(&empty);
    let mut outcomes = BTreeMap::<i64, Count>::new();
    for roll in sides.iter().map(|&s| 1..=s).multi_cartesian_product() {
        let value = match aggregate {
            Aggregate::Sum => roll.iter().map(|&x| i64::from(x)).sum(),
            Aggregate::Min => roll.iter().copied().min().map_or(0, i64::from),
            Aggregate::Max => roll.iter().copied().max().map_or(0, i64::from),
            Aggregate::InSet => roll.iter().filter(|&&x| set.contains(u64::from(x))).count() as i64,
        };
        match outcomes.entry(value) {
            Entry::Vacant(e) => {
                e.insert(Count::one());
            }
            Entry::Occupied(mut e) => {
                *e.get_mut() += 1u32;
            }
        }
    }

    let mut counts = vec![Count::zero(); support_len(aggregate, &sides)];
    for (value, count) in outcomes {
        counts[(value - start_x) as usize] = count;
    }
    Ok(ExactPmf {
        start_x,
        counts,
        denom: Count::from(total),
    })
}

fn support_len(aggregate: Aggregate, sides: &[u32]) -> usize {
    match aggregate {
        Aggregate::Sum => sides.iter().map(|&s| s as usize - 1).sum::<usize>() + 1,
        Aggregate::Min => sides.iter().copied().min().unwrap_or(0) as usize,
        Aggregate::Max => sides.iter().copied().max().unwrap_or(0) as usize,
        Aggregate::InSet => sides.len() + 1,
    }
}
