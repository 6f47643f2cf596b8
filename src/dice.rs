use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

use itertools::Itertools;
use log::{trace, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{MAX_DICE, MAX_ROLL, MAX_SIDES};

static DIE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([0-9]*)d([0-9]+)").unwrap());

/// `count` independent fair dice, each showing `1..=sides`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DieGroup {
    pub count: u32,
    pub sides: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiceSpec {
    groups: Vec<DieGroup>,
    min_roll: u64,
    max_roll: u64,
}

impl DieGroup {
    #[must_use]
    pub fn new(count: u32, sides: u32) -> Option<Self> {
        (count > 0 && sides > 0).then_some(Self { count, sides })
    }

    /// Sides of every individual die in the group, one entry per die.
    pub fn dice(&self) -> impl Iterator<Item = u32> {
        std::iter::repeat(self.sides).take(self.count as usize)
    }
}

impl Display for DieGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

impl DiceSpec {
    /// Scans `text` for `NdM` tokens; everything between them is ignored.
    ///
    /// Tokens that would push the pool past [`MAX_SIDES`], [`MAX_DICE`] or
    /// [`MAX_ROLL`] are dropped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut spec = Self::default();
        for caps in DIE_PATTERN.captures_iter(text) {
            let count = match &caps[1] {
                "" => Some(1),
                digits => digits.parse().ok(),
            };
            let sides = caps[2].parse().ok();
            let Some(group) = count.zip(sides).and_then(|(c, s)| DieGroup::new(c, s)) else {
                trace!("skipping die token {:?}", &caps[0]);
                continue;
            };
            if spec.fits(group) {
                spec.push(group);
            } else {
                warn!("dropping die token {:?}: pool too large", &caps[0]);
            }
        }
        spec
    }

    fn fits(&self, group: DieGroup) -> bool {
        let count = u64::from(group.count);
        group.sides <= MAX_SIDES
            && self.dice_count() + count <= MAX_DICE
            && self.max_roll + count * u64::from(group.sides) <= MAX_ROLL
    }

    pub fn push(&mut self, group: DieGroup) {
        self.min_roll += u64::from(group.count);
        self.max_roll += u64::from(group.count) * u64::from(group.sides);
        self.groups.push(group);
    }

    #[must_use]
    pub fn groups(&self) -> &[DieGroup] {
        &self.groups
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Smallest possible sum of all dice.
    #[must_use]
    pub fn min_roll(&self) -> u64 {
        self.min_roll
    }

    /// Largest possible sum of all dice.
    #[must_use]
    pub fn max_roll(&self) -> u64 {
        self.max_roll
    }

    #[must_use]
    pub fn dice_count(&self) -> u64 {
        self.min_roll
    }

    #[must_use]
    pub fn display_label(&self) -> String {
        self.groups.iter().join(", ")
    }

    /// Sides of every individual die, in input order.
    pub fn dice(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.iter().flat_map(DieGroup::dice)
    }
}

impl FromIterator<DieGroup> for DiceSpec {
    fn from_iter<I: IntoIterator<Item = DieGroup>>(iter: I) -> Self {
        let mut spec = Self::default();
        for group in iter {
            spec.push(group);
        }
        spec
    }
}

impl FromStr for DiceSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label())
    }
}

#[must_use]
pub fn parse_dice(text: &str) -> DiceSpec {
    DiceSpec::parse(text)
}
