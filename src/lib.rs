//! Probability distributions of dice pools: sum, minimum, maximum, or the
//! number of dice landing in a set, described by text such as `"3d6, 1d20"`.

pub mod approx;
pub mod chart;
pub mod dice;
pub mod engine;
pub mod exact;
pub mod pmf;
pub mod set;
pub mod stats;

pub use approx::Approx;
pub use chart::{Chart, ChartStyle};
pub use dice::{parse_dice, DiceSpec, DieGroup};
pub use engine::{
    compute_distribution, compute_distribution_by_name, compute_pmf, Aggregate, DistKind,
    Distribution, Engine,
};
pub use set::{parse_integer_set, IntegerSet};
pub use stats::Stats;
use thiserror::Error;

pub type Result<T> = ::core::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unknown aggregate {0:?}, expected sum, min, max or inset")]
    UnknownAggregate(String),
    #[error("unknown distribution kind {0:?}, expected pdf, cdf or ccdf")]
    UnknownDistKind(String),
    #[error("pool has more than {0} rolls to enumerate")]
    TooManyOutcomes(u64),
    #[error("overflow in probability")]
    Overflow,
}

pub const APPROX_SAMPLE_SIZE: u32 = 1_000_000;
pub const EXACT_MAX_OUTCOMES: u64 = 10_000_000;
pub const MAX_RANGE_SPAN: u64 = 1 << 20;
pub const MAX_SIDES: u32 = 1 << 20;
pub const MAX_DICE: u64 = 1_000;
/// Cap on the largest possible sum of a pool, which sizes the sum PMF.
pub const MAX_ROLL: u64 = 1 << 22;
pub const ENGINE_CACHE_CAPACITY: usize = 256;
