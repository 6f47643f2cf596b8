use bon::Builder;
use log::debug;
use rand::rngs::ThreadRng;
use rand::{thread_rng, Rng, RngCore};

use crate::dice::DiceSpec;
use crate::engine::Aggregate;
use crate::set::IntegerSet;
use crate::APPROX_SAMPLE_SIZE;

/// Monte Carlo estimate of an aggregate's PMF.
#[derive(Debug, Builder)]
pub struct Approx<G = ThreadRng>
where
    G: RngCore,
{
    #[builder(finish_fn)]
    rng: G,
    #[builder(default = APPROX_SAMPLE_SIZE)]
    sample_size: u32,
}

impl Default for Approx<ThreadRng> {
    fn default() -> Self {
        Self::builder().build(thread_rng())
    }
}

impl<G> Approx<G>
where
    G: RngCore,
{
    #[must_use]
    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// Rolls every die in `dice` once and returns the aggregate.
    pub fn roll(&mut self, aggregate: Aggregate, dice: &DiceSpec, set: Option<&IntegerSet>) -> i64 {
        let faces = dice.dice().map(|s| self.rng.gen_range(1..=s));
        match aggregate {
            Aggregate::Sum => faces.map(i64::from).sum(),
            Aggregate::Min => faces.min().map_or(0, i64::from),
            Aggregate::Max => faces.max().map_or(0, i64::from),
            Aggregate::InSet => {
                let hits = faces.filter(|&x| set.is_some_and(|s| s.contains(u64::from(x))));
                hits.count() as i64
            }
        }
    }

    /// Empirical PMF indexed like [`crate::compute_pmf`], trimmed after the
    /// largest value actually sampled.
    #[must_use]
    pub fn approximate(
        &mut self,
        aggregate: Aggregate,
        dice: &DiceSpec,
        set: Option<&IntegerSet>,
    ) -> Vec<f64> {
        if dice.is_empty() || self.sample_size == 0 {
            return Vec::new();
        }
        debug!("sampling {} rolls of {aggregate}({dice})", self.sample_size);

        let start_x = aggregate.start_x(dice);
        let mut counts = Vec::<u64>::new();
        for _ in 0..self.sample_size {
            let idx = (self.roll(aggregate, dice, set) - start_x) as usize;
            if idx >= counts.len() {
                counts.resize(idx + 1, 0);
            }
            counts[idx] += 1;
        }

        let total = f64::from(self.sample_size);
        counts.into_iter().map(|c| c as f64 / total).collect()
    }
}
