//! Balancer trait and the top-K random implementation
//!
//! Always returning the single best split repeats the same pairing for a
//! stable group. Drawing uniformly from the K best candidates keeps variety
//! while bounding how unbalanced a proposed split can be.

use crate::balance::enumerator::{enumerate_candidates, verify_partition};
use crate::error::{BalancerError, Result};
use crate::types::{RatedPlayer, TeamSplit};
use rand::Rng;
use tracing::{debug, info};

/// Number of near-optimal candidates to draw from
pub const DEFAULT_TOP_K: usize = 20;

/// Trait for producing a balanced 5v5 split from ten rated players
pub trait TeamBalancer: Send + Sync {
    /// Produce a split using the thread-local random source
    fn balance(&self, players: &[RatedPlayer]) -> Result<TeamSplit>;

    /// Candidates this balancer may choose from, most balanced first
    fn eligible_candidates(&self, players: &[RatedPlayer]) -> Result<Vec<TeamSplit>>;
}

/// Picks uniformly at random among the `top_k` lowest-difference splits
#[derive(Debug, Clone)]
pub struct TopKBalancer {
    top_k: usize,
}

impl TopKBalancer {
    /// Create a balancer drawing from the `top_k` best candidates
    pub fn new(top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(BalancerError::Configuration {
                message: "top_k must be at least 1".to_string(),
            });
        }

        Ok(Self { top_k })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Produce a split drawing from the supplied random source
    ///
    /// Selection within the top-K prefix is unweighted; a lower `diff`
    /// inside the prefix does not make a candidate more likely.
    pub fn balance_with_rng<R: Rng + ?Sized>(
        &self,
        players: &[RatedPlayer],
        rng: &mut R,
    ) -> Result<TeamSplit> {
        let mut eligible = self.eligible_candidates(players)?;

        let index = rng.gen_range(0..eligible.len());
        let split = eligible.swap_remove(index);

        verify_partition(players, &split)?;

        info!(
            "Generated split {}/{} of top {}: sum_a={}, sum_b={}, diff={}",
            index + 1,
            eligible.len() + 1,
            self.top_k,
            split.sum_a,
            split.sum_b,
            split.diff
        );

        Ok(split)
    }
}

impl Default for TopKBalancer {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl TeamBalancer for TopKBalancer {
    fn balance(&self, players: &[RatedPlayer]) -> Result<TeamSplit> {
        self.balance_with_rng(players, &mut rand::thread_rng())
    }

    fn eligible_candidates(&self, players: &[RatedPlayer]) -> Result<Vec<TeamSplit>> {
        let mut candidates = enumerate_candidates(players)?;

        // Empty only if enumeration is broken
        let k = self.top_k.min(candidates.len());
        if k == 0 {
            return Err(BalancerError::InvariantViolation {
                reason: "no candidate splits were generated".to_string(),
            });
        }
        candidates.truncate(k);

        debug!(
            "Top {} candidates span diff {}..={}",
            k,
            candidates[0].diff,
            candidates[k - 1].diff
        );

        Ok(candidates)
    }
}
