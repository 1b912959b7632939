//! Property tests for the balancer and rating rules

mod fixtures;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use squad_balancer::balance::{enumerate_candidates, verify_partition, TopKBalancer};
use squad_balancer::rating::{apply_result, seed_rating, Division, RankTier};
use squad_balancer::types::Team;
use std::collections::HashSet;

use fixtures::roster;

proptest! {
    #[test]
    fn chosen_split_is_a_partition(
        ratings in prop::collection::vec(0u32..4000, 10),
        top_k in 1usize..300,
        seed in any::<u64>(),
    ) {
        let players = roster(&ratings);
        let balancer = TopKBalancer::new(top_k).unwrap();
        let split = balancer
            .balance_with_rng(&players, &mut StdRng::seed_from_u64(seed))
            .unwrap();

        prop_assert!(verify_partition(&players, &split).is_ok());
        prop_assert_eq!(split.team_a.len(), 5);
        prop_assert_eq!(split.team_b.len(), 5);

        let ids: HashSet<&str> = split
            .team_a
            .iter()
            .chain(split.team_b.iter())
            .map(|p| p.id.as_str())
            .collect();
        prop_assert_eq!(ids.len(), 10);
        prop_assert_eq!(split.sum_a + split.sum_b, ratings.iter().map(|r| u64::from(*r)).sum::<u64>());
    }

    #[test]
    fn chosen_split_is_within_top_k(
        ratings in prop::collection::vec(0u32..4000, 10),
        top_k in 1usize..300,
        seed in any::<u64>(),
    ) {
        let players = roster(&ratings);
        let candidates = enumerate_candidates(&players).unwrap();
        let bound = candidates[top_k.min(candidates.len()) - 1].diff;

        let split = TopKBalancer::new(top_k)
            .unwrap()
            .balance_with_rng(&players, &mut StdRng::seed_from_u64(seed))
            .unwrap();
        prop_assert!(split.diff <= bound);
        if top_k == 1 {
            prop_assert_eq!(split.diff, candidates[0].diff);
        }
    }

    #[test]
    fn elo_update_is_anti_symmetric(
        x in 0.0f64..4000.0,
        y in 0.0f64..4000.0,
        k in 1.0f64..64.0,
    ) {
        prop_assert_eq!(apply_result(x, y, Team::A, k), apply_result(y, x, Team::B, k));
    }
}

#[test]
fn seeding_is_monotonic_over_every_rank() {
    let mut ranks = Vec::new();
    for tier in RankTier::ALL {
        if tier.is_apex() {
            ranks.push(seed_rating(Some(tier), None));
        } else {
            for division in Division::ALL.iter().rev() {
                ranks.push(seed_rating(Some(tier), Some(*division)));
            }
        }
    }

    assert!(ranks.windows(2).all(|pair| pair[0] < pair[1]));
}
