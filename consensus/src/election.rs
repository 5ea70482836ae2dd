//! Deterministic committee election.
//!
//! Every node must derive the identical committee from the identical
//! inputs, so the whole procedure is fixed here:
//!
//! 1. Candidates are ranked by score descending; ties break by ascending
//!    address byte order. The ranking is the canonical input to sampling.
//! 2. The pseudorandom stream is ChaCha20 (`ChaCha20Rng`), seeded with the
//!    election seed's 64-bit two's-complement representation via
//!    `seed_from_u64`. The ChaCha20 stream is specified and portable
//!    across platforms and releases.
//! 3. Selection is weighted sampling without replacement: with `n`
//!    candidates, the rank-`i` candidate (0-based) carries weight `n - i`.
//!    Each round draws `next_u64() % total_remaining_weight` and walks the
//!    cumulative weights to pick one candidate, which is removed from the
//!    pool. The modulo reduction is mildly biased and exactly
//!    reproducible, which is the property that matters here.
//!
//! Selection order defines committee order, and committee order defines
//! the view rotation.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use dpor_types::{Address, Reputation};

use crate::error::ElectionError;

/// Elect `committee_size` distinct addresses from `rpts`.
///
/// Deterministic in `(rpts, seed, committee_size)`; the order of `rpts`
/// itself is irrelevant because ranking is canonical. The roster must not
/// contain duplicate addresses.
pub fn elect(
    rpts: &[Reputation],
    seed: i64,
    committee_size: usize,
) -> Result<Vec<Address>, ElectionError> {
    if rpts.is_empty() {
        return Err(ElectionError::EmptyInput);
    }
    if rpts.len() < committee_size {
        return Err(ElectionError::InsufficientCandidates {
            needed: committee_size,
            have: rpts.len(),
        });
    }

    let mut ranked = rpts.to_vec();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.address.cmp(&b.address))
    });

    let n = ranked.len() as u64;
    let mut pool: Vec<(Address, u64)> = ranked
        .iter()
        .enumerate()
        .map(|(rank, r)| (r.address, n - rank as u64))
        .collect();

    let mut rng = ChaCha20Rng::seed_from_u64(seed as u64);
    let mut committee = Vec::with_capacity(committee_size);

    while committee.len() < committee_size {
        let total: u64 = pool.iter().map(|(_, weight)| weight).sum();
        let mut draw = rng.next_u64() % total;

        let mut index = pool.len() - 1;
        for (i, (_, weight)) in pool.iter().enumerate() {
            if draw < *weight {
                index = i;
                break;
            }
            draw -= *weight;
        }

        let (address, _) = pool.remove(index);
        committee.push(address);
    }

    Ok(committee)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn roster(count: u8) -> Vec<Reputation> {
        (0..count)
            .map(|i| Reputation::new(addr(i), i as i64))
            .collect()
    }

    #[test]
    fn election_is_deterministic() {
        let rpts = roster(10);
        let a = elect(&rpts, 42, 4).unwrap();
        let b = elect(&rpts, 42, 4).unwrap();
        assert_eq!(a, b, "same inputs must produce the same committee");
    }

    #[test]
    fn input_order_is_irrelevant() {
        let rpts = roster(10);
        let mut shuffled = rpts.clone();
        shuffled.reverse();
        shuffled.swap(0, 3);

        assert_eq!(
            elect(&rpts, 7, 4).unwrap(),
            elect(&shuffled, 7, 4).unwrap(),
        );
    }

    #[test]
    fn committee_has_exact_size_and_distinct_members() {
        let rpts = roster(20);
        let committee = elect(&rpts, 1234, 7).unwrap();
        assert_eq!(committee.len(), 7);
        for (i, a) in committee.iter().enumerate() {
            assert!(!committee[i + 1..].contains(a), "duplicate member {a}");
        }
    }

    #[test]
    fn negative_seed_is_accepted() {
        let rpts = roster(10);
        let committee = elect(&rpts, -1, 4).unwrap();
        assert_eq!(committee.len(), 4);
        assert_eq!(committee, elect(&rpts, -1, 4).unwrap());
    }

    #[test]
    fn different_seeds_produce_different_committees() {
        let rpts = roster(50);
        let a = elect(&rpts, 1, 5).unwrap();
        let b = elect(&rpts, 2, 5).unwrap();
        assert_ne!(
            a, b,
            "different seeds should generally produce different committees"
        );
    }

    #[test]
    fn ties_break_by_address_order() {
        // All scores equal: the ranking is purely the address order, so two
        // rosters with identical addresses elect identically.
        let flat: Vec<Reputation> = (0..6).map(|i| Reputation::new(addr(i), 0)).collect();
        let mut reversed = flat.clone();
        reversed.reverse();
        assert_eq!(elect(&flat, 9, 3).unwrap(), elect(&reversed, 9, 3).unwrap());
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(elect(&[], 1, 1), Err(ElectionError::EmptyInput)));
    }

    #[test]
    fn insufficient_candidates_fail() {
        let rpts = roster(3);
        match elect(&rpts, 1, 4) {
            Err(ElectionError::InsufficientCandidates { needed, have }) => {
                assert_eq!(needed, 4);
                assert_eq!(have, 3);
            }
            other => panic!("expected InsufficientCandidates, got {other:?}"),
        }
    }

    #[test]
    fn full_roster_election_is_a_permutation() {
        let rpts = roster(5);
        let mut committee = elect(&rpts, 3, 5).unwrap();
        committee.sort();
        let mut all: Vec<Address> = rpts.iter().map(|r| r.address).collect();
        all.sort();
        assert_eq!(committee, all);
    }
}
