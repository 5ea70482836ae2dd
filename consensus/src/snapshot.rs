//! Authoritative record of proposer and validator committees.
//!
//! A snapshot captures, for one canonical block, everything needed to
//! answer "who may propose or validate block `n`": the candidate roster
//! read at that block and the committees of the recent terms. Snapshots
//! advance by deep-copying a parent and applying consecutive headers;
//! elections run at checkpoint blocks and seat committees `TERM_GAP` terms
//! ahead. Queries are read-only and safe for concurrent use while another
//! thread builds a successor snapshot.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use dpor_store::KeyValueStore;
use dpor_types::{Address, BlockHash, DporConfig, Header};

use crate::election::elect;
use crate::error::{CommitteeRole, SnapshotError};
use crate::oracle::{CandidateSource, ReputationSource};

/// Storage key prefix for persisted snapshots.
const STORE_KEY_PREFIX: &[u8] = b"dpor-";

/// The persisted portion of a snapshot. Field order is the canonical
/// encoding order; the term maps are `BTreeMap` so their encoding is
/// order-stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SnapshotState {
    number: u64,
    hash: BlockHash,
    candidates: Vec<Address>,
    recent_proposers: BTreeMap<u64, Vec<Address>>,
    recent_validators: BTreeMap<u64, Vec<Address>>,
}

/// Per-block authoritative committee state.
///
/// One reader/writer lock guards all mutable fields; getters copy out
/// whatever they return, so callers never observe later mutations.
#[derive(Debug)]
pub struct DporSnapshot {
    config: DporConfig,
    state: RwLock<SnapshotState>,
}

impl Clone for DporSnapshot {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: RwLock::new(self.state.read().unwrap().clone()),
        }
    }
}

impl PartialEq for DporSnapshot {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        *self.state.read().unwrap() == *other.state.read().unwrap()
    }
}

impl Eq for DporSnapshot {}

impl DporSnapshot {
    /// Create a genesis snapshot. `seed_signers` become both the proposer
    /// and the validator committee of the starting term; recent terms are
    /// otherwise empty, so only ever use this for the genesis block.
    pub fn new(
        config: DporConfig,
        number: u64,
        hash: BlockHash,
        seed_signers: Vec<Address>,
    ) -> Self {
        let term = config.term_of(number);
        let mut recent_proposers = BTreeMap::new();
        recent_proposers.insert(term, seed_signers.clone());
        let mut recent_validators = BTreeMap::new();
        recent_validators.insert(term, seed_signers);

        Self {
            config,
            state: RwLock::new(SnapshotState {
                number,
                hash,
                candidates: Vec::new(),
                recent_proposers,
                recent_validators,
            }),
        }
    }

    /// Load a stored snapshot and re-attach the runtime configuration.
    pub fn load(
        config: DporConfig,
        db: &dyn KeyValueStore,
        hash: BlockHash,
    ) -> Result<Self, SnapshotError> {
        let blob = db
            .get(&Self::store_key(&hash))?
            .ok_or(SnapshotError::NotFound(hash))?;
        let state: SnapshotState = serde_json::from_slice(&blob).map_err(|e| {
            SnapshotError::CorruptSnapshot {
                hash,
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            config,
            state: RwLock::new(state),
        })
    }

    /// Persist this snapshot under `"dpor-" ‖ hash` as a single atomic put.
    pub fn store(&self, db: &dyn KeyValueStore) -> Result<(), SnapshotError> {
        let state = self.state.read().unwrap();
        let blob = serde_json::to_vec(&*state)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        db.put(&Self::store_key(&state.hash), &blob)?;
        Ok(())
    }

    fn store_key(hash: &BlockHash) -> Vec<u8> {
        let mut key = Vec::with_capacity(STORE_KEY_PREFIX.len() + 32);
        key.extend_from_slice(STORE_KEY_PREFIX);
        key.extend_from_slice(hash.as_bytes());
        key
    }

    pub fn config(&self) -> &DporConfig {
        &self.config
    }

    /// Height of the most recently applied header.
    pub fn number(&self) -> u64 {
        self.state.read().unwrap().number
    }

    /// Hash of the most recently applied header.
    pub fn hash(&self) -> BlockHash {
        self.state.read().unwrap().hash
    }

    /// `(number, hash)` read under a single lock acquisition, so the pair
    /// is never torn.
    pub fn head(&self) -> (u64, BlockHash) {
        let state = self.state.read().unwrap();
        (state.number, state.hash)
    }

    /// Candidate roster read at this snapshot's block.
    pub fn candidates(&self) -> Vec<Address> {
        self.state.read().unwrap().candidates.clone()
    }

    /// Retained proposer committees, keyed by term.
    pub fn recent_proposers(&self) -> BTreeMap<u64, Vec<Address>> {
        self.state.read().unwrap().recent_proposers.clone()
    }

    /// Retained validator committees, keyed by term.
    pub fn recent_validators(&self) -> BTreeMap<u64, Vec<Address>> {
        self.state.read().unwrap().recent_validators.clone()
    }

    /// Term index of block `number`.
    pub fn term_of(&self, number: u64) -> u64 {
        self.config.term_of(number)
    }

    /// Term whose committee is elected while processing block `number`.
    pub fn future_term_of(&self, number: u64) -> u64 {
        self.config.future_term_of(number)
    }

    /// Proposer committee serving block `number`'s term; empty when the
    /// term is unknown (expected during bootstrap, never fatal).
    pub fn proposers_of(&self, number: u64) -> Vec<Address> {
        let term = self.config.term_of(number);
        self.state
            .read()
            .unwrap()
            .recent_proposers
            .get(&term)
            .cloned()
            .unwrap_or_default()
    }

    /// Validator committee serving block `number`'s term; empty when the
    /// term is unknown.
    pub fn validators_of(&self, number: u64) -> Vec<Address> {
        let term = self.config.term_of(number);
        self.state
            .read()
            .unwrap()
            .recent_validators
            .get(&term)
            .cloned()
            .unwrap_or_default()
    }

    /// Committee elected while processing block `number`, i.e. the
    /// proposers of `future_term_of(number)`.
    pub fn future_proposers_of(&self, number: u64) -> Vec<Address> {
        let term = self.config.future_term_of(number);
        self.state
            .read()
            .unwrap()
            .recent_proposers
            .get(&term)
            .cloned()
            .unwrap_or_default()
    }

    /// Validators of `future_term_of(number)`.
    pub fn future_validators_of(&self, number: u64) -> Vec<Address> {
        let term = self.config.future_term_of(number);
        self.state
            .read()
            .unwrap()
            .recent_validators
            .get(&term)
            .cloned()
            .unwrap_or_default()
    }

    /// 0-based view index of `address` in the proposer committee serving
    /// block `number`.
    pub fn proposer_view_of(&self, address: Address, number: u64) -> Result<u64, SnapshotError> {
        self.proposers_of(number)
            .iter()
            .position(|a| *a == address)
            .map(|view| view as u64)
            .ok_or(SnapshotError::NotInCommittee {
                role: CommitteeRole::Proposer,
                address,
            })
    }

    /// 0-based view index of `address` in the validator committee serving
    /// block `number`.
    pub fn validator_view_of(&self, address: Address, number: u64) -> Result<u64, SnapshotError> {
        self.validators_of(number)
            .iter()
            .position(|a| *a == address)
            .map(|view| view as u64)
            .ok_or(SnapshotError::NotInCommittee {
                role: CommitteeRole::Validator,
                address,
            })
    }

    /// Whether `address` sits in the validator committee for block
    /// `number`'s term.
    pub fn is_validator_of(&self, address: Address, number: u64) -> bool {
        self.validator_view_of(address, number).is_ok()
    }

    /// Whether `address` is the in-turn proposer of block `number`.
    ///
    /// Fails with `GenesisHasNoLeader` at height 0 and `NotInCommittee`
    /// when the address is not seated for that term.
    pub fn is_proposer_of(&self, address: Address, number: u64) -> Result<bool, SnapshotError> {
        let inturn = self
            .config
            .inturn_view_of(number)
            .ok_or(SnapshotError::GenesisHasNoLeader)?;
        let view = self.proposer_view_of(address, number)?;
        Ok(view == inturn)
    }

    /// Semantic alias of [`is_proposer_of`](Self::is_proposer_of); the
    /// impeachment path asks the question in leadership terms.
    pub fn is_leader_of(&self, address: Address, number: u64) -> Result<bool, SnapshotError> {
        self.is_proposer_of(address, number)
    }

    /// Convenience form of [`is_proposer_of`](Self::is_proposer_of) that
    /// swallows errors to `false`.
    pub fn inturn_of(&self, number: u64, address: Address) -> bool {
        self.is_proposer_of(address, number).unwrap_or(false)
    }

    /// Whether `address` was elected into the committee that becomes
    /// active `TERM_GAP` terms after block `number`'s term.
    pub fn is_future_proposer_of(&self, address: Address, number: u64) -> bool {
        self.future_proposers_of(number).contains(&address)
    }

    /// Produce a new snapshot by applying consecutive headers to a deep
    /// copy of this one.
    ///
    /// The batch is validated up front: the first header must extend this
    /// snapshot's block and each later header must extend its predecessor.
    /// Any sub-step failure aborts the whole batch and this snapshot is
    /// left untouched; headers are never applied partially. An empty batch
    /// yields a content-equal copy.
    pub fn apply_headers(
        &self,
        headers: &[Header],
        candidates: &dyn CandidateSource,
        reputations: &dyn ReputationSource,
    ) -> Result<DporSnapshot, SnapshotError> {
        let next = self.clone();
        if headers.is_empty() {
            return Ok(next);
        }

        let mut expected = next.number() + 1;
        for header in headers {
            if header.number != expected {
                return Err(SnapshotError::InvalidChain {
                    expected,
                    got: header.number,
                });
            }
            expected += 1;
        }

        for header in headers {
            if let Err(err) = next.apply_header(header, candidates, reputations) {
                warn!(number = header.number, %err, "header application aborted the batch");
                return Err(err);
            }
        }

        Ok(next)
    }

    /// Apply one header. Holds the writer lock for the duration, including
    /// the oracle calls; `apply_headers` only ever invokes this on a
    /// detached copy, so readers of the parent snapshot are not stalled.
    fn apply_header(
        &self,
        header: &Header,
        candidates: &dyn CandidateSource,
        reputations: &dyn ReputationSource,
    ) -> Result<(), SnapshotError> {
        let mut state = self.state.write().unwrap();

        state.number = header.number;
        state.hash = header.hash();
        state.candidates = candidates.candidates(header)?;

        if self.config.is_checkpoint(header.number) {
            let committee = match self.bootstrap_roster(&state, header.number) {
                Some(seed_roster) => seed_roster,
                None => {
                    let rpts = reputations.reputations(header, &state.candidates)?;
                    elect(
                        &rpts,
                        header.election_seed(),
                        self.config.term_len as usize,
                    )?
                }
            };

            let future_term = self.config.future_term_of(header.number);
            state.recent_proposers.insert(future_term, committee.clone());
            state.recent_validators.insert(future_term, committee);

            while state.recent_proposers.len() > self.config.max_recent_terms {
                state.recent_proposers.pop_first();
            }
            while state.recent_validators.len() > self.config.max_recent_terms {
                state.recent_validators.pop_first();
            }
        }

        Ok(())
    }

    /// Static seed roster to seat below the init height, if still present.
    /// Once the init height passes (or the genesis term was evicted), the
    /// regular election takes over.
    fn bootstrap_roster(&self, state: &SnapshotState, number: u64) -> Option<Vec<Address>> {
        if number >= self.config.max_init_block_number {
            return None;
        }
        state.recent_proposers.get(&0).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{StaticCandidateSource, TableReputationSource};
    use std::collections::HashMap;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn config() -> DporConfig {
        DporConfig::new(4, 3).unwrap()
    }

    fn seed_signers() -> Vec<Address> {
        vec![addr(1), addr(2), addr(3), addr(4)]
    }

    fn genesis() -> DporSnapshot {
        DporSnapshot::new(config(), 0, BlockHash::new([0xEE; 32]), seed_signers())
    }

    fn oracles() -> (StaticCandidateSource, TableReputationSource) {
        let roster: Vec<Address> = (1u8..=5).map(addr).collect();
        let scores: HashMap<Address, i64> =
            roster.iter().enumerate().map(|(i, a)| (*a, i as i64)).collect();
        (
            StaticCandidateSource::new(roster),
            TableReputationSource::new(scores),
        )
    }

    fn header_chain(parent: BlockHash, from: u64, to: u64) -> Vec<Header> {
        let mut headers = Vec::new();
        let mut parent_hash = parent;
        for number in from..=to {
            let header = Header {
                parent_hash,
                proposer: addr((number % 4) as u8 + 1),
                number,
                timestamp: 1_700_000_000 + number,
                extra: Vec::new(),
            };
            parent_hash = header.hash();
            headers.push(header);
        }
        headers
    }

    #[test]
    fn genesis_installs_seed_signers_in_both_roles() {
        let snap = genesis();
        assert_eq!(snap.proposers_of(0), seed_signers());
        assert_eq!(snap.validators_of(0), seed_signers());
        assert_eq!(snap.number(), 0);
    }

    #[test]
    fn unknown_terms_yield_empty_committees() {
        let snap = genesis();
        assert!(snap.proposers_of(1000).is_empty());
        assert!(snap.validators_of(1000).is_empty());
        assert!(snap.future_proposers_of(0).is_empty());
    }

    #[test]
    fn leader_queries_fail_at_genesis() {
        let snap = genesis();
        assert!(matches!(
            snap.is_leader_of(addr(1), 0),
            Err(SnapshotError::GenesisHasNoLeader)
        ));
        assert!(!snap.inturn_of(0, addr(1)));
    }

    #[test]
    fn view_lookup_reports_absent_members() {
        let snap = genesis();
        assert_eq!(snap.proposer_view_of(addr(2), 1).unwrap(), 1);
        match snap.proposer_view_of(addr(9), 1) {
            Err(SnapshotError::NotInCommittee { role, address }) => {
                assert_eq!(role, CommitteeRole::Proposer);
                assert_eq!(address, addr(9));
            }
            other => panic!("expected NotInCommittee, got {other:?}"),
        }
    }

    #[test]
    fn validator_lookup_mirrors_proposer_lookup() {
        let snap = genesis();
        assert_eq!(snap.validator_view_of(addr(3), 1).unwrap(), 2);
        assert!(snap.is_validator_of(addr(3), 1));
        // Membership is not a leadership question; it holds at height 0 too.
        assert!(snap.is_validator_of(addr(1), 0));

        assert!(!snap.is_validator_of(addr(9), 1));
        match snap.validator_view_of(addr(9), 1) {
            Err(SnapshotError::NotInCommittee { role, address }) => {
                assert_eq!(role, CommitteeRole::Validator);
                assert_eq!(address, addr(9));
            }
            other => panic!("expected NotInCommittee, got {other:?}"),
        }
    }

    #[test]
    fn applying_empty_batch_returns_equal_content() {
        let snap = genesis();
        let (cs, rs) = oracles();
        let next = snap.apply_headers(&[], &cs, &rs).unwrap();
        assert_eq!(snap, next);
    }

    #[test]
    fn child_mutation_leaves_parent_untouched() {
        let snap = genesis();
        let (cs, rs) = oracles();
        let headers = header_chain(snap.hash(), 1, 13);
        let child = snap.apply_headers(&headers, &cs, &rs).unwrap();

        assert_eq!(snap.number(), 0);
        assert_eq!(snap.candidates(), Vec::new());
        assert_eq!(snap.recent_proposers().len(), 1);

        assert_eq!(child.number(), 13);
        assert!(child.recent_proposers().len() > 1);
    }

    #[test]
    fn wrong_first_header_fails_invalid_chain() {
        let snap = genesis();
        let (cs, rs) = oracles();
        let headers = header_chain(snap.hash(), 2, 3);
        match snap.apply_headers(&headers, &cs, &rs) {
            Err(SnapshotError::InvalidChain { expected, got }) => {
                assert_eq!(expected, 1);
                assert_eq!(got, 2);
            }
            other => panic!("expected InvalidChain, got {other:?}"),
        }
    }

    #[test]
    fn bootstrap_checkpoints_reuse_the_seed_roster() {
        let mut cfg = config();
        cfg.max_init_block_number = 40;
        let snap = DporSnapshot::new(cfg, 0, BlockHash::new([0xEE; 32]), seed_signers());
        let (cs, rs) = oracles();

        let headers = header_chain(snap.hash(), 1, 13);
        let next = snap.apply_headers(&headers, &cs, &rs).unwrap();

        // Checkpoints 1 and 13 both ran below the init height, so terms 3
        // and 4 carry the seed roster, not an election result.
        assert_eq!(next.recent_proposers().get(&3), Some(&seed_signers()));
        assert_eq!(next.recent_proposers().get(&4), Some(&seed_signers()));
    }

    #[test]
    fn snapshot_equality_is_by_content() {
        let a = genesis();
        let b = genesis();
        assert_eq!(a, b);
        assert_eq!(a, a.clone());
    }
}
