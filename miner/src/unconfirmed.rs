//! Unconfirmed-block tracking for the local miner.
//!
//! Blocks we mined are not final until they sit deep enough under the
//! canonical head. This module keeps a bounded FIFO of locally mined
//! `(number, hash)` entries and, as the chain advances, ages out the old
//! ones and reports whether each joined the canonical chain or ended up on
//! a side fork.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use dpor_types::{BlockHash, Header};

/// Canonical-chain lookup used to classify aged-out blocks.
pub trait HeaderRetriever: Send + Sync {
    /// The canonical header at `number`, if the chain has one.
    fn header_by_number(&self, number: u64) -> Option<Header>;
}

/// Metadata about one locally mined block awaiting maturity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct UnconfirmedBlock {
    number: u64,
    hash: BlockHash,
}

/// How an aged-out block relates to the canonical chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnconfirmedStatus {
    /// The canonical header at this height is the block we mined.
    Canonical,
    /// The canonical header at this height is a different block.
    SideFork,
    /// The chain has no header at this height.
    Unknown,
}

/// Classification of one aged-out block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationReport {
    pub number: u64,
    pub hash: BlockHash,
    pub status: UnconfirmedStatus,
}

/// Bounded FIFO of locally mined blocks that have not yet reached enough
/// maturity to guarantee chain inclusion.
///
/// Every operation takes the writer lock; classification happens under it
/// too, which is acceptable because the retriever is an in-memory header
/// index lookup.
pub struct UnconfirmedBlocks {
    chain: Arc<dyn HeaderRetriever>,
    depth: u64,
    blocks: Mutex<VecDeque<UnconfirmedBlock>>,
}

impl UnconfirmedBlocks {
    /// Track unconfirmed blocks, discarding each one `depth` blocks after
    /// its height. Only the number and hash are stored, never the block.
    pub fn new(chain: Arc<dyn HeaderRetriever>, depth: u64) -> Self {
        Self {
            chain,
            depth,
            blocks: Mutex::new(VecDeque::new()),
        }
    }

    /// Add a freshly mined block, first aging out anything old enough to
    /// judge. Re-announcing a `(number, hash)` already tracked is a no-op.
    pub fn insert(&self, number: u64, hash: BlockHash) {
        self.shift(number);

        let mut blocks = self.blocks.lock().unwrap();
        let entry = UnconfirmedBlock { number, hash };
        if blocks.contains(&entry) {
            return;
        }
        blocks.push_back(entry);
        info!(number, %hash, "🔨 mined potential block");
    }

    /// Age out every block at the front whose maturity window has passed,
    /// classifying each against the canonical chain. Returns the
    /// classifications in eviction order.
    pub fn shift(&self, height: u64) -> Vec<ConfirmationReport> {
        let mut blocks = self.blocks.lock().unwrap();
        let mut reports = Vec::new();

        while let Some(block) = blocks.front().copied() {
            if block.number + self.depth > height {
                break;
            }

            let status = match self.chain.header_by_number(block.number) {
                None => {
                    warn!(number = block.number, hash = %block.hash, "failed to retrieve header of mined block");
                    UnconfirmedStatus::Unknown
                }
                Some(header) if header.hash() == block.hash => {
                    info!(number = block.number, hash = %block.hash, "🔗 block reached canonical chain");
                    UnconfirmedStatus::Canonical
                }
                Some(_) => {
                    info!(number = block.number, hash = %block.hash, "⑂ block became a side fork");
                    UnconfirmedStatus::SideFork
                }
            };

            reports.push(ConfirmationReport {
                number: block.number,
                hash: block.hash,
                status,
            });
            blocks.pop_front();
        }

        reports
    }

    /// Number of blocks still awaiting maturity.
    pub fn len(&self) -> usize {
        self.blocks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().unwrap().is_empty()
    }
}
