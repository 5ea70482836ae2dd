//! Block header, reduced to the fields consensus reads.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

use crate::{Address, BlockHash};

type Blake2b256 = Blake2b<U32>;

/// A block header as seen by the snapshot engine.
///
/// The full chain header carries many more fields (state roots, gas
/// accounting, seal signatures); consensus only ever reads the parent link,
/// the height and the digest, so only those and the fields that feed the
/// digest are modelled here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Hash of the parent block.
    pub parent_hash: BlockHash,
    /// Address of the block producer.
    pub proposer: Address,
    /// Block height.
    pub number: u64,
    /// Unix timestamp (seconds) at which the block was sealed.
    pub timestamp: u64,
    /// Opaque consensus payload (seal data, committee signatures).
    pub extra: Vec<u8>,
}

impl Header {
    /// Deterministic Blake2b-256 digest of the header.
    ///
    /// Fields are fed to the hasher in declaration order with fixed-width
    /// big-endian integer encodings, so the digest is independent of any
    /// wire serialization framing.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Blake2b256::new();
        hasher.update(self.parent_hash.as_bytes());
        hasher.update(self.proposer.as_bytes());
        hasher.update(self.number.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(&self.extra);

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        BlockHash::new(out)
    }

    /// Election seed derived from this header.
    ///
    /// The digest is read as a 256-bit big-endian unsigned integer and
    /// reduced to its low-order 64 bits, reinterpreted as two's-complement.
    /// Every node derives the identical seed from the identical header.
    pub fn election_seed(&self) -> i64 {
        let hash = self.hash();
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&hash.as_bytes()[24..]);
        i64::from_be_bytes(tail)
    }
}
