//! Fixed-width ghost-membership bitmask.
//!
//! Bit `k` of an element's mask is set iff the element is visible to
//! partition `k` as a halo element. The width is a hard ceiling on the
//! partition count: requesting more partitions is a configuration error,
//! never a silent truncation.

use crate::mesh_error::MeshHaloError;
use crate::topology::PartitionId;
use std::cmp::Ordering;
use std::fmt;

/// Largest partition count a [`GhostMask`] can describe.
pub const MAX_PARTITIONS: usize = 256;

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = MAX_PARTITIONS / WORD_BITS;

static_assertions::const_assert!(MAX_PARTITIONS % WORD_BITS == 0);
static_assertions::const_assert!(WORDS >= 1);

/// Reject partition counts a [`GhostMask`] cannot hold.
pub fn check_capacity(n_parts: usize) -> Result<(), MeshHaloError> {
    if n_parts > MAX_PARTITIONS {
        return Err(MeshHaloError::PartitionCountExceedsCapacity {
            requested: n_parts,
            capacity: MAX_PARTITIONS,
        });
    }
    Ok(())
}

/// Set of partitions an element is a ghost for.
///
/// Ordered as an unsigned integer whose bit `k` is partition `k`, so
/// `{0} < {1} < {0, 1} < {2}`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct GhostMask {
    words: [u64; WORDS],
}

impl GhostMask {
    pub const EMPTY: Self = Self { words: [0; WORDS] };

    /// Mask with the single bit `part` set.
    pub fn single(part: PartitionId) -> Result<Self, MeshHaloError> {
        let mut m = Self::EMPTY;
        m.try_insert(part)?;
        Ok(m)
    }

    /// Set bit `part`, failing if it is beyond [`MAX_PARTITIONS`].
    pub fn try_insert(&mut self, part: PartitionId) -> Result<bool, MeshHaloError> {
        check_capacity(part + 1)?;
        Ok(self.insert(part))
    }

    /// Set bit `part`; returns whether it was newly set.
    ///
    /// Callers must have validated `part < MAX_PARTITIONS`.
    #[inline]
    pub(crate) fn insert(&mut self, part: PartitionId) -> bool {
        debug_assert!(part < MAX_PARTITIONS);
        let (w, b) = (part / WORD_BITS, part % WORD_BITS);
        let was = (self.words[w] >> b) & 1 == 1;
        self.words[w] |= 1u64 << b;
        !was
    }

    #[inline]
    pub fn contains(&self, part: PartitionId) -> bool {
        part < MAX_PARTITIONS && (self.words[part / WORD_BITS] >> (part % WORD_BITS)) & 1 == 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of partitions in the mask.
    #[inline]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Partitions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let b = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(wi * WORD_BITS + b)
            })
        })
    }

    /// Raw words, least significant first.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl Ord for GhostMask {
    fn cmp(&self, other: &Self) -> Ordering {
        // most significant word decides
        self.words.iter().rev().cmp(other.words.iter().rev())
    }
}

impl PartialOrd for GhostMask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for GhostMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<PartitionId> for GhostMask {
    /// # Panics
    /// Panics if a partition id is `>= MAX_PARTITIONS`.
    fn from_iter<I: IntoIterator<Item = PartitionId>>(iter: I) -> Self {
        let mut m = Self::EMPTY;
        for p in iter {
            assert!(p < MAX_PARTITIONS, "partition {p} exceeds ghost mask width");
            m.insert(p);
        }
        m
    }
}
