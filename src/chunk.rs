//! Split and reassembly rules for streamed-reply components.
//!
//! A logical component of an assistant reply (identified by message id and
//! [`ChunkType`](crate::entity::message_chunk::ChunkType)) may be too large to
//! store comfortably in one row. This module holds the pure half of the chunk
//! lifecycle: cutting a serialized payload into fragments and validating that
//! a set of stored fragments reassembles to the original, byte for byte.
//! [`ChunkStore`](crate::ChunkStore) layers the database reads and writes on
//! top.
//!
//! The contract is strict on the read side: if the rows for one component
//! disagree on `total_data_chunks`, repeat an index, or leave a gap, the
//! component is reported as corrupt rather than patched around.

/// Default upper bound, in bytes, for a stored fragment.
///
/// Inherited from the incident that motivated the chunk table: btree v4 index
/// entries cap out at 2704 bytes, and payload rows were once indexed. The
/// payload column is no longer indexed, but fragments this size keep rows
/// cheap to move and well clear of the limit should an index ever reappear.
pub const DEFAULT_FRAGMENT_BYTES: usize = 2048;

/// A stored fragment of one component, as read back from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Zero-based position of this fragment within the component.
    pub index: i32,
    /// Fragment count every row of the component must agree on.
    pub total: i32,
    /// The fragment text.
    pub payload: String,
}

/// Why a set of fragments could not be reassembled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReassemblyError {
    #[error("no fragments to reassemble")]
    Empty,
    #[error("fragments disagree on total_data_chunks (expected {expected}, found {found})")]
    TotalMismatch { expected: i32, found: i32 },
    #[error("component declares {declared} fragments but {actual} rows are stored")]
    CountMismatch { declared: i32, actual: usize },
    #[error("duplicate fragment index {0}")]
    DuplicateIndex(i32),
    #[error("fragment index {index} out of range for declared total {total}")]
    IndexOutOfRange { index: i32, total: i32 },
}

/// Cuts `serialized` into fragments of at most `max_bytes` bytes each, never
/// splitting inside a UTF-8 character.
///
/// The caller owns the split decision; this function only guarantees that
/// concatenating the returned slices in order reproduces `serialized`
/// exactly. `max_bytes` is clamped to 4 so any single character fits.
pub fn split_fragments(serialized: &str, max_bytes: usize) -> Vec<&str> {
    let max_bytes = max_bytes.max(4);
    let mut fragments = Vec::new();
    let mut start = 0;
    while start < serialized.len() {
        let mut end = (start + max_bytes).min(serialized.len());
        while !serialized.is_char_boundary(end) {
            end -= 1;
        }
        fragments.push(&serialized[start..end]);
        start = end;
    }
    fragments
}

/// Reassembles a component from its stored fragments.
///
/// Validates that every fragment declares the same total, that exactly
/// `total` rows are present, and that the indices are exactly `0..total`
/// with no duplicates or gaps. On success the concatenation (in index
/// order) is returned; input order does not matter.
pub fn reassemble(mut fragments: Vec<Fragment>) -> Result<String, ReassemblyError> {
    let Some(first) = fragments.first() else {
        return Err(ReassemblyError::Empty);
    };
    let total = first.total;

    for frag in &fragments {
        if frag.total != total {
            return Err(ReassemblyError::TotalMismatch {
                expected: total,
                found: frag.total,
            });
        }
        if frag.index < 0 || frag.index >= total {
            return Err(ReassemblyError::IndexOutOfRange {
                index: frag.index,
                total,
            });
        }
    }
    if fragments.len() != total as usize {
        return Err(ReassemblyError::CountMismatch {
            declared: total,
            actual: fragments.len(),
        });
    }

    fragments.sort_by_key(|frag| frag.index);
    for (expected, frag) in fragments.iter().enumerate() {
        if frag.index != expected as i32 {
            // Sorted and length-checked, so a mismatch here is a repeat.
            return Err(ReassemblyError::DuplicateIndex(frag.index));
        }
    }

    let mut assembled = String::with_capacity(fragments.iter().map(|f| f.payload.len()).sum());
    for frag in &fragments {
        assembled.push_str(&frag.payload);
    }
    Ok(assembled)
}
