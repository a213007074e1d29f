use thiserror::Error;

/// Failures surfaced by [`Heap`](crate::Heap) operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
    /// The growth source could not extend the arena any further.
    #[error("out of memory: growth source exhausted")]
    OutOfMemory,

    /// The released handle does not name a live allocation: it was never
    /// returned by `allocate`, was already released, or points into the
    /// middle of a block. The payload offset is carried for diagnostics.
    #[error("invalid release of offset {0}")]
    InvalidRelease(usize),
}
