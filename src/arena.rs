use log::trace;

use crate::error::AllocError;

const WORD: usize = core::mem::size_of::<usize>();

/// The growth source: a contiguous byte arena that only ever grows.
///
/// Each [`grow`](Arena::grow) call hands out a fresh region strictly above
/// all earlier ones, so block offsets order the same way the regions were
/// issued. Memory is never returned to the arena; a freed block goes back to
/// the free list, not here.
pub(crate) struct Arena {
    bytes: Vec<u8>,
    limit: usize,
    growth_calls: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// An arena that refuses to grow past `limit` total bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            growth_calls: 0,
        }
    }

    /// Extend the arena by exactly `size` bytes and return the offset of the
    /// fresh region. Fails with `OutOfMemory` once the limit is reached.
    pub fn grow(&mut self, size: usize) -> Result<usize, AllocError> {
        let at = self.bytes.len();

        if size > self.limit.saturating_sub(at) {
            return Err(AllocError::OutOfMemory);
        }

        self.bytes
            .try_reserve(size)
            .map_err(|_| AllocError::OutOfMemory)?;
        self.bytes.resize(at + size, 0);
        self.growth_calls += 1;

        trace!("arena grew by {size} bytes to {}", self.bytes.len());

        Ok(at)
    }

    /// High-water mark: total bytes handed out so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn growth_calls(&self) -> usize {
        self.growth_calls
    }

    pub fn word(&self, at: usize) -> usize {
        let raw = self.bytes[at..at + WORD].try_into().unwrap();
        usize::from_ne_bytes(raw)
    }

    pub fn set_word(&mut self, at: usize, value: usize) {
        self.bytes[at..at + WORD].copy_from_slice(&value.to_ne_bytes());
    }

    pub fn slice(&self, at: usize, len: usize) -> &[u8] {
        &self.bytes[at..at + len]
    }

    pub fn slice_mut(&mut self, at: usize, len: usize) -> &mut [u8] {
        &mut self.bytes[at..at + len]
    }
}
