//! A first-fit, address-ordered free-list allocator over a growable byte
//! arena.
//!
//! A [`Heap`] owns a contiguous arena that only ever grows. Every block in
//! the arena carries a one-word header recording its total size; freed
//! blocks are threaded into a singly linked free list kept in strictly
//! ascending address order, with the link stored inside the freed payload
//! itself. Allocation takes the first listed block large enough (whole, no
//! splitting) or grows the arena by exactly the rounded request; release
//! splices the block back in address order and merges it with physically
//! adjacent neighbors on both sides.
//!
//! Addresses are opaque [`Offset`] handles rather than raw pointers, and
//! payload access goes through [`Heap::payload`] / [`Heap::payload_mut`],
//! so client code can never touch a header word. The allocator is
//! single-threaded by construction: every operation takes `&mut self`.

mod arena;
mod block;
mod error;
mod free_list;

use log::debug;

use arena::Arena;
use block::{round_up, Block, MIN_BLOCK};
use free_list::FreeList;

pub use block::{Offset, ALIGN, HEADER_SIZE};
pub use error::AllocError;

/// An independent allocator instance: a growable arena plus its free list.
pub struct Heap {
    arena: Arena,
    free: FreeList,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// An empty heap with no ceiling on arena growth.
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// An empty heap whose growth source refuses to hand out more than
    /// `limit` bytes in total.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            arena: Arena::with_limit(limit),
            free: FreeList::new(),
        }
    }

    /// Allocate at least `size` bytes of payload.
    ///
    /// The request is rounded up to [`ALIGN`] (with a minimum of one
    /// alignment unit, so the block can host its free-list link once
    /// released). A first-fit match hands back the whole matched block, so
    /// the payload may be larger than requested; its contents are
    /// unspecified.
    pub fn allocate(&mut self, size: usize) -> Result<Offset, AllocError> {
        let size = round_up(size.max(ALIGN))
            .and_then(|s| s.checked_add(HEADER_SIZE))
            .ok_or(AllocError::OutOfMemory)?;

        let block = match self.free.take_first(&mut self.arena, size) {
            Some(block) => {
                debug!("reusing free block at {} for request of {size}", block.0);
                block
            }
            None => {
                let at = self.arena.grow(size)?;
                let block = Block(at);
                block.set_size(&mut self.arena, size);
                block
            }
        };

        Ok(block.payload())
    }

    /// Release a previously allocated handle.
    ///
    /// The block is spliced back into the free list at its address-ordered
    /// position and merged with any physically adjacent free neighbor.
    /// A handle that fails the header sanity checks (never allocated,
    /// already released, or pointing into the middle of a block) is
    /// rejected with [`AllocError::InvalidRelease`] and the heap is left
    /// untouched.
    pub fn release(&mut self, at: Offset) -> Result<(), AllocError> {
        let block = self.checked_block(at)?;
        self.free.insert(&mut self.arena, block)?;

        debug_assert!(self.free.check(&self.arena));

        Ok(())
    }

    /// Payload bytes of a live allocation.
    ///
    /// The slice spans the whole block payload, which may be larger than
    /// the requested size.
    ///
    /// # Panics
    ///
    /// Panics if `at` does not name a live allocation.
    pub fn payload(&self, at: Offset) -> &[u8] {
        let block = self.checked_block(at).expect("not a live allocation");
        let len = block.size(&self.arena) - HEADER_SIZE;
        self.arena.slice(at.0, len)
    }

    /// Mutable payload bytes of a live allocation.
    ///
    /// # Panics
    ///
    /// Panics if `at` does not name a live allocation.
    pub fn payload_mut(&mut self, at: Offset) -> &mut [u8] {
        let block = self.checked_block(at).expect("not a live allocation");
        let len = block.size(&self.arena) - HEADER_SIZE;
        self.arena.slice_mut(at.0, len)
    }

    /// Total bytes obtained from the growth source. This is a high-water
    /// mark: freed memory stays with the heap and is never handed back.
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    /// How many times the growth source has been invoked.
    pub fn growth_calls(&self) -> usize {
        self.arena.growth_calls()
    }

    /// Snapshot of the free list as `(block offset, total size)` pairs in
    /// address order.
    pub fn free_blocks(&self) -> Vec<(usize, usize)> {
        self.free
            .blocks(&self.arena)
            .map(|b| (b.0, b.size(&self.arena)))
            .collect()
    }

    // Recover and sanity-check the block header behind a payload handle.
    fn checked_block(&self, at: Offset) -> Result<Block, AllocError> {
        let block = match Block::from_payload(at) {
            Some(block) if block.0 % ALIGN == 0 => block,
            _ => return Err(AllocError::InvalidRelease(at.as_usize())),
        };

        if block.0 + HEADER_SIZE > self.arena.len() {
            return Err(AllocError::InvalidRelease(at.as_usize()));
        }

        let size = block.size(&self.arena);
        if size < MIN_BLOCK || size % ALIGN != 0 || size > self.arena.len() - block.0 {
            return Err(AllocError::InvalidRelease(at.as_usize()));
        }

        Ok(block)
    }
}
