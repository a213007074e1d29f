use log::debug;

use crate::arena::Arena;
use crate::block::{Block, ALIGN, MIN_BLOCK};
use crate::error::AllocError;

/// The address-ordered free list, threaded through the freed blocks
/// themselves. `head` plays the sentinel role: it owns no block, only the
/// link to the lowest-address free block.
pub(crate) struct FreeList {
    head: Option<Block>,
}

impl FreeList {
    pub fn new() -> Self {
        Self { head: None }
    }

    /// First-fit: detach and return the first block, in address order, whose
    /// total size covers `size`. The list is untouched when nothing fits.
    pub fn take_first(&mut self, arena: &mut Arena, size: usize) -> Option<Block> {
        let mut pred: Option<Block> = None;
        let mut cur = self.head;

        while let Some(block) = cur {
            if block.size(arena) >= size {
                let next = block.next(arena);
                match pred {
                    None => self.head = next,
                    Some(p) => p.set_next(arena, next),
                }
                return Some(block);
            }

            pred = cur;
            cur = block.next(arena);
        }

        None
    }

    /// Splice `block` in, keeping addresses strictly ascending, then merge
    /// it with any physically adjacent neighbor on either side.
    ///
    /// The insertion walk doubles as the sanity check: a block that is
    /// already on the list, or that overlaps a listed block, is rejected
    /// before anything is mutated.
    pub fn insert(&mut self, arena: &mut Arena, block: Block) -> Result<(), AllocError> {
        let mut pred: Option<Block> = None;
        let mut cur = self.head;

        while let Some(b) = cur {
            if b.0 >= block.0 {
                break;
            }
            pred = cur;
            cur = b.next(arena);
        }

        // cur is the first free block at or above `block`
        if let Some(b) = cur {
            if b.0 == block.0 || block.end(arena) > b.0 {
                debug!("rejecting release at {}: collides with free block at {}", block.0, b.0);
                return Err(AllocError::InvalidRelease(block.payload().as_usize()));
            }
        }
        if let Some(p) = pred {
            if p.end(arena) > block.0 {
                debug!("rejecting release at {}: inside free block at {}", block.0, p.0);
                return Err(AllocError::InvalidRelease(block.payload().as_usize()));
            }
        }

        block.set_next(arena, cur);
        match pred {
            None => self.head = Some(block),
            Some(p) => p.set_next(arena, Some(block)),
        }

        // Merge forward from the freed block, then let an adjacent
        // predecessor absorb it. Every other pair was non-adjacent before
        // this release, so these two passes leave no adjacent pair behind.
        Self::coalesce(arena, block);
        if let Some(p) = pred {
            Self::coalesce(arena, p);
        }

        Ok(())
    }

    // Absorb `block`'s successors for as long as they start exactly where
    // `block` ends.
    fn coalesce(arena: &mut Arena, block: Block) {
        while let Some(next) = block.next(arena) {
            if block.end(arena) != next.0 {
                break;
            }

            debug!("coalescing block at {} into block at {}", next.0, block.0);
            block.set_size(arena, block.size(arena) + next.size(arena));
            block.set_next(arena, next.next(arena));
        }
    }

    pub fn blocks<'a>(&self, arena: &'a Arena) -> Blocks<'a> {
        Blocks {
            arena,
            cur: self.head,
        }
    }

    /// Invariant check used by debug assertions and tests: strictly
    /// ascending, no two blocks adjacent, every block sized and placed
    /// plausibly within the arena.
    pub fn check(&self, arena: &Arena) -> bool {
        let mut prev: Option<Block> = None;

        for block in self.blocks(arena) {
            let size = block.size(arena);

            if block.0 % ALIGN != 0 || size < MIN_BLOCK || size % ALIGN != 0 {
                return false;
            }
            if block.end(arena) > arena.len() {
                return false;
            }
            if let Some(p) = prev {
                // equality would mean a missed merge
                if p.end(arena) >= block.0 {
                    return false;
                }
            }

            prev = Some(block);
        }

        true
    }
}

pub(crate) struct Blocks<'a> {
    arena: &'a Arena,
    cur: Option<Block>,
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let block = self.cur?;
        self.cur = block.next(self.arena);
        Some(block)
    }
}
