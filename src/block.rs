use crate::arena::Arena;

/// Alignment unit. Payload sizes are rounded up to this, and every block
/// starts at a multiple of it.
pub const ALIGN: usize = core::mem::size_of::<usize>();

/// Bytes of metadata prefixed to every block: one word holding the block's
/// total size, header included.
pub const HEADER_SIZE: usize = core::mem::size_of::<usize>();

/// Smallest legal block: header plus one alignment unit of payload, so a
/// freed block can host its free-list link inside its own payload.
pub const MIN_BLOCK: usize = HEADER_SIZE + ALIGN;

// Sentinel word for "no next free block".
const NIL: usize = usize::MAX;

/// Round `size` up to the next multiple of [`ALIGN`].
///
/// `None` if the rounded size does not fit in a `usize`.
pub fn round_up(size: usize) -> Option<usize> {
    size.checked_add(ALIGN - 1).map(|s| s & !(ALIGN - 1))
}

/// Opaque handle to a live allocation's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Offset(pub(crate) usize);

impl Offset {
    /// Byte position of the payload within the arena.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// View of one block within the arena, addressed by the offset of its header.
///
/// The header word holds the block's total size. While the block is free,
/// the first payload word hosts the link to the next free block; while
/// allocated, the whole payload belongs to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Block(pub(crate) usize);

impl Block {
    pub fn from_payload(at: Offset) -> Option<Block> {
        at.0.checked_sub(HEADER_SIZE).map(Block)
    }

    pub fn payload(self) -> Offset {
        Offset(self.0 + HEADER_SIZE)
    }

    pub fn size(self, arena: &Arena) -> usize {
        arena.word(self.0)
    }

    pub fn set_size(self, arena: &mut Arena, size: usize) {
        arena.set_word(self.0, size);
    }

    /// One past the last byte spanned by this block.
    pub fn end(self, arena: &Arena) -> usize {
        self.0 + self.size(arena)
    }

    pub fn next(self, arena: &Arena) -> Option<Block> {
        match arena.word(self.0 + HEADER_SIZE) {
            NIL => None,
            at => Some(Block(at)),
        }
    }

    pub fn set_next(self, arena: &mut Arena, next: Option<Block>) {
        arena.set_word(self.0 + HEADER_SIZE, next.map_or(NIL, |block| block.0));
    }
}
