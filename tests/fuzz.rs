// Randomized churn against a shadow model.
//
// Every live allocation is mirrored in a HashMap; after each round the
// payload contents are compared byte for byte and the free list is checked
// for ordering, coalescing completeness and overlap against live blocks.
use rand::prelude::*;
use std::collections::HashMap;

use firstfit::{Heap, Offset, HEADER_SIZE};

const ROUNDS: usize = 50;
const OPS_PER_ROUND: usize = 400;
const MAX_PAYLOAD: usize = 512;

struct Shadow {
    heap: Heap,
    values: HashMap<Offset, Vec<u8>>,
}

impl Shadow {
    fn new() -> Self {
        Self {
            heap: Heap::new(),
            values: HashMap::new(),
        }
    }

    fn allocate(&mut self, rng: &mut impl Rng) {
        let size = rng.gen_range(0..=MAX_PAYLOAD);
        let at = self.heap.allocate(size).unwrap();

        let mut value = vec![0u8; size];
        rng.fill(&mut value[..]);
        self.heap.payload_mut(at)[..size].copy_from_slice(&value);

        let prev = self.values.insert(at, value);
        assert!(prev.is_none(), "allocator handed out a live handle twice");
    }

    fn release(&mut self, rng: &mut impl Rng) {
        if self.values.is_empty() {
            return;
        }

        let at = *self.values.keys().choose(rng).unwrap();
        self.values.remove(&at);
        self.heap.release(at).unwrap();
    }

    fn verify(&self) {
        for (at, value) in &self.values {
            assert_eq!(&self.heap.payload(*at)[..value.len()], &value[..]);
        }

        self.check_free_list();
        self.check_no_overlap();
    }

    fn check_free_list(&self) {
        let free = self.heap.free_blocks();

        for pair in free.windows(2) {
            let (at, size) = pair[0];
            let (next, _) = pair[1];

            assert!(at + size <= next, "free list out of address order");
            assert_ne!(at + size, next, "missed coalesce between free blocks");
        }
    }

    fn check_no_overlap(&self) {
        // block ranges of every live allocation plus every free block
        let mut ranges: Vec<(usize, usize)> = self
            .values
            .keys()
            .map(|at| {
                let start = at.as_usize() - HEADER_SIZE;
                let len = self.heap.payload(*at).len() + HEADER_SIZE;
                (start, start + len)
            })
            .collect();
        ranges.extend(
            self.heap
                .free_blocks()
                .iter()
                .map(|&(at, size)| (at, at + size)),
        );

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "blocks {:?} and {:?} overlap",
                pair[0],
                pair[1]
            );
        }
    }
}

#[test]
fn fuzz() {
    let mut rng = rand::thread_rng();
    let mut shadow = Shadow::new();

    for round in 0..ROUNDS {
        for _ in 0..OPS_PER_ROUND {
            // bias toward allocation so the heap actually grows
            if rng.gen_range(0..100) < 60 {
                shadow.allocate(&mut rng);
            } else {
                shadow.release(&mut rng);
            }
        }

        shadow.verify();

        if round % 10 == 0 {
            println!(
                "round {round}: {} live, {} free blocks, heap {} bytes",
                shadow.values.len(),
                shadow.heap.free_blocks().len(),
                shadow.heap.size()
            );
        }
    }

    // drain everything: the whole arena must fold back into one free block
    let live: Vec<Offset> = shadow.values.keys().copied().collect();
    for at in live {
        shadow.values.remove(&at);
        shadow.heap.release(at).unwrap();
    }

    shadow.verify();
    assert_eq!(shadow.heap.free_blocks(), vec![(0, shadow.heap.size())]);
}
