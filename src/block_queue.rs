//! Thread-safe FIFO of pending blocks, filled once and then drained.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::types::Block;

/// Job queue shared by all workers.
#[derive(Debug)]
pub struct BlockQueue {
    blocks: Mutex<VecDeque<Block>>,
}

impl BlockQueue {
    /// Build the queue from the identified blocks, keeping their order.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            blocks: Mutex::new(blocks.into_iter().collect()),
        }
    }

    /// Take the next block; `None` once the queue is exhausted.
    pub fn pop(&self) -> Option<Block> {
        let mut guard = self.blocks.lock().expect("block queue mutex poisoned");
        guard.pop_front()
    }

    /// Whether a block is still waiting. Only a hint under contention.
    pub fn has_next(&self) -> bool {
        let guard = self.blocks.lock().expect("block queue mutex poisoned");
        !guard.is_empty()
    }

    /// Current number of queued blocks.
    pub fn len(&self) -> usize {
        let guard = self.blocks.lock().expect("block queue mutex poisoned");
        guard.len()
    }

    /// Total units still queued.
    pub fn total_units(&self) -> u64 {
        let guard = self.blocks.lock().expect("block queue mutex poisoned");
        guard.iter().map(Block::units).sum()
    }
}
