use crate::block::{Block, BlockState, HEADER_SIZE};

/// Whether a block with `capacity` payload bytes serving `size` bytes leaves
/// enough room for a remainder with a non-empty payload.
pub fn should_split(
  capacity: usize,
  size: usize,
) -> bool {
  capacity > size + HEADER_SIZE
}

/// Carves `block` into a served block of exactly `size` payload bytes and a
/// free remainder placed right after it. Returns the remainder, unlinked.
///
/// ```text
///   before: ┌────────┬──────────────────────────────────────────┐
///           │ header │ capacity                                 │
///           └────────┴──────────────────────────────────────────┘
///   after:  ┌────────┬──────────┬────────┬──────────────────────┐
///           │ header │ size     │ header │ capacity-size-HEADER │
///           └────────┴──────────┴────────┴──────────────────────┘
/// ```
///
/// # Safety
///
/// `block` must be a valid header, unlinked from the free list, and
/// `should_split((*block).size, size)` must hold. `size` must be word
/// aligned.
pub unsafe fn split(
  block: *mut Block,
  size: usize,
) -> *mut Block {
  unsafe {
    debug_assert!(should_split((*block).size, size));

    let remaining = (*block).size - (size + HEADER_SIZE);
    let at = Block::payload_of(block).add(size);
    let remainder = Block::write(at, remaining, BlockState::Free);

    (*block).size = size;

    log::trace!(
      "split {:?}: served {} bytes, remainder {:?} with {} bytes",
      block,
      size,
      remainder,
      remaining
    );

    remainder
  }
}
