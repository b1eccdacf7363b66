use std::{mem, ptr};

/// Allocation state stored in every header.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
  Free = 1,
  InUse = 0,
}

/// Metadata prefixed to every region of the heap, free or in use.
///
/// `prev` and `next` link the block into the free list and carry no meaning
/// while the block is in use.
#[repr(C)]
pub struct Block {
  pub size: usize,
  pub state: BlockState,
  pub prev: *mut Block,
  pub next: *mut Block,
}

pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(HEADER_SIZE % mem::size_of::<usize>() == 0);

impl Block {
  pub fn new(
    size: usize,
    state: BlockState,
  ) -> Self {
    Self {
      size,
      state,
      prev: ptr::null_mut(),
      next: ptr::null_mut(),
    }
  }

  /// Writes a fresh unlinked header at `at` and returns it.
  ///
  /// # Safety
  ///
  /// `at` must be word aligned and valid for `HEADER_SIZE` bytes of writes.
  pub unsafe fn write(
    at: *mut u8,
    size: usize,
    state: BlockState,
  ) -> *mut Block {
    let block = at as *mut Block;
    unsafe { block.write(Block::new(size, state)) };
    block
  }

  /// Header of the block whose payload starts at `payload`.
  pub fn header_of(payload: *mut u8) -> *mut Block {
    payload.wrapping_sub(HEADER_SIZE) as *mut Block
  }

  /// First byte of `block`'s payload.
  pub fn payload_of(block: *mut Block) -> *mut u8 {
    (block as *mut u8).wrapping_add(HEADER_SIZE)
  }

  /// Reads the state byte without trusting it to be a valid [`BlockState`].
  ///
  /// # Safety
  ///
  /// `block` must be readable for `HEADER_SIZE` bytes.
  pub unsafe fn is_free(block: *mut Block) -> bool {
    let state = unsafe { ptr::addr_of!((*block).state).cast::<u8>().read() };
    state == BlockState::Free as u8
  }

  /// Address one past the last payload byte of `block`.
  ///
  /// # Safety
  ///
  /// `block` must point to an initialized header.
  pub unsafe fn end(block: *mut Block) -> usize {
    unsafe { block as usize + HEADER_SIZE + (*block).size }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_payload_mapping() {
    let mut storage = [0usize; 16];
    let base = storage.as_mut_ptr() as *mut u8;

    unsafe {
      let block = Block::write(base, 64, BlockState::InUse);
      let payload = Block::payload_of(block);

      assert_eq!(payload as usize - block as usize, HEADER_SIZE);
      assert_eq!(Block::header_of(payload), block);
      assert_eq!(Block::end(block), base as usize + HEADER_SIZE + 64);
      assert!((*block).prev.is_null());
      assert!((*block).next.is_null());
      assert_eq!((*block).state, BlockState::InUse);
    }
  }

  #[test]
  fn test_header_is_word_aligned() {
    assert_eq!(HEADER_SIZE % mem::align_of::<Block>(), 0);
    assert_eq!(mem::align_of::<Block>(), mem::size_of::<usize>());
  }
}
