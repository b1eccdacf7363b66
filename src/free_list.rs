use std::ptr;

use crate::{
  block::{Block, BlockState, HEADER_SIZE},
  split::{should_split, split},
};

/// A free block as seen from outside the lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlockInfo {
  /// Header address.
  pub address: usize,
  /// Payload bytes, header excluded.
  pub size: usize,
}

impl FreeBlockInfo {
  /// Address one past the payload.
  pub fn end(&self) -> usize {
    self.address + HEADER_SIZE + self.size
  }

  /// Whether `[start, start + len)` lies entirely inside this block.
  pub fn covers(
    &self,
    start: usize,
    len: usize,
  ) -> bool {
    start >= self.address && start + len <= self.end()
  }
}

/// Doubly linked list of free blocks, ordered by ascending address.
pub struct FreeList {
  head: *mut Block,
  len: usize,
}

impl FreeList {
  pub fn new() -> Self {
    Self {
      head: ptr::null_mut(),
      len: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Marks `block` free and links it in at its address-ordered position.
  ///
  /// # Safety
  ///
  /// `block` must be a valid header that is not currently on the list.
  pub unsafe fn insert(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      (*block).state = BlockState::Free;
      (*block).prev = ptr::null_mut();
      (*block).next = ptr::null_mut();

      if self.head.is_null() || block < self.head {
        if !self.head.is_null() {
          (*self.head).prev = block;
        }
        (*block).next = self.head;
        self.head = block;
      } else {
        let mut current = self.head;
        while !(*current).next.is_null() && (*current).next < block {
          current = (*current).next;
        }

        (*block).next = (*current).next;
        (*block).prev = current;
        if !(*current).next.is_null() {
          (*(*current).next).prev = block;
        }
        (*current).next = block;
      }

      self.len += 1;
    }
  }

  /// Unlinks `block` from the list. Its state is left untouched.
  ///
  /// # Safety
  ///
  /// `block` must currently be on this list.
  pub unsafe fn remove(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let prev = (*block).prev;
      let next = (*block).next;

      if prev.is_null() {
        self.head = next;
      } else {
        (*prev).next = next;
      }
      if !next.is_null() {
        (*next).prev = prev;
      }

      (*block).prev = ptr::null_mut();
      (*block).next = ptr::null_mut();
      self.len -= 1;
    }
  }

  /// First block, in address order, with at least `size` payload bytes.
  pub fn find_fit(
    &self,
    size: usize,
  ) -> Option<*mut Block> {
    self.iter().find(|&block| unsafe { (*block).size } >= size)
  }

  /// Removes the first fitting block, splits off any slack back onto the
  /// list, and returns the served block marked in use.
  ///
  /// # Safety
  ///
  /// Every block on the list must be a valid header. `size` must be word
  /// aligned.
  pub unsafe fn take_fit(
    &mut self,
    size: usize,
  ) -> Option<*mut Block> {
    let block = self.find_fit(size)?;

    unsafe {
      self.remove(block);

      if should_split((*block).size, size) {
        let remainder = split(block, size);
        self.insert(remainder);
      }

      (*block).state = BlockState::InUse;
    }

    log::trace!("reused free block {:?} for {} bytes", block, size);
    Some(block)
  }

  /// Merges every run of address-contiguous free blocks in one pass.
  ///
  /// A block that just absorbed its successor is checked again against its
  /// new successor, so runs of any length collapse.
  pub fn coalesce_adjacent(&mut self) {
    let mut current = self.head;

    unsafe {
      while !current.is_null() && !(*current).next.is_null() {
        let next = (*current).next;

        if next as usize == Block::end(current) {
          log::trace!("merging {:?} into {:?}", next, current);

          (*current).size += (*next).size + HEADER_SIZE;
          (*current).next = (*next).next;
          if !(*next).next.is_null() {
            (*(*next).next).prev = current;
          }
          self.len -= 1;
        } else {
          current = next;
        }
      }
    }
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      current: self.head,
      _list: self,
    }
  }

  pub fn snapshot(&self) -> Vec<FreeBlockInfo> {
    self
      .iter()
      .map(|block| FreeBlockInfo {
        address: block as usize,
        size: unsafe { (*block).size },
      })
      .collect()
  }

  /// Logs every entry at trace level.
  pub fn dump(&self) {
    if !log::log_enabled!(log::Level::Trace) {
      return;
    }

    log::trace!("free list: {} entries", self.len);
    for info in self.snapshot() {
      log::trace!("  {:#x}: {} bytes", info.address, info.size);
    }
  }
}

impl Default for FreeList {
  fn default() -> Self {
    Self::new()
  }
}

/// Head-to-tail traversal of a [`FreeList`].
pub struct Iter<'a> {
  current: *mut Block,
  _list: &'a FreeList,
}

impl Iterator for Iter<'_> {
  type Item = *mut Block;

  fn next(&mut self) -> Option<Self::Item> {
    if self.current.is_null() {
      return None;
    }

    let block = self.current;
    self.current = unsafe { (*block).next };
    Some(block)
  }
}
