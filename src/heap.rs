use std::ptr::{self, NonNull};

use crate::{
  align_to,
  block::{Block, BlockState, HEADER_SIZE},
  error::AllocError,
  free_list::FreeList,
  split::{should_split, split},
};

/// Source of raw page-aligned memory.
pub trait PageMapper {
  fn page_size(&self) -> usize;

  /// Maps `len` bytes of readable, writable memory.
  ///
  /// # Safety
  ///
  /// `len` must be non-zero.
  unsafe fn map(
    &self,
    len: usize,
  ) -> Option<NonNull<u8>>;

  /// Returns a span obtained from [`PageMapper::map`].
  ///
  /// # Safety
  ///
  /// `ptr` and `len` must describe a span previously returned by `map`, and
  /// nothing may touch it afterwards.
  unsafe fn unmap(
    &self,
    ptr: NonNull<u8>,
    len: usize,
  );
}

/// Anonymous private mappings from `mmap(2)`.
#[derive(Clone, Copy, Debug)]
pub struct MmapPages {
  page_size: usize,
}

impl MmapPages {
  pub fn new() -> Self {
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let page_size = if page_size > 0 { page_size as usize } else { 4096 };

    Self { page_size }
  }
}

impl Default for MmapPages {
  fn default() -> Self {
    Self::new()
  }
}

impl PageMapper for MmapPages {
  fn page_size(&self) -> usize {
    self.page_size
  }

  unsafe fn map(
    &self,
    len: usize,
  ) -> Option<NonNull<u8>> {
    let address = unsafe {
      libc::mmap(
        ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == libc::MAP_FAILED {
      return None;
    }

    NonNull::new(address as *mut u8)
  }

  unsafe fn unmap(
    &self,
    ptr: NonNull<u8>,
    len: usize,
  ) {
    if unsafe { libc::munmap(ptr.as_ptr().cast(), len) } != 0 {
      log::warn!("munmap of {:?} ({} bytes) failed", ptr, len);
    }
  }
}

/// Bytes to map for a block of `total` bytes, header included.
///
/// Anything smaller than `min_unit` gets a whole `min_unit` span; larger
/// requests are mapped exactly.
pub fn span_len(
  total: usize,
  min_unit: usize,
) -> usize {
  if total < min_unit { min_unit } else { total }
}

/// A region obtained from a [`PageMapper`].
#[derive(Clone, Copy, Debug)]
pub struct Span {
  pub base: NonNull<u8>,
  pub len: usize,
}

/// Maps a new span able to hold `size` payload bytes, returns its first
/// block marked in use and puts any slack on `free_list`.
///
/// Nothing is modified when the mapping fails.
///
/// # Safety
///
/// `size` must be word aligned and `size + HEADER_SIZE` must not overflow.
pub unsafe fn grow<M: PageMapper>(
  mapper: &M,
  free_list: &mut FreeList,
  spans: &mut Vec<Span>,
  size: usize,
  min_unit: usize,
) -> Result<*mut Block, AllocError> {
  let total = size + HEADER_SIZE;
  let len = span_len(total, min_unit);

  let base = unsafe { mapper.map(len) }.ok_or(AllocError::OutOfMemory { len })?;
  spans.push(Span { base, len });

  log::debug!(
    "mapped span {:?} of {} bytes ({} pages) for {} bytes",
    base,
    len,
    align_to!(len, mapper.page_size()) / mapper.page_size(),
    size
  );

  unsafe {
    let block = Block::write(base.as_ptr(), len - HEADER_SIZE, BlockState::InUse);

    if should_split((*block).size, size) {
      let remainder = split(block, size);
      free_list.insert(remainder);
    }

    Ok(block)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_span_len_policy() {
    let unit = 3 * 4096;

    assert_eq!(span_len(HEADER_SIZE + 8, unit), unit);
    assert_eq!(span_len(unit - 1, unit), unit);
    assert_eq!(span_len(unit, unit), unit);
    assert_eq!(span_len(unit + 8, unit), unit + 8);
  }

  #[test]
  fn test_mmap_pages_round_trip() {
    let mapper = MmapPages::new();
    assert!(mapper.page_size().is_power_of_two());

    unsafe {
      let span = mapper.map(mapper.page_size()).unwrap();
      span.as_ptr().write_bytes(0x5A, mapper.page_size());
      assert_eq!(*span.as_ptr().add(mapper.page_size() - 1), 0x5A);
      mapper.unmap(span, mapper.page_size());
    }
  }

  #[test]
  fn test_grow_small_request_leaves_remainder() {
    let mapper = MmapPages::new();
    let unit = 3 * mapper.page_size();
    let mut list = FreeList::new();
    let mut spans = Vec::new();

    unsafe {
      let block = grow(&mapper, &mut list, &mut spans, 48, unit).unwrap();

      assert_eq!((*block).size, 48);
      assert_eq!((*block).state, BlockState::InUse);
      assert_eq!(block as usize % mapper.page_size(), 0);

      let free = list.snapshot();
      assert_eq!(free.len(), 1);
      assert_eq!(free[0].address, Block::end(block));
      assert_eq!(free[0].end(), block as usize + unit);

      for span in spans {
        mapper.unmap(span.base, span.len);
      }
    }
  }

  #[test]
  fn test_grow_large_request_is_exact() {
    let mapper = MmapPages::new();
    let unit = 3 * mapper.page_size();
    let size = 4 * mapper.page_size();
    let mut list = FreeList::new();
    let mut spans = Vec::new();

    unsafe {
      let block = grow(&mapper, &mut list, &mut spans, size, unit).unwrap();
      assert_eq!((*block).size, size);
      assert_eq!(list.len(), 0);
      assert_eq!(spans[0].len, size + HEADER_SIZE);

      for span in spans {
        mapper.unmap(span.base, span.len);
      }
    }
  }
}
