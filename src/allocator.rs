use std::ptr::NonNull;

use parking_lot::Mutex;

use crate::{
  align::checked_align,
  block::{Block, BlockState, HEADER_SIZE},
  config::Config,
  error::AllocError,
  free_list::{FreeBlockInfo, FreeList},
  heap::{MmapPages, PageMapper, Span, grow},
};

/// Counters describing the heap at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
  /// Spans mapped so far.
  pub spans: usize,
  /// Bytes mapped across all spans.
  pub mapped_bytes: usize,
  /// Entries on the free list.
  pub free_blocks: usize,
  /// Payload bytes on the free list, headers excluded.
  pub free_bytes: usize,
}

/// State guarded by the allocator lock.
struct Heap {
  free_list: FreeList,
  spans: Vec<Span>,
}

// The raw pointers in `Heap` only ever refer to spans this heap mapped, and
// they are only touched with the lock held.
unsafe impl Send for Heap {}

/// First-fit free-list allocator over memory mapped from the OS.
///
/// Every call to [`Allocator::allocate`] and [`Allocator::release`] runs to
/// completion under a single lock, so the allocator can be shared freely
/// between threads.
///
/// ```rust
/// use rfreelist::Allocator;
///
/// let allocator = Allocator::new();
///
/// let ptr = allocator.allocate(48).unwrap();
/// unsafe {
///   ptr.as_ptr().write_bytes(0xAB, 48);
///   allocator.release(ptr.as_ptr());
/// }
///
/// assert!(allocator.allocate(0).is_none());
/// ```
pub struct Allocator<M: PageMapper = MmapPages> {
  heap: Mutex<Heap>,
  mapper: M,
  min_unit: usize,
}

impl Allocator {
  pub fn new() -> Self {
    let mapper = MmapPages::new();
    let min_unit = mapper.page_size() * crate::config::DEFAULT_MIN_UNIT_PAGES;

    Self::from_parts(mapper, min_unit)
  }

  pub fn with_config(config: Config) -> Result<Self, AllocError> {
    Self::with_mapper(MmapPages::new(), config)
  }
}

impl Default for Allocator {
  fn default() -> Self {
    Self::new()
  }
}

impl<M: PageMapper> Allocator<M> {
  pub fn with_mapper(
    mapper: M,
    config: Config,
  ) -> Result<Self, AllocError> {
    let min_unit = config.min_unit(mapper.page_size())?;
    Ok(Self::from_parts(mapper, min_unit))
  }

  fn from_parts(
    mapper: M,
    min_unit: usize,
  ) -> Self {
    log::debug!(
      "allocator ready: page size {}, min unit {} bytes, header {} bytes",
      mapper.page_size(),
      min_unit,
      HEADER_SIZE
    );

    Self {
      heap: Mutex::new(Heap {
        free_list: FreeList::new(),
        spans: Vec::new(),
      }),
      mapper,
      min_unit,
    }
  }

  pub fn page_size(&self) -> usize {
    self.mapper.page_size()
  }

  /// Smallest span this allocator maps, in bytes.
  pub fn min_unit(&self) -> usize {
    self.min_unit
  }

  /// Returns at least `size` usable bytes, or `None` if `size` is not
  /// positive or the OS refuses to map more memory. The cause is logged.
  ///
  /// The memory is not zeroed.
  pub fn allocate(
    &self,
    size: isize,
  ) -> Option<NonNull<u8>> {
    match self.try_allocate(size) {
      Ok(ptr) => Some(ptr),
      Err(err @ (AllocError::InvalidSize(_) | AllocError::SizeOverflow(_))) => {
        log::warn!("allocation rejected: {}", err);
        None
      }
      Err(err) => {
        log::error!("allocation failed: {}", err);
        None
      }
    }
  }

  /// Like [`Allocator::allocate`], but reports why the request failed.
  pub fn try_allocate(
    &self,
    size: isize,
  ) -> Result<NonNull<u8>, AllocError> {
    let size = payload_size(size)?;

    let mut guard = self.heap.lock();
    let heap = &mut *guard;

    let block = match unsafe { heap.free_list.take_fit(size) } {
      Some(block) => block,
      None => unsafe {
        grow(
          &self.mapper,
          &mut heap.free_list,
          &mut heap.spans,
          size,
          self.min_unit,
        )?
      },
    };

    unsafe {
      (*block).state = BlockState::InUse;
      log::trace!("allocated {} bytes at {:?}", (*block).size, block);
      Ok(NonNull::new_unchecked(Block::payload_of(block)))
    }
  }

  /// Hands `ptr` back to the allocator. Null is ignored; a double release is
  /// logged and leaves the heap untouched.
  ///
  /// # Safety
  ///
  /// `ptr` must be null or a pointer returned by this allocator that has not
  /// been reused since it was last released.
  pub unsafe fn release(
    &self,
    ptr: *mut u8,
  ) {
    if let Err(err) = unsafe { self.try_release(ptr) } {
      log::warn!("release rejected: {}", err);
    }
  }

  /// Like [`Allocator::release`], but reports a double release.
  ///
  /// # Safety
  ///
  /// Same contract as [`Allocator::release`].
  pub unsafe fn try_release(
    &self,
    ptr: *mut u8,
  ) -> Result<(), AllocError> {
    if ptr.is_null() {
      return Ok(());
    }

    let block = Block::header_of(ptr);
    let mut heap = self.heap.lock();

    unsafe {
      if Block::is_free(block) {
        return Err(AllocError::DoubleRelease(ptr as usize));
      }

      log::trace!("releasing {} bytes at {:?}", (*block).size, block);
      heap.free_list.insert(block);
    }

    heap.free_list.coalesce_adjacent();
    heap.free_list.dump();

    Ok(())
  }

  /// Free list contents in address order.
  pub fn free_blocks(&self) -> Vec<FreeBlockInfo> {
    self.heap.lock().free_list.snapshot()
  }

  pub fn free_len(&self) -> usize {
    self.heap.lock().free_list.len()
  }

  pub fn stats(&self) -> Stats {
    let heap = self.heap.lock();

    Stats {
      spans: heap.spans.len(),
      mapped_bytes: heap.spans.iter().map(|span| span.len).sum(),
      free_blocks: heap.free_list.len(),
      free_bytes: heap
        .free_list
        .iter()
        .map(|block| unsafe { (*block).size })
        .sum(),
    }
  }
}

impl<M: PageMapper> Drop for Allocator<M> {
  fn drop(&mut self) {
    let heap = self.heap.get_mut();

    for span in heap.spans.drain(..) {
      unsafe { self.mapper.unmap(span.base, span.len) };
    }
  }
}

/// Payload bytes to reserve for a request of `size`.
fn payload_size(size: isize) -> Result<usize, AllocError> {
  if size <= 0 {
    return Err(AllocError::InvalidSize(size));
  }

  let size = size as usize;
  checked_align(size)
    .filter(|aligned| {
      aligned
        .checked_add(HEADER_SIZE)
        .is_some_and(|total| total <= isize::MAX as usize)
    })
    .ok_or(AllocError::SizeOverflow(size))
}
