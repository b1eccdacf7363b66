/// Calculates the machine word alignment for the given size.
///
/// Every payload size the allocator records goes through this macro, which
/// keeps every block header on a word boundary.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use rfreelist::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::std::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `boundary`, which must be a
/// power of two.
///
/// ```rust
/// use rfreelist::align_to;
///
/// assert_eq!(align_to!(1, 4096), 4096);
/// assert_eq!(align_to!(8192, 4096), 8192);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $boundary:expr) => {
    ($value + $boundary - 1) & !($boundary - 1)
  };
}

/// Word-aligns `size`, returning `None` instead of wrapping.
pub(crate) fn checked_align(size: usize) -> Option<usize> {
  let word = std::mem::size_of::<usize>();
  size.checked_add(word - 1).map(|v| v & !(word - 1))
}
