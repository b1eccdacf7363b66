use thiserror::Error;

/// Failures the allocator detects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
  /// `allocate` called with a size of zero or less.
  #[error("invalid allocation size {0}: size must be greater than 0")]
  InvalidSize(isize),

  /// The size cannot be aligned and given a header without overflowing.
  #[error("allocation size {0} overflows once aligned and given a header")]
  SizeOverflow(usize),

  /// The OS refused to map more memory.
  #[error("out of memory: failed to map {len} bytes")]
  OutOfMemory { len: usize },

  /// `release` called on a block that is already free.
  #[error("double release of {0:#x}")]
  DoubleRelease(usize),

  #[error("invalid configuration: {0}")]
  InvalidConfig(&'static str),
}
