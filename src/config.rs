use crate::error::AllocError;

/// Default minimum span, in pages.
pub const DEFAULT_MIN_UNIT_PAGES: usize = 3;

/// Tunables for an [`Allocator`](crate::Allocator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
  /// Smallest span requested from the OS, in pages. Requests below this are
  /// rounded up to a full unit and the slack becomes a free block.
  pub min_unit_pages: usize,
}

impl Config {
  pub fn new(min_unit_pages: usize) -> Self {
    Self { min_unit_pages }
  }

  pub fn validate(&self) -> Result<(), AllocError> {
    if self.min_unit_pages == 0 {
      return Err(AllocError::InvalidConfig("min_unit_pages must be at least 1"));
    }
    Ok(())
  }

  /// Minimum span in bytes for the given page size.
  pub fn min_unit(
    &self,
    page_size: usize,
  ) -> Result<usize, AllocError> {
    self.validate()?;
    self
      .min_unit_pages
      .checked_mul(page_size)
      .ok_or(AllocError::InvalidConfig("min_unit_pages * page size overflows"))
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      min_unit_pages: DEFAULT_MIN_UNIT_PAGES,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_is_three_pages() {
    let config = Config::default();
    assert_eq!(config.min_unit(4096).unwrap(), 3 * 4096);
  }

  #[test]
  fn test_rejects_zero_and_overflow() {
    assert!(matches!(
      Config::new(0).min_unit(4096),
      Err(AllocError::InvalidConfig(_))
    ));
    assert!(matches!(
      Config::new(usize::MAX).min_unit(4096),
      Err(AllocError::InvalidConfig(_))
    ));
  }
}
