//! # rfreelist - A First-Fit Free-List Allocator
//!
//! This crate provides a general-purpose **free-list allocator** that gets its
//! memory straight from the OS with `mmap(2)` and hands it out through two
//! calls: [`Allocator::allocate`] and [`Allocator::release`].
//!
//! ## Overview
//!
//! Every region of the heap, free or in use, starts with a block header.
//! Free blocks are threaded onto a doubly linked list kept in address order:
//!
//! ```text
//!   Free List (ascending addresses):
//!
//!   head
//!    │
//!    ▼
//!   ┌────────┬──────────┐   ┌────────┬───────┐   ┌────────┬──────────────┐
//!   │ header │   free   │◄─►│ header │ free  │◄─►│ header │     free     │
//!   └────────┴──────────┘   └────────┴───────┘   └────────┴──────────────┘
//!      0x1000                  0x1400               0x9000
//!
//!   In-use blocks sit between them, unlinked, until they are released.
//! ```
//!
//! Because the list is sorted by address, two free blocks can only be
//! neighbours in memory if they are neighbours on the list, which makes
//! merging a local check.
//!
//! ## Crate Structure
//!
//! ```text
//!   rfreelist
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── block      - Block header layout and header/payload mapping
//!   ├── split      - Carving a served block out of a larger free one
//!   ├── free_list  - Address-ordered free list, first fit, coalescing
//!   ├── heap       - Page mapping (PageMapper, MmapPages) and heap growth
//!   ├── config     - Minimum span size
//!   ├── error      - AllocError
//!   └── allocator  - Allocator facade
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rfreelist::Allocator;
//!
//! let allocator = Allocator::new();
//!
//! let ptr = allocator.allocate(64).expect("out of memory");
//!
//! unsafe {
//!     ptr.as_ptr().write_bytes(0x2A, 64);
//!     assert_eq!(*ptr.as_ptr(), 0x2A);
//!
//!     allocator.release(ptr.as_ptr());
//! }
//! ```
//!
//! ## How It Works
//!
//! `allocate` walks the free list and takes the first block big enough. If
//! it is much bigger than needed, the tail is split off and stays free:
//!
//! ```text
//!   ┌────────┬────────────────────────────────────────────────────┐
//!   │ header │                    free block                      │
//!   └────────┴────────────────────────────────────────────────────┘
//!                               │ split(48)
//!                               ▼
//!   ┌────────┬──────────┬────────┬────────────────────────────────┐
//!   │ header │ 48 bytes │ header │        free remainder          │
//!   └────────┴──────────┴────────┴────────────────────────────────┘
//!            ▲
//!            └── Pointer returned to user
//! ```
//!
//! When nothing fits, a new span is mapped. Small requests get a whole
//! minimum unit (three pages by default) so later requests can be served
//! from the leftover; requests at or above the unit get an exact span.
//!
//! `release` links the block back in at its address-ordered position and
//! then merges every run of touching free blocks:
//!
//! ```text
//!   ┌────┬──────┬────┬──────┐        ┌────┬──────────────────┐
//!   │ h  │ free │ h  │ free │  ───►  │ h  │       free       │
//!   └────┴──────┴────┴──────┘        └────┴──────────────────┘
//!          a           b                 a.size + h + b.size
//! ```
//!
//! ## Concurrency
//!
//! All heap state lives behind one `parking_lot::Mutex` owned by the
//! [`Allocator`]. Both calls hold it for their whole body, so an
//! `Allocator` can be shared across threads (for example in an `Arc` or a
//! scoped thread) without further synchronization.
//!
//! ## Limitations
//!
//! - **No size classes or per-thread caches**: one lock, one list
//! - **Linear scans**: insertion and first fit are O(n) in free blocks
//! - **Memory is kept**: spans are only unmapped when the allocator is dropped
//! - **Use after release is not detected**: only double release is
//! - **Unix-only**: Requires `libc` and `mmap`
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and installs no logger.
//! Rejected requests are logged at `warn`, mapping failures at `error`,
//! heap growth at `debug` and block-level events at `trace`.
//!
//! ## Safety
//!
//! `allocate` is safe; `release` is `unsafe` because it trusts the pointer
//! to come from the same allocator.

pub mod align;
mod allocator;
mod block;
mod config;
mod error;
mod free_list;
mod heap;
mod split;

pub use allocator::{Allocator, Stats};
pub use block::HEADER_SIZE;
pub use config::{Config, DEFAULT_MIN_UNIT_PAGES};
pub use error::AllocError;
pub use free_list::FreeBlockInfo;
pub use heap::{MmapPages, PageMapper};
