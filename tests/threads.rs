use std::{sync::Arc, thread};

use rfreelist::{Allocator, HEADER_SIZE};

fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Allocates every size in `sizes`, fills each block with `tag`, checks the
/// fill survived, then releases them all. Returns `(address, size)` pairs.
fn churn(
  allocator: &Allocator,
  sizes: impl Iterator<Item = usize>,
  tag: u8,
) -> Vec<(usize, usize)> {
  let mut blocks = Vec::new();

  for size in sizes {
    let ptr = allocator.allocate(size as isize).expect("allocation failed");
    unsafe { ptr.as_ptr().write_bytes(tag, size) };
    blocks.push((ptr.as_ptr() as usize, size));
  }

  for &(addr, size) in &blocks {
    let bytes = unsafe { std::slice::from_raw_parts(addr as *const u8, size) };
    assert!(bytes.iter().all(|&b| b == tag));
  }

  for &(addr, _) in &blocks {
    unsafe { allocator.release(addr as *mut u8) };
  }

  blocks
}

#[test]
fn two_threads_release_everything_back_to_the_free_list() {
  init_logger();
  let allocator = Arc::new(Allocator::new());

  let first = {
    let allocator = Arc::clone(&allocator);
    thread::spawn(move || churn(&allocator, (5..65).step_by(5), 0x11))
  };
  let second = {
    let allocator = Arc::clone(&allocator);
    thread::spawn(move || churn(&allocator, (65..125).step_by(5), 0x22))
  };

  let mut blocks = first.join().unwrap();
  blocks.extend(second.join().unwrap());
  assert_eq!(blocks.len(), 24);

  let free = allocator.free_blocks();
  for pair in free.windows(2) {
    assert!(pair[0].address < pair[1].address);
  }

  for &(addr, size) in &blocks {
    let header = addr - HEADER_SIZE;
    assert!(
      free.iter().any(|entry| entry.covers(header, HEADER_SIZE + size)),
      "block at {:#x} is not reachable from the free list",
      addr
    );
  }

  let stats = allocator.stats();
  assert_eq!(
    stats.free_bytes + stats.free_blocks * HEADER_SIZE,
    stats.mapped_bytes
  );
}

#[test]
fn concurrent_live_allocations_never_overlap() {
  init_logger();
  let allocator = Allocator::new();

  let live: Vec<Vec<(usize, usize)>> = thread::scope(|scope| {
    let handles: Vec<_> = (0..4u8)
      .map(|tag| {
        let allocator = &allocator;
        scope.spawn(move || {
          let mut held = Vec::new();

          for i in 0..200usize {
            let size = 16 + (i * 37 + tag as usize * 11) % 700;
            let ptr = allocator.allocate(size as isize).unwrap();
            unsafe { ptr.as_ptr().write_bytes(tag, size) };
            held.push((ptr.as_ptr() as usize, size));

            if i % 3 == 0 {
              let (addr, _) = held.swap_remove(held.len() / 2);
              unsafe { allocator.release(addr as *mut u8) };
            }
          }

          for &(addr, size) in &held {
            let bytes = unsafe { std::slice::from_raw_parts(addr as *const u8, size) };
            assert!(bytes.iter().all(|&b| b == tag));
          }

          held
        })
      })
      .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
  });

  let mut all: Vec<(usize, usize)> = live.iter().flatten().copied().collect();
  all.sort();
  for pair in all.windows(2) {
    assert!(
      pair[0].0 + pair[0].1 <= pair[1].0,
      "{:#x}+{} overlaps {:#x}",
      pair[0].0,
      pair[0].1,
      pair[1].0
    );
  }

  for (addr, _) in all {
    unsafe { allocator.release(addr as *mut u8) };
  }

  let stats = allocator.stats();
  assert_eq!(
    stats.free_bytes + stats.free_blocks * HEADER_SIZE,
    stats.mapped_bytes
  );
}
