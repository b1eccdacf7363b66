use std::{sync::Arc, thread};

use rfreelist::Allocator;

/// Allocates each size in `sizes`, then releases them in order.
fn worker(
  name: &str,
  allocator: &Allocator,
  sizes: impl Iterator<Item = isize>,
) {
  println!("Inside {}", name);

  let blocks: Vec<_> = sizes.filter_map(|size| allocator.allocate(size)).collect();
  println!("[{}] allocated {} blocks", name, blocks.len());

  for ptr in blocks {
    unsafe { allocator.release(ptr.as_ptr()) };
  }

  println!("-----{} Done----", name);
}

fn main() {
  // RUST_LOG=trace shows every split, merge and free-list dump.
  env_logger::init();

  let allocator = Arc::new(Allocator::new());

  // --------------------------------------------------------------------
  // 1) Rejected requests: both are logged and return None.
  // --------------------------------------------------------------------
  assert!(allocator.allocate(-1).is_none());
  assert!(allocator.allocate(0).is_none());

  // --------------------------------------------------------------------
  // 2) Allocate 48 bytes, write a pattern, release it, then ask for less.
  // --------------------------------------------------------------------
  let first = allocator.allocate(48).expect("out of memory");
  unsafe {
    first.as_ptr().write_bytes(0xAB, 48);
    allocator.release(first.as_ptr());
  }
  let second = allocator.allocate(40).expect("out of memory");
  println!(
    "[2] reused the released block? {}",
    if first == second { "yes" } else { "no" }
  );

  // --------------------------------------------------------------------
  // 3) A double release is reported and ignored.
  // --------------------------------------------------------------------
  unsafe {
    allocator.release(second.as_ptr());
    allocator.release(second.as_ptr());
  }

  // --------------------------------------------------------------------
  // 4) Two threads, twelve allocations each.
  // --------------------------------------------------------------------
  let handles: Vec<_> = [("thread 1", 5isize), ("thread 2", 65)]
    .into_iter()
    .map(|(name, start)| {
      let allocator = Arc::clone(&allocator);
      thread::spawn(move || worker(name, &allocator, (start..start + 60).step_by(5)))
    })
    .collect();

  for handle in handles {
    handle.join().expect("worker panicked");
  }

  let stats = allocator.stats();
  println!(
    "\n{} spans, {} bytes mapped, {} free blocks holding {} bytes",
    stats.spans, stats.mapped_bytes, stats.free_blocks, stats.free_bytes
  );
  for block in allocator.free_blocks() {
    println!("  free {:#x}: {} bytes", block.address, block.size);
  }
}
