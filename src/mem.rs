use std::alloc::System;

#[cfg(not(target_os = "windows"))]
use jemalloc_ctl::{epoch, stats};
#[cfg(not(target_os = "windows"))]
use jemallocator::Jemalloc;

/// Bytes the global allocator currently holds, 0 when unknown.
pub trait GetAlloc {
    fn get_alloc(&self) -> usize;
}

impl GetAlloc for System {
    fn get_alloc(&self) -> usize {
        0
    }
}

#[cfg(not(target_os = "windows"))]
impl GetAlloc for Jemalloc {
    fn get_alloc(&self) -> usize {
        // stats are cached until the epoch moves
        if epoch::advance().is_err() {
            return 0;
        }
        stats::active::read().unwrap_or(0)
    }
}

#[test]
fn test_system_alloc_unknown() {
    assert_eq!(System.get_alloc(), 0);
}
