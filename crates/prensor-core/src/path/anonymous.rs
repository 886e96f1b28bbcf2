use crate::path::Step;
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL: AnonymousIdAllocator = AnonymousIdAllocator::new();

///
/// AnonymousIdAllocator
///
/// Source of unique ids for synthetic (anonymous) fields.
///
/// One process-wide allocator exists (see [`global`](Self::global)); it is
/// created at compile time, incremented atomically and never reset, so ids
/// from uncoordinated threads never collide. Transforms that invent a field
/// take the allocator explicitly instead of reaching for hidden state.
///

#[derive(Debug)]
pub struct AnonymousIdAllocator {
    next: AtomicU64,
}

impl AnonymousIdAllocator {
    /// A fresh allocator starting at zero.
    ///
    /// Steps from two different allocators may collide; only use a private
    /// allocator for expression trees that never meet trees built from
    /// another one.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// The process-wide allocator.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate the next id as a path step.
    pub fn next_step(&self) -> Step {
        Step::Anonymous(self.next_id())
    }
}

impl Default for AnonymousIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
