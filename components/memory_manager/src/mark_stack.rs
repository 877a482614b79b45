//! Grey-object work list for marking.

use crossbeam_deque::{Injector, Steal, Worker};

use core_types::HeapRef;

/// Work list of grey objects.
///
/// Roots go through the injector; children discovered while tracing go on
/// the local deque. Popping drains local work first so tracing stays depth
/// first.
#[derive(Debug)]
pub struct MarkStack {
    local: Worker<HeapRef>,
    injector: Injector<HeapRef>,
    size: usize,
}

impl MarkStack {
    /// Creates an empty mark stack.
    pub fn new() -> Self {
        MarkStack {
            local: Worker::new_lifo(),
            injector: Injector::new(),
            size: 0,
        }
    }

    /// Pushes an object found while tracing.
    pub fn push(&mut self, addr: HeapRef) {
        self.local.push(addr);
        self.size += 1;
    }

    /// Pushes a root.
    pub fn push_root(&mut self, addr: HeapRef) {
        self.injector.push(addr);
        self.size += 1;
    }

    /// Pops the next grey object.
    pub fn pop(&mut self) -> Option<HeapRef> {
        if let Some(addr) = self.local.pop() {
            self.size -= 1;
            return Some(addr);
        }
        loop {
            match self.injector.steal() {
                Steal::Success(addr) => {
                    self.size -= 1;
                    return Some(addr);
                }
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    /// Returns true if no work remains.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of pending objects.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Drops all pending work.
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

impl Default for MarkStack {
    fn default() -> Self {
        Self::new()
    }
}
