//! Live node sanitizer.
//!
//! Records which arena slots are currently handed out so the pool can tell
//! a live [`ContId`](super::ContId) apart from one that was already recycled
//! or that belongs to a pool generation discarded by `reset`.

/// Tracks the liveness of every node slot in the pool arena.
///
/// The number of live slots always equals the pool's free pointer.
#[derive(Debug, Default)]
pub struct LiveSlots {
    /// One flag per arena slot.
    live: Vec<bool>,
    /// Number of flags currently set.
    count: usize,
}

impl LiveSlots {
    /// Extends the tracker with `by` slots, all initially free.
    pub fn grow(&mut self, by: usize) {
        self.live.resize(self.live.len() + by, false);
    }

    /// Forgets every slot.
    pub fn clear(&mut self) {
        self.live.clear();
        self.count = 0;
    }

    /// Marks a slot as handed out.
    ///
    /// # Arguments
    /// * `index` - Arena index of the node being allocated
    pub fn register(&mut self, index: usize) {
        // The free list handed out a node that is still in use. This is a bug
        // in the pool bookkeeping, not something a caller can cause. So, kaboom!
        assert!(
            !self.live[index],
            "Node slot {} allocated while still live",
            index
        );
        self.live[index] = true;
        self.count += 1;
    }

    /// Marks a slot as returned to the free list.
    ///
    /// # Returns
    /// * `true` - The slot was live and is now free
    /// * `false` - The slot was not live (double recycle or stale id)
    pub fn deregister(&mut self, index: usize) -> bool {
        match self.live.get_mut(index) {
            Some(flag) if *flag => {
                *flag = false;
                self.count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Checks whether a slot is currently handed out.
    pub fn contains(&self, index: usize) -> bool {
        self.live.get(index).copied().unwrap_or(false)
    }

    /// Number of live slots.
    pub fn count(&self) -> usize {
        self.count
    }
}
