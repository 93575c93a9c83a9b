//! A computed value together with its validity flag.

/// Lazily recomputed value.
///
/// The value is recomputed on the next [`get_or_update`](Self::get_or_update)
/// after [`invalidate`](Self::invalidate). A fresh `Cached` starts out dirty.
/// The number of recomputations is kept so callers can verify that nothing
/// was recomputed needlessly.
#[derive(Clone, Debug)]
pub struct Cached<T> {
    value: Option<T>,
    dirty: bool,
    recomputations: u64,
}

impl<T> Cached<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            dirty: true,
            recomputations: 0,
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Returns the last computed value, even when it is stale.
    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_or_update(&mut self, compute: impl FnOnce() -> T) -> &T {
        if self.dirty || self.value.is_none() {
            self.dirty = false;
            self.recomputations += 1;
            return self.value.insert(compute());
        }
        self.value.get_or_insert_with(compute)
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}
