//! Reference counted buffer handles addressed by opaque ids.
//!
//! Geometries never own GPU buffers directly. They hold a [`BufferId`] into a
//! [`BufferTable`], so two geometries can share one vertex buffer and the
//! buffer is only dropped once the last holder releases it.

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u32);

#[derive(Debug)]
struct Entry<B> {
    buffer: B,
    holders: usize,
}

#[derive(Debug)]
pub struct BufferTable<B> {
    entries: HashMap<BufferId, Entry<B>>,
    next_id: u32,
}

impl<B> BufferTable<B> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 0,
        }
    }

    /// Stores `buffer` with a single holder.
    pub fn insert(&mut self, buffer: B) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, Entry { buffer, holders: 1 });
        id
    }

    pub fn get(&self, id: BufferId) -> Option<&B> {
        self.entries.get(&id).map(|entry| &entry.buffer)
    }

    /// Registers one more holder of `id`.
    pub fn retain(&mut self, id: BufferId) -> Result<BufferId> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownBuffer(id))?;
        entry.holders += 1;
        Ok(id)
    }

    /// Drops one holder of `id`. The buffer is handed back once nobody holds it anymore.
    pub fn release(&mut self, id: BufferId) -> Option<B> {
        let entry = self.entries.get_mut(&id)?;
        entry.holders -= 1;
        if entry.holders > 0 {
            return None;
        }
        self.entries.remove(&id).map(|entry| entry.buffer)
    }

    pub fn holders(&self, id: BufferId) -> usize {
        self.entries.get(&id).map_or(0, |entry| entry.holders)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B> Default for BufferTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let mut table = BufferTable::new();
        let a = table.insert("a");
        let b = table.insert("b");
        assert_ne!(a, b);
        assert_eq!(table.get(a), Some(&"a"));
        assert_eq!(table.get(b), Some(&"b"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn shared_buffer_is_released_by_last_holder() {
        let mut table = BufferTable::new();
        let id = table.insert(vec![1u8, 2, 3]);
        table.retain(id).unwrap();
        assert_eq!(table.holders(id), 2);

        assert_eq!(table.release(id), None);
        assert_eq!(table.get(id), Some(&vec![1, 2, 3]));
        assert_eq!(table.release(id), Some(vec![1, 2, 3]));
        assert!(table.is_empty());
        assert_eq!(table.holders(id), 0);
    }

    #[test]
    fn released_ids_are_not_reused() {
        let mut table = BufferTable::new();
        let first = table.insert(0);
        table.release(first);
        let second = table.insert(1);
        assert_ne!(first, second);
        assert_eq!(table.get(first), None);
    }

    #[test]
    fn retain_unknown_id_fails() {
        let mut table: BufferTable<()> = BufferTable::new();
        let err = table.retain(BufferId(42)).unwrap_err();
        assert!(matches!(err, Error::UnknownBuffer(BufferId(42))));
        assert_eq!(table.release(BufferId(42)), None);
    }
}
