//! Doubly linked list whose nodes live in a [`SlotArena`].
//!
//! Nodes are linked by [`SlotId`], so the handle returned from
//! [`push_front`](IntrusiveList::push_front) stays valid until the node is
//! removed and can be kept in an external index. The LRU policy uses this as
//! its recency list: head is the most recently used entry, tail the least.
//!
//! ```text
//!   head ─► [id_4] ◄──► [id_1] ◄──► [id_7] ◄── tail
//!            MRU                      LRU (evicted first)
//! ```
//!
//! `push_front`, `remove`, `move_to_front` and `pop_back` are O(1); iteration
//! is O(n).

use crate::ds::slot_arena::{SlotArena, SlotId};

#[derive(Debug)]
struct Link<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Arena-backed list with stable node handles.
#[derive(Debug)]
pub struct IntrusiveList<T> {
    nodes: SlotArena<Link<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handle of the head (most recently used) node.
    #[cfg(test)]
    pub(crate) fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Handle of the tail (least recently used) node.
    #[cfg(test)]
    pub(crate) fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.nodes.get(id).map(|link| &link.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|link| &mut link.value)
    }

    /// Links a new node in front of the current head.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.nodes.insert(Link {
            value,
            prev: None,
            next: None,
        });
        self.link_front(id);
        id
    }

    /// Unlinks `id` and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.unlink(id)?;
        self.nodes.remove(id).map(|link| link.value)
    }

    /// Unlinks and returns the tail value.
    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Relinks `id` at the head. Returns `false` if `id` is not in the list.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.nodes.contains(id) {
            return false;
        }
        if self.head != Some(id) {
            self.unlink(id);
            self.link_front(id);
        }
        true
    }

    /// Position of `id` counted from the head, O(n).
    pub fn position(&self, id: SlotId) -> Option<usize> {
        self.iter_ids().position(|candidate| candidate == id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Values from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter_ids().filter_map(|id| self.get(id))
    }

    /// Handles from head to tail.
    pub fn iter_ids(&self) -> IdIter<'_, T> {
        IdIter {
            list: self,
            cursor: self.head,
        }
    }

    fn unlink(&mut self, id: SlotId) -> Option<()> {
        let link = self.nodes.get_mut(id)?;
        let (prev, next) = (link.prev.take(), link.next.take());

        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(prev_link) => prev_link.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.nodes.get_mut(n)) {
            Some(next_link) => next_link.prev = prev,
            None => self.tail = prev,
        }
        Some(())
    }

    fn link_front(&mut self, id: SlotId) {
        let old_head = self.head;
        if let Some(link) = self.nodes.get_mut(id) {
            link.prev = None;
            link.next = old_head;
        }
        match old_head.and_then(|h| self.nodes.get_mut(h)) {
            Some(head_link) => head_link.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Walks the list and panics on a broken link, cycle or length mismatch.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none() && self.tail.is_none());
            assert_eq!(self.len(), 0);
            return;
        }

        let mut walked = 0usize;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let link = self.nodes.get(id).expect("dangling list link");
            assert_eq!(link.prev, prev, "back link mismatch at {id:?}");
            walked += 1;
            assert!(walked <= self.len(), "cycle in list");
            prev = Some(id);
            cursor = link.next;
        }
        assert_eq!(prev, self.tail);
        assert_eq!(walked, self.len());
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over node handles from head to tail.
pub struct IdIter<'a, T> {
    list: &'a IntrusiveList<T>,
    cursor: Option<SlotId>,
}

impl<T> Iterator for IdIter<'_, T> {
    type Item = SlotId;

    fn next(&mut self) -> Option<SlotId> {
        let id = self.cursor?;
        self.cursor = self.list.nodes.get(id)?.next;
        Some(id)
    }
}
