//! First-in, first-out queue of pending operations, with removal from any position.
//!
//! Entries live in a generational arena and are linked to their neighbours by arena
//! [`Key`]s instead of references. Appending at the tail and unlinking any entry are both
//! O(1). A key that has already been removed stays invalid forever, even after its slot
//! is reused, so a late removal can never splice out somebody else's entry.

use generational_arena::{Arena, Index};

/// Stable handle to an entry of a [`Queue`].
pub(crate) type Key = Index;

pub(crate) struct Queue<T> {
    links: Arena<Link<T>>,
    head: Option<Key>,
    tail: Option<Key>,
}

struct Link<T> {
    item: T,
    prev: Option<Key>,
    next: Option<Key>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    pub(crate) fn new() -> Self {
        Self {
            links: Arena::new(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The oldest entry.
    pub(crate) fn front(&self) -> Option<&T> {
        self.head.map(|key| &self.links[key].item)
    }

    pub(crate) fn push_back(&mut self, item: T) -> Key {
        let key = self.links.insert(Link {
            item,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.links[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Unlinks the entry under `key` wherever it sits. Returns `None` if it is not
    /// (or no longer) in the queue.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let Link { item, prev, next } = self.links.remove(key)?;
        match prev {
            Some(prev) => self.links[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.links[next].prev = prev,
            None => self.tail = prev,
        }
        Some(item)
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            cursor: self.head,
        }
    }
}

pub(crate) struct Iter<'a, T> {
    queue: &'a Queue<T>,
    cursor: Option<Key>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let link = &self.queue.links[self.cursor?];
        self.cursor = link.next;
        Some(&link.item)
    }
}
