//! Recency Order Module
//!
//! Tracks least-recently-used to most-recently-used order for cache eviction.

/// Stable handle to a key's position in a [`RecencyOrder`].
///
/// A slot stays valid until the key is unlinked; afterwards it may be reused.
pub type Slot = usize;

const NIL: Slot = usize::MAX;

#[derive(Debug)]
struct Link<K> {
    /// `None` while the slot sits on the free list
    key: Option<K>,
    /// Neighbour towards the oldest end
    prev: Slot,
    /// Neighbour towards the newest end
    next: Slot,
}

// == Recency Order ==
/// Doubly-linked recency list stored in an arena.
///
/// - Oldest end = least recently used, next eviction victim
/// - Newest end = most recently used
///
/// Every operation except iteration is O(1). Unlinked slots are recycled
/// through a free list so steady-state churn does not allocate.
#[derive(Debug)]
pub struct RecencyOrder<K> {
    links: Vec<Link<K>>,
    free: Vec<Slot>,
    oldest: Slot,
    newest: Slot,
    len: usize,
}

impl<K> Default for RecencyOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RecencyOrder<K> {
    // == Constructor ==
    /// Creates a new empty recency order.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty recency order with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            links: Vec::with_capacity(capacity),
            free: Vec::new(),
            oldest: NIL,
            newest: NIL,
            len: 0,
        }
    }

    // == Push Newest ==
    /// Links a new key at the most recently used end and returns its slot.
    pub fn push_newest(&mut self, key: K) -> Slot {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.links[slot].key = Some(key);
                slot
            }
            None => {
                self.links.push(Link {
                    key: Some(key),
                    prev: NIL,
                    next: NIL,
                });
                self.links.len() - 1
            }
        };
        self.attach_newest(slot);
        self.len += 1;
        slot
    }

    // == Promote ==
    /// Moves the key at `slot` to the most recently used end.
    ///
    /// Returns false if the slot is not linked.
    pub fn promote(&mut self, slot: Slot) -> bool {
        if !self.is_linked(slot) {
            return false;
        }
        if slot != self.newest {
            self.detach(slot);
            self.attach_newest(slot);
        }
        true
    }

    // == Unlink ==
    /// Removes the key at `slot` from the order and returns it.
    ///
    /// Unlinking a free or out-of-range slot is a no-op.
    pub fn unlink(&mut self, slot: Slot) -> Option<K> {
        if !self.is_linked(slot) {
            return None;
        }
        self.detach(slot);
        let key = self.links[slot].key.take();
        self.free.push(slot);
        self.len -= 1;
        key
    }

    // == Pop Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the order is empty.
    pub fn pop_oldest(&mut self) -> Option<K> {
        if self.oldest == NIL {
            return None;
        }
        self.unlink(self.oldest)
    }

    // == Peek ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.key(self.oldest)
    }

    /// Returns the most recently used key.
    pub fn peek_newest(&self) -> Option<&K> {
        self.key(self.newest)
    }

    /// Returns the key linked at `slot`.
    pub fn key(&self, slot: Slot) -> Option<&K> {
        self.links.get(slot).and_then(|link| link.key.as_ref())
    }

    // == Length ==
    /// Returns the number of linked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Unlinks every key and releases the arena.
    pub fn clear(&mut self) {
        self.links.clear();
        self.free.clear();
        self.oldest = NIL;
        self.newest = NIL;
        self.len = 0;
    }

    // == Iteration ==
    /// Iterates `(slot, key)` pairs from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            order: self,
            cursor: self.oldest,
            remaining: self.len,
        }
    }

    fn is_linked(&self, slot: Slot) -> bool {
        self.links
            .get(slot)
            .map(|link| link.key.is_some())
            .unwrap_or(false)
    }

    fn detach(&mut self, slot: Slot) {
        let (prev, next) = {
            let link = &self.links[slot];
            (link.prev, link.next)
        };
        if prev == NIL {
            self.oldest = next;
        } else {
            self.links[prev].next = next;
        }
        if next == NIL {
            self.newest = prev;
        } else {
            self.links[next].prev = prev;
        }
        let link = &mut self.links[slot];
        link.prev = NIL;
        link.next = NIL;
    }

    fn attach_newest(&mut self, slot: Slot) {
        let previous_newest = self.newest;
        {
            let link = &mut self.links[slot];
            link.prev = previous_newest;
            link.next = NIL;
        }
        if previous_newest == NIL {
            self.oldest = slot;
        } else {
            self.links[previous_newest].next = slot;
        }
        self.newest = slot;
    }
}

/// Iterator over a [`RecencyOrder`], oldest first.
pub struct Iter<'a, K> {
    order: &'a RecencyOrder<K>,
    cursor: Slot,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (Slot, &'a K);

    fn next(&mut self) -> Option<Self::Item> {
        // bounded by len so a broken link can never loop forever
        if self.remaining == 0 {
            return None;
        }
        let slot = self.cursor;
        let link = self.order.links.get(slot)?;
        self.cursor = link.next;
        self.remaining -= 1;
        link.key.as_ref().map(|key| (slot, key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
