use crate::math::Index;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::sync::{Mutex, PoisonError};

/// Objects carrying their own global identifier.
pub trait Identifiable {
    fn id(&self) -> Index;
}

impl<T: Identifiable> Identifiable for Mutex<T> {
    fn id(&self) -> Index {
        self.lock().unwrap_or_else(PoisonError::into_inner).id()
    }
}

/// A registry of objects keyed by their global identifier.
///
/// Iteration follows insertion order, and `handler[i]` returns the `i`-th inserted
/// element still present.
#[derive(Clone, Debug)]
pub struct Handler<T> {
    items: IndexMap<Index, T>,
}

impl<T> Handler<T> {
    pub fn new() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts `item` under `id`. Returns `false`, leaving the handler unchanged, if
    /// `id` is already taken.
    pub fn insert(&mut self, id: Index, item: T) -> bool {
        match self.items.entry(id) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(item);
                true
            }
        }
    }

    /// Inserts `item` under its own identifier.
    pub fn push(&mut self, item: T) -> bool
    where
        T: Identifiable,
    {
        self.insert(item.id(), item)
    }

    /// Removes the element with the given id, preserving the order of the others.
    pub fn remove(&mut self, id: Index) -> bool {
        self.take(id).is_some()
    }

    pub fn take(&mut self, id: Index) -> Option<T> {
        self.items.shift_remove(&id)
    }

    pub fn contains(&self, id: Index) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: Index) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: Index) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = Index> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.values_mut()
    }

    pub fn for_each(&mut self, f: impl FnMut(&mut T)) {
        self.items.values_mut().for_each(f)
    }

    pub fn par_iter(&self) -> impl ParallelIterator<Item = &T>
    where
        T: Sync,
    {
        self.items.par_values()
    }

    #[inline(always)]
    pub fn par_for_each(&mut self, f: impl Fn(&mut T) + Sync + Send)
    where
        T: Send,
    {
        self.items.par_values_mut().for_each(f)
    }
}

impl<T> Default for Handler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<usize> for Handler<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.items[i]
    }
}

impl<T> std::ops::IndexMut<usize> for Handler<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.items[i]
    }
}

impl<'a, T> IntoIterator for &'a Handler<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, Index, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

#[cfg(test)]
mod test {
    use super::{Handler, Identifiable};
    use crate::math::Index;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        id: Index,
        value: f64,
    }

    impl Identifiable for Item {
        fn id(&self) -> Index {
            self.id
        }
    }

    #[test]
    fn insert_and_remove() {
        let mut handler = Handler::new();
        assert!(handler.push(Item { id: 0, value: 1.0 }));
        assert!(handler.insert(1, Item { id: 1, value: 2.0 }));
        assert!(handler.insert(7, Item { id: 7, value: 3.0 }));
        assert!(!handler.insert(7, Item { id: 7, value: 4.0 }));
        assert_eq!(handler.len(), 3);
        assert_eq!(handler.get(7).unwrap().value, 3.0);

        assert!(handler.remove(1));
        assert!(!handler.remove(1));
        assert!(!handler.contains(1));
        assert_eq!(handler.len(), 2);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut handler = Handler::new();
        for id in [5, 3, 9, 1] {
            handler.insert(id, Item { id, value: 0.0 });
        }
        handler.remove(3);

        let ids: Vec<_> = handler.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![5, 9, 1]);
        assert_eq!(handler.ids().collect::<Vec<_>>(), ids);
        assert_eq!(handler[0].id, 5);
        assert_eq!(handler[2].id, 1);
    }

    #[test]
    fn for_each_updates_every_element() {
        let mut handler = Handler::new();
        for id in 0..10 {
            handler.insert(id, Item { id, value: 0.0 });
        }

        handler.for_each(|item| item.value = item.id as f64 * 2.0);
        assert!(handler.iter().all(|item| item.value == item.id as f64 * 2.0));

        handler.par_for_each(|item| item.value += 1.0);
        assert!((&handler)
            .into_iter()
            .all(|item| item.value == item.id as f64 * 2.0 + 1.0));
    }
}
