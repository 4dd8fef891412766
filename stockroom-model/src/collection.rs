//! Ordered, id-unique record collections.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use stockroom_types::EntityId;

use crate::Record;

/// An ordered sequence of records of one projection type.
///
/// Ids are unique: collecting from an iterator keeps the first record seen
/// for each id, and [`Collection::insert`] replaces in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<E> {
    elements: Vec<E>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<E: Record> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.elements.iter()
    }

    pub fn first(&self) -> Option<&E> {
        self.elements.first()
    }

    pub fn get(&self, id: &EntityId) -> Option<&E> {
        self.elements.iter().find(|e| e.id() == *id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Ids in collection order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.elements.iter().map(Record::id).collect()
    }

    /// Adds a record, replacing any record with the same id in place.
    pub fn insert(&mut self, element: E) {
        let id = element.id();
        match self.elements.iter_mut().find(|e| e.id() == id) {
            Some(slot) => *slot = element,
            None => self.elements.push(element),
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<E> {
        let pos = self.elements.iter().position(|e| e.id() == *id)?;
        Some(self.elements.remove(pos))
    }

    /// Records matching `predicate`, in order.
    pub fn filter(&self, predicate: impl Fn(&E) -> bool) -> Self {
        Self {
            elements: self.elements.iter().filter(|e| predicate(e)).cloned().collect(),
        }
    }

    pub fn fmap<T>(&self, f: impl Fn(&E) -> T) -> Vec<T> {
        self.elements.iter().map(f).collect()
    }

    /// Distinct ids referenced by the records, in first-seen order.
    pub fn referenced_ids(&self, reference: impl Fn(&E) -> Option<EntityId>) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        self.elements
            .iter()
            .filter_map(reference)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Records whose reference equals `id`.
    pub fn filter_by_reference(&self, reference: impl Fn(&E) -> Option<EntityId>, id: EntityId) -> Self {
        self.filter(|e| reference(e) == Some(id))
    }

    /// Collects a to-one association of every record into its own collection.
    pub fn related<R: Record>(&self, association: impl Fn(&E) -> Option<&R>) -> Collection<R> {
        self.elements
            .iter()
            .filter_map(association)
            .cloned()
            .collect()
    }

    /// Merges a to-many association of every record into one collection.
    pub fn related_many<R: Record>(&self, association: impl Fn(&E) -> &Collection<R>) -> Collection<R> {
        self.elements
            .iter()
            .flat_map(|e| association(e).iter().cloned())
            .collect()
    }

    /// Reorders records to follow `order`. Records whose id is not in `order`
    /// keep their relative order after the listed ones.
    pub fn sort_by_ids(&mut self, order: &[EntityId]) {
        let rank: HashMap<EntityId, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, id)| (*id, pos))
            .collect();
        self.elements
            .sort_by_key(|e| rank.get(&e.id()).copied().unwrap_or(usize::MAX));
    }

    pub fn into_vec(self) -> Vec<E> {
        self.elements
    }
}

impl<E: Record> FromIterator<E> for Collection<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        Self {
            elements: iter.into_iter().filter(|e| seen.insert(e.id())).collect(),
        }
    }
}

impl<E> IntoIterator for Collection<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a Collection<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<E: Serialize> Serialize for Collection<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.elements.serialize(serializer)
    }
}

impl<'de, E: Record> Deserialize<'de> for Collection<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<E>::deserialize(deserializer)?.into_iter().collect())
    }
}
