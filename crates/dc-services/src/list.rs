//! Local list state kept beside a backend collection

use dc_core::{EntityId, Identifiable, Page};
use dc_queries::{Columns, ListQuery};

/// The rows a screen shows.
///
/// Mutations mirror a successful backend call; a failed call leaves the
/// list untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Identifiable + Clone> EntityList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.has_id(id))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Replace everything after a reload
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Remove the first entry carrying `id`. Later duplicates stay.
    pub fn remove(&mut self, id: &EntityId) -> Option<T> {
        let index = self.items.iter().position(|item| item.has_id(id))?;
        Some(self.items.remove(index))
    }

    /// Replace the entry with the same id, or append
    pub fn upsert(&mut self, item: T) {
        let existing = item
            .id()
            .and_then(|id| self.items.iter().position(|i| i.has_id(id)));
        match existing {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T: Identifiable + Columns + Clone> EntityList<T> {
    pub fn query(&self, query: &ListQuery) -> Page<T> {
        query.apply(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_models::Project;

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: Some(EntityId::from(id)),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_remove_takes_exactly_one() {
        let mut list = EntityList::new(vec![
            project("p-1", "A"),
            project("p-2", "B"),
            project("p-2", "B again"),
        ]);

        let removed = list.remove(&EntityId::from("p-2")).unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(list.len(), 2);
        assert!(list.contains(&EntityId::from("p-2")));

        assert!(list.remove(&EntityId::from("p-9")).is_none());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_upsert() {
        let mut list = EntityList::new(vec![project("p-1", "A")]);
        list.upsert(project("p-1", "A renamed"));
        list.upsert(project("p-2", "B"));

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(&EntityId::from("p-1")).unwrap().name, "A renamed");

        list.upsert(Project::default());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_query() {
        let list = EntityList::new(vec![project("p-1", "Tower"), project("p-2", "Villa")]);
        let page = list.query(&ListQuery::new().search("vil"));
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Villa");
    }
}
