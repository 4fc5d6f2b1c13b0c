//! Local edit buffer for lists that are saved as a whole
//!
//! The admin edits services and categories in memory (duplicate, edit, remove)
//! and then commits the full list in one write.

use serde::{Deserialize, Serialize};

use crate::entities::{Category, Service};
use crate::error::{Result, StagingError};

/// An item that can live in a [`StagedList`]
pub trait Staged: Clone {
    fn staged_id(&self) -> &str;

    /// A copy under an id not in `taken`
    fn duplicated(&self, taken: &[&str]) -> Self;
}

impl Staged for Service {
    fn staged_id(&self) -> &str {
        &self.id
    }

    fn duplicated(&self, _taken: &[&str]) -> Self {
        self.duplicate()
    }
}

impl Staged for Category {
    fn staged_id(&self) -> &str {
        &self.id
    }

    fn duplicated(&self, taken: &[&str]) -> Self {
        self.duplicate(taken)
    }
}

/// One local edit, as sent by the back office when it saves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StagedEdit<T> {
    Duplicate { id: String },
    Remove { id: String },
    Upsert { item: T },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StagedList<T> {
    items: Vec<T>,
    dirty: bool,
}

impl<T: Staged> StagedList<T> {
    /// Start editing the list as last saved
    pub fn new(saved: Vec<T>) -> Self {
        Self {
            items: saved,
            dirty: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.staged_id() == id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.staged_id() == id)
            .ok_or_else(|| StagingError::UnknownId(id.to_string()).into())
    }

    fn taken(&self) -> Vec<&str> {
        self.items.iter().map(Staged::staged_id).collect()
    }

    /// Insert a copy right after the original and return it
    pub fn duplicate(&mut self, id: &str) -> Result<&T> {
        let index = self.position(id)?;
        let copy = self.items[index].duplicated(&self.taken());
        self.items.insert(index + 1, copy);
        self.dirty = true;
        Ok(&self.items[index + 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<T> {
        let index = self.position(id)?;
        self.dirty = true;
        Ok(self.items.remove(index))
    }

    /// Replace the item with the same id, or append a new one
    pub fn upsert(&mut self, item: T) {
        match self.position(item.staged_id()) {
            Ok(index) => self.items[index] = item,
            Err(_) => self.items.push(item),
        }
        self.dirty = true;
    }

    pub fn apply(&mut self, edit: StagedEdit<T>) -> Result<()> {
        match edit {
            StagedEdit::Duplicate { id } => self.duplicate(&id).map(|_| ()),
            StagedEdit::Remove { id } => self.remove(&id).map(|_| ()),
            StagedEdit::Upsert { item } => {
                self.upsert(item);
                Ok(())
            }
        }
    }

    /// The full list to write, checked for id collisions
    pub fn commit(&mut self) -> Result<Vec<T>> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let id = item.staged_id();
            if seen.contains(&id) {
                return Err(StagingError::DuplicateId(id.to_string()).into());
            }
            seen.push(id);
        }
        self.dirty = false;
        Ok(self.items.clone())
    }

    /// Drop local edits and start over from `saved`
    pub fn reset(&mut self, saved: Vec<T>) {
        self.items = saved;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ServiceCategory;

    fn categories() -> StagedList<Category> {
        StagedList::new(vec![Category::new("cars", "Cars"), Category::new("trips", "Trips")])
    }

    fn ids(list: &StagedList<Category>) -> Vec<&str> {
        list.items().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_duplicate_inserts_after_original() {
        let mut list = categories();
        let copy = list.duplicate("cars").unwrap();
        assert_eq!(copy.id, "cars-copy");
        assert_eq!(ids(&list), vec!["cars", "cars-copy", "trips"]);
        assert!(list.is_dirty());

        list.duplicate("cars").unwrap();
        assert_eq!(ids(&list), vec!["cars", "cars-copy-2", "cars-copy", "trips"]);
    }

    #[test]
    fn test_remove_then_commit() {
        let mut list = categories();
        list.remove("trips").unwrap();
        assert!(list.remove("trips").is_err());

        let saved = list.commit().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(!list.is_dirty());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut list = categories();
        list.upsert(Category {
            name: "Car hire".to_string(),
            ..Category::new("cars", "Cars")
        });
        list.upsert(Category::new("hotels", "Hotels"));
        assert_eq!(list.get("cars").unwrap().name, "Car hire");
        assert_eq!(ids(&list), vec!["cars", "trips", "hotels"]);
    }

    #[test]
    fn test_commit_rejects_colliding_ids() {
        let mut list = StagedList::new(vec![
            Category::new("cars", "Cars"),
            Category::new("cars", "Cars again"),
        ]);
        assert!(list.commit().is_err());
    }

    #[test]
    fn test_duplicated_service_gets_new_id() {
        let service = Service::new(ServiceCategory::Trips, "Desert", 200.0);
        let id = service.id.clone();
        let mut list = StagedList::new(vec![service]);
        let copy_id = list.duplicate(&id).unwrap().id.clone();
        assert_ne!(copy_id, id);
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_apply_edits_from_json() {
        let edits: Vec<StagedEdit<Category>> = serde_json::from_str(
            r#"[
                {"op": "duplicate", "id": "trips"},
                {"op": "remove", "id": "cars"}
            ]"#,
        )
        .unwrap();

        let mut list = categories();
        for edit in edits {
            list.apply(edit).unwrap();
        }
        assert_eq!(ids(&list), vec!["trips", "trips-copy"]);
        assert!(list.apply(StagedEdit::Remove { id: "cars".to_string() }).is_err());
    }

    #[test]
    fn test_reset_discards_edits() {
        let mut list = categories();
        list.remove("cars").unwrap();
        list.reset(vec![Category::new("cars", "Cars")]);
        assert!(!list.is_dirty());
        assert_eq!(ids(&list), vec!["cars"]);
    }
}
