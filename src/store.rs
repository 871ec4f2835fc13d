// Todo store: owns the canonical order, persists and notifies on every commit

use crate::models::{Clock, IdGenerator, TodoId, TodoItem};
use crate::reducer::{self, Action};
use crate::storage::Storage;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Why the canonical order changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    Hydrate,
    Add,
    Delete,
    Check,
    Edit,
    Load,
    Reorder,
}

/// Receives the new canonical order after every commit
pub trait Subscriber {
    fn on_change(&mut self, items: &[TodoItem], cause: ChangeCause);
}

impl<F> Subscriber for F
where
    F: FnMut(&[TodoItem], ChangeCause),
{
    fn on_change(&mut self, items: &[TodoItem], cause: ChangeCause) {
        self(items, cause)
    }
}

/// Owner of the canonical todo order
///
/// Every command that changes the order is a commit: the whole list is saved through the
/// storage backend and subscribers are notified. Commands that leave the order as it was
/// (absent ids, blank text) neither save nor notify.
pub struct TodoStore {
    items: Vec<TodoItem>,
    ids: IdGenerator,
    storage: Box<dyn Storage>,
    subscribers: Vec<Box<dyn Subscriber>>,
    hydrated: bool,
}

impl TodoStore {
    /// Create an empty store on top of `storage`; call [`TodoStore::hydrate`] to load it
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self::with_ids(storage, IdGenerator::default())
    }

    pub fn with_clock(storage: impl Storage + 'static, clock: impl Clock + 'static) -> Self {
        Self::with_ids(storage, IdGenerator::new(Box::new(clock)))
    }

    fn with_ids(storage: impl Storage + 'static, ids: IdGenerator) -> Self {
        Self {
            items: Vec::new(),
            ids,
            storage: Box::new(storage),
            subscribers: Vec::new(),
            hydrated: false,
        }
    }

    /// Create a store and hydrate it from `storage`
    pub fn open(storage: impl Storage + 'static) -> Self {
        let mut store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Register a subscriber; it is called after every commit
    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// The canonical order
    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|todo| todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Load the persisted list, once
    ///
    /// A failed or empty load leaves the store empty. Returns the number of items loaded.
    pub fn hydrate(&mut self) -> usize {
        if self.hydrated {
            debug!("Store already hydrated, ignoring");
            return self.items.len();
        }
        self.hydrated = true;

        let loaded = match self.storage.load() {
            Ok(Some(items)) => items,
            Ok(None) => {
                info!("No saved todos, starting empty");
                return 0;
            }
            Err(e) => {
                warn!(error = ?e, "Failed to load saved todos, starting empty");
                return 0;
            }
        };

        let count = loaded.len();
        let items = dedup_ids(loaded);
        let changed = items.len() != count;

        for item in &items {
            self.ids.observe(item.id);
        }
        self.items = items;
        info!(count = self.items.len(), "Hydrated todo store");

        // Identical data is not written back; a deduplicated list is
        if changed {
            self.persist();
        }
        self.notify(ChangeCause::Hydrate);
        self.items.len()
    }

    /// Append a new incomplete item
    ///
    /// Blank or whitespace-only text is rejected: nothing is added and `None` is returned.
    pub fn add(&mut self, text: &str) -> Option<TodoId> {
        if text.trim().is_empty() {
            debug!("Rejected blank todo");
            return None;
        }

        let Some(id) = self.ids.next_id() else {
            warn!("No ids left above the largest stored id, todo not added");
            return None;
        };
        self.commit(Action::Add(TodoItem::new(id, text)), ChangeCause::Add);
        Some(id)
    }

    /// Remove the item with `id`; no-op if absent
    pub fn delete(&mut self, id: TodoId) -> bool {
        self.commit(Action::Delete(id), ChangeCause::Delete)
    }

    /// Toggle `completed` on the item with `id`; no-op if absent
    pub fn check(&mut self, id: TodoId) -> bool {
        self.commit(Action::Check(id), ChangeCause::Check)
    }

    /// Replace the text of the item with `id`; no-op if absent
    ///
    /// The text is not validated here; callers gate blank edits.
    pub fn edit(&mut self, id: TodoId, text: &str) -> bool {
        self.commit(
            Action::Edit {
                id,
                text: text.to_string(),
            },
            ChangeCause::Edit,
        )
    }

    /// Replace the whole canonical order
    pub fn load(&mut self, items: Vec<TodoItem>) -> bool {
        self.load_as(items, ChangeCause::Load)
    }

    /// Replace the whole canonical order, reporting `cause` to subscribers
    pub fn load_as(&mut self, items: Vec<TodoItem>, cause: ChangeCause) -> bool {
        let items = dedup_ids(items);
        for item in &items {
            self.ids.observe(item.id);
        }
        self.commit(Action::Load(items), cause)
    }

    /// Delete every completed item in a single commit
    pub fn clear_completed(&mut self) -> usize {
        let remaining: Vec<TodoItem> = self.items.iter().filter(|todo| !todo.completed).cloned().collect();
        let removed = self.items.len() - remaining.len();
        self.load_as(remaining, ChangeCause::Delete);
        removed
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn commit(&mut self, action: Action, cause: ChangeCause) -> bool {
        let next = reducer::reduce(&self.items, action);
        if next == self.items {
            debug!(?cause, "Command left the order unchanged");
            return false;
        }

        self.items = next;
        debug!(?cause, count = self.items.len(), "Committed");
        self.persist();
        self.notify(cause);
        true
    }

    // Save failures are logged and otherwise ignored: the in-memory order stays authoritative
    // and the next commit tries again with the full list.
    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.items) {
            warn!(error = ?e, count = self.items.len(), "Failed to save todos, changes are only in memory");
        }
    }

    fn notify(&mut self, cause: ChangeCause) {
        for subscriber in &mut self.subscribers {
            subscriber.on_change(&self.items, cause);
        }
    }
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore")
            .field("items", &self.items)
            .field("ids", &self.ids)
            .field("subscribers", &self.subscribers.len())
            .field("hydrated", &self.hydrated)
            .finish()
    }
}

/// Keep the first occurrence of each id
fn dedup_ids(items: Vec<TodoItem>) -> Vec<TodoItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert(item.id);
            if !fresh {
                warn!(id = item.id, "Dropping todo with duplicate id");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterMode, apply};
    use crate::storage::{JsonlStorage, MemoryStorage};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0
        }
    }

    fn texts(items: &[TodoItem]) -> Vec<&str> {
        items.iter().map(|t| t.text.as_str()).collect()
    }

    fn recorder(store: &mut TodoStore) -> Rc<RefCell<Vec<ChangeCause>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |_: &[TodoItem], cause: ChangeCause| sink.borrow_mut().push(cause));
        seen
    }

    #[test]
    fn test_add_appends_incomplete() {
        let mut store = TodoStore::new(MemoryStorage::new());
        let a = store.add("buy milk").unwrap();
        let b = store.add("call mom").unwrap();

        assert_eq!(texts(store.items()), vec!["buy milk", "call mom"]);
        assert_ne!(a, b);
        assert!(!store.get(a).unwrap().completed);
    }

    #[test]
    fn test_ids_unique_with_frozen_clock() {
        let mut store = TodoStore::with_clock(MemoryStorage::new(), FixedClock(1_700_000_000_000));
        let ids: Vec<TodoId> = (0..20).filter_map(|i| store.add(&format!("item {}", i))).collect();

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = TodoStore::with_clock(MemoryStorage::new(), FixedClock(100));
        let a = store.add("a").unwrap();
        store.delete(a);
        let b = store.add("b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_blank_add_rejected() {
        let storage = MemoryStorage::new();
        let mut store = TodoStore::new(storage.clone());
        let seen = recorder(&mut store);

        assert!(store.add("").is_none());
        assert!(store.add("   ").is_none());
        assert!(store.add("\t\n").is_none());

        assert!(store.is_empty());
        assert!(seen.borrow().is_empty());
        assert!(storage.raw().is_none());
    }

    #[test]
    fn test_absent_id_is_noop() {
        let storage = MemoryStorage::new();
        let mut store = TodoStore::new(storage.clone());
        store.add("a");
        store.add("b");
        let before = store.items().to_vec();
        let saved = storage.raw();
        let seen = recorder(&mut store);

        assert!(!store.delete(42));
        assert!(!store.check(42));
        assert!(!store.edit(42, "x"));

        assert_eq!(store.items(), before.as_slice());
        assert_eq!(storage.raw(), saved);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_every_commit_saves() {
        let storage = MemoryStorage::new();
        let mut store = TodoStore::new(storage.clone());

        let id = store.add("buy milk").unwrap();
        assert_eq!(storage.load().unwrap().unwrap().len(), 1);

        store.check(id);
        assert!(storage.load().unwrap().unwrap()[0].completed);

        store.edit(id, "buy oat milk");
        assert_eq!(storage.load().unwrap().unwrap()[0].text, "buy oat milk");

        store.delete(id);
        assert!(storage.load().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_subscribers_see_causes() {
        let mut store = TodoStore::new(MemoryStorage::new());
        let seen = recorder(&mut store);

        let id = store.add("a").unwrap();
        store.check(id);
        store.edit(id, "b");
        store.load(vec![]);

        assert_eq!(
            *seen.borrow(),
            vec![ChangeCause::Add, ChangeCause::Check, ChangeCause::Edit, ChangeCause::Load]
        );
    }

    #[test]
    fn test_save_failure_keeps_mutation() {
        let storage = MemoryStorage::new();
        storage.set_fail_saves(true);
        let mut store = TodoStore::new(storage.clone());

        store.add("kept in memory").unwrap();
        assert_eq!(store.len(), 1);
        assert!(storage.raw().is_none());

        // next commit writes the full list once storage recovers
        storage.set_fail_saves(false);
        store.add("second").unwrap();
        assert_eq!(storage.load().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_hydrate_round_trip() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = TodoStore::new(JsonlStorage::open(temp.path()).unwrap());
            store.add("buy milk");
            let id = store.add("call mom").unwrap();
            store.check(id);
        }

        let store = TodoStore::open(JsonlStorage::open(temp.path()).unwrap());
        assert_eq!(texts(store.items()), vec!["buy milk", "call mom"]);
        assert!(store.items()[1].completed);
    }

    #[test]
    fn test_hydrate_does_not_write_back() {
        let storage = MemoryStorage::new();
        let raw = "{\"id\":1,\"text\":\"a\",\"completed\":false}\n   \n";
        storage.set_raw(raw);

        let mut store = TodoStore::new(storage.clone());
        let seen = recorder(&mut store);
        assert_eq!(store.hydrate(), 1);

        assert_eq!(storage.raw().unwrap(), raw);
        assert_eq!(*seen.borrow(), vec![ChangeCause::Hydrate]);

        // only once
        storage.set_raw("");
        assert_eq!(store.hydrate(), 1);
    }

    #[test]
    fn test_hydrate_drops_duplicate_ids() {
        let storage = MemoryStorage::new();
        storage.set_raw(
            "{\"id\":1,\"text\":\"first\",\"completed\":false}\n{\"id\":1,\"text\":\"dup\",\"completed\":true}\n",
        );

        let store = TodoStore::open(storage.clone());
        assert_eq!(texts(store.items()), vec!["first"]);
        assert_eq!(storage.load().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_hydrate_seeds_ids() {
        let storage = MemoryStorage::new();
        storage.set_raw("{\"id\":5000,\"text\":\"old\",\"completed\":false}\n");

        let mut store = TodoStore::with_clock(storage, FixedClock(10));
        store.hydrate();
        assert_eq!(store.add("new"), Some(5001));
    }

    #[test]
    fn test_add_after_max_stored_id_is_rejected() {
        let storage = MemoryStorage::new();
        storage.set_raw(format!("{{\"id\":{},\"text\":\"last\",\"completed\":false}}\n", i64::MAX));

        let mut store = TodoStore::open(storage.clone());
        assert_eq!(store.len(), 1);

        assert_eq!(store.add("new"), None);
        assert_eq!(texts(store.items()), vec!["last"]);
        assert_eq!(storage.load().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let storage = MemoryStorage::new();
        storage.set_raw("not json at all\n");

        let store = TodoStore::open(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_then_filter_scenario() {
        let mut store = TodoStore::new(MemoryStorage::new());
        store.add("buy milk");
        let id = store.add("call mom").unwrap();
        store.check(id);

        assert_eq!(texts(&apply(store.items(), &FilterMode::Completed)), vec!["call mom"]);
        assert_eq!(texts(&apply(store.items(), &FilterMode::Incomplete)), vec!["buy milk"]);
    }

    #[test]
    fn test_clear_completed() {
        let mut store = TodoStore::new(MemoryStorage::new());
        let a = store.add("a").unwrap();
        store.add("b");
        let c = store.add("c").unwrap();
        store.check(a);
        store.check(c);

        assert_eq!(store.clear_completed(), 2);
        assert_eq!(texts(store.items()), vec!["b"]);
        assert_eq!(store.clear_completed(), 0);
    }
}
