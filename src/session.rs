// Session: the single state object behind the view layer

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::filter::{FilterEngine, FilterMode};
use crate::models::{TodoId, TodoItem};
use crate::reorder::ReorderController;
use crate::storage::{JsonlStorage, STORE_DIR, Storage};
use crate::store::{ChangeCause, Subscriber, TodoStore};
use eyre::Result;
use std::cell::{Ref, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;
use tracing::debug;

/// Longest text the edit dialog accepts, in characters
pub const MAX_EDIT_CHARS: usize = 100;

/// Item currently open in the edit dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub id: TodoId,
    pub text: String,
}

/// Owns the store together with every piece of view state: filter mode, derived view,
/// drag gesture, pending search input and edit target
///
/// Commands never fail from the caller's point of view; invalid input is ignored.
pub struct Session {
    store: TodoStore,
    filter: Rc<RefCell<FilterEngine>>,
    reorder: ReorderController,
    search: Debouncer<String>,
    editing: Option<EditTarget>,
}

impl Session {
    /// Wrap a store; the derived view follows it through a subscription
    pub fn new(mut store: TodoStore, config: &Config) -> Self {
        let filter = Rc::new(RefCell::new(FilterEngine::new()));
        filter.borrow_mut().recompute(store.items());

        let sink = Rc::clone(&filter);
        store.subscribe(move |items: &[TodoItem], cause: ChangeCause| {
            sink.borrow_mut().on_change(items, cause);
        });

        Self {
            store,
            filter,
            reorder: ReorderController::new(),
            search: Debouncer::new(config.search_debounce()),
            editing: None,
        }
    }

    /// Build a session over `storage` and hydrate it
    pub fn with_storage(storage: impl Storage + 'static, config: &Config) -> Self {
        let mut session = Self::new(TodoStore::new(storage), config);
        session.store.hydrate();
        session
    }

    /// Open the on-disk store under `root`, reading its config if present
    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::load(&root.join(STORE_DIR))?;
        let storage = JsonlStorage::open_with_key(root, &config.storage_key)?;
        Ok(Self::with_storage(storage, &config))
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    /// Canonical order
    pub fn items(&self) -> &[TodoItem] {
        self.store.items()
    }

    /// Derived view for the active filter
    pub fn view(&self) -> Ref<'_, [TodoItem]> {
        Ref::map(self.filter.borrow(), |engine| engine.view())
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter.borrow().mode().clone()
    }

    // ========================================================================
    // Item commands
    // ========================================================================

    pub fn add(&mut self, text: &str) -> Option<TodoId> {
        self.store.add(text)
    }

    pub fn delete(&mut self, id: TodoId) -> bool {
        if self.editing.as_ref().is_some_and(|e| e.id == id) {
            self.editing = None;
        }
        self.store.delete(id)
    }

    pub fn check(&mut self, id: TodoId) -> bool {
        self.store.check(id)
    }

    pub fn edit(&mut self, id: TodoId, text: &str) -> bool {
        self.store.edit(id, text)
    }

    pub fn clear_completed(&mut self) -> usize {
        self.store.clear_completed()
    }

    // ========================================================================
    // Edit dialog
    // ========================================================================

    /// Open the edit dialog on `id`, capturing its current text
    pub fn begin_edit(&mut self, id: TodoId) -> Option<&EditTarget> {
        let text = self.store.get(id)?.text.clone();
        self.editing = Some(EditTarget { id, text });
        self.editing.as_ref()
    }

    pub fn editing(&self) -> Option<&EditTarget> {
        self.editing.as_ref()
    }

    /// Save the dialog's text to its item and close it
    ///
    /// Blank text is ignored and the dialog stays open. Text beyond [`MAX_EDIT_CHARS`]
    /// characters is cut off. Returns whether the item changed.
    pub fn commit_edit(&mut self, text: &str) -> bool {
        let Some(target) = &self.editing else {
            return false;
        };
        if text.trim().is_empty() {
            debug!(id = target.id, "Ignoring blank edit");
            return false;
        }

        let id = target.id;
        let text: String = text.chars().take(MAX_EDIT_CHARS).collect();
        self.editing = None;
        self.store.edit(id, &text)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    // ========================================================================
    // Drag gesture
    // ========================================================================

    pub fn drag_start(&mut self, index: usize) -> bool {
        let filter = self.filter.borrow();
        self.reorder.drag_start(filter.view(), index)
    }

    /// Hover over view position `index`; commits a move when the item changes place
    pub fn drag_over(&mut self, index: usize) -> bool {
        let next = {
            let filter = self.filter.borrow();
            self.reorder.drag_over(filter.view(), self.store.items(), index)
        };
        match next {
            Some(order) => self.store.load_as(order, ChangeCause::Reorder),
            None => false,
        }
    }

    /// The drop event; the move already happened while hovering
    pub fn end_drag(&mut self) {
        self.reorder.end_drag();
    }

    pub fn is_dragging(&self) -> bool {
        self.reorder.is_dragging()
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Switch filter mode immediately
    ///
    /// Drops any pending debounced search and any drag in progress, since both refer to
    /// the view being replaced.
    pub fn set_filter(&mut self, mode: FilterMode) {
        self.search.cancel();
        self.reorder.end_drag();
        self.filter.borrow_mut().set_mode(mode, self.store.items());
    }

    /// Search right away
    pub fn search(&mut self, term: &str) {
        self.set_filter(FilterMode::Search(term.to_string()));
    }

    /// Record a keystroke in the search box; applied by [`Session::tick`] once input settles
    pub fn search_input(&mut self, term: &str, now: Instant) {
        self.search.push(term.to_string(), now);
    }

    /// Apply a settled search; returns whether the view changed mode
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.search.poll(now) {
            Some(term) => {
                self.search(&term);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("filter", &self.filter.borrow().mode())
            .field("reorder", &self.reorder)
            .field("editing", &self.editing)
            .finish()
    }
}
