// Drag gesture sequencing into canonical-order splices

use crate::models::{TodoId, TodoItem};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drag {
    id: TodoId,
    index: usize,
}

/// Turns `drag_start` / `drag_over` / `end_drag` events over the displayed view into moves
/// on the canonical order
///
/// Indices are positions in the displayed (possibly filtered) view. They are mapped to
/// canonical positions through item ids, so dragging inside a filtered view moves the
/// item next to the hovered item in the canonical order as well. With no filter active
/// the mapping is the identity and a move is a plain remove-then-insert splice.
#[derive(Debug, Clone, Default)]
pub struct ReorderController {
    drag: Option<Drag>,
}

impl ReorderController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current view index of the dragged item
    pub fn dragged_index(&self) -> Option<usize> {
        self.drag.map(|d| d.index)
    }

    /// Begin a gesture on the item displayed at `index`
    pub fn drag_start(&mut self, view: &[TodoItem], index: usize) -> bool {
        match view.get(index) {
            Some(item) => {
                debug!(index, id = item.id, "Drag started");
                self.drag = Some(Drag { id: item.id, index });
                true
            }
            None => {
                debug!(index, len = view.len(), "Drag start outside the view, ignoring");
                self.drag = None;
                false
            }
        }
    }

    /// Hover over view position `target`
    ///
    /// Returns the new canonical order to commit, or `None` when nothing moves. The
    /// tracked index follows the item, so later hovers in the same gesture are relative
    /// to where it now sits.
    pub fn drag_over(&mut self, view: &[TodoItem], canonical: &[TodoItem], target: usize) -> Option<Vec<TodoItem>> {
        let drag = self.drag?;
        if target == drag.index {
            return None;
        }

        let target_id = view.get(target)?.id;
        if target_id == drag.id {
            self.drag = Some(Drag { index: target, ..drag });
            return None;
        }

        let Some(from) = canonical.iter().position(|todo| todo.id == drag.id) else {
            debug!(id = drag.id, "Dragged item vanished, ending drag");
            self.drag = None;
            return None;
        };
        let to = canonical.iter().position(|todo| todo.id == target_id)?;

        let mut next = canonical.to_vec();
        let item = next.remove(from);
        next.insert(to, item);

        debug!(from, to, view_target = target, "Moved dragged item");
        self.drag = Some(Drag { index: target, ..drag });
        Some(next)
    }

    /// The drop event: clears the gesture without moving anything
    pub fn end_drag(&mut self) {
        if self.drag.take().is_some() {
            debug!("Drag ended");
        }
    }
}
