// Pure transitions over the canonical todo order

use crate::models::{TodoId, TodoItem};

/// A transition applied to the canonical order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a new item
    Add(TodoItem),
    /// Remove the item with this id
    Delete(TodoId),
    /// Flip `completed` on the item with this id
    Check(TodoId),
    /// Replace the text of the item with this id
    Edit { id: TodoId, text: String },
    /// Replace the whole order
    Load(Vec<TodoItem>),
}

/// Compute the next canonical order
///
/// Actions naming an absent id return the previous order unchanged.
pub fn reduce(state: &[TodoItem], action: Action) -> Vec<TodoItem> {
    match action {
        Action::Add(item) => {
            let mut next = Vec::with_capacity(state.len() + 1);
            next.extend_from_slice(state);
            next.push(item);
            next
        }
        Action::Delete(id) => state.iter().filter(|todo| todo.id != id).cloned().collect(),
        Action::Check(id) => state
            .iter()
            .map(|todo| {
                if todo.id == id {
                    TodoItem {
                        completed: !todo.completed,
                        ..todo.clone()
                    }
                } else {
                    todo.clone()
                }
            })
            .collect(),
        Action::Edit { id, text } => state
            .iter()
            .map(|todo| {
                if todo.id == id {
                    TodoItem {
                        text: text.clone(),
                        ..todo.clone()
                    }
                } else {
                    todo.clone()
                }
            })
            .collect(),
        Action::Load(items) => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(texts: &[&str]) -> Vec<TodoItem> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| TodoItem::new(i as TodoId + 1, *text))
            .collect()
    }

    #[test]
    fn test_add_appends() {
        let state = items(&["a", "b"]);
        let next = reduce(&state, Action::Add(TodoItem::new(10, "c")));
        assert_eq!(next.len(), 3);
        assert_eq!(next[2].id, 10);
        assert!(!next[2].completed);
        // previous order untouched
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_delete() {
        let state = items(&["a", "b", "c"]);
        let next = reduce(&state, Action::Delete(2));
        let texts: Vec<_> = next.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_check_toggles() {
        let state = items(&["a", "b"]);
        let once = reduce(&state, Action::Check(1));
        assert!(once[0].completed);
        assert!(!once[1].completed);

        let twice = reduce(&once, Action::Check(1));
        assert_eq!(twice, state);
    }

    #[test]
    fn test_edit_replaces_text_only() {
        let mut state = items(&["a", "b"]);
        state[1].completed = true;

        let next = reduce(
            &state,
            Action::Edit {
                id: 2,
                text: "bee".to_string(),
            },
        );
        assert_eq!(next[1].text, "bee");
        assert!(next[1].completed);
        assert_eq!(next[1].id, 2);
    }

    #[test]
    fn test_edit_does_not_validate() {
        let state = items(&["a"]);
        let next = reduce(
            &state,
            Action::Edit {
                id: 1,
                text: String::new(),
            },
        );
        assert_eq!(next[0].text, "");
    }

    #[test]
    fn test_absent_id_is_noop() {
        let state = items(&["a", "b", "c"]);
        assert_eq!(reduce(&state, Action::Delete(99)), state);
        assert_eq!(reduce(&state, Action::Check(99)), state);
        assert_eq!(
            reduce(
                &state,
                Action::Edit {
                    id: 99,
                    text: "x".to_string()
                }
            ),
            state
        );
    }

    #[test]
    fn test_load_replaces() {
        let state = items(&["a", "b"]);
        let replacement = items(&["x"]);
        assert_eq!(reduce(&state, Action::Load(replacement.clone())), replacement);
    }
}
