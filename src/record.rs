// Record trait for persisted types

use serde::{Deserialize, Serialize};

/// Core trait that any persisted record must implement
pub trait Record: Serialize + for<'de> Deserialize<'de> + Clone + 'static {
    /// Collection name for this record type (e.g., "todos")
    /// Used as the default storage key: {collection}.jsonl
    fn collection_name() -> &'static str
    where
        Self: Sized;
}
