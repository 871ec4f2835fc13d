// TodoStore - Single-user todo list engine with ordered JSONL persistence

pub mod config;
pub mod debounce;
pub mod filter;
pub mod jsonl;
pub mod models;
pub mod record;
pub mod reducer;
pub mod reorder;
pub mod session;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use debounce::Debouncer;
pub use filter::{FilterEngine, FilterMode};
pub use models::{Clock, IdGenerator, SystemClock, TodoId, TodoItem, now_ms};
pub use record::Record;
pub use reducer::{Action, reduce};
pub use reorder::ReorderController;
pub use session::{EditTarget, Session};
pub use storage::{JsonlStorage, MemoryStorage, Storage};
pub use store::{ChangeCause, Subscriber, TodoStore};
