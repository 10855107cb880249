// Resumable job state: node-list cache and completion journal

pub mod journal;
pub mod node_cache;
pub mod record;

pub use journal::CompletionJournal;
pub use node_cache::{CachedList, NodeListCache};
