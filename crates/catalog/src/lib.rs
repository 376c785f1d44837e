//! Versioned metadata catalog: records, namespace nodes, listings and job
//! counts over pluggable single-key stores.

pub mod jobs;
pub mod json_file;
pub mod memory;
pub mod namespace;
pub mod store;
pub mod tree;
pub mod writer;

pub use jobs::{JobAccounting, JobTally, StoreJobAccounting};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use namespace::{NamespaceEntry, NamespaceNode, NamespaceTree, NodeKind, NodeStore};
pub use store::{Precondition, RenameOutcome, Versioned, VersionedStore, WriteOutcome};
pub use tree::{EntryKind, TreeBuilder, TreeEntry};
pub use writer::{CatalogWriter, DatasetEntry, RecordStore};
