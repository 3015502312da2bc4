pub mod error;
pub mod layout;
pub mod memory;
pub mod repository;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use layout::SchemaVersion;
pub use memory::MemoryStore;
pub use repository::CollectionRepository;
pub use store::{CollectionFilter, CollectionStore};
