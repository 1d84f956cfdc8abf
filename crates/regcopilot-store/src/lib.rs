//! Storage layer: vector document stores (in-memory, LanceDB) and the JSON
//! files a run reads and writes (summary cache, workflow result).

mod error;
pub use error::{PersistError, StoreError};

mod store;
pub use store::DocumentStore;

mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "lancedb")]
mod lance;
#[cfg(feature = "lancedb")]
pub use lance::LanceStore;

pub mod cache;
mod json_file;
pub mod results;

pub use cache::SummaryCache;
pub use results::{read_result, write_result};

#[cfg(any(test, feature = "test-utils"))]
pub mod recording;
