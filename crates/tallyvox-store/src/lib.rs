pub mod memory_store;
pub mod scoreboard;
pub mod sqlite_store;
pub mod store_trait;

pub use memory_store::MemoryCountStore;
pub use scoreboard::Scoreboard;
pub use sqlite_store::SqliteCountStore;
pub use store_trait::CountStore;
