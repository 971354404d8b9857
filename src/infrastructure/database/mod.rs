//! SQLite storage for shared memory.

pub mod connection;
pub mod memory_store;
pub mod migrations;

pub use connection::{create_pool, create_test_pool, ConnectionError, PoolConfig};
pub use memory_store::SqliteMemoryStore;
pub use migrations::{embedded_migrations, Migration, MigrationError, Migrator};
