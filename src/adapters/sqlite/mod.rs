//! SQLite adapters: connection pool and schema migrations.

pub mod connection;
pub mod migrations;

pub use connection::{create_memory_pool, create_pool, verify_connection, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
