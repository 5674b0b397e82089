//! SQLite backend for the cafeteria-plan ledger.
//!
//! Implements [`cafeplan_core::LedgerRepository`] over a [`sqlx`] connection
//! pool. Register [`SqliteRepositoryFactory`] with a
//! [`cafeplan_core::db::RepositoryRegistry`] to make the `"sqlite"` backend
//! available.

pub mod decimal;
pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
