pub mod calculations;
pub mod close;
pub mod db;
pub mod models;

pub use db::repository::{LedgerRepository, RepositoryError};
pub use models::*;
