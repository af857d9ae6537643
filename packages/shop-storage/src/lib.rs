//! Catalog persistence: models, the query/pipeline IR, and the Postgres and in-memory stores
//! that execute it.

pub mod db;
pub mod memory;
pub mod models;
pub mod pipeline;
pub mod postgres;
pub mod queries;
pub mod schema;
pub mod store;

mod error;
mod sql;

pub use error::Error;
pub use store::{BoxFuture, CatalogStore};

pub type Result<T, E = Error> = std::result::Result<T, E>;
