//! Database module: models, schema and the SQLite-backed record store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `RecordStore` and the per-request `UnitOfWork`

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbStartup, NewStartup};
pub use sqlite::{RecordStore, UnitOfWork};
