pub mod auth_gateway;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod types;

pub use auth_gateway::{AuthGateway, SupabaseAuth};
pub use db::RecordStore;
pub use error::RegistryError;
pub use router::{AppState, registry_router};
