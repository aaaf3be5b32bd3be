//! Client for the external identity provider.
//!
//! Handlers and the access guard only see the [`AuthGateway`] trait; the
//! production implementation is [`SupabaseAuth`], which speaks the
//! Supabase/GoTrue REST API.

pub mod endpoints;
pub mod service;

pub use service::SupabaseAuth;

use crate::error::RegistryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Account as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session issued by a successful password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<ProviderAccount>,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register a new account with the provider.
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAccount, RegistryError>;

    /// Exchange credentials for a session. Rejected credentials yield
    /// [`RegistryError::InvalidCredentials`].
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, RegistryError>;

    /// Resolve a bearer token. `Ok(None)` means the provider does not
    /// recognise the token.
    async fn introspect(&self, token: &str) -> Result<Option<ProviderAccount>, RegistryError>;

    /// Remove an account. Used to undo a sign-up whose local write failed.
    async fn delete_account(&self, account_id: &str) -> Result<(), RegistryError>;
}
