//! Access guard for the record routes.
//!
//! Guarded routes run an ordered chain of layers. [`require_identity`]
//! resolves the bearer token through the identity provider, loads the
//! caller's role and stores a [`Caller`] in the request extensions.
//! [`require_role`] then compares that role against a fixed string.
//! Either layer short-circuits with an error response.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::TypedHeader;
use axum_extra::typed_header::{TypedHeaderRejection, TypedHeaderRejectionReason};
use headers::Authorization;
use headers::authorization::Bearer;
use tracing::{debug, warn};

use crate::db::DbStartup;
use crate::error::RegistryError;
use crate::router::AppState;

pub const ADMIN_ROLE: &str = "admin";
/// Role assumed when the identity has no local user row.
pub const DEFAULT_ROLE: &str = "user";

/// Authenticated caller attached to the request by [`require_identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Provider account id; doubles as the owner key on records.
    pub id: String,
    pub role: String,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Admins may modify anything, everyone else only what they own.
    pub fn can_modify(&self, startup: &DbStartup) -> bool {
        self.is_admin() || startup.is_owned_by(&self.id)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = RegistryError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(RegistryError::MissingToken)
    }
}

type BearerHeader = Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>;

/// Resolve the bearer credential to a [`Caller`]. One provider round trip
/// and one store lookup per call; nothing is cached.
pub async fn resolve_caller(state: &AppState, bearer: BearerHeader) -> Result<Caller, RegistryError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|rejection| {
        match rejection.reason() {
            TypedHeaderRejectionReason::Missing => RegistryError::MissingToken,
            _ => RegistryError::InvalidToken,
        }
    })?;

    let account = state
        .gateway
        .introspect(bearer.token())
        .await
        .map_err(|e| RegistryError::TokenError(e.to_string()))?
        .ok_or(RegistryError::InvalidToken)?;

    let role = state
        .store
        .role_for(&account.id)
        .await
        .map_err(|e| RegistryError::TokenError(e.to_string()))?
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    debug!(caller = %account.id, role = %role, "resolved caller");
    Ok(Caller {
        id: account.id,
        role,
    })
}

/// First guard layer: authenticate and attach the [`Caller`].
pub async fn require_identity(
    State(state): State<AppState>,
    bearer: BearerHeader,
    mut req: Request,
    next: Next,
) -> Result<Response, RegistryError> {
    let caller = resolve_caller(&state, bearer).await.inspect_err(|e| {
        warn!(path = %req.uri().path(), error = %e, "authentication failed");
    })?;
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// Role demanded by [`require_role`], matched exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredRole(pub &'static str);

impl RequiredRole {
    pub const ADMIN: RequiredRole = RequiredRole(ADMIN_ROLE);
}

pub fn check_role(caller: &Caller, required: RequiredRole) -> Result<(), RegistryError> {
    if caller.role == required.0 {
        Ok(())
    } else {
        Err(RegistryError::Forbidden)
    }
}

/// Second guard layer; must run inside [`require_identity`].
pub async fn require_role(
    State(required): State<RequiredRole>,
    caller: Caller,
    req: Request,
    next: Next,
) -> Result<Response, RegistryError> {
    check_role(&caller, required).inspect_err(|_| {
        warn!(
            caller = %caller.id,
            role = %caller.role,
            required = required.0,
            "role check failed"
        );
    })?;
    Ok(next.run(req).await)
}
