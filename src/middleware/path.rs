use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use crate::error::RegistryError;

/// Integer `{startup_id}` path segment. Anything that is not an integer
/// cannot name a record, so it is answered as a JSON 404 instead of
/// axum's plain-text 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupId(pub i64);

impl<S> FromRequestParts<S> for StartupId
where
    S: Send + Sync,
{
    type Rejection = RegistryError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(StartupId(id)),
            Err(_) => Err(RegistryError::NotFound("Startup")),
        }
    }
}
