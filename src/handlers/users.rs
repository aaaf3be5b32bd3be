use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, warn};

use crate::db::RecordStore;
use crate::middleware::auth::DEFAULT_ROLE;
use crate::middleware::json::JsonBody;
use crate::types::MessageResponse;
use crate::types::user::{LoginRequest, LoginResponse, SignupRequest};
use crate::{RegistryError, router::AppState};

const SIGNUP_MESSAGE: &str = "User created successfully. Please check your email to verify.";

/// POST /api/v1/users/signup
///
/// Registers the account with the provider, then records the local user
/// row. When the local write fails the provider account this request
/// created is deleted again.
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), RegistryError> {
    let account = state.gateway.sign_up(&req.email, &req.password).await?;
    let role = req.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());

    if let Err(err) = record_user(&state.store, &req.email, &account.id, &role).await {
        warn!(
            email = %req.email,
            account_id = %account.id,
            error = %err,
            "local user insert failed"
        );
        compensate(&state, &account.id).await;
        return Err(err);
    }

    info!(email = %req.email, role = %role, "user signed up");
    Ok((StatusCode::CREATED, Json(MessageResponse::new(SIGNUP_MESSAGE))))
}

async fn record_user(
    store: &RecordStore,
    email: &str,
    auth_id: &str,
    role: &str,
) -> Result<i64, RegistryError> {
    let mut uow = store.begin().await?;
    let id = uow.insert_user(email, auth_id, role).await?;
    uow.commit().await?;
    Ok(id)
}

/// Delete the provider account created by a failed sign-up. The provider
/// may hand back the id of an existing unconfirmed account for a repeated
/// email; an id already owned by a local user row is never deleted.
async fn compensate(state: &AppState, account_id: &str) {
    match state.store.role_for(account_id).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            warn!(account_id, "provider account belongs to an existing user; keeping it");
            return;
        }
        Err(err) => {
            warn!(account_id, error = %err, "cannot verify account ownership; keeping it");
            return;
        }
    }
    match state.gateway.delete_account(account_id).await {
        Ok(()) => info!(account_id, "sign-up compensation done"),
        Err(err) => warn!(account_id, error = %err, "failed to delete provider account"),
    }
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, RegistryError> {
    let session = state.gateway.sign_in(&req.email, &req.password).await?;
    info!(email = %req.email, "login succeeded");
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: session.access_token,
    }))
}
