use axum::{Json, extract::State};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::middleware::auth::Caller;
use crate::middleware::json::JsonBody;
use crate::middleware::path::StartupId;
use crate::types::MessageResponse;
use crate::types::startup::{CreateStartupRequest, CreatedResponse, StartupPatch, StartupView};
use crate::{RegistryError, router::AppState};

const ENTITY: &str = "Startup";

/// GET /api/v1/startups/ -> every row for admins, own rows otherwise.
pub async fn list_startups(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<StartupView>>, RegistryError> {
    let mut uow = state.store.begin().await?;
    let rows = if caller.is_admin() {
        uow.list_startups().await?
    } else {
        uow.list_startups_by_owner(&caller.id).await?
    };
    uow.commit().await?;

    Ok(Json(rows.into_iter().map(StartupView::from).collect()))
}

/// POST /api/v1/startups/ -> owner is always the caller.
pub async fn create_startup(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(req): JsonBody<CreateStartupRequest>,
) -> Result<Json<CreatedResponse>, RegistryError> {
    let mut uow = state.store.begin().await?;
    let startup_id = uow.insert_startup(req.into_new(&caller.id)).await?;
    uow.commit().await?;

    info!(startup_id, owner = %caller.id, "startup created");
    Ok(Json(CreatedResponse {
        message: "Startup created".to_string(),
        startup_id,
    }))
}

/// PUT /api/v1/startups/{startup_id} -> owner or admin, allow-listed fields only.
pub async fn update_startup(
    State(state): State<AppState>,
    caller: Caller,
    StartupId(startup_id): StartupId,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let mut uow = state.store.begin().await?;
    let Some(mut startup) = uow.get_startup(startup_id).await? else {
        return Err(RegistryError::NotFound(ENTITY));
    };

    if !caller.can_modify(&startup) {
        warn!(startup_id, caller = %caller.id, "update refused: not owner");
        return Err(RegistryError::Forbidden);
    }

    StartupPatch::from_json(body)?.apply(&mut startup);
    uow.update_startup(&startup).await?;
    uow.commit().await?;

    info!(startup_id, caller = %caller.id, "startup updated");
    Ok(Json(MessageResponse::new("Startup updated")))
}

/// DELETE /api/v1/startups/{startup_id} -> admin only, enforced by the role layer.
pub async fn delete_startup(
    State(state): State<AppState>,
    caller: Caller,
    StartupId(startup_id): StartupId,
) -> Result<Json<MessageResponse>, RegistryError> {
    let mut uow = state.store.begin().await?;
    if !uow.delete_startup(startup_id).await? {
        return Err(RegistryError::NotFound(ENTITY));
    }
    uow.commit().await?;

    info!(startup_id, caller = %caller.id, "startup deleted");
    Ok(Json(MessageResponse::new("Startup deleted")))
}
