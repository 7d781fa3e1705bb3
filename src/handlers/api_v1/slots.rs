use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::state::AppState;

use super::meetings::RoleRequest;

#[derive(Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct RemoveQuery {
    pub role: String,
}

/// POST /api/v1/meetings/{id}/slots/{index}/claim - Book a role.
/// Body: {"role": "..."} naming the role the caller saw at that index.
pub async fn claim(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<(String, usize)>,
    body: web::Json<RoleRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let receipt = state.engine.claim(&id, index, &caller, &body.role).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// POST /api/v1/meetings/{id}/slots/{index}/release - Cancel a booking.
pub async fn release(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<(String, usize)>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let receipt = state.engine.release(&id, index, &caller).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// PUT /api/v1/meetings/{id}/slots/{index}/occupant - Enter or clear a name by hand (admin).
pub async fn assign(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<(String, usize)>,
    body: web::Json<AssignRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let slot = state
        .engine
        .admin_override_assign(&id, index, &caller, &body.display_name)
        .await?;
    Ok(HttpResponse::Ok().json(slot))
}

/// PUT /api/v1/meetings/{id}/slots/{index}/role - Rename a role (admin).
pub async fn rename(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<(String, usize)>,
    body: web::Json<RoleRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let slot = state.engine.rename_slot(&id, index, &caller, &body.role).await?;
    Ok(HttpResponse::Ok().json(slot))
}

/// DELETE /api/v1/meetings/{id}/slots/{index}?role=... - Remove a role (admin).
pub async fn remove(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<(String, usize)>,
    query: web::Query<RemoveQuery>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let removed = state.engine.remove_slot(&id, index, &caller, &query.role).await?;
    Ok(HttpResponse::Ok().json(removed))
}
