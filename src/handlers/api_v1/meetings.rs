use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::meeting::{self, Meeting, Slot};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiMeeting {
    pub id: String,
    pub scheduled_at: NaiveDateTime,
    pub display_date: String,
    pub published: bool,
    pub open_slots: usize,
    pub slots: Vec<Slot>,
}

impl From<Meeting> for ApiMeeting {
    fn from(m: Meeting) -> Self {
        ApiMeeting {
            display_date: m.display_date(),
            open_slots: m.open_slot_count(),
            id: m.id,
            scheduled_at: m.scheduled_at,
            published: m.published,
            slots: m.slots,
        }
    }
}

#[derive(Deserialize)]
pub struct PublishRequest {
    pub published: bool,
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

/// GET /api/v1/meetings - Upcoming meetings, soonest first.
/// Members only see published meetings.
pub async fn list(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
    let meetings = meeting::find_upcoming(&state.store, state.today(), caller.is_admin).await?;
    let items: Vec<ApiMeeting> = meetings.into_iter().map(ApiMeeting::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/v1/meetings/{id}
pub async fn read(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = meeting::find_visible(&state.store, &id, caller.is_admin)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(ApiMeeting::from(found)))
}

/// PUT /api/v1/meetings/{id}/published - Show or hide a meeting (admin).
pub async fn set_published(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<PublishRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let updated = state.engine.set_published(&id, &caller, body.published).await?;
    Ok(HttpResponse::Ok().json(ApiMeeting::from(updated)))
}

/// POST /api/v1/meetings/{id}/slots - Append a role to the agenda (admin).
pub async fn add_slot(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<RoleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let index = state.engine.add_slot(&id, &caller, &body.role).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "meeting_id": id,
        "slot_index": index,
    })))
}
