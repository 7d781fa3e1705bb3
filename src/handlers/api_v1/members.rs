use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::{Caller, require_admin};
use crate::errors::AppError;
use crate::models::meeting::{self, Booking};
use crate::models::member::{MemberRecord, RoleCount};
use crate::state::AppState;
use crate::store::MeetingStore;

#[derive(Serialize)]
pub struct ApiProfile {
    pub member_id: String,
    pub display_name: String,
    pub is_admin: bool,
    pub total_completed: usize,
    pub role_counts: Vec<RoleCount>,
    pub suggested_role: Option<String>,
    pub bookings: Vec<Booking>,
}

/// GET /api/v1/me - Role history, a suggested next role, and current bookings.
pub async fn me(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
    let record = state
        .store
        .get_member(&caller.member_id)
        .await?
        .map(|found| found.value)
        .unwrap_or_else(|| MemberRecord::new(&caller.member_id, &caller.display_name, &caller.email));
    let bookings = meeting::find_bookings_for(&state.store, &caller.member_id, state.today()).await?;

    Ok(HttpResponse::Ok().json(ApiProfile {
        suggested_role: record
            .suggest_next_role(&state.config.role_template)
            .map(String::from),
        total_completed: record.total_completed(),
        role_counts: record.role_counts(),
        member_id: record.member_id,
        display_name: caller.display_name,
        is_admin: caller.is_admin,
        bookings,
    }))
}

/// GET /api/v1/notifications - Recently delivered notices (admin).
pub async fn notifications(
    state: web::Data<AppState>,
    caller: Caller,
) -> Result<HttpResponse, AppError> {
    require_admin(&caller)?;
    Ok(HttpResponse::Ok().json(state.outbox.sent()))
}
