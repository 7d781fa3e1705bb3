use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{Caller, require_admin};
use crate::errors::AppError;
use crate::schedule::{self, CadencePlan};
use crate::state::AppState;

/// Phrase the caller must send to wipe the calendar.
pub const WIPE_CONFIRMATION: &str = "WIPE";

/// Optional overrides of the configured cadence. Send `{}` for the defaults.
#[derive(Deserialize)]
pub struct CadenceRequest {
    pub weekday: Option<String>,
    pub roles: Option<Vec<String>>,
    pub weeks: Option<u32>,
}

#[derive(Deserialize)]
pub struct WipeRequest {
    #[serde(default)]
    pub confirm: String,
}

fn plan_for(state: &AppState, req: CadenceRequest) -> Result<CadencePlan, AppError> {
    let mut plan = state.default_plan();
    if let Some(day) = req.weekday {
        plan.weekday = schedule::parse_weekday(&day)
            .ok_or_else(|| AppError::Validation(format!("'{day}' is not a weekday")))?;
    }
    if let Some(roles) = req.roles {
        plan.role_template = roles;
    }
    if let Some(weeks) = req.weeks {
        plan.week_count = weeks;
    }
    Ok(plan)
}

/// POST /api/v1/schedule/seed - Generate meetings from the next cadence day (admin).
pub async fn seed(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CadenceRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&caller)?;
    let plan = plan_for(&state, body.into_inner())?;
    let report = state.generator.seed_cadence(&plan, state.today()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// POST /api/v1/schedule/extend - Generate meetings after the latest one (admin).
pub async fn extend(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CadenceRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&caller)?;
    let plan = plan_for(&state, body.into_inner())?;
    let report = state.generator.extend_cadence(&plan, state.today()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// POST /api/v1/schedule/wipe - Delete every meeting (admin).
/// Body must be {"confirm": "WIPE"}.
pub async fn wipe(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<WipeRequest>,
) -> Result<HttpResponse, AppError> {
    require_admin(&caller)?;
    if body.confirm != WIPE_CONFIRMATION {
        return Err(AppError::Validation(format!(
            "send {{\"confirm\": \"{WIPE_CONFIRMATION}\"}} to delete every meeting"
        )));
    }
    let removed = state.generator.wipe_all().await?;
    log::warn!("Calendar wiped by {}", caller.member_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}
