pub mod meetings;
pub mod members;
pub mod schedule;
pub mod slots;

use actix_web::{
    web, Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, header},
    middleware::Next,
};

fn is_mutation(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::DELETE].contains(method)
}

fn declares_json(req: &ServiceRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Every mutation must declare `Content-Type: application/json`, bodyless ones
/// such as `POST .../release` and `DELETE .../slots/{index}` included. A
/// cross-site HTML form cannot set that header. Reads pass through.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if is_mutation(req.method()) && !declares_json(&req) {
        log::debug!("Rejected {} {} without a JSON content type", req.method(), req.path());
        let response = HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Content-Type must be application/json for mutation requests"
        }));
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Configure API v1 routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/meetings")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::get().to(meetings::list))
            .route("/{id}", web::get().to(meetings::read))
            .route("/{id}/published", web::put().to(meetings::set_published))
            .route("/{id}/slots", web::post().to(meetings::add_slot))
            .route("/{id}/slots/{index}", web::delete().to(slots::remove))
            .route("/{id}/slots/{index}/claim", web::post().to(slots::claim))
            .route("/{id}/slots/{index}/release", web::post().to(slots::release))
            .route("/{id}/slots/{index}/occupant", web::put().to(slots::assign))
            .route("/{id}/slots/{index}/role", web::put().to(slots::rename)),
    );
    cfg.service(
        web::scope("/schedule")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("/seed", web::post().to(schedule::seed))
            .route("/extend", web::post().to(schedule::extend))
            .route("/wipe", web::post().to(schedule::wipe)),
    );
    cfg.route("/me", web::get().to(members::me));
    cfg.route("/notifications", web::get().to(members::notifications));
}
