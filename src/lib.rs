pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod reservation;
pub mod schedule;
pub mod state;
pub mod store;

use actix_web::web;

/// Register every route under `/api/v1`.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1").configure(handlers::api_v1::configure));
}
