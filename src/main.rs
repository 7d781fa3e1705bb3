use actix_web::{App, HttpResponse, HttpServer, middleware, web};

use rolecall::config::AppConfig;
use rolecall::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };
    if config.admin_email.is_none() {
        log::warn!("No ROLECALL_ADMIN_EMAIL set; administrative endpoints are unreachable");
    }

    let bind_addr = config.bind_addr.clone();
    let state = web::Data::new(AppState::new(config));

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(rolecall::configure_app)
            .default_service(web::to(|| async {
                HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
