use actix_session::Session;
use actix_web::{get, web, HttpResponse, Responder};
use log::error;
use serde_json::json;

use crate::handlers::session_handler;
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(init_session);
}

/// Called once per page load; puts the dashboard on seed data and loads the mailbox if connected.
#[get("/init_session")]
async fn init_session(data: web::Data<AppState>, session: Session) -> impl Responder {
    match session_handler::initialize_session(data, session).await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => {
            error!("Could not start dashboard session: {:?}", e);
            HttpResponse::InternalServerError().json(json!({
                "initialized": false,
                "error": format!("Could not start dashboard session: {}", e),
            }))
        }
    }
}
