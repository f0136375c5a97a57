use actix_session::Session;
use actix_web::{get, post, web, Responder};

use crate::handlers::oauth_handler::{self, CallbackParams};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(check_auth)
        .service(oauth_login)
        .service(oauth_callback)
        .service(auth_callback)
        .service(oauth_logout);
}

#[get("/check_auth")]
async fn check_auth(data: web::Data<AppState>) -> impl Responder {
    oauth_handler::check_auth(data).await
}

#[get("/oauth/login")]
async fn oauth_login(data: web::Data<AppState>, session: Session) -> impl Responder {
    oauth_handler::oauth_login(data, session).await
}

#[get("/oauth/callback")]
async fn oauth_callback(
    data: web::Data<AppState>,
    session: Session,
    params: web::Query<CallbackParams>,
) -> impl Responder {
    oauth_handler::oauth_callback(data, session, params).await
}

// Redirect URI registered with Google.
#[get("/auth/callback")]
async fn auth_callback(
    data: web::Data<AppState>,
    session: Session,
    params: web::Query<CallbackParams>,
) -> impl Responder {
    oauth_handler::oauth_callback(data, session, params).await
}

#[post("/oauth/logout")]
async fn oauth_logout(data: web::Data<AppState>) -> impl Responder {
    oauth_handler::oauth_logout(data).await
}
