use actix_web::web;

pub mod app_state;
pub mod oauth_routes;
pub mod session_routes;
pub mod subscription_routes;

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    oauth_routes::init_routes(cfg);
    session_routes::init_routes(cfg);
    subscription_routes::init_routes(cfg);
}
