use actix_session::Session;
use actix_web::{delete, get, post, web, Responder};

use crate::handlers::subscription_handler::{self, FilterQuery};
use crate::routes::app_state::AppState;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_subscriptions)
        .service(unsubscribe)
        .service(resubscribe)
        .service(refresh)
        .service(dismiss_error);
}

#[get("/api/subscriptions")]
async fn list_subscriptions(
    data: web::Data<AppState>,
    session: Session,
    query: web::Query<FilterQuery>,
) -> impl Responder {
    subscription_handler::list_subscriptions(data, session, query).await
}

#[post("/api/subscriptions/{id}/unsubscribe")]
async fn unsubscribe(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> impl Responder {
    subscription_handler::set_active(data, session, path.into_inner(), false).await
}

#[post("/api/subscriptions/{id}/resubscribe")]
async fn resubscribe(
    data: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> impl Responder {
    subscription_handler::set_active(data, session, path.into_inner(), true).await
}

#[post("/api/refresh")]
async fn refresh(data: web::Data<AppState>, session: Session) -> impl Responder {
    subscription_handler::refresh(data, session).await
}

#[delete("/api/error")]
async fn dismiss_error(data: web::Data<AppState>, session: Session) -> impl Responder {
    subscription_handler::dismiss_error(data, session).await
}
