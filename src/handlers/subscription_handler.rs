use actix_session::Session;
use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::handlers::session_handler::{ensure_session_id, refresh_session, RefreshError};
use crate::models::dashboard::ALL_CATEGORIES;
use crate::routes::app_state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// The filtered view plus everything the dashboard shows around it.
pub async fn list_subscriptions(
    data: web::Data<AppState>,
    session: Session,
    query: web::Query<FilterQuery>,
) -> HttpResponse {
    let session_id = ensure_session_id(&session);
    let category = query.category.as_deref().unwrap_or(ALL_CATEGORIES);
    let search = query.search.as_deref().unwrap_or("");
    let authenticated = data.mailbox.is_authenticated();

    let body = data.session_manager.view(&session_id, |state| {
        let visible = state.visible(category, search);
        json!({
            "total_visible": visible.len(),
            "subscriptions": visible,
            "category_counts": state.category_counts(),
            "stats": state.stats(),
            "selected_category": category,
            "search": search,
            "using_seed_data": state.using_seed_data(),
            "loading": state.is_refreshing(),
            "error": state.error(),
            "authenticated": authenticated,
        })
    });
    HttpResponse::Ok().json(body)
}

pub async fn set_active(
    data: web::Data<AppState>,
    session: Session,
    id: String,
    value: bool,
) -> HttpResponse {
    let session_id = ensure_session_id(&session);
    let updated = data
        .session_manager
        .with_session(&session_id, |state| {
            if value {
                state.resubscribe(&id)
            } else {
                state.unsubscribe(&id)
            }
        });

    if updated {
        info!("Session {} set subscription {} active={}", session_id, id, value);
    } else {
        warn!("Session {} has no subscription {}; nothing to update", session_id, id);
    }
    HttpResponse::Ok().json(json!({ "id": id, "updated": updated, "is_active": value }))
}

pub async fn refresh(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let session_id = ensure_session_id(&session);
    match refresh_session(&data, &session_id).await {
        Ok(applied) => {
            let state = data.session_manager.get(&session_id).unwrap_or_default();
            HttpResponse::Ok().json(json!({
                "refreshed": applied,
                "using_seed_data": state.using_seed_data(),
                "total": state.records().len(),
                "error": state.error(),
            }))
        }
        Err(e @ RefreshError::NotAuthenticated) => {
            HttpResponse::Unauthorized().json(json!({ "error": e.to_string() }))
        }
        Err(e @ RefreshError::InProgress(_)) => {
            HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
        }
    }
}

pub async fn dismiss_error(data: web::Data<AppState>, session: Session) -> HttpResponse {
    let session_id = ensure_session_id(&session);
    data.session_manager
        .with_existing(&session_id, |state| state.dismiss_error());
    HttpResponse::NoContent().finish()
}
