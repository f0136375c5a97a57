use actix_session::Session;
use actix_web::web;
use log::{error, info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::models::dashboard::{DashboardState, RefreshInProgress};
use crate::models::session_manager::SessionManager;
use crate::routes::app_state::AppState;
use crate::services::subscription_service;

const SESSION_ID_KEY: &str = "session_id";

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    InProgress(#[from] RefreshInProgress),
}

pub fn session_id(session: &Session) -> Option<String> {
    match session.get::<String>(SESSION_ID_KEY) {
        Ok(id) => id,
        Err(e) => {
            warn!("Unreadable session_id in cookie: {:?}", e);
            None
        }
    }
}

/// Returns the caller's view-session id, issuing a new one when the cookie has none.
pub fn ensure_session_id(session: &Session) -> String {
    if let Some(id) = session_id(session) {
        return id;
    }
    let id = Uuid::new_v4().to_string();
    if let Err(e) = session.insert(SESSION_ID_KEY, id.clone()) {
        error!("Failed to insert session_id into cookie: {:?}", e);
    } else {
        info!("Stored session_id {} in cookie", id);
    }
    id
}

/// Releases the session's refresh guard if the run is dropped before it settles,
/// e.g. when the client disconnects and actix drops the handler future.
struct InFlightRefresh<'a> {
    sessions: &'a SessionManager,
    session_id: &'a str,
    generation: u64,
    settled: bool,
}

impl Drop for InFlightRefresh<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let released = self
            .sessions
            .with_existing(self.session_id, |state| state.abandon_refresh(self.generation));
        if released == Some(true) {
            warn!("Extraction run for session {} was cancelled", self.session_id);
        }
    }
}

/// Runs one extraction run for `session_id` and applies the result to its view.
///
/// Returns `Ok(false)` when the result arrived after a sign-out or sign-in
/// and was discarded, or the session expired in the meantime.
pub async fn refresh_session(data: &AppState, session_id: &str) -> Result<bool, RefreshError> {
    let client = data.mailbox.client().ok_or(RefreshError::NotAuthenticated)?;
    let generation = data
        .session_manager
        .with_session(session_id, DashboardState::begin_refresh)?;
    let mut in_flight = InFlightRefresh {
        sessions: &data.session_manager,
        session_id,
        generation,
        settled: false,
    };

    info!("Loading Gmail subscriptions for session {}", session_id);
    let result = subscription_service::fetch_subscriptions(client.as_ref()).await;
    if let Err(ref e) = result {
        error!("Failed to load Gmail subscriptions for session {}: {}", session_id, e);
    }

    let applied = data
        .session_manager
        .with_existing(session_id, |state| state.finish_refresh(generation, result))
        .unwrap_or(false);
    in_flight.settled = true;
    if !applied {
        warn!("Discarded stale extraction result for session {}", session_id);
    }
    Ok(applied)
}

/// Starts (or restarts) the caller's view on seed data and loads the mailbox
/// when one is connected. A session id already in the cookie is reused.
pub async fn initialize_session(
    data: web::Data<AppState>,
    session: Session,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let session_id = ensure_session_id(&session);
    data.session_manager.with_session(&session_id, |state| {
        state.reset_to_seed();
        state.dismiss_error();
    });

    if data.mailbox.is_authenticated() {
        refresh_session(&data, &session_id).await?;
    } else {
        info!("No mailbox connected; session {} shows sample data", session_id);
    }

    let state = data.session_manager.get(&session_id).unwrap_or_default();
    info!("Initialized view session: {}", session_id);

    Ok(json!({
        "initialized": true,
        "session_id": session_id,
        "authenticated": data.mailbox.is_authenticated(),
        "using_seed_data": state.using_seed_data(),
        "error": state.error(),
    }))
}
