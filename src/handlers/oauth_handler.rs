use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::handlers::session_handler::{ensure_session_id, refresh_session};
use crate::routes::app_state::AppState;

const OAUTH_STATE_KEY: &str = "oauth_state";
const AUTH_FAILED_MESSAGE: &str = "Failed to complete Gmail authentication. Please try again.";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn redirect_home() -> HttpResponse {
    HttpResponse::Found().append_header(("Location", "/")).finish()
}

/// A stored token counts as signed in; its expiry is not checked.
pub async fn check_auth(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "authenticated": data.mailbox.is_authenticated() }))
}

/// Initiates the OAuth flow by generating the authorization URL and redirecting.
pub async fn oauth_login(data: web::Data<AppState>, session: Session) -> impl Responder {
    let (auth_url, state) = data.identity.authorize_url();
    if let Err(e) = session.insert(OAUTH_STATE_KEY, state) {
        error!("Failed to store OAuth state in cookie: {:?}", e);
    }

    // Redirect the browser to Google's OAuth 2.0 server.
    HttpResponse::Found()
        .append_header(("Location", auth_url))
        .finish()
}

/// Handles the redirect back from Google.
///
/// Exchanges the code for a token, connects the mailbox and reloads the
/// caller's list. Every outcome ends with a redirect to `/`; failures raise
/// the error banner on the caller's view instead.
pub async fn oauth_callback(
    data: web::Data<AppState>,
    session: Session,
    params: web::Query<CallbackParams>,
) -> impl Responder {
    let session_id = ensure_session_id(&session);
    let params = params.into_inner();

    if let Some(err) = params.error {
        warn!("Authorization denied: {}", err);
        return redirect_home();
    }
    let Some(code) = params.code else {
        warn!("OAuth callback without a code");
        return redirect_home();
    };

    let expected_state = session.get::<String>(OAUTH_STATE_KEY).ok().flatten();
    session.remove(OAUTH_STATE_KEY);
    if let Some(expected) = expected_state {
        if params.state.as_deref() != Some(expected.as_str()) {
            warn!("OAuth state mismatch for session {}", session_id);
            data.session_manager
                .with_session(&session_id, |state| state.set_error(AUTH_FAILED_MESSAGE));
            return redirect_home();
        }
    }

    let connected = match data.identity.exchange_code(code).await {
        Ok(token) => data.identity.client_for(&token),
        Err(e) => Err(e),
    };

    match connected {
        Ok(client) => {
            data.mailbox.connect(client);
            data.session_manager.for_each(|state| state.reset_to_seed());
            info!("Gmail connected; reloading session {}", session_id);
            if let Err(e) = refresh_session(&data, &session_id).await {
                error!("Reload after sign-in failed: {}", e);
            }
        }
        Err(e) => {
            error!("Gmail authentication failed: {}", e);
            data.session_manager
                .with_session(&session_id, |state| state.set_error(AUTH_FAILED_MESSAGE));
        }
    }
    redirect_home()
}

/// Forgets the stored token and puts every view back on sample data.
pub async fn oauth_logout(data: web::Data<AppState>) -> impl Responder {
    if let Err(e) = data.identity.sign_out() {
        error!("Error removing stored token: {}", e);
        return HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }));
    }
    data.mailbox.disconnect();
    data.session_manager.for_each(|state| state.reset_to_seed());
    info!(
        "Signed out; {} view sessions back on sample data",
        data.session_manager.session_count()
    );
    HttpResponse::Ok().json(json!({ "authenticated": false }))
}
