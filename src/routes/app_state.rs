use std::sync::Arc;

use log::info;

use crate::config::AppConfig;
use crate::models::session_manager::SessionManager;
use crate::services::auth_service::{AuthError, IdentityGateway, MailboxContext};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityGateway>,
    pub mailbox: MailboxContext,
    pub session_manager: SessionManager,
}

impl AppState {
    /// Builds the shared state and reconnects the mailbox from a stored token.
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        let identity = IdentityGateway::new(config)?;
        let mailbox = MailboxContext::default();
        if let Some(client) = identity.restore() {
            info!("Restored Gmail connection from {}", identity.token_store().path().display());
            mailbox.connect(client);
        }
        Ok(AppState {
            identity: Arc::new(identity),
            mailbox,
            session_manager: SessionManager::new(),
        })
    }
}
