use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{error, info, warn};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl,
};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, GMAIL_SCOPE, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL};
use crate::services::gmail_service::{GmailClient, GmailError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("OAuth configuration error: {0}")]
    Config(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error(transparent)]
    Gmail(#[from] GmailError),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        AuthError::TokenStore(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        AuthError::TokenStore(error.to_string())
    }
}

/// The token blob as persisted after a code exchange.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenCache {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Durable token storage. A stored token counts as signed in; expiry is not checked.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<TokenCache>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_json(&self, token_json: &str) -> Result<TokenCache, AuthError> {
        let token: TokenCache = serde_json::from_str(token_json)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token_json)?;
        Ok(token)
    }

    pub fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// The connected mailbox, if any. Holds the only [`GmailClient`]; it is
/// created when a token is loaded and dropped on sign-out.
#[derive(Clone, Default)]
pub struct MailboxContext {
    client: Arc<RwLock<Option<Arc<GmailClient>>>>,
}

impl MailboxContext {
    pub fn client(&self) -> Option<Arc<GmailClient>> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client().is_some()
    }

    pub fn connect(&self, client: GmailClient) {
        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(client));
    }

    pub fn disconnect(&self) {
        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// OAuth2 authorization-code flow against Google, plus token persistence.
pub struct IdentityGateway {
    oauth_client: BasicClient,
    token_store: TokenStore,
    api_base: String,
}

impl IdentityGateway {
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| AuthError::Config(format!("Invalid authorization endpoint URL: {}", e)))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| AuthError::Config(format!("Invalid token endpoint URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| AuthError::Config(format!("Invalid redirect URL: {}", e)))?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(IdentityGateway {
            oauth_client,
            token_store: TokenStore::new(config.token_cache_path()),
            api_base: config.gmail_api_base.clone(),
        })
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    /// URL to send the browser to, and the CSRF state it will echo back.
    pub fn authorize_url(&self) -> (String, String) {
        let (auth_url, csrf_token) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(GMAIL_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .url();
        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchanges an authorization code for tokens and persists them.
    pub async fn exchange_code(&self, code: String) -> Result<TokenCache, AuthError> {
        let token = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                error!("Token exchange error: {:?}", e);
                AuthError::TokenExchange(e.to_string())
            })?;

        let token_json = serde_json::to_string(&token)?;
        let cache = self.token_store.save_json(&token_json)?;
        info!("Token successfully obtained and cached.");
        Ok(cache)
    }

    pub fn client_for(&self, token: &TokenCache) -> Result<GmailClient, AuthError> {
        Ok(GmailClient::new(token.access_token.clone(), self.api_base.clone())?)
    }

    /// Builds the mailbox client from a previously stored token, if there is one.
    pub fn restore(&self) -> Option<GmailClient> {
        match self.token_store.load() {
            Ok(Some(token)) => match self.client_for(&token) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("Stored token unusable: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Error loading stored token: {}", e);
                None
            }
        }
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.token_store.clear()?;
        info!("Stored token removed.");
        Ok(())
    }
}
