use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::StatusCode;
use url::Url;

use crate::config::{REQUEST_TIMEOUT_SECS, UNREAD_MAX_RESULTS};
use crate::models::message::{Message, MessageList, MessageSummary};

#[derive(Debug, thiserror::Error)]
pub enum GmailError {
    #[error("Not authenticated")]
    AuthenticationMissing,

    #[error("Gmail API error: {status}")]
    Api { status: StatusCode },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid Gmail URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Could not parse {0}")]
    ParseFailure(String),
}

/// Read-only calls the extraction run makes against the mailbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailApi: Send + Sync {
    /// Ids of messages matching a Gmail search query, at most `max_results`.
    async fn list_message_ids(&self, query: &str, max_results: u32) -> Result<Vec<String>, GmailError>;

    /// From/Subject/Date headers of one message; `None` when From or Subject is missing.
    async fn get_message_summary(&self, message_id: &str) -> Result<Option<MessageSummary>, GmailError>;

    /// Number of unread messages from `sender_email`, capped by the listing page size.
    async fn count_unread(&self, sender_email: &str) -> Result<u32, GmailError>;
}

/// An authenticated Gmail REST client. One exists per connected mailbox and
/// is dropped on sign-out.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>, api_base: impl Into<String>) -> Result<Self, GmailError> {
        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(GmailError::AuthenticationMissing);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(GmailClient {
            http,
            access_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GmailError> {
        Ok(Url::parse(&format!("{}{}", self.api_base, path))?)
    }

    fn messages_url(&self, query: &str, max_results: u32) -> Result<Url, GmailError> {
        let mut url = self.endpoint("/users/me/messages")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("maxResults", &max_results.to_string());
        Ok(url)
    }

    fn message_url(&self, message_id: &str) -> Result<Url, GmailError> {
        let mut url = self.endpoint("/users/me/messages/")?;
        url.path_segments_mut()
            .map_err(|_| GmailError::ParseFailure(format!("message url for {}", message_id)))?
            .pop_if_empty()
            .push(message_id);
        url.query_pairs_mut()
            .append_pair("format", "metadata")
            .append_pair("metadataHeaders", "From")
            .append_pair("metadataHeaders", "Subject")
            .append_pair("metadataHeaders", "Date");
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, GmailError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Gmail API returned {}", status);
            return Err(GmailError::Api { status });
        }
        Ok(response.json::<T>().await?)
    }

    async fn list(&self, query: &str, max_results: u32) -> Result<MessageList, GmailError> {
        self.get_json(self.messages_url(query, max_results)?).await
    }
}

#[async_trait]
impl MailApi for GmailClient {
    async fn list_message_ids(&self, query: &str, max_results: u32) -> Result<Vec<String>, GmailError> {
        info!("Listing messages matching '{}'", query);
        let list = self.list(query, max_results).await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message_summary(&self, message_id: &str) -> Result<Option<MessageSummary>, GmailError> {
        debug!("Fetching message details for ID: {}", message_id);
        let message: Message = self.get_json(self.message_url(message_id)?).await?;
        Ok(message.summary())
    }

    async fn count_unread(&self, sender_email: &str) -> Result<u32, GmailError> {
        let query = format!("from:{} is:unread", sender_email);
        let list = self.list(&query, UNREAD_MAX_RESULTS).await?;
        Ok(list.messages.len() as u32)
    }
}
