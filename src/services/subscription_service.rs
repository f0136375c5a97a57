use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};

use crate::config::{
    CANDIDATE_MAX_RESULTS, ENRICHMENT_CONCURRENCY, MAX_CANDIDATE_MESSAGES, SUBSCRIPTION_QUERY,
};
use crate::models::message::MessageSummary;
use crate::models::subscription::SubscriptionRecord;
use crate::services::extraction::{extract_subscriptions, MailboxUnreadLookup};
use crate::services::gmail_service::{GmailError, MailApi};

/// Fetches headers for each id, keeping input order. Messages that fail to
/// load or lack a From/Subject header are logged and dropped.
pub async fn fetch_summaries(api: &dyn MailApi, message_ids: &[String]) -> Vec<MessageSummary> {
    stream::iter(message_ids)
        .map(|id| async move { (id, api.get_message_summary(id).await) })
        .buffered(ENRICHMENT_CONCURRENCY)
        .filter_map(|(id, result)| async move {
            match result {
                Ok(Some(summary)) => Some(summary),
                Ok(None) => {
                    warn!("Message {} has no From or Subject header; skipping", id);
                    None
                }
                Err(e) => {
                    error!("Error processing message {}: {}", id, e);
                    None
                }
            }
        })
        .collect()
        .await
}

/// One extraction run against the connected mailbox.
///
/// Only a failure to list candidates is returned as an error; everything
/// that goes wrong for a single message just drops that message.
pub async fn fetch_subscriptions(api: &dyn MailApi) -> Result<Vec<SubscriptionRecord>, GmailError> {
    info!("Searching mailbox for subscription candidates");
    let mut message_ids = api
        .list_message_ids(SUBSCRIPTION_QUERY, CANDIDATE_MAX_RESULTS)
        .await?;
    message_ids.truncate(MAX_CANDIDATE_MESSAGES);

    info!("Loading headers for {} candidate messages", message_ids.len());
    let summaries = fetch_summaries(api, &message_ids).await;

    let records = extract_subscriptions(&summaries, &MailboxUnreadLookup(api)).await;
    info!("Extraction run produced {} subscriptions", records.len());
    for record in &records {
        debug!("{}", record);
    }
    Ok(records)
}
