//! Subscription extraction heuristic.
//!
//! Turns candidate message headers into deduplicated [`SubscriptionRecord`]s:
//! one record per sender, classified by keyword matching on the From and
//! Subject headers. The matching is deliberately literal; a sender whose
//! address contains `daily` is a daily sender, whatever it actually sends.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use crate::config::{ENRICHMENT_CONCURRENCY, MAX_CANDIDATE_MESSAGES};
use crate::models::message::MessageSummary;
use crate::models::subscription::{Category, Frequency, SubscriptionRecord};
use crate::services::gmail_service::{GmailError, MailApi};

const SUBSCRIPTION_KEYWORDS: [&str; 16] = [
    "newsletter",
    "unsubscribe",
    "subscription",
    "digest",
    "update",
    "notification",
    "alert",
    "weekly",
    "daily",
    "monthly",
    "noreply",
    "no-reply",
    "automated",
    "marketing",
    "promo",
    "offer",
];

/// Checked in order; the first rule with a matching keyword decides the category.
const CATEGORY_RULES: [(Category, &[&str]); 5] = [
    (Category::Jobs, &["job", "career", "linkedin"]),
    (Category::Education, &["course", "learn", "education"]),
    (Category::Shopping, &["shop", "deal", "sale", "amazon"]),
    (Category::Entertainment, &["entertainment", "music", "video", "spotify"]),
    (Category::Newsletter, &["newsletter", "news", "blog"]),
];

/// Upper bound (exclusive) of the made-up unread count used when the lookup fails.
pub const UNREAD_FALLBACK_MAX: u32 = 20;

lazy_static! {
    static ref ANGLE_ADDRESS: Regex = Regex::new(r"<(.+)>").unwrap();
    static ref DISPLAY_NAME: Regex = Regex::new(r"^(.+?)\s*<").unwrap();
    static ref TRAILING_COMMENT: Regex = Regex::new(r"\s*\([^()]*\)\s*$").unwrap();
}

/// Source of per-sender unread counts.
#[async_trait]
pub trait UnreadLookup: Send + Sync {
    async fn unread_count(&self, sender_email: &str) -> Result<u32, GmailError>;
}

/// Adapts any [`MailApi`] into an [`UnreadLookup`].
pub struct MailboxUnreadLookup<'a>(pub &'a dyn MailApi);

#[async_trait]
impl<'a> UnreadLookup for MailboxUnreadLookup<'a> {
    async fn unread_count(&self, sender_email: &str) -> Result<u32, GmailError> {
        self.0.count_unread(sender_email).await
    }
}

/// Splits a From header into `(sender_name, sender_email)`.
pub fn parse_from_header(from: &str) -> (String, String) {
    let email = ANGLE_ADDRESS
        .captures(from)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| from.to_string());

    let name = DISPLAY_NAME
        .captures(from)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace('"', "").trim().to_string())
        .unwrap_or_default();

    (name, email)
}

fn combined_text(from: &str, subject: &str) -> String {
    format!("{} {}", from, subject).to_lowercase()
}

pub fn is_subscription(from: &str, subject: &str) -> bool {
    let text = combined_text(from, subject);
    SUBSCRIPTION_KEYWORDS.iter().any(|k| text.contains(k))
}

pub fn categorize(from: &str, subject: &str) -> Category {
    let text = combined_text(from, subject);
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

fn domain_of(email: &str) -> Option<&str> {
    email.split('@').nth(1)
}

pub fn estimate_frequency(email: &str) -> Frequency {
    let domain = domain_of(email).unwrap_or("").to_lowercase();
    let mentions = |word: &str| domain.contains(word) || email.contains(word);

    if mentions("daily") {
        Frequency::Daily
    } else if mentions("weekly") {
        Frequency::Weekly
    } else if mentions("monthly") {
        Frequency::Monthly
    } else {
        Frequency::default()
    }
}

/// Parses a Date header (RFC 2822, or RFC 3339) into its UTC calendar date.
pub fn parse_email_date(date: &str) -> Result<NaiveDate, GmailError> {
    let trimmed = TRAILING_COMMENT.replace(date.trim(), "");
    DateTime::parse_from_rfc2822(&trimmed)
        .or_else(|_| DateTime::parse_from_rfc3339(&trimmed))
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|e| GmailError::ParseFailure(format!("date '{}': {}", date, e)))
}

/// Date of the message, or today when the header is missing or malformed.
pub fn last_email_date(date: Option<&str>, today: NaiveDate) -> NaiveDate {
    match date.map(parse_email_date) {
        Some(Ok(parsed)) => parsed,
        Some(Err(e)) => {
            debug!("{}; using today's date", e);
            today
        }
        None => today,
    }
}

pub fn describe(sender_name: &str, sender_email: &str) -> String {
    let name = if sender_name.is_empty() { "Updates" } else { sender_name };
    format!("{} from {}", name, domain_of(sender_email).unwrap_or(sender_email))
}

/// A record that passed classification and still needs its unread count.
struct Candidate {
    sender_name: String,
    sender_email: String,
    category: Category,
    frequency: Frequency,
    last_email_date: NaiveDate,
    description: String,
}

impl Candidate {
    fn from_message(message: &MessageSummary, seen: &mut HashSet<String>, today: NaiveDate) -> Option<Self> {
        let (sender_name, sender_email) = parse_from_header(&message.from);

        if !seen.insert(sender_email.clone()) {
            return None;
        }
        if !is_subscription(&message.from, &message.subject) {
            debug!("Skipping non-subscription sender {}", sender_email);
            return None;
        }

        Some(Candidate {
            category: categorize(&message.from, &message.subject),
            frequency: estimate_frequency(&sender_email),
            last_email_date: last_email_date(message.date.as_deref(), today),
            description: describe(&sender_name, &sender_email),
            sender_name: if sender_name.is_empty() {
                sender_email.clone()
            } else {
                sender_name
            },
            sender_email,
        })
    }

    fn into_record(self, unread_count: u32) -> SubscriptionRecord {
        SubscriptionRecord {
            id: Uuid::new_v4().to_string(),
            sender_name: self.sender_name,
            sender_email: self.sender_email,
            category: self.category,
            frequency: self.frequency,
            last_email_date: self.last_email_date,
            description: self.description,
            unread_count,
            is_active: true,
        }
    }
}

async fn unread_or_fallback<L: UnreadLookup + ?Sized>(lookup: &L, sender_email: &str) -> u32 {
    match lookup.unread_count(sender_email).await {
        Ok(count) => count,
        Err(e) => {
            let fallback = rand::thread_rng().gen_range(0..UNREAD_FALLBACK_MAX);
            warn!(
                "Unread count for {} unavailable ({}); using {}",
                sender_email, e, fallback
            );
            fallback
        }
    }
}

/// Classifies and deduplicates candidate messages, then fills in unread counts.
///
/// At most [`MAX_CANDIDATE_MESSAGES`] messages are inspected. The first
/// message seen from a sender decides that sender's record, and records come
/// out in the order their senders were first seen.
pub async fn extract_subscriptions<L>(messages: &[MessageSummary], lookup: &L) -> Vec<SubscriptionRecord>
where
    L: UnreadLookup + ?Sized,
{
    let today = Utc::now().date_naive();
    let mut seen = HashSet::new();
    let candidates: Vec<Candidate> = messages
        .iter()
        .take(MAX_CANDIDATE_MESSAGES)
        .filter_map(|m| Candidate::from_message(m, &mut seen, today))
        .collect();

    info!(
        "{} of {} candidate messages look like subscriptions",
        candidates.len(),
        messages.len().min(MAX_CANDIDATE_MESSAGES)
    );

    stream::iter(candidates)
        .map(|candidate| async move {
            let unread = unread_or_fallback(lookup, &candidate.sender_email).await;
            candidate.into_record(unread)
        })
        .buffered(ENRICHMENT_CONCURRENCY)
        .collect()
        .await
}
