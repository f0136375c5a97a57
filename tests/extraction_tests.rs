use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use email_oasis::config::MAX_CANDIDATE_MESSAGES;
use email_oasis::models::message::MessageSummary;
use email_oasis::models::subscription::{Category, Frequency};
use email_oasis::services::extraction::{extract_subscriptions, UnreadLookup, UNREAD_FALLBACK_MAX};
use email_oasis::services::gmail_service::GmailError;

/// Unread lookup with fixed answers; senders listed in `failing` error out.
#[derive(Default)]
struct FakeUnread {
    count: u32,
    failing: HashSet<String>,
    asked: Mutex<Vec<String>>,
}

#[async_trait]
impl UnreadLookup for FakeUnread {
    async fn unread_count(&self, sender_email: &str) -> Result<u32, GmailError> {
        self.asked.lock().unwrap().push(sender_email.to_string());
        if self.failing.contains(sender_email) {
            return Err(GmailError::Api { status: StatusCode::TOO_MANY_REQUESTS });
        }
        Ok(self.count)
    }
}

fn msg(from: &str, subject: &str) -> MessageSummary {
    MessageSummary::new(from, subject, Some("Mon, 1 Jan 2024 09:00:00 +0000"))
}

#[tokio::test]
async fn non_subscription_message_produces_no_record() {
    let _ = env_logger::builder().is_test(true).try_init();
    let lookup = FakeUnread::default();
    let records = extract_subscriptions(&[msg("person@example.com", "Hello")], &lookup).await;
    assert!(records.is_empty());
    assert!(lookup.asked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn same_sender_yields_one_record_from_first_message() {
    let lookup = FakeUnread { count: 7, ..Default::default() };
    let messages = vec![
        MessageSummary::new(
            "Medium Daily <noreply@medium.com>",
            "Your daily digest",
            Some("Fri, 5 Jan 2024 06:00:00 +0000"),
        ),
        MessageSummary::new(
            "Medium Jobs <noreply@medium.com>",
            "Careers at Medium",
            Some("Sat, 6 Jan 2024 06:00:00 +0000"),
        ),
    ];

    let records = extract_subscriptions(&messages, &lookup).await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.sender_name, "Medium Daily");
    assert_eq!(record.sender_email, "noreply@medium.com");
    assert_eq!(record.category, Category::Newsletter);
    assert_eq!(record.last_email_date.to_string(), "2024-01-05");
    assert_eq!(record.description, "Medium Daily from medium.com");
    assert_eq!(record.unread_count, 7);
    assert!(record.is_active);
    assert_eq!(*lookup.asked.lock().unwrap(), vec!["noreply@medium.com".to_string()]);
}

#[tokio::test]
async fn job_rule_wins_over_newsletter_rule() {
    let records = extract_subscriptions(
        &[msg("jobs@linkedin.com newsletter updates", "")],
        &FakeUnread::default(),
    )
    .await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, Category::Jobs);
}

#[tokio::test]
async fn unmatched_category_defaults_to_newsletter() {
    let records = extract_subscriptions(
        &[msg("team@acme.io", "Click here to unsubscribe")],
        &FakeUnread::default(),
    )
    .await;
    assert_eq!(records[0].category, Category::Newsletter);
    assert_eq!(records[0].frequency, Frequency::Weekly);
    // No display name: the record shows the address, the description says "Updates".
    assert_eq!(records[0].sender_name, "team@acme.io");
    assert_eq!(records[0].description, "Updates from acme.io");
}

#[tokio::test]
async fn failed_unread_lookup_keeps_the_record() {
    let lookup = FakeUnread {
        count: 3,
        failing: ["alerts@bank.com".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let messages = vec![
        msg("Bank <alerts@bank.com>", "Security alert"),
        msg("Shop <deals@shop.com>", "Weekly offer"),
    ];

    let records = extract_subscriptions(&messages, &lookup).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sender_email, "alerts@bank.com");
    assert!(records[0].unread_count < UNREAD_FALLBACK_MAX);
    assert_eq!(records[1].unread_count, 3);
    assert_eq!(records[1].category, Category::Shopping);
}

#[tokio::test]
async fn output_follows_first_seen_order_and_ids_are_unique() {
    let messages = vec![
        msg("A <a@daily.example.com>", "newsletter"),
        msg("B <b@example.com>", "promo inside"),
        msg("A again <a@daily.example.com>", "newsletter"),
        msg("C <monthly@example.com>", "no-reply"),
    ];
    let records = extract_subscriptions(&messages, &FakeUnread::default()).await;

    let senders: Vec<_> = records.iter().map(|r| r.sender_email.as_str()).collect();
    assert_eq!(senders, vec!["a@daily.example.com", "b@example.com", "monthly@example.com"]);
    assert_eq!(records[0].frequency, Frequency::Daily);
    assert_eq!(records[2].frequency, Frequency::Monthly);

    let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), records.len());
}

#[tokio::test]
async fn never_more_records_than_distinct_senders_or_the_cap() {
    let messages: Vec<_> = (0..120)
        .map(|i| msg(&format!("List {} <list{}@example.com>", i % 80, i % 80), "weekly digest"))
        .collect();
    let records = extract_subscriptions(&messages, &FakeUnread::default()).await;
    assert_eq!(records.len(), MAX_CANDIDATE_MESSAGES);

    let few: Vec<_> = (0..10)
        .map(|i| msg(&format!("<list{}@example.com>", i % 3), "weekly digest"))
        .collect();
    assert_eq!(extract_subscriptions(&few, &FakeUnread::default()).await.len(), 3);
}

#[tokio::test]
async fn first_message_of_a_sender_decides_even_when_rejected() {
    let messages = vec![
        msg("Friend <pal@example.com>", "Lunch?"),
        msg("Friend <pal@example.com>", "Weekly newsletter"),
    ];
    let records = extract_subscriptions(&messages, &FakeUnread::default()).await;
    assert!(records.is_empty());
}
