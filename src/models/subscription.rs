use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Newsletter,
    Jobs,
    Education,
    Shopping,
    Entertainment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Newsletter,
        Category::Jobs,
        Category::Education,
        Category::Shopping,
        Category::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Newsletter => "newsletter",
            Category::Jobs => "jobs",
            Category::Education => "education",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

/// One sender-level entry representing a presumed recurring email relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    pub sender_name: String,
    pub sender_email: String,
    pub category: Category,
    pub frequency: Frequency,
    pub last_email_date: NaiveDate,
    pub description: String,
    pub unread_count: u32,
    pub is_active: bool,
}

impl fmt::Display for SubscriptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> [{}, {:?}] last {} unread {}{}",
            self.sender_name,
            self.sender_email,
            self.category,
            self.frequency,
            self.last_email_date,
            self.unread_count,
            if self.is_active { "" } else { " (unsubscribed)" }
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    name: &str,
    email: &str,
    category: Category,
    frequency: Frequency,
    (y, m, d): (i32, u32, u32),
    description: &str,
    unread_count: u32,
    is_active: bool,
) -> SubscriptionRecord {
    SubscriptionRecord {
        id: id.to_string(),
        sender_name: name.to_string(),
        sender_email: email.to_string(),
        category,
        frequency,
        last_email_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
        description: description.to_string(),
        unread_count,
        is_active,
    }
}

/// Sample list shown whenever no mailbox is connected or loading one failed.
pub fn seed_subscriptions() -> Vec<SubscriptionRecord> {
    vec![
        seed(
            "1",
            "Medium Daily Digest",
            "noreply@medium.com",
            Category::Newsletter,
            Frequency::Daily,
            (2024, 1, 5),
            "Daily curated stories from Medium writers",
            12,
            true,
        ),
        seed(
            "2",
            "LinkedIn Job Alerts",
            "jobs-noreply@linkedin.com",
            Category::Jobs,
            Frequency::Weekly,
            (2024, 1, 4),
            "Personalized job recommendations",
            3,
            true,
        ),
        seed(
            "3",
            "Coursera Course Updates",
            "no-reply@coursera.org",
            Category::Education,
            Frequency::Weekly,
            (2024, 1, 3),
            "Updates on your enrolled courses",
            5,
            true,
        ),
        seed(
            "4",
            "Amazon Deals",
            "store-news@amazon.com",
            Category::Shopping,
            Frequency::Daily,
            (2024, 1, 5),
            "Daily deals and recommendations",
            25,
            true,
        ),
        seed(
            "5",
            "TechCrunch Newsletter",
            "newsletter@techcrunch.com",
            Category::Newsletter,
            Frequency::Daily,
            (2024, 1, 5),
            "Latest tech news and startup updates",
            8,
            true,
        ),
        seed(
            "6",
            "Spotify Weekly Recap",
            "no-reply@spotify.com",
            Category::Entertainment,
            Frequency::Weekly,
            (2024, 1, 1),
            "Your weekly music statistics",
            1,
            false,
        ),
    ]
}
