use serde::{Deserialize, Serialize};

/// Response of `users.messages.list`. Gmail omits `messages` when nothing matched.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub result_size_estimate: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub payload: Option<MessagePayload>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Message {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Reduces a full message to the headers the extraction run looks at.
    /// Messages without a `From` or `Subject` header yield `None`.
    pub fn summary(&self) -> Option<MessageSummary> {
        Some(MessageSummary {
            from: self.header("From")?.to_string(),
            subject: self.header("Subject")?.to_string(),
            date: self.header("Date").map(String::from),
        })
    }
}

/// Headers of one candidate message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub from: String,
    pub subject: String,
    pub date: Option<String>,
}

impl MessageSummary {
    pub fn new(from: &str, subject: &str, date: Option<&str>) -> Self {
        MessageSummary {
            from: from.to_string(),
            subject: subject.to_string(),
            date: date.map(String::from),
        }
    }
}
