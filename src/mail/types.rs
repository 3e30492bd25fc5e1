use serde::{Deserialize, Serialize};

/// Opaque thread identifier assigned by the mail service.
pub type ThreadRef = String;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email_address: String,
}

/// One page of a thread search.
///
/// An empty `next_page_token` means there are no further pages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    #[serde(default)]
    pub threads: Vec<ThreadSummary>,
    #[serde(default)]
    pub next_page_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThreadSummary {
    pub id: ThreadRef,
}

/// A conversation with its messages, oldest first as returned by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadRef,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Milliseconds since the epoch, sent by Gmail as a decimal string
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: MessagePart,
}

impl Message {
    pub fn internal_date_ms(&self) -> Option<i64> {
        self.internal_date.as_deref()?.parse().ok()
    }

    pub fn headers(&self) -> &[Header] {
        &self.payload.headers
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
impl Header {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// A reply ready for the send endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    /// RFC 5322 message, URL-safe base64 without padding
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadRef>,
}
