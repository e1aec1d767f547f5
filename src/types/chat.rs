use serde::{Deserialize, Serialize};

use crate::db::ChatMessageRecord;
use crate::time::format_timestamp;

/// Reply stored after every user message until a real assistant is wired in.
pub const SIMULATED_REPLY: &str = "This is a simulated AI response";

pub const HISTORY_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
}

impl HistoryQuery {
    /// 1-based page number. Missing, non-numeric and non-positive values all
    /// mean the first page.
    pub fn page(&self) -> u64 {
        match self.page.as_deref().map(str::trim).map(str::parse::<u64>) {
            Some(Ok(page)) if page >= 1 => page,
            _ => 1,
        }
    }

    /// Row offset of the page, capped at `i64::MAX` which is the largest
    /// value SQLite accepts. Pages that far out are simply empty.
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(HISTORY_PAGE_SIZE)
            .min(i64::MAX as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub content: String,

    /// 1 for messages written by the user, 0 for replies.
    #[serde(rename = "isUser")]
    pub is_user: u8,

    pub timestamp: String,
}

impl From<ChatMessageRecord> for ChatMessage {
    fn from(record: ChatMessageRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            is_user: u8::from(record.is_user),
            timestamp: format_timestamp(record.create_time),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<ChatMessage>,
}
