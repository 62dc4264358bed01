use serde::{Deserialize, Serialize};

pub type ThreadId = i64;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    /// Decodes the store's message box enum. Only `inbound_box` means
    /// received; every other value is treated as sent.
    pub fn from_msg_box(msg_box: i64, inbound_box: i64) -> Self {
        if msg_box == inbound_box {
            Direction::Received
        } else {
            Direction::Sent
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Attachment {
    pub part_id: String,
    pub mime_type: Option<String>,
    pub uri: String,
    pub data: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CompositeMessage {
    pub mms_id: String,
    pub thread_id: ThreadId,
    /// Unix ms, derived from the store's second resolution.
    pub timestamp: i64,
    pub direction: Direction,
    pub parts: Vec<Attachment>,
}

#[derive(Deserialize)]
pub struct MediaQueryParams {
    pub address: Option<String>,
    #[serde(default)]
    pub from: i64,
    pub to: Option<i64>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub address: String,
    pub thread_id: Option<ThreadId>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MmsDebugRow {
    pub mms_id: Option<String>,
    pub thread_id: Option<i64>,
    pub date: Option<i64>,
    pub msg_box: Option<i64>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DebugReport {
    pub total_mms_count: usize,
    pub mms_details: Vec<MmsDebugRow>,
    pub total_parts_count: usize,
    pub parts_columns: Vec<String>,
    pub current_package: Option<String>,
    pub default_sms_package: Option<String>,
    pub is_default_sms: bool,
    pub generated_at: i64,
}

#[derive(Deserialize)]
pub struct CachePartRequest {
    pub uri: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CachedPart {
    pub file_uri: String,
    pub mime_type: Option<String>,
    pub size: u64,
}
