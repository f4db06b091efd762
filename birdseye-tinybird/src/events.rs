use serde::{Deserialize, Serialize};

pub const RESPONSE_OBJECT: &str = "chat.completion";
pub const CALL_TYPE: &str = "completion";
pub const DEFAULT_EVENT_TYPE: &str = "chat_completion";
pub const UNKNOWN: &str = "unknown";
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Success,
    Error,
}

/// One row of the `llm_events` datasource, describing a single model call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub message_id: String,
    pub model: String,
    pub provider: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: u64,
    pub llm_api_duration_ms: u64,
    pub response: EventResponse,
    pub messages: Vec<EventMessage>,
    pub proxy_metadata: ProxyMetadata,
    pub user: String,
    pub standard_logging_object_status: EventStatus,
    pub standard_logging_object_response_time: u64,
    pub log_event_type: String,
    pub call_type: String,
    pub cache_hit: bool,
    /// Present only on failed calls; both keys are omitted on success.
    #[serde(flatten)]
    pub failure: Option<EventFailure>,
}

impl AnalyticsEvent {
    pub fn status(&self) -> EventStatus {
        self.standard_logging_object_status
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFailure {
    pub exception: String,
    pub traceback: String,
}

/// Completion envelope shaped like an OpenAI chat completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: String,
    pub object: String,
    pub usage: EventUsage,
    pub choices: Vec<EventChoice>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl EventUsage {
    /// `total_tokens` is always recomputed from the two sides.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChoice {
    pub message: ChoiceMessage,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    pub role: String,
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyMetadata {
    pub organization: String,
    pub project: String,
    pub environment: String,
    pub chat_id: String,
}
