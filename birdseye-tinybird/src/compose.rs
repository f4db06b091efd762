use std::error::Error as StdError;
use std::sync::Arc;

use birdseye_core::{CallOptions, Completion, ModelError, Prompt};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::events::{
    ChoiceMessage, EventChoice, EventFailure, EventMessage, EventResponse, EventUsage,
    ProxyMetadata, CALL_TYPE, DEFAULT_EVENT_TYPE, RESPONSE_OBJECT, UNKNOWN, UNKNOWN_ERROR,
};
use crate::{AnalyticsEvent, EventStatus, EventTags, Sanitizer, TinybirdConfig};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// How the wrapped call settled.
#[derive(Clone, Copy, Debug)]
pub enum CallOutcome<'a> {
    Generated(&'a Completion),
    /// A stream was opened; nothing about its content is known yet.
    Streamed,
    Failed(&'a ModelError),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ModelIdentity<'a> {
    pub model_id: Option<&'a str>,
    pub provider: Option<&'a str>,
}

#[derive(Clone, Copy, Debug)]
pub struct CallRecord<'a> {
    pub identity: ModelIdentity<'a>,
    pub start_time: DateTime<Utc>,
    pub outcome: CallOutcome<'a>,
    pub options: &'a CallOptions,
}

/// Builds [`AnalyticsEvent`]s from settled calls.
///
/// Composition never fails: anything missing from the call falls back to the
/// defaults documented on each field.
#[derive(Clone)]
pub struct EventComposer {
    tags: EventTags,
    sanitizer: Sanitizer,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for EventComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventComposer")
            .field("tags", &self.tags)
            .field("sanitizer", &self.sanitizer)
            .finish()
    }
}

impl EventComposer {
    pub fn new(config: &TinybirdConfig) -> Self {
        Self {
            tags: config.tags.clone(),
            sanitizer: Sanitizer::new(config.redact_regex.clone(), config.max_content_bytes),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn compose(&self, record: CallRecord<'_>) -> AnalyticsEvent {
        let id = self.ids.next_id();
        let end_time = self.clock.now();
        let duration = elapsed_ms(record.start_time, end_time);

        let completion = match record.outcome {
            CallOutcome::Generated(completion) => Some(completion),
            CallOutcome::Streamed | CallOutcome::Failed(_) => None,
        };
        let (status, failure) = match record.outcome {
            CallOutcome::Failed(error) => (EventStatus::Error, Some(self.describe_failure(error))),
            _ => (EventStatus::Success, None),
        };

        let model = first_present(&[
            record.identity.model_id,
            completion.and_then(|c| c.model_id.as_deref()),
        ])
        .unwrap_or(UNKNOWN);
        let provider = first_present(&[
            record.identity.provider,
            completion.and_then(|c| c.provider.as_deref()),
        ])
        .unwrap_or(UNKNOWN);

        AnalyticsEvent {
            message_id: id.clone(),
            model: model.to_string(),
            provider: provider.to_string(),
            start_time: format_timestamp(record.start_time),
            end_time: format_timestamp(end_time),
            duration,
            llm_api_duration_ms: duration,
            response: self.response_envelope(&id, completion),
            messages: self.normalize_messages(record.options),
            proxy_metadata: ProxyMetadata {
                organization: tag_or(&self.tags.organization, ""),
                project: tag_or(&self.tags.project, ""),
                environment: tag_or(&self.tags.environment, ""),
                chat_id: tag_or(&self.tags.chat_id, ""),
            },
            user: tag_or(&self.tags.user, UNKNOWN),
            standard_logging_object_status: status,
            standard_logging_object_response_time: duration,
            log_event_type: tag_or(&self.tags.event, DEFAULT_EVENT_TYPE),
            call_type: CALL_TYPE.to_string(),
            cache_hit: false,
            failure,
            id,
        }
    }

    fn response_envelope(&self, id: &str, completion: Option<&Completion>) -> EventResponse {
        let usage = completion.and_then(|c| c.usage).unwrap_or_default();
        let text = completion
            .and_then(|c| c.text.as_deref())
            .map(|text| self.sanitizer.clean(text))
            .unwrap_or_default();

        EventResponse {
            id: id.to_string(),
            object: RESPONSE_OBJECT.to_string(),
            usage: EventUsage::new(
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
            ),
            choices: vec![EventChoice {
                message: ChoiceMessage { content: text },
            }],
        }
    }

    fn normalize_messages(&self, options: &CallOptions) -> Vec<EventMessage> {
        match &options.prompt {
            None => Vec::new(),
            Some(Prompt::Text(text)) if text.is_empty() => Vec::new(),
            Some(Prompt::Text(text)) => vec![EventMessage {
                role: "user".to_string(),
                content: self.sanitizer.clean(text),
            }],
            Some(Prompt::Messages(messages)) => messages
                .iter()
                .map(|message| EventMessage {
                    role: message.role.as_str().to_string(),
                    content: self.sanitizer.clean(&message.content),
                })
                .collect(),
        }
    }

    fn describe_failure(&self, error: &ModelError) -> EventFailure {
        let message = error.to_string();
        let exception = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            self.sanitizer.clean(&message)
        };
        EventFailure {
            exception,
            traceback: self.sanitizer.clean(&cause_chain(error)),
        }
    }
}

/// Renders `source()` causes one per line; empty when the error has none.
fn cause_chain(error: &(dyn StdError + 'static)) -> String {
    let mut lines = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}

fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.is_empty())
}

fn tag_or(tag: &Option<String>, fallback: &str) -> String {
    match tag.as_deref() {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback.to_string(),
    }
}
