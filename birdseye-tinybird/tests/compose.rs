use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use birdseye_core::{CallOptions, Completion, Message, ModelError, Prompt, Usage};
use birdseye_tinybird::{
    CallOutcome, CallRecord, Clock, EventComposer, EventStatus, IdGenerator, ModelIdentity,
    TinybirdConfig,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;
use secrecy::SecretString;
use serde_json::Value;

struct StepClock {
    base: DateTime<Utc>,
    step_ms: i64,
    ticks: AtomicI64,
}

impl StepClock {
    fn new(step_ms: i64) -> Self {
        Self {
            base: Utc.with_ymd_and_hms(2026, 2, 3, 10, 0, 0).unwrap(),
            step_ms,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + Duration::milliseconds(tick * self.step_ms)
    }
}

struct CountingIds(AtomicUsize);

impl IdGenerator for CountingIds {
    fn next_id(&self) -> String {
        format!("evt-{}", self.0.fetch_add(1, Ordering::SeqCst))
    }
}

fn config() -> TinybirdConfig {
    TinybirdConfig::new(SecretString::new("token".to_string()), "http://localhost")
}

fn composer(config: &TinybirdConfig, step_ms: i64) -> EventComposer {
    EventComposer::new(config)
        .with_clock(Arc::new(StepClock::new(step_ms)))
        .with_id_generator(Arc::new(CountingIds(AtomicUsize::new(0))))
}

#[test]
fn success_event_carries_completion_and_timing() {
    let composer = composer(&config(), 250);
    let start = composer.now();
    let completion = Completion::text("world")
        .with_usage(Usage::new(1, 1))
        .with_model("m1", "p1");
    let options = CallOptions::new("hello");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: start,
        outcome: CallOutcome::Generated(&completion),
        options: &options,
    });

    assert_eq!(event.id, "evt-0");
    assert_eq!(event.message_id, event.id);
    assert_eq!(event.response.id, event.id);
    assert_eq!(event.model, "m1");
    assert_eq!(event.provider, "p1");
    assert_eq!(event.start_time, "2026-02-03T10:00:00.000Z");
    assert_eq!(event.end_time, "2026-02-03T10:00:00.250Z");
    assert_eq!(event.duration, 250);
    assert_eq!(event.llm_api_duration_ms, 250);
    assert_eq!(event.standard_logging_object_response_time, 250);
    assert_eq!(event.status(), EventStatus::Success);
    assert_eq!(event.response.object, "chat.completion");
    assert_eq!(event.response.usage.total_tokens, 2);
    assert_eq!(event.response.choices.len(), 1);
    assert_eq!(event.response.choices[0].message.content, "world");
    assert_eq!(event.messages.len(), 1);
    assert_eq!(event.messages[0].role, "user");
    assert_eq!(event.messages[0].content, "hello");
    assert!(event.failure.is_none());
}

#[test]
fn absent_completion_fields_fall_back_to_defaults() {
    let composer = composer(&config(), 0);
    let completion = Completion::default();
    let options = CallOptions::default();

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Generated(&completion),
        options: &options,
    });

    assert_eq!(event.model, "unknown");
    assert_eq!(event.provider, "unknown");
    assert_eq!(event.response.usage.prompt_tokens, 0);
    assert_eq!(event.response.usage.completion_tokens, 0);
    assert_eq!(event.response.usage.total_tokens, 0);
    assert_eq!(event.response.choices[0].message.content, "");
    assert!(event.messages.is_empty());
    assert_eq!(event.duration, 0);
}

#[test]
fn partial_usage_still_sums_to_total() {
    let composer = composer(&config(), 0);
    let completion = Completion {
        usage: Some(Usage {
            prompt_tokens: Some(7),
            completion_tokens: None,
        }),
        ..Completion::default()
    };
    let options = CallOptions::default();

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Generated(&completion),
        options: &options,
    });

    assert_eq!(event.response.usage.prompt_tokens, 7);
    assert_eq!(event.response.usage.completion_tokens, 0);
    assert_eq!(event.response.usage.total_tokens, 7);
}

#[test]
fn model_identity_prefers_capability_over_completion() {
    let composer = composer(&config(), 0);
    let completion = Completion::text("x").with_model("served-model", "served-provider");
    let options = CallOptions::new("q");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity {
            model_id: Some("gpt-4o-mini"),
            provider: Some(""),
        },
        start_time: composer.now(),
        outcome: CallOutcome::Generated(&completion),
        options: &options,
    });

    assert_eq!(event.model, "gpt-4o-mini");
    // An empty identity counts as missing.
    assert_eq!(event.provider, "served-provider");
}

#[test]
fn streamed_call_has_empty_response() {
    let composer = composer(&config(), 40);
    let options = CallOptions::new("tell me a story");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity {
            model_id: Some("m"),
            provider: Some("p"),
        },
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    assert_eq!(event.status(), EventStatus::Success);
    assert_eq!(event.response.usage.total_tokens, 0);
    assert_eq!(event.response.choices[0].message.content, "");
    assert_eq!(event.messages[0].content, "tell me a story");
    assert_eq!(event.duration, 40);
}

#[test]
fn error_event_includes_exception_and_traceback() {
    let composer = composer(&config(), 5);
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "socket timed out");
    let error = ModelError::transport(io);
    let options = CallOptions::new("x");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Failed(&error),
        options: &options,
    });

    assert_eq!(event.status(), EventStatus::Error);
    let failure = event.failure.as_ref().unwrap();
    assert_eq!(failure.exception, "Transport failed: socket timed out");
    assert_eq!(failure.traceback, "caused by: socket timed out");
    assert_eq!(event.response.usage.total_tokens, 0);
    assert_eq!(event.response.choices[0].message.content, "");
}

#[test]
fn error_without_message_or_source_uses_fallbacks() {
    let composer = composer(&config(), 0);
    let error = ModelError::Custom(String::new());
    let options = CallOptions::default();

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Failed(&error),
        options: &options,
    });

    let failure = event.failure.unwrap();
    assert_eq!(failure.exception, "Unknown error");
    assert_eq!(failure.traceback, "");
}

#[test]
fn error_fields_only_serialized_on_failure() {
    let composer = composer(&config(), 0);
    let completion = Completion::text("ok");
    let error = ModelError::Custom("timeout".to_string());
    let options = CallOptions::new("x");

    let success = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Generated(&completion),
        options: &options,
    });
    let success: Value = serde_json::to_value(&success).unwrap();
    assert!(success.get("exception").is_none());
    assert!(success.get("traceback").is_none());
    assert_eq!(success["standard_logging_object_status"], "success");

    let failed = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Failed(&error),
        options: &options,
    });
    let failed: Value = serde_json::to_value(&failed).unwrap();
    assert_eq!(failed["exception"], "timeout");
    assert_eq!(failed["traceback"], "");
    assert_eq!(failed["standard_logging_object_status"], "error");
}

#[test]
fn chat_prompt_keeps_message_order_and_roles() {
    let composer = composer(&config(), 0);
    let options = CallOptions::new(Prompt::Messages(vec![
        Message::system("be terse"),
        Message::user("hi"),
        Message::assistant("hello"),
    ]));

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    let pairs: Vec<(&str, &str)> = event
        .messages
        .iter()
        .map(|m| (m.role.as_str(), m.content.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("system", "be terse"), ("user", "hi"), ("assistant", "hello")]
    );
}

#[test]
fn empty_text_prompt_yields_no_messages() {
    let composer = composer(&config(), 0);
    let options = CallOptions::new("");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    assert!(event.messages.is_empty());
}

#[test]
fn tags_default_when_unset_or_empty() {
    let composer = composer(&config().user(""), 0);
    let options = CallOptions::default();

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    assert_eq!(event.proxy_metadata.organization, "");
    assert_eq!(event.proxy_metadata.project, "");
    assert_eq!(event.proxy_metadata.environment, "");
    assert_eq!(event.proxy_metadata.chat_id, "");
    assert_eq!(event.user, "unknown");
    assert_eq!(event.log_event_type, "chat_completion");
    assert_eq!(event.call_type, "completion");
    assert!(!event.cache_hit);
}

#[test]
fn configured_tags_are_copied() {
    let config = config()
        .organization("acme")
        .project("support")
        .environment("prod")
        .chat_id("chat-9")
        .user("u-1")
        .event("agent_turn");
    let composer = composer(&config, 0);
    let options = CallOptions::default();

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    assert_eq!(event.proxy_metadata.organization, "acme");
    assert_eq!(event.proxy_metadata.project, "support");
    assert_eq!(event.proxy_metadata.environment, "prod");
    assert_eq!(event.proxy_metadata.chat_id, "chat-9");
    assert_eq!(event.user, "u-1");
    assert_eq!(event.log_event_type, "agent_turn");
}

#[test]
fn clock_going_backwards_clamps_duration_to_zero() {
    let composer = composer(&config(), -30);
    let options = CallOptions::default();

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    assert_eq!(event.duration, 0);
}

#[test]
fn redaction_applies_to_prompt_completion_and_exception() {
    let config = config().redact(Regex::new(r"\d{3}-\d{2}-\d{4}").unwrap());
    let composer = composer(&config, 0);
    let completion = Completion::text("ssn is 123-45-6789");
    let options = CallOptions::new("my ssn 987-65-4321");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Generated(&completion),
        options: &options,
    });
    assert_eq!(event.messages[0].content, "my ssn [REDACTED]");
    assert_eq!(event.response.choices[0].message.content, "ssn is [REDACTED]");

    let error = ModelError::InvalidRequest("bad 111-22-3333".to_string());
    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Failed(&error),
        options: &options,
    });
    assert_eq!(
        event.failure.unwrap().exception,
        "Invalid request: bad [REDACTED]"
    );
}

#[test]
fn long_content_is_truncated() {
    let mut config = config();
    config.max_content_bytes = 8;
    let composer = composer(&config, 0);
    let options = CallOptions::new("abcdefghijklmnop");

    let event = composer.compose(CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    });

    assert_eq!(event.messages[0].content, "abcdefgh");
}

#[test]
fn each_event_gets_a_fresh_id() {
    let composer = EventComposer::new(&config());
    let options = CallOptions::default();
    let record = CallRecord {
        identity: ModelIdentity::default(),
        start_time: composer.now(),
        outcome: CallOutcome::Streamed,
        options: &options,
    };

    let first = composer.compose(record);
    let second = composer.compose(record);
    assert_ne!(first.id, second.id);
    assert_eq!(first.id.len(), 36);
}
