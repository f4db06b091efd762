use std::env;

use regex::Regex;
use secrecy::SecretString;

use crate::TinybirdError;

pub const DEFAULT_HOST: &str = "https://api.europe-west2.gcp.tinybird.co";
pub const DEFAULT_DATASOURCE: &str = "llm_events";
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 100_000;

/// Optional labels copied onto every event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventTags {
    pub organization: Option<String>,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub chat_id: Option<String>,
    pub user: Option<String>,
    pub event: Option<String>,
}

/// How a wrapped call hands its event to the sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Delivery is awaited before the call returns.
    #[default]
    Inline,
    /// Delivery runs on a tracked background task. Tasks still pending when
    /// the runtime shuts down are dropped unless `flush` was awaited first.
    Detached,
}

#[derive(Clone, Debug)]
pub struct TinybirdConfig {
    pub token: SecretString,
    pub host: String,
    pub datasource: String,
    pub tags: EventTags,
    pub delivery_mode: DeliveryMode,
    pub redact_regex: Option<Regex>,
    pub max_content_bytes: usize,
}

impl TinybirdConfig {
    pub fn new(token: SecretString, host: impl Into<String>) -> Self {
        Self {
            token,
            host: host.into(),
            datasource: DEFAULT_DATASOURCE.to_string(),
            tags: EventTags::default(),
            delivery_mode: DeliveryMode::Inline,
            redact_regex: None,
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
        }
    }

    /// Reads `TINYBIRD_TOKEN` (required), `TINYBIRD_HOST`, `TINYBIRD_DATASOURCE`
    /// and the optional `TINYBIRD_{ORGANIZATION,PROJECT,ENVIRONMENT,USER,EVENT}` tags.
    pub fn from_env() -> Result<Self, TinybirdError> {
        let token = non_empty_var("TINYBIRD_TOKEN").ok_or(TinybirdError::MissingToken)?;
        let host = match env::var("TINYBIRD_HOST") {
            Ok(host) => host,
            Err(_) => DEFAULT_HOST.to_string(),
        };
        if host.trim().is_empty() {
            return Err(TinybirdError::EmptyHost);
        }

        let mut config = Self::new(SecretString::new(token), host);
        if let Some(datasource) = non_empty_var("TINYBIRD_DATASOURCE") {
            config.datasource = datasource;
        }
        config.tags = EventTags {
            organization: non_empty_var("TINYBIRD_ORGANIZATION"),
            project: non_empty_var("TINYBIRD_PROJECT"),
            environment: non_empty_var("TINYBIRD_ENVIRONMENT"),
            chat_id: None,
            user: non_empty_var("TINYBIRD_USER"),
            event: non_empty_var("TINYBIRD_EVENT"),
        };
        Ok(config)
    }

    pub fn organization(mut self, value: impl Into<String>) -> Self {
        self.tags.organization = Some(value.into());
        self
    }

    pub fn project(mut self, value: impl Into<String>) -> Self {
        self.tags.project = Some(value.into());
        self
    }

    pub fn environment(mut self, value: impl Into<String>) -> Self {
        self.tags.environment = Some(value.into());
        self
    }

    pub fn chat_id(mut self, value: impl Into<String>) -> Self {
        self.tags.chat_id = Some(value.into());
        self
    }

    pub fn user(mut self, value: impl Into<String>) -> Self {
        self.tags.user = Some(value.into());
        self
    }

    pub fn event(mut self, value: impl Into<String>) -> Self {
        self.tags.event = Some(value.into());
        self
    }

    pub fn datasource(mut self, value: impl Into<String>) -> Self {
        self.datasource = value.into();
        self
    }

    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn redact(mut self, regex: Regex) -> Self {
        self.redact_regex = Some(regex);
        self
    }

    pub fn validate(&self) -> Result<(), TinybirdError> {
        if self.host.trim().is_empty() {
            return Err(TinybirdError::EmptyHost);
        }
        if self.datasource.trim().is_empty() {
            return Err(TinybirdError::EmptyDatasource);
        }
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
