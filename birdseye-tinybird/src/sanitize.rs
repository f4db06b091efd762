use regex::Regex;

const REDACTED: &str = "[REDACTED]";

/// Redacts and truncates free text before it leaves the process.
#[derive(Clone, Debug)]
pub struct Sanitizer {
    regex: Option<Regex>,
    max_bytes: usize,
}

impl Sanitizer {
    pub fn new(regex: Option<Regex>, max_bytes: usize) -> Self {
        Self { regex, max_bytes }
    }

    pub fn clean(&self, text: &str) -> String {
        let redacted = redact_text(text, self.regex.as_ref());
        truncate_text(&redacted, self.max_bytes)
    }
}

pub fn redact_text(text: &str, regex: Option<&Regex>) -> String {
    match regex {
        Some(pattern) => pattern.replace_all(text, REDACTED).into_owned(),
        None => text.to_string(),
    }
}

/// Cuts `text` to at most `max_bytes`, backing off to a char boundary.
pub fn truncate_text(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
