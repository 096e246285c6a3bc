//! Model-backed fallback for portals with neither a static profile nor a cached row.

mod ollama;
mod prompt;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Map, Value};

use super::domain::{
    CanonicalKey, InputKind, MappingEntry, MappingSource, ResolvedMapping, SelectorChain,
};
use super::transform::TransformName;
use crate::config::InferenceConfig;

pub use ollama::OllamaClient;
pub use prompt::{build_request, ChatMessage, ChatOptions, ChatRequest, SYSTEM_INSTRUCTION};

/// Transport to a chat-completion model. Returns the raw reply text.
pub trait InferenceBackend: Send + Sync {
    fn complete(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("inference transport failed: {0}")]
    Transport(String),
    #[error("inference service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("inference reply could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    MalformedResponse(String),
    #[error("model returned no usable field descriptors")]
    EmptyMapping,
}

/// Sanitizes markup, asks the model for descriptors and validates what comes back.
#[derive(Debug)]
pub struct InferenceResolver<B> {
    backend: Arc<B>,
    model: String,
    markup_budget: usize,
    timeout: Duration,
}

impl<B> InferenceResolver<B>
where
    B: InferenceBackend + 'static,
{
    pub fn new(backend: Arc<B>, config: &InferenceConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            markup_budget: config.markup_budget,
            timeout: config.timeout,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub async fn infer(
        &self,
        domain: &str,
        slug_hint: Option<&str>,
        markup: &str,
    ) -> Result<ResolvedMapping, InferenceError> {
        let sanitized = sanitize_markup(markup);
        let excerpt = truncate_chars(&sanitized, self.markup_budget);
        let request = build_request(&self.model, excerpt);

        let started = Instant::now();
        let reply = match tokio::time::timeout(self.timeout, self.backend.complete(request)).await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                tracing::warn!(domain, error = %err, "inference call failed");
                return Err(InferenceError::Unavailable(err.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    domain,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "inference call timed out"
                );
                return Err(InferenceError::Unavailable(format!(
                    "inference timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };
        tracing::debug!(
            domain,
            markup_chars = excerpt.chars().count(),
            reply_chars = reply.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "inference reply received"
        );

        let descriptors = extract_first_array(&reply).ok_or_else(|| {
            InferenceError::MalformedResponse("no JSON array found in model reply".to_string())
        })?;
        if descriptors.is_empty() {
            return Err(InferenceError::EmptyMapping);
        }

        let entries = validate_descriptors(domain, &descriptors);
        if entries.is_empty() {
            return Err(InferenceError::EmptyMapping);
        }

        Ok(ResolvedMapping {
            domain: domain.to_string(),
            source: MappingSource::Inferred,
            slug: Some(inferred_slug(domain, slug_hint)),
            form_type: None,
            entries,
            verified: false,
            resolved_at: Utc::now(),
        })
    }
}

fn inferred_slug(domain: &str, slug_hint: Option<&str>) -> String {
    slug_hint
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| domain.split('.').next().unwrap_or(domain).to_string())
}

/// Drops script/style blocks and comments, then collapses whitespace.
pub fn sanitize_markup(markup: &str) -> String {
    let stripped = strip_blocks(markup, "<!--", "-->");
    let stripped = strip_blocks(&stripped, "<script", "</script>");
    let stripped = strip_blocks(&stripped, "<style", "</style>");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_blocks(input: &str, open: &str, close: &str) -> String {
    let lowered = input.to_ascii_lowercase();
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(offset) = lowered[cursor..].find(open) {
        let start = cursor + offset;
        output.push_str(&input[cursor..start]);
        let body = start + open.len();
        match lowered[body..].find(close) {
            Some(end) => cursor = body + end + close.len(),
            None => {
                cursor = input.len();
                break;
            }
        }
    }

    output.push_str(&input[cursor..]);
    output
}

/// Keeps at most `budget` characters, never splitting a code point.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Finds the first substring that parses as a complete JSON array, skipping surrounding
/// prose or code fences.
pub fn extract_first_array(reply: &str) -> Option<Vec<Value>> {
    reply.match_indices('[').find_map(|(index, _)| {
        let mut stream = serde_json::Deserializer::from_str(&reply[index..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Array(items))) => Some(items),
            _ => None,
        }
    })
}

fn validate_descriptors(domain: &str, descriptors: &[Value]) -> Vec<MappingEntry> {
    let mut seen_selectors = HashSet::new();
    let mut entries = Vec::with_capacity(descriptors.len());

    for (position, descriptor) in descriptors.iter().enumerate() {
        match parse_descriptor(descriptor) {
            Ok(entry) => {
                if seen_selectors.insert(entry.selector.to_group()) {
                    entries.push(entry);
                } else {
                    tracing::debug!(domain, position, "dropping duplicate selector");
                }
            }
            Err(reason) => {
                tracing::warn!(domain, position, reason, "dropping field descriptor");
            }
        }
    }

    tracing::info!(
        domain,
        offered = descriptors.len(),
        accepted = entries.len(),
        "validated inferred descriptors"
    );
    entries
}

fn parse_descriptor(descriptor: &Value) -> Result<MappingEntry, &'static str> {
    let fields = descriptor.as_object().ok_or("descriptor is not an object")?;

    let selector = text_field(fields, &["selector"])
        .map(SelectorChain::parse)
        .filter(|chain| !chain.is_empty())
        .ok_or("missing selector")?;

    let canonical_key = text_field(fields, &["profileKey", "profile_key", "canonicalKey"])
        .ok_or("missing profile key")
        .and_then(|raw| CanonicalKey::parse(raw).ok_or("profile key outside vocabulary"))?;

    let input_kind = text_field(fields, &["inputType", "input_type", "inputKind"])
        .ok_or("missing input type")
        .and_then(|raw| InputKind::parse(raw).ok_or("unknown input type"))?;

    let transform = match text_field(fields, &["transform"]) {
        None => None,
        Some(raw) if raw.eq_ignore_ascii_case("none") => None,
        Some(raw) => Some(TransformName::parse(raw).ok_or("unknown transform")?),
    };

    let required = fields
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let label = text_field(fields, &["label"]).map(str::to_string);

    Ok(MappingEntry {
        selector,
        canonical_key,
        input_kind,
        required,
        transform,
        label,
        options: Default::default(),
    })
}

fn text_field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| fields.get(*name).and_then(Value::as_str))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
