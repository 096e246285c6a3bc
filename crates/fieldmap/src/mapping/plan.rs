use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{CanonicalKey, InputKind, MappingEntry, MappingSource, ResolvedMapping};
use super::transform::{self, TransformContext};

/// Normalized student data keyed by canonical profile key.
///
/// Deserializes from a flat JSON object; numbers are accepted and stringified, unknown keys
/// and nulls are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, String>")]
pub struct StudentProfile {
    values: BTreeMap<CanonicalKey, String>,
}

impl StudentProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: CanonicalKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn get(&self, key: CanonicalKey) -> Option<&str> {
        self.values
            .get(&key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn marks_total_for(&self, key: CanonicalKey) -> Option<f64> {
        key.marks_total_key()
            .and_then(|total_key| self.get(total_key))
            .and_then(|raw| raw.trim().parse::<f64>().ok())
    }
}

impl From<BTreeMap<String, Value>> for StudentProfile {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let values = raw
            .into_iter()
            .filter_map(|(name, value)| {
                let key = CanonicalKey::parse(&name)?;
                let value = match value {
                    Value::String(text) => text,
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();
        Self { values }
    }
}

impl From<StudentProfile> for BTreeMap<String, String> {
    fn from(profile: StudentProfile) -> Self {
        profile
            .values
            .into_iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect()
    }
}

/// What the DOM-writing actor should do with one mapping entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FillAction {
    Fill { value: String },
    Manual { reason: String },
    Rejected { detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillInstruction {
    pub canonical_key: CanonicalKey,
    pub selectors: Vec<String>,
    pub input_kind: InputKind,
    pub required: bool,
    #[serde(flatten)]
    pub action: FillAction,
}

/// Ordered instructions for writing a profile into one portal's form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillPlan {
    pub domain: String,
    pub source: MappingSource,
    pub instructions: Vec<FillInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("mapping for '{domain}' has no entries")]
    EmptyMapping { domain: String },
    #[error("student profile has no recognised fields")]
    EmptyProfile,
}

impl FillPlan {
    pub fn build(mapping: &ResolvedMapping, profile: &StudentProfile) -> Result<Self, PlanError> {
        if mapping.entries.is_empty() {
            return Err(PlanError::EmptyMapping {
                domain: mapping.domain.clone(),
            });
        }
        if profile.is_empty() {
            return Err(PlanError::EmptyProfile);
        }

        let instructions = mapping
            .entries
            .iter()
            .map(|entry| FillInstruction {
                canonical_key: entry.canonical_key,
                selectors: entry.selector.candidates().to_vec(),
                input_kind: entry.input_kind,
                required: entry.required,
                action: plan_entry(entry, profile),
            })
            .collect();

        Ok(Self {
            domain: mapping.domain.clone(),
            source: mapping.source,
            instructions,
        })
    }

    pub fn fill_count(&self) -> usize {
        self.count(|action| matches!(action, FillAction::Fill { .. }))
    }

    pub fn manual_count(&self) -> usize {
        self.count(|action| matches!(action, FillAction::Manual { .. }))
    }

    pub fn rejected_count(&self) -> usize {
        self.count(|action| matches!(action, FillAction::Rejected { .. }))
    }

    fn count(&self, predicate: impl Fn(&FillAction) -> bool) -> usize {
        self.instructions
            .iter()
            .filter(|instruction| predicate(&instruction.action))
            .count()
    }
}

fn plan_entry(entry: &MappingEntry, profile: &StudentProfile) -> FillAction {
    if entry.input_kind == InputKind::File {
        return FillAction::Manual {
            reason: "file inputs must be attached by hand".to_string(),
        };
    }

    let source_key = entry
        .transform
        .map(|name| name.source_key(entry.canonical_key))
        .unwrap_or(entry.canonical_key);
    let Some(raw) = profile.get(source_key) else {
        return FillAction::Manual {
            reason: format!("profile has no value for {source_key}"),
        };
    };

    let context = TransformContext {
        marks_total: profile.marks_total_for(entry.canonical_key),
    };
    match transform::apply(entry.transform, raw, &context) {
        Ok(value) => {
            let value = entry
                .options
                .get(&value.to_lowercase())
                .cloned()
                .unwrap_or(value);
            FillAction::Fill { value }
        }
        Err(err) => FillAction::Rejected {
            detail: err.to_string(),
        },
    }
}
