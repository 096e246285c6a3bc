use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::transform::TransformName;

macro_rules! canonical_keys {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Identifier of one field in the normalized student profile.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum CanonicalKey {
            $($variant),+
        }

        impl CanonicalKey {
            pub const ALL: &'static [CanonicalKey] = &[$(CanonicalKey::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(CanonicalKey::$variant => $name),+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw.trim() {
                    $($name => Some(CanonicalKey::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

canonical_keys! {
    FullName => "full_name",
    FirstName => "first_name",
    MiddleName => "middle_name",
    LastName => "last_name",
    FatherName => "father_name",
    Cnic => "cnic",
    DateOfBirth => "date_of_birth",
    Gender => "gender",
    Nationality => "nationality",
    Email => "email",
    Phone => "phone",
    Address => "address",
    City => "city",
    Province => "province",
    PostalCode => "postal_code",
    DomicileProvince => "domicile_province",
    FscMarks => "fsc_marks",
    FscTotal => "fsc_total",
    FscPercentage => "fsc_percentage",
    MatricMarks => "matric_marks",
    MatricTotal => "matric_total",
    MatricPercentage => "matric_percentage",
    BoardName => "board_name",
    PassingYear => "passing_year",
    SchoolName => "school_name",
    SatScore => "sat_score",
    EcatScore => "ecat_score",
    NetScore => "net_score",
}

impl CanonicalKey {
    /// Profile key holding the denominator used when this key is rescaled.
    pub fn marks_total_key(self) -> Option<CanonicalKey> {
        match self {
            CanonicalKey::FscMarks | CanonicalKey::FscTotal | CanonicalKey::FscPercentage => {
                Some(CanonicalKey::FscTotal)
            }
            CanonicalKey::MatricMarks
            | CanonicalKey::MatricTotal
            | CanonicalKey::MatricPercentage => Some(CanonicalKey::MatricTotal),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTML control shape a mapping entry targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Select,
    File,
    Radio,
    Checkbox,
    Textarea,
}

impl InputKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "select" => Some(Self::Select),
            "file" => Some(Self::File),
            "radio" => Some(Self::Radio),
            "checkbox" => Some(Self::Checkbox),
            "textarea" => Some(Self::Textarea),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::File => "file",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Textarea => "textarea",
        }
    }
}

/// Whether a portal's form is reachable directly or only after signing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    Direct,
    RequiresLoginFirst,
}

/// Provenance of a resolved mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    Static,
    Cached,
    Inferred,
}

impl MappingSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Cached => "cached",
            Self::Inferred => "inferred",
        }
    }
}

/// Ordered selector candidates for one field; the first one present in the page wins.
///
/// Serialized as a CSS selector group (`a, b, c`), which is how portal configs and model
/// output both express fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorChain(Vec<String>);

impl SelectorChain {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            candidates
                .into_iter()
                .map(Into::into)
                .map(|candidate: String| candidate.trim().to_string())
                .filter(|candidate| !candidate.is_empty())
                .collect(),
        )
    }

    /// Splits a selector group on top-level commas (commas inside `[...]`, `(...)` or quotes
    /// belong to the selector).
    pub fn parse(group: &str) -> Self {
        let mut candidates = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        for ch in group.chars() {
            match quote {
                Some(open) => {
                    if ch == open {
                        quote = None;
                    }
                    current.push(ch);
                }
                None => match ch {
                    '"' | '\'' => {
                        quote = Some(ch);
                        current.push(ch);
                    }
                    '[' | '(' => {
                        depth += 1;
                        current.push(ch);
                    }
                    ']' | ')' => {
                        depth = depth.saturating_sub(1);
                        current.push(ch);
                    }
                    ',' if depth == 0 => {
                        candidates.push(std::mem::take(&mut current));
                    }
                    _ => current.push(ch),
                },
            }
        }
        candidates.push(current);

        Self::new(candidates)
    }

    pub fn candidates(&self) -> &[String] {
        &self.0
    }

    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_group(&self) -> String {
        self.0.join(", ")
    }
}

impl fmt::Display for SelectorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_group())
    }
}

impl Serialize for SelectorChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_group())
    }
}

impl<'de> Deserialize<'de> for SelectorChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One form field the caller should write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub selector: SelectorChain,
    pub canonical_key: CanonicalKey,
    pub input_kind: InputKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Profile value -> form-facing option label, for enumerated inputs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Authoritative mapping for one domain together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMapping {
    pub domain: String,
    pub source: MappingSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<FormType>,
    pub entries: Vec<MappingEntry>,
    #[serde(default)]
    pub verified: bool,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedMapping {
    pub fn entry_for(&self, key: CanonicalKey) -> Option<&MappingEntry> {
        self.entries.iter().find(|entry| entry.canonical_key == key)
    }

    pub(crate) fn with_source(mut self, source: MappingSource) -> Self {
        self.source = source;
        self
    }
}

/// Lowercases a host and strips scheme, credentials, port, path and trailing dot so that
/// `https://Admissions.NU.edu.pk:443/apply` and `admissions.nu.edu.pk` compare equal.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let mut host = raw.trim();
    if let Some((_, rest)) = host.split_once("://") {
        host = rest;
    }
    host = host.split(['/', '?', '#']).next().unwrap_or_default();
    if let Some((_, rest)) = host.rsplit_once('@') {
        host = rest;
    }
    host = host.split(':').next().unwrap_or_default();
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    let valid = !host.is_empty()
        && host
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '.')
        && !host.split('.').any(str::is_empty);

    valid.then_some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_keys_round_trip_through_names() {
        for key in CanonicalKey::ALL {
            assert_eq!(CanonicalKey::parse(key.as_str()), Some(*key));
        }
        assert_eq!(CanonicalKey::parse("favourite_colour"), None);
    }

    #[test]
    fn selector_chain_keeps_commas_inside_attribute_values() {
        let chain = SelectorChain::parse(r#"[name="a,b"], #email , [name*="Mobile" i]"#);
        assert_eq!(
            chain.candidates(),
            &[
                r#"[name="a,b"]"#.to_string(),
                "#email".to_string(),
                r#"[name*="Mobile" i]"#.to_string(),
            ]
        );
        assert_eq!(chain.primary(), Some(r#"[name="a,b"]"#));
    }

    #[test]
    fn selector_chain_serializes_as_group() {
        let chain = SelectorChain::new(["#cnic", "[name=\"cnic_no\"]"]);
        let json = serde_json::to_string(&chain).expect("serializes");
        assert_eq!(json, r##""#cnic, [name=\"cnic_no\"]""##);
        let back: SelectorChain = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, chain);
    }

    #[test]
    fn normalize_domain_strips_url_noise() {
        assert_eq!(
            normalize_domain("https://Admissions.NU.edu.pk:443/apply?x=1").as_deref(),
            Some("admissions.nu.edu.pk")
        );
        assert_eq!(
            normalize_domain("portal.example.edu.pk.").as_deref(),
            Some("portal.example.edu.pk")
        );
        assert_eq!(normalize_domain("   "), None);
        assert_eq!(normalize_domain("bad..host"), None);
        assert_eq!(normalize_domain("spaces in host"), None);
    }

    #[test]
    fn marks_keys_know_their_totals() {
        assert_eq!(
            CanonicalKey::FscPercentage.marks_total_key(),
            Some(CanonicalKey::FscTotal)
        );
        assert_eq!(
            CanonicalKey::MatricMarks.marks_total_key(),
            Some(CanonicalKey::MatricTotal)
        );
        assert_eq!(CanonicalKey::Cnic.marks_total_key(), None);
    }
}
