//! Hand-maintained portal profiles, validated once at startup.

mod portals;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    normalize_domain, CanonicalKey, FormType, InputKind, MappingEntry, MappingSource,
    ResolvedMapping, SelectorChain,
};
use super::transform::TransformName;

/// Selector candidates for one canonical key, in authored order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    pub key: CanonicalKey,
    pub selectors: SelectorChain,
}

/// Static description of one admissions portal.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalProfile {
    pub slug: String,
    pub display_name: String,
    pub domains: Vec<String>,
    pub form_type: FormType,
    pub registration_url: String,
    pub login_url: Option<String>,
    pub field_map: Vec<FieldBinding>,
    pub select_options: BTreeMap<CanonicalKey, BTreeMap<String, String>>,
    pub transforms: BTreeMap<CanonicalKey, TransformName>,
    pub verified: bool,
    pub last_verified: Option<NaiveDate>,
    pub notes: String,
}

impl PortalProfile {
    pub fn selectors_for(&self, key: CanonicalKey) -> Option<&SelectorChain> {
        self.field_map
            .iter()
            .find(|binding| binding.key == key)
            .map(|binding| &binding.selectors)
    }

    /// Builds the `static` mapping handed to callers for `domain`.
    pub fn to_mapping(&self, domain: &str) -> ResolvedMapping {
        let entries = self
            .field_map
            .iter()
            .map(|binding| {
                let options = self
                    .select_options
                    .get(&binding.key)
                    .cloned()
                    .unwrap_or_default();
                let input_kind = if options.is_empty() {
                    InputKind::Text
                } else {
                    InputKind::Select
                };
                MappingEntry {
                    selector: binding.selectors.clone(),
                    canonical_key: binding.key,
                    input_kind,
                    required: false,
                    transform: self.transforms.get(&binding.key).copied(),
                    label: None,
                    options,
                }
            })
            .collect();

        ResolvedMapping {
            domain: domain.to_string(),
            source: MappingSource::Static,
            slug: Some(self.slug.clone()),
            form_type: Some(self.form_type),
            entries,
            verified: self.verified,
            resolved_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> PortalSummary {
        PortalSummary {
            slug: self.slug.clone(),
            name: self.display_name.clone(),
            domains: self.domains.clone(),
            form_type: self.form_type,
            registration_url: self.registration_url.clone(),
            fields: self.field_map.len(),
            verified: self.verified,
            last_verified: self.last_verified,
        }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.domains.is_empty() {
            return Err(RegistryError::NoDomains {
                slug: self.slug.clone(),
            });
        }

        let mut seen = HashSet::new();
        for binding in &self.field_map {
            if !seen.insert(binding.key) {
                return Err(RegistryError::DuplicateField {
                    slug: self.slug.clone(),
                    key: binding.key,
                });
            }
            if binding.selectors.is_empty() {
                return Err(RegistryError::EmptySelectorChain {
                    slug: self.slug.clone(),
                    key: binding.key,
                });
            }
        }

        if let Some(key) = self.transforms.keys().find(|key| !seen.contains(*key)) {
            return Err(RegistryError::OrphanTransform {
                slug: self.slug.clone(),
                key: *key,
            });
        }
        if let Some(key) = self.select_options.keys().find(|key| !seen.contains(*key)) {
            return Err(RegistryError::OrphanOptions {
                slug: self.slug.clone(),
                key: *key,
            });
        }

        Ok(())
    }
}

/// Public listing shape for a registry entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSummary {
    pub slug: String,
    pub name: String,
    pub domains: Vec<String>,
    pub form_type: FormType,
    pub registration_url: String,
    pub fields: usize,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("portal slug '{0}' is defined more than once")]
    DuplicateSlug(String),
    #[error("portal '{slug}' lists no domains")]
    NoDomains { slug: String },
    #[error("portal '{slug}' lists invalid domain '{domain}'")]
    InvalidDomain { slug: String, domain: String },
    #[error("domain '{domain}' is claimed by both '{first}' and '{second}'")]
    AmbiguousDomain {
        domain: String,
        first: String,
        second: String,
    },
    #[error("portal '{slug}' maps '{key}' more than once")]
    DuplicateField { slug: String, key: CanonicalKey },
    #[error("portal '{slug}' has no selectors for '{key}'")]
    EmptySelectorChain { slug: String, key: CanonicalKey },
    #[error("portal '{slug}' transforms '{key}' but has no selector for it")]
    OrphanTransform { slug: String, key: CanonicalKey },
    #[error("portal '{slug}' defines options for '{key}' but has no selector for it")]
    OrphanOptions { slug: String, key: CanonicalKey },
    #[error("portal '{slug}' has unparsable verification date '{value}'")]
    InvalidDate { slug: String, value: String },
}

/// Read-only slug -> profile arena with a domain index.
#[derive(Debug, Clone)]
pub struct PortalRegistry {
    profiles: Vec<PortalProfile>,
    by_slug: HashMap<String, usize>,
    by_domain: HashMap<String, usize>,
}

impl PortalRegistry {
    /// Loads and validates the compiled-in portal table.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_profiles(portals::builtin_profiles()?)
    }

    pub fn from_profiles(profiles: Vec<PortalProfile>) -> Result<Self, RegistryError> {
        let mut by_slug = HashMap::with_capacity(profiles.len());
        let mut by_domain = HashMap::new();
        let mut normalized_profiles = Vec::with_capacity(profiles.len());

        for (index, mut profile) in profiles.into_iter().enumerate() {
            profile.validate()?;

            if by_slug.insert(profile.slug.clone(), index).is_some() {
                return Err(RegistryError::DuplicateSlug(profile.slug));
            }

            let mut domains = Vec::with_capacity(profile.domains.len());
            for raw in &profile.domains {
                let domain = normalize_domain(raw).ok_or_else(|| RegistryError::InvalidDomain {
                    slug: profile.slug.clone(),
                    domain: raw.clone(),
                })?;
                if let Some(existing) = by_domain.insert(domain.clone(), index) {
                    if existing != index {
                        let first: &PortalProfile = &normalized_profiles[existing];
                        return Err(RegistryError::AmbiguousDomain {
                            domain,
                            first: first.slug.clone(),
                            second: profile.slug.clone(),
                        });
                    }
                }
                domains.push(domain);
            }
            profile.domains = domains;
            normalized_profiles.push(profile);
        }

        Ok(Self {
            profiles: normalized_profiles,
            by_slug,
            by_domain,
        })
    }

    /// Finds the profile whose domain is the longest exact or subdomain-suffix match.
    pub fn lookup(&self, domain: &str) -> Option<&PortalProfile> {
        let host = normalize_domain(domain)?;
        let mut candidate: &str = &host;
        loop {
            if let Some(index) = self.by_domain.get(candidate) {
                return self.profiles.get(*index);
            }
            let (_, parent) = candidate.split_once('.')?;
            candidate = parent;
        }
    }

    pub fn get(&self, slug: &str) -> Option<&PortalProfile> {
        self.by_slug
            .get(slug)
            .and_then(|index| self.profiles.get(*index))
    }

    pub fn profiles(&self) -> &[PortalProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
