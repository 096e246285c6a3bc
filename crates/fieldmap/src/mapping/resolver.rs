use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::OnceCell;

use super::cache::{CacheError, MappingCache};
use super::domain::{normalize_domain, MappingEntry, MappingSource, ResolvedMapping};
use super::inference::{InferenceBackend, InferenceError, InferenceResolver};
use super::registry::PortalRegistry;

type SharedOutcome = Arc<OnceCell<Result<ResolvedMapping, ResolutionError>>>;

/// Failure taxonomy surfaced to callers of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("'{0}' is not a valid domain")]
    InvalidDomain(String),
    #[error("no static, cached or inferable mapping for '{domain}'")]
    NoMappingAvailable { domain: String },
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),
    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
    #[error("no usable field descriptors for '{domain}'")]
    EmptyMapping { domain: String },
    #[error("a verified mapping is already stored for '{domain}'")]
    ImmutableVerifiedMapping { domain: String },
    #[error("'{domain}' is served by the static '{slug}' profile")]
    StaticProfile { domain: String, slug: String },
    #[error("mapping storage failed: {0}")]
    Storage(String),
}

impl ResolutionError {
    /// Stable name used in `{kind, detail}` response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDomain(_) => "InvalidDomain",
            Self::NoMappingAvailable { .. } => "NoMappingAvailable",
            Self::InferenceUnavailable(_) => "InferenceUnavailable",
            Self::MalformedResponse(_) => "MalformedResponse",
            Self::EmptyMapping { .. } => "EmptyMapping",
            Self::ImmutableVerifiedMapping { .. } => "ImmutableVerifiedMapping",
            Self::StaticProfile { .. } => "StaticProfile",
            Self::Storage(_) => "Storage",
        }
    }

    fn from_inference(domain: &str, error: InferenceError) -> Self {
        match error {
            InferenceError::Unavailable(detail) => Self::InferenceUnavailable(detail),
            InferenceError::MalformedResponse(detail) => Self::MalformedResponse(detail),
            InferenceError::EmptyMapping => Self::EmptyMapping {
                domain: domain.to_string(),
            },
        }
    }
}

impl From<CacheError> for ResolutionError {
    fn from(value: CacheError) -> Self {
        match value {
            CacheError::ImmutableVerifiedMapping { domain } => {
                Self::ImmutableVerifiedMapping { domain }
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Single entry point composing the static registry, the cache and the inference fallback.
pub struct MappingResolver<C, B> {
    registry: Arc<PortalRegistry>,
    cache: Arc<C>,
    inference: InferenceResolver<B>,
    in_flight: Mutex<HashMap<String, SharedOutcome>>,
}

impl<C, B> MappingResolver<C, B>
where
    C: MappingCache + 'static,
    B: InferenceBackend + 'static,
{
    pub fn new(
        registry: Arc<PortalRegistry>,
        cache: Arc<C>,
        inference: InferenceResolver<B>,
    ) -> Self {
        Self {
            registry,
            cache,
            inference,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &PortalRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Static then cached mapping for `domain`; never calls the model.
    pub fn lookup(&self, domain: &str) -> Result<Option<ResolvedMapping>, ResolutionError> {
        let domain = canonical_domain(domain)?;
        if let Some(profile) = self.registry.lookup(&domain) {
            return Ok(Some(profile.to_mapping(&domain)));
        }
        Ok(self
            .cache
            .get(&domain)?
            .map(|row| row.with_source(MappingSource::Cached)))
    }

    /// Resolves `domain` through static profiles, the cache and finally inference over
    /// `markup`. Concurrent calls for the same unseen domain share one inference call.
    pub async fn resolve(
        &self,
        domain: &str,
        markup: Option<&str>,
        slug_hint: Option<&str>,
    ) -> Result<ResolvedMapping, ResolutionError> {
        let started = Instant::now();
        let domain = canonical_domain(domain)?;

        let resolved = match self.lookup(&domain)? {
            Some(mapping) => mapping,
            None => {
                let markup = markup
                    .filter(|markup| !markup.trim().is_empty())
                    .ok_or_else(|| ResolutionError::NoMappingAvailable {
                        domain: domain.clone(),
                    })?;
                self.single_flight(&domain, markup, slug_hint).await?
            }
        };

        tracing::info!(
            domain = %domain,
            source = resolved.source.label(),
            entries = resolved.entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "mapping resolved"
        );
        Ok(resolved)
    }

    /// Stores a human-confirmed mapping, superseding whatever was cached.
    pub fn record_verified(
        &self,
        domain: &str,
        entries: Vec<MappingEntry>,
        slug: Option<String>,
    ) -> Result<ResolvedMapping, ResolutionError> {
        let domain = canonical_domain(domain)?;
        if let Some(profile) = self.registry.lookup(&domain) {
            return Err(ResolutionError::StaticProfile {
                domain,
                slug: profile.slug.clone(),
            });
        }
        if entries.is_empty() {
            return Err(ResolutionError::EmptyMapping { domain });
        }

        let previous_slug = self.cache.get(&domain)?.and_then(|row| row.slug);
        let slug = slug
            .filter(|slug| !slug.trim().is_empty())
            .or(previous_slug)
            .or_else(|| domain.split('.').next().map(str::to_string));

        let mapping = ResolvedMapping {
            domain: domain.clone(),
            source: MappingSource::Cached,
            slug,
            form_type: None,
            entries,
            verified: true,
            resolved_at: Utc::now(),
        };
        self.cache.replace(&domain, mapping.clone())?;
        tracing::info!(domain = %domain, entries = mapping.entries.len(), "verified mapping stored");
        Ok(mapping)
    }

    pub fn invalidate(&self, domain: &str) -> Result<bool, ResolutionError> {
        let domain = canonical_domain(domain)?;
        let removed = self.cache.invalidate(&domain)?;
        tracing::info!(domain = %domain, removed, "cached mapping invalidated");
        Ok(removed)
    }

    async fn single_flight(
        &self,
        domain: &str,
        markup: &str,
        slug_hint: Option<&str>,
    ) -> Result<ResolvedMapping, ResolutionError> {
        let cell = {
            let mut in_flight = self.in_flight.lock().expect("in-flight map mutex poisoned");
            in_flight
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = cell
            .get_or_init(|| self.infer_and_store(domain, markup, slug_hint))
            .await
            .clone();

        let mut in_flight = self.in_flight.lock().expect("in-flight map mutex poisoned");
        if in_flight
            .get(domain)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            in_flight.remove(domain);
        }

        outcome
    }

    async fn infer_and_store(
        &self,
        domain: &str,
        markup: &str,
        slug_hint: Option<&str>,
    ) -> Result<ResolvedMapping, ResolutionError> {
        // A previous flight may have finished between our cache miss and joining.
        if let Some(row) = self.cache.get(domain)? {
            return Ok(row.with_source(MappingSource::Cached));
        }

        let mapping = self
            .inference
            .infer(domain, slug_hint, markup)
            .await
            .map_err(|err| ResolutionError::from_inference(domain, err))?;

        match self.cache.put(domain, mapping.clone()) {
            Ok(()) => Ok(mapping),
            Err(CacheError::ImmutableVerifiedMapping { .. }) => {
                tracing::warn!(domain, "verified mapping appeared during inference");
                match self.cache.get(domain)? {
                    Some(row) => Ok(row.with_source(MappingSource::Cached)),
                    None => {
                        self.cache.put(domain, mapping.clone())?;
                        Ok(mapping)
                    }
                }
            }
            Err(err) => {
                tracing::warn!(domain, error = %err, "failed to persist inferred mapping");
                Err(err.into())
            }
        }
    }
}

fn canonical_domain(raw: &str) -> Result<String, ResolutionError> {
    normalize_domain(raw).ok_or_else(|| ResolutionError::InvalidDomain(raw.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceConfig;
    use crate::mapping::cache::InMemoryMappingCache;
    use crate::mapping::domain::{CanonicalKey, InputKind, SelectorChain};
    use crate::mapping::inference::{BackendError, ChatRequest};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const FULL_NAME_REPLY: &str = r#"[{"selector": "[name=\"FullName\"]", "profileKey": "full_name", "inputType": "text", "required": true}]"#;

    struct CountingBackend {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CountingBackend {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl InferenceBackend for CountingBackend {
        async fn complete(&self, _request: ChatRequest) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(FULL_NAME_REPLY.to_string())
        }
    }

    /// Hides the first `hidden_reads` reads, simulating a verified row written mid-flight.
    struct RacingCache {
        inner: InMemoryMappingCache,
        hidden_reads: AtomicUsize,
    }

    impl MappingCache for RacingCache {
        fn get(&self, domain: &str) -> Result<Option<ResolvedMapping>, CacheError> {
            let hidden = self
                .hidden_reads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if hidden {
                return Ok(None);
            }
            self.inner.get(domain)
        }

        fn put(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
            self.inner.put(domain, mapping)
        }

        fn invalidate(&self, domain: &str) -> Result<bool, CacheError> {
            self.inner.invalidate(domain)
        }

        fn replace(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
            self.inner.replace(domain, mapping)
        }

        fn domains(&self) -> Result<Vec<String>, CacheError> {
            self.inner.domains()
        }
    }

    fn inference_config() -> InferenceConfig {
        InferenceConfig {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(5),
            markup_budget: 6000,
        }
    }

    fn resolver_with<C: MappingCache + 'static>(
        cache: Arc<C>,
        backend: Arc<CountingBackend>,
    ) -> MappingResolver<C, CountingBackend> {
        let registry = Arc::new(PortalRegistry::builtin().expect("builtin registry"));
        MappingResolver::new(
            registry,
            cache,
            InferenceResolver::new(backend, &inference_config()),
        )
    }

    fn entry(selector: &str, key: CanonicalKey) -> MappingEntry {
        MappingEntry {
            selector: SelectorChain::parse(selector),
            canonical_key: key,
            input_kind: InputKind::Text,
            required: false,
            transform: None,
            label: None,
            options: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn static_profiles_win_without_calling_inference() {
        let cache = Arc::new(InMemoryMappingCache::new());
        let backend = CountingBackend::new(Duration::ZERO);
        let resolver = resolver_with(cache.clone(), backend.clone());

        let shadow = ResolvedMapping {
            domain: "ugadmissions.nust.edu.pk".to_string(),
            source: MappingSource::Inferred,
            slug: Some("shadow".to_string()),
            form_type: None,
            entries: vec![entry("#guess", CanonicalKey::FullName)],
            verified: false,
            resolved_at: Utc::now(),
        };
        cache
            .put("ugadmissions.nust.edu.pk", shadow)
            .expect("seed cache");

        let mapping = resolver
            .resolve("https://UGAdmissions.nust.edu.pk/apply", Some("<form></form>"), None)
            .await
            .expect("static mapping");

        assert_eq!(mapping.source, MappingSource::Static);
        assert_eq!(mapping.slug.as_deref(), Some("nust"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_resolutions_share_one_inference_call() {
        let backend = CountingBackend::new(Duration::from_millis(50));
        let resolver = Arc::new(resolver_with(
            Arc::new(InMemoryMappingCache::new()),
            backend.clone(),
        ));
        let markup = r#"<form><input type="text" name="FullName"></form>"#;

        let (first, second) = tokio::join!(
            resolver.resolve("portal.example.edu.pk", Some(markup), None),
            resolver.resolve("portal.example.edu.pk", Some(markup), None),
        );

        let first = first.expect("first caller resolves");
        let second = second.expect("second caller resolves");
        assert_eq!(backend.calls(), 1);
        assert_eq!(first.entries, second.entries);
        assert!(resolver
            .in_flight
            .lock()
            .expect("in-flight map mutex poisoned")
            .is_empty());

        let third = resolver
            .resolve("portal.example.edu.pk", None, None)
            .await
            .expect("cached afterwards");
        assert_eq!(third.source, MappingSource::Cached);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_resolutions_across_tasks_share_one_inference_call() {
        let backend = CountingBackend::new(Duration::from_millis(50));
        let resolver = Arc::new(resolver_with(
            Arc::new(InMemoryMappingCache::new()),
            backend.clone(),
        ));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver
                    .resolve("forms.example.edu", Some("<input name=\"FullName\">"), None)
                    .await
            }));
        }
        for handle in handles {
            handle.await.expect("task joins").expect("resolution succeeds");
        }

        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn missing_markup_is_no_mapping_available() {
        let backend = CountingBackend::new(Duration::ZERO);
        let resolver = resolver_with(Arc::new(InMemoryMappingCache::new()), backend.clone());

        let err = resolver
            .resolve("unknown.example.org", Some("   "), None)
            .await
            .expect_err("nothing to infer from");
        assert_eq!(err.kind(), "NoMappingAvailable");
        assert_eq!(backend.calls(), 0);

        let err = resolver
            .resolve("not a domain", None, None)
            .await
            .expect_err("invalid domain");
        assert_eq!(err.kind(), "InvalidDomain");
    }

    #[tokio::test]
    async fn verified_row_written_mid_flight_is_returned_as_cached() {
        let cache = Arc::new(RacingCache {
            inner: InMemoryMappingCache::new(),
            hidden_reads: AtomicUsize::new(0),
        });
        let backend = CountingBackend::new(Duration::ZERO);
        let resolver = resolver_with(cache.clone(), backend.clone());

        resolver
            .record_verified(
                "portal.example.edu.pk",
                vec![entry("#applicant", CanonicalKey::FullName)],
                None,
            )
            .expect("verified stored");
        cache.hidden_reads.store(2, Ordering::SeqCst);

        let mapping = resolver
            .resolve("portal.example.edu.pk", Some("<input name=\"FullName\">"), None)
            .await
            .expect("falls back to verified row");

        assert_eq!(backend.calls(), 1);
        assert_eq!(mapping.source, MappingSource::Cached);
        assert!(mapping.verified);
        assert_eq!(mapping.entries[0].selector.primary(), Some("#applicant"));
    }

    #[tokio::test]
    async fn verified_corrections_replace_inferred_rows() {
        let backend = CountingBackend::new(Duration::ZERO);
        let resolver = resolver_with(Arc::new(InMemoryMappingCache::new()), backend.clone());

        let inferred = resolver
            .resolve("apply.example.edu", Some("<input name=\"FullName\">"), Some("example"))
            .await
            .expect("inferred");
        assert!(!inferred.verified);

        let corrected = resolver
            .record_verified(
                "apply.example.edu",
                vec![entry("#full-name", CanonicalKey::FullName)],
                None,
            )
            .expect("correction stored");
        assert!(corrected.verified);
        assert_eq!(corrected.slug.as_deref(), Some("example"));

        let looked_up = resolver
            .lookup("apply.example.edu")
            .expect("lookup")
            .expect("row present");
        assert!(looked_up.verified);
        assert_eq!(looked_up.source, MappingSource::Cached);

        assert!(resolver.invalidate("apply.example.edu").expect("invalidate"));
        assert!(resolver.lookup("apply.example.edu").expect("lookup").is_none());
    }

    #[test]
    fn corrections_for_static_domains_are_rejected() {
        let resolver = resolver_with(
            Arc::new(InMemoryMappingCache::new()),
            CountingBackend::new(Duration::ZERO),
        );
        let err = resolver
            .record_verified(
                "admissions.lums.edu.pk",
                vec![entry("#x", CanonicalKey::FullName)],
                None,
            )
            .expect_err("static domain");
        assert_eq!(
            err,
            ResolutionError::StaticProfile {
                domain: "admissions.lums.edu.pk".to_string(),
                slug: "lums".to_string(),
            }
        );
    }
}
