//! End-to-end resolution scenarios driven through the public orchestrator, cache and
//! router, with the model replaced by a counting double.

mod common {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use fieldmap::config::InferenceConfig;
    use fieldmap::mapping::{
        BackendError, ChatRequest, InferenceBackend, InferenceResolver, MappingCache,
        MappingResolver, PortalRegistry,
    };

    pub(super) struct CountingModel {
        reply: String,
        calls: AtomicUsize,
        prompts: std::sync::Mutex<Vec<String>>,
    }

    impl CountingModel {
        pub(super) fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                prompts: std::sync::Mutex::new(Vec::new()),
            })
        }

        pub(super) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(super) fn last_prompt(&self) -> Option<String> {
            self.prompts
                .lock()
                .expect("prompt mutex poisoned")
                .last()
                .cloned()
        }
    }

    impl InferenceBackend for CountingModel {
        async fn complete(&self, request: ChatRequest) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(prompt) = request.user_prompt() {
                self.prompts
                    .lock()
                    .expect("prompt mutex poisoned")
                    .push(prompt.to_string());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(self.reply.clone())
        }
    }

    pub(super) fn inference_config() -> InferenceConfig {
        InferenceConfig {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(5),
            markup_budget: 6000,
        }
    }

    pub(super) fn resolver<C: MappingCache + 'static>(
        cache: Arc<C>,
        model: Arc<CountingModel>,
    ) -> Arc<MappingResolver<C, CountingModel>> {
        let registry = Arc::new(PortalRegistry::builtin().expect("builtin registry"));
        Arc::new(MappingResolver::new(
            registry,
            cache,
            InferenceResolver::new(model, &inference_config()),
        ))
    }

    pub(super) const FULL_NAME_REPLY: &str = "Here you go:\n[{\"selector\": \"[name=\\\"FullName\\\"]\", \"profileKey\": \"full_name\", \"label\": \"Full Name\", \"required\": true, \"inputType\": \"text\", \"transform\": null}]";

    pub(super) const FULL_NAME_FORM: &str = r#"<html><head><script>track()</script></head><body><form><label>Full Name</label><input type="text" name="FullName"></form></body></html>"#;
}

use std::sync::Arc;

use fieldmap::mapping::{
    CacheError, CanonicalKey, FileMappingCache, InMemoryMappingCache, InputKind, MappingCache,
    MappingEntry, MappingSource, ResolutionError, SelectorChain,
};

use common::{resolver, CountingModel, FULL_NAME_FORM, FULL_NAME_REPLY};

#[tokio::test]
async fn unknown_portal_is_inferred_once_then_served_from_cache() {
    let cache = Arc::new(InMemoryMappingCache::new());
    let model = CountingModel::replying(FULL_NAME_REPLY);
    let resolver = resolver(cache.clone(), model.clone());

    let mapping = resolver
        .resolve("portal.example.edu.pk", Some(FULL_NAME_FORM), None)
        .await
        .expect("inferred mapping");

    assert_eq!(mapping.source, MappingSource::Inferred);
    assert!(!mapping.verified);
    assert_eq!(mapping.entries.len(), 1);
    let entry = &mapping.entries[0];
    assert_eq!(entry.canonical_key, CanonicalKey::FullName);
    assert_eq!(entry.selector.primary(), Some(r#"[name="FullName"]"#));
    assert_eq!(entry.input_kind, InputKind::Text);

    let stored = cache
        .get("portal.example.edu.pk")
        .expect("cache readable")
        .expect("row persisted");
    assert!(!stored.verified);

    let prompt = model.last_prompt().expect("prompt captured");
    assert!(prompt.contains(r#"<input type="text" name="FullName">"#));
    assert!(!prompt.contains("track()"));

    let again = resolver
        .resolve("https://portal.example.edu.pk/register", Some(FULL_NAME_FORM), None)
        .await
        .expect("cached mapping");
    assert_eq!(again.source, MappingSource::Cached);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn many_concurrent_callers_trigger_a_single_inference() {
    let model = CountingModel::replying(FULL_NAME_REPLY);
    let resolver = resolver(Arc::new(InMemoryMappingCache::new()), model.clone());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                resolver
                    .resolve("new.example.edu.pk", Some(FULL_NAME_FORM), None)
                    .await
            })
        })
        .collect();

    for task in tasks {
        let mapping = task
            .await
            .expect("task joins")
            .expect("every caller gets the mapping");
        assert_eq!(mapping.entries[0].canonical_key, CanonicalKey::FullName);
    }
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn static_portals_never_reach_the_model() {
    let model = CountingModel::replying(FULL_NAME_REPLY);
    let resolver = resolver(Arc::new(InMemoryMappingCache::new()), model.clone());

    for domain in [
        "ugadmissions.nust.edu.pk",
        "admissions.nu.edu.pk",
        "red.pieas.edu.pk",
        "admissions.szabist-isb.edu.pk",
    ] {
        let mapping = resolver
            .resolve(domain, Some(FULL_NAME_FORM), None)
            .await
            .expect("static mapping");
        assert_eq!(mapping.source, MappingSource::Static, "{domain}");
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn empty_model_output_is_not_cached() {
    let model = CountingModel::replying("[]");
    let cache = Arc::new(InMemoryMappingCache::new());
    let resolver = resolver(cache.clone(), model.clone());

    let err = resolver
        .resolve("empty.example.edu", Some("<form></form>"), None)
        .await
        .expect_err("empty mapping");
    assert_eq!(err.kind(), "EmptyMapping");
    assert!(cache.get("empty.example.edu").expect("cache").is_none());

    let err = resolver
        .resolve("empty.example.edu", Some("<form></form>"), None)
        .await
        .expect_err("caller-driven retry runs inference again");
    assert!(matches!(err, ResolutionError::EmptyMapping { .. }));
    assert_eq!(model.calls(), 2);
}

#[test]
fn verified_rows_require_invalidation_before_put() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cache = FileMappingCache::open(dir.path().join("fieldmaps.json")).expect("open store");
    let model = CountingModel::replying(FULL_NAME_REPLY);
    let resolver = resolver(Arc::new(cache), model);

    let entry = MappingEntry {
        selector: SelectorChain::new(["#applicant_name"]),
        canonical_key: CanonicalKey::FullName,
        input_kind: InputKind::Text,
        required: true,
        transform: None,
        label: Some("Applicant Name".to_string()),
        options: Default::default(),
    };
    let verified = resolver
        .record_verified("curated.example.edu", vec![entry], Some("curated".to_string()))
        .expect("verified stored");

    let cache = resolver.cache();
    let mut attempt = verified.clone();
    attempt.verified = false;
    let err = cache
        .put("curated.example.edu", attempt.clone())
        .expect_err("verified row is immutable");
    assert!(matches!(err, CacheError::ImmutableVerifiedMapping { .. }));

    assert!(resolver
        .invalidate("curated.example.edu")
        .expect("invalidate"));
    cache
        .put("curated.example.edu", attempt)
        .expect("put after invalidate");
}
