use fieldmap::config::{AppConfig, CacheConfig};
use fieldmap::error::AppError;
use fieldmap::mapping::{
    CacheError, FileMappingCache, InMemoryMappingCache, InferenceResolver, MappingCache,
    MappingResolver, OllamaClient, PortalRegistry, ResolvedMapping,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Cache backend chosen by `FIELDMAP_CACHE_PATH`.
#[derive(Debug)]
pub(crate) enum ConfiguredCache {
    Memory(InMemoryMappingCache),
    File(FileMappingCache),
}

impl ConfiguredCache {
    pub(crate) fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        match &config.store_path {
            Some(path) => FileMappingCache::open(path).map(Self::File),
            None => Ok(Self::Memory(InMemoryMappingCache::new())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "memory".to_string(),
            Self::File(cache) => format!("file:{}", cache.path().display()),
        }
    }

    fn backend(&self) -> &dyn MappingCache {
        match self {
            Self::Memory(cache) => cache,
            Self::File(cache) => cache,
        }
    }
}

impl MappingCache for ConfiguredCache {
    fn get(&self, domain: &str) -> Result<Option<ResolvedMapping>, CacheError> {
        self.backend().get(domain)
    }

    fn put(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
        self.backend().put(domain, mapping)
    }

    fn invalidate(&self, domain: &str) -> Result<bool, CacheError> {
        self.backend().invalidate(domain)
    }

    fn replace(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
        self.backend().replace(domain, mapping)
    }

    fn domains(&self) -> Result<Vec<String>, CacheError> {
        self.backend().domains()
    }
}

pub(crate) type ServiceResolver = MappingResolver<ConfiguredCache, OllamaClient>;

/// Wires the builtin registry, the configured cache and the Ollama client together.
pub(crate) fn build_resolver(config: &AppConfig) -> Result<Arc<ServiceResolver>, AppError> {
    let registry = Arc::new(PortalRegistry::builtin()?);
    let cache = Arc::new(ConfiguredCache::from_config(&config.cache)?);
    let client = Arc::new(OllamaClient::new(&config.inference)?);

    info!(
        portals = registry.len(),
        cache = %cache.describe(),
        model = %config.inference.model,
        chat_url = client.chat_url(),
        "mapping resolver assembled"
    );

    let inference = InferenceResolver::new(client, &config.inference);
    Ok(Arc::new(MappingResolver::new(registry, cache, inference)))
}
