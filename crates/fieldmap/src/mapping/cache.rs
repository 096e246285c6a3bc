use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::domain::ResolvedMapping;

/// Domain-keyed store for mappings that did not come from the static registry.
///
/// Implementations must make `replace` atomic with respect to `get`: a reader sees either
/// the old row or the new one, never a gap between them.
pub trait MappingCache: Send + Sync {
    fn get(&self, domain: &str) -> Result<Option<ResolvedMapping>, CacheError>;
    /// Stores `mapping` unless a verified row already exists for `domain`.
    fn put(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError>;
    /// Drops the row for `domain`, returning whether one existed.
    fn invalidate(&self, domain: &str) -> Result<bool, CacheError>;
    /// Invalidate followed by put under one critical section.
    fn replace(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError>;
    fn domains(&self) -> Result<Vec<String>, CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("a verified mapping is already stored for '{domain}'")]
    ImmutableVerifiedMapping { domain: String },
    #[error("mapping store I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("mapping store at {path} is not valid JSON: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn ensure_writable(
    existing: Option<&ResolvedMapping>,
    domain: &str,
) -> Result<(), CacheError> {
    match existing {
        Some(row) if row.verified => Err(CacheError::ImmutableVerifiedMapping {
            domain: domain.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Process-local cache; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMappingCache {
    rows: RwLock<HashMap<String, ResolvedMapping>>,
}

impl InMemoryMappingCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MappingCache for InMemoryMappingCache {
    fn get(&self, domain: &str) -> Result<Option<ResolvedMapping>, CacheError> {
        let rows = self.rows.read().expect("mapping cache lock poisoned");
        Ok(rows.get(domain).cloned())
    }

    fn put(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
        let mut rows = self.rows.write().expect("mapping cache lock poisoned");
        ensure_writable(rows.get(domain), domain)?;
        rows.insert(domain.to_string(), mapping);
        Ok(())
    }

    fn invalidate(&self, domain: &str) -> Result<bool, CacheError> {
        let mut rows = self.rows.write().expect("mapping cache lock poisoned");
        Ok(rows.remove(domain).is_some())
    }

    fn replace(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
        let mut rows = self.rows.write().expect("mapping cache lock poisoned");
        rows.insert(domain.to_string(), mapping);
        Ok(())
    }

    fn domains(&self) -> Result<Vec<String>, CacheError> {
        let rows = self.rows.read().expect("mapping cache lock poisoned");
        let mut domains: Vec<String> = rows.keys().cloned().collect();
        domains.sort();
        Ok(domains)
    }
}

/// JSON-file backed cache. Every mutation writes and fsyncs a temp file, renames it over
/// the store and then syncs the directory, so a crash leaves either the old or the new file.
#[derive(Debug)]
pub struct FileMappingCache {
    path: PathBuf,
    rows: RwLock<BTreeMap<String, ResolvedMapping>>,
}

impl FileMappingCache {
    /// Opens the store at `path`, creating parent directories; a missing file is an empty
    /// cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let rows = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| CacheError::Serialization {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), rows = rows.len(), "opened mapping store");
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hidden sibling of the store, unique per process so two writers never share one.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("fieldmaps");
        self.path
            .with_file_name(format!(".{name}.tmp.{}", std::process::id()))
    }

    fn persist(&self, rows: &BTreeMap<String, ResolvedMapping>) -> Result<(), CacheError> {
        let encoded =
            serde_json::to_vec_pretty(rows).map_err(|source| CacheError::Serialization {
                path: self.path.clone(),
                source,
            })?;

        let staging = self.staging_path();
        let written = fs::File::create(&staging).and_then(|mut file| {
            file.write_all(&encoded)?;
            file.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&staging);
            return Err(CacheError::Io {
                path: staging,
                source,
            });
        }

        fs::rename(&staging, &self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;
        if let Some(dir) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            if let Ok(dir) = fs::File::open(dir) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn mutate<F, T>(&self, change: F) -> Result<T, CacheError>
    where
        F: FnOnce(&mut BTreeMap<String, ResolvedMapping>) -> Result<T, CacheError>,
    {
        let mut rows = self.rows.write().expect("mapping store lock poisoned");
        let mut next = rows.clone();
        let outcome = change(&mut next)?;
        self.persist(&next)?;
        *rows = next;
        Ok(outcome)
    }
}

impl MappingCache for FileMappingCache {
    fn get(&self, domain: &str) -> Result<Option<ResolvedMapping>, CacheError> {
        let rows = self.rows.read().expect("mapping store lock poisoned");
        Ok(rows.get(domain).cloned())
    }

    fn put(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
        self.mutate(|rows| {
            ensure_writable(rows.get(domain), domain)?;
            rows.insert(domain.to_string(), mapping);
            Ok(())
        })
    }

    fn invalidate(&self, domain: &str) -> Result<bool, CacheError> {
        {
            let rows = self.rows.read().expect("mapping store lock poisoned");
            if !rows.contains_key(domain) {
                return Ok(false);
            }
        }
        self.mutate(|rows| Ok(rows.remove(domain).is_some()))
    }

    fn replace(&self, domain: &str, mapping: ResolvedMapping) -> Result<(), CacheError> {
        self.mutate(|rows| {
            rows.insert(domain.to_string(), mapping);
            Ok(())
        })
    }

    fn domains(&self) -> Result<Vec<String>, CacheError> {
        let rows = self.rows.read().expect("mapping store lock poisoned");
        Ok(rows.keys().cloned().collect())
    }
}
