//! Field mapping between the normalized student profile and portal registration forms.
//!
//! Resolution order is static registry, then cache, then model inference. Transforms and
//! fill planning turn a resolved mapping plus a profile into values ready to write.

pub mod cache;
pub mod domain;
pub mod inference;
pub mod plan;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod transform;

pub use cache::{CacheError, FileMappingCache, InMemoryMappingCache, MappingCache};
pub use domain::{
    normalize_domain, CanonicalKey, FormType, InputKind, MappingEntry, MappingSource,
    ResolvedMapping, SelectorChain,
};
pub use inference::{
    BackendError, ChatRequest, InferenceBackend, InferenceError, InferenceResolver, OllamaClient,
};
pub use plan::{FillAction, FillInstruction, FillPlan, PlanError, StudentProfile};
pub use registry::{FieldBinding, PortalProfile, PortalRegistry, PortalSummary, RegistryError};
pub use resolver::{MappingResolver, ResolutionError};
pub use router::fieldmap_router;
pub use transform::{apply as apply_transform, TransformContext, TransformError, TransformName};
