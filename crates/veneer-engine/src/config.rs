//! Projection configuration
//!
//! Loaded from the `[projection]` table of a TOML document:
//!
//! ```toml
//! [projection]
//! strict_invocations = true
//! lenient_reads = true
//! lenient_writes = false
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use veneer_types::TypeRegistry;

use crate::cache::InvocationCache;
use crate::error::{ProjectionError, ProjectionResult};
use crate::proxy::ProxySynthesizer;

/// How a projection treats members its target does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Surface `MemberNotFound` for absent methods (otherwise they return null)
    pub strict_invocations: bool,

    /// Absent properties and indexers read as null
    pub lenient_reads: bool,

    /// Writes to absent properties and indexers are accepted and dropped
    pub lenient_writes: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            strict_invocations: true,
            lenient_reads: true,
            lenient_writes: true,
        }
    }
}

#[derive(Deserialize, Default)]
struct ConfigDocument {
    #[serde(default)]
    projection: ProjectionConfig,
}

impl ProjectionConfig {
    /// Every absent member is an error
    pub fn strict() -> Self {
        Self {
            strict_invocations: true,
            lenient_reads: false,
            lenient_writes: false,
        }
    }

    /// Parse the `[projection]` table; a missing table yields the defaults
    pub fn from_toml_str(source: &str) -> ProjectionResult<Self> {
        let doc: ConfigDocument = toml::from_str(source)?;
        Ok(doc.projection)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ProjectionResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ProjectionError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }
}

/// Configuration plus the shared state projections are built from
#[derive(Clone)]
pub struct ProjectionOptions {
    /// Absence handling
    pub config: ProjectionConfig,

    /// Types for late binding and reconstitution (shared)
    pub registry: Arc<TypeRegistry>,

    /// Binding cache (shared)
    pub cache: Arc<InvocationCache>,

    /// Proxy type memo (shared)
    pub synthesizer: Arc<ProxySynthesizer>,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            config: ProjectionConfig::default(),
            registry: TypeRegistry::global(),
            cache: InvocationCache::global(),
            synthesizer: ProxySynthesizer::global(),
        }
    }
}

impl ProjectionOptions {
    /// Options with fresh, unshared registry, cache and synthesizer
    pub fn isolated() -> Self {
        Self {
            config: ProjectionConfig::default(),
            registry: Arc::new(TypeRegistry::new()),
            cache: Arc::new(InvocationCache::new()),
            synthesizer: Arc::new(ProxySynthesizer::new()),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ProjectionConfig) -> Self {
        self.config = config;
        self
    }
}
