//! Named encoder variants.
//!
//! Documents are indexed with an encoder chosen by name, and queries against a
//! document must use the same encoder. [`EncoderRegistry`] resolves those names.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::hashing::HashingEmbeddingProvider;

/// Fast, small encoder variant.
pub const MINI_ENCODER: &str = "mini";
/// Large, more accurate encoder variant.
pub const LABSE_ENCODER: &str = "labse";
/// Output size of the `mini` variant.
pub const MINI_DIMENSIONS: usize = 312;
/// Output size of the `labse` variant.
pub const LABSE_DIMENSIONS: usize = 768;

/// Maps encoder variant names to embedding providers.
///
/// [`EncoderRegistry::default`] registers the built-in `mini` and `labse`
/// variants backed by [`HashingEmbeddingProvider`]. Registering a provider
/// under an existing name replaces it.
///
/// # Example
///
/// ```rust,ignore
/// use sift_rag::EncoderRegistry;
///
/// let registry = EncoderRegistry::default();
/// let encoder = registry.get("mini")?;
/// assert_eq!(encoder.dimensions(), 312);
/// ```
#[derive(Clone)]
pub struct EncoderRegistry {
    encoders: BTreeMap<String, Arc<dyn EmbeddingProvider>>,
}

impl EncoderRegistry {
    /// Create a registry with no encoders.
    pub fn empty() -> Self {
        Self { encoders: BTreeMap::new() }
    }

    /// Register `provider` under `name`.
    pub fn register(
        mut self,
        name: impl Into<String>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        self.encoders.insert(name.into(), provider);
        self
    }

    /// Look up an encoder by variant name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if no encoder is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn EmbeddingProvider>> {
        self.encoders.get(name).cloned().ok_or_else(|| {
            RagError::InvalidInput(format!(
                "unsupported encoder '{name}' (available: {})",
                self.names().join(", ")
            ))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.encoders.contains_key(name)
    }

    /// Registered variant names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.encoders.keys().map(String::as_str).collect()
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::empty()
            .register(
                MINI_ENCODER,
                Arc::new(HashingEmbeddingProvider::new(MINI_ENCODER, MINI_DIMENSIONS)),
            )
            .register(
                LABSE_ENCODER,
                Arc::new(HashingEmbeddingProvider::new(LABSE_ENCODER, LABSE_DIMENSIONS)),
            )
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderRegistry").field("encoders", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_both_variants() {
        let registry = EncoderRegistry::default();
        assert_eq!(registry.names(), vec!["labse", "mini"]);
        assert_eq!(registry.get("mini").unwrap().dimensions(), MINI_DIMENSIONS);
        assert_eq!(registry.get("labse").unwrap().dimensions(), LABSE_DIMENSIONS);
    }

    #[test]
    fn unknown_variant_is_invalid_input() {
        let err = EncoderRegistry::default().get("bert").err().unwrap();
        assert!(matches!(err, RagError::InvalidInput(ref m) if m.contains("bert")));
    }

    #[test]
    fn register_replaces_existing_variant() {
        let registry = EncoderRegistry::default()
            .register(MINI_ENCODER, Arc::new(HashingEmbeddingProvider::new("tiny", 16)));
        assert_eq!(registry.get("mini").unwrap().dimensions(), 16);
        assert!(registry.contains("labse"));
        assert!(!EncoderRegistry::empty().contains("mini"));
    }
}
