//! The current-document slot.
//!
//! A [`DocumentSlot`] holds at most one [`IndexedDocument`] as an immutable
//! snapshot behind an `Arc`. Readers clone the `Arc` and release the lock
//! immediately; replacement swaps the pointer in one step. A reader therefore
//! sees either the old document or the new one, never a mix, and a rebuild that
//! fails before [`replace`](DocumentSlot::replace) leaves the slot untouched.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::document::IndexedDocument;
use crate::error::{RagError, Result};

/// Holds the current indexed document, if any.
///
/// Cloning a `DocumentSlot` yields a handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct DocumentSlot {
    current: Arc<RwLock<Option<Arc<IndexedDocument>>>>,
}

impl DocumentSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `document` current, returning the shared snapshot.
    pub async fn replace(&self, document: IndexedDocument) -> Arc<IndexedDocument> {
        let document = Arc::new(document);
        let previous = self.current.write().await.replace(Arc::clone(&document));
        info!(
            document.id = %document.document_id,
            previous.id = previous.as_ref().map(|d| d.document_id.as_str()),
            "current document replaced"
        );
        document
    }

    /// The current document snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if no document has been loaded.
    pub async fn current(&self) -> Result<Arc<IndexedDocument>> {
        self.current
            .read()
            .await
            .clone()
            .ok_or_else(|| RagError::NotFound("no document is loaded".to_string()))
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::document::Chunk;
    use crate::index::SimilarityIndex;

    fn document(id: &str) -> IndexedDocument {
        IndexedDocument {
            document_id: id.to_string(),
            file_name: format!("{id}.txt"),
            raw_text: "text".to_string(),
            encoder_name: "mini".to_string(),
            chunk_size: 10,
            chunk_overlap: 0,
            indexed_at: Utc::now(),
            index: SimilarityIndex::from_parts(
                vec![Chunk { chunk_id: 0, text: "text".into() }],
                vec![vec![1.0]],
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn empty_slot_reports_not_found() {
        let slot = DocumentSlot::new();
        assert!(!slot.is_loaded().await);
        assert!(matches!(slot.current().await, Err(RagError::NotFound(_))));
    }

    #[tokio::test]
    async fn replace_swaps_whole_snapshot() {
        let slot = DocumentSlot::new();
        slot.replace(document("first")).await;
        let held = slot.current().await.unwrap();

        let handle = slot.clone();
        handle.replace(document("second")).await;

        // A snapshot taken before the swap stays intact.
        assert_eq!(held.document_id, "first");
        assert_eq!(slot.current().await.unwrap().document_id, "second");
    }
}
