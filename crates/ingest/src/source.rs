//! Post source contract and a static in-process source.

use async_trait::async_trait;

use surge_core::NormalizedPost;

use crate::error::IngestError;

/// An adapter yielding normalized posts from one platform.
///
/// Implementations wrap the actual platform clients (search endpoints,
/// listing APIs). An empty result is a normal outcome, not an error.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch up to `limit` recent items matching the keywords.
    async fn fetch(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<NormalizedPost>, IngestError>;

    /// Short source name for logs and limit lookup (e.g. "x", "reddit").
    fn name(&self) -> &str;
}

/// Fixed-content source used in tests and offline runs.
pub struct StaticSource {
    name: String,
    items: Vec<NormalizedPost>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, items: Vec<NormalizedPost>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

#[async_trait]
impl PostSource for StaticSource {
    async fn fetch(
        &self,
        _keywords: &[String],
        limit: usize,
    ) -> Result<Vec<NormalizedPost>, IngestError> {
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
