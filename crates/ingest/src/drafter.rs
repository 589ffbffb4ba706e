//! Reply drafting contract.

use async_trait::async_trait;

use surge_core::{Post, ReplyDraft};

use crate::error::IngestError;

/// Drafts candidate replies for a post, one per requested tone.
///
/// Implementations wrap the completion backend. Returning an empty list
/// is the degradation path (backend unconfigured or response unusable);
/// callers treat it as "no drafts", never as a job failure.
#[async_trait]
pub trait ReplyDrafter: Send + Sync {
    async fn draft(&self, post: &Post, tones: &[String]) -> Result<Vec<ReplyDraft>, IngestError>;
}

/// Drafter used when no completion backend is configured.
pub struct NoDrafter;

#[async_trait]
impl ReplyDrafter for NoDrafter {
    async fn draft(&self, _post: &Post, _tones: &[String]) -> Result<Vec<ReplyDraft>, IngestError> {
        Ok(Vec::new())
    }
}
