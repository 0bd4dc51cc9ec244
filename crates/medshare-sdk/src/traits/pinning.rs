use crate::error::Result;
use crate::record::ContentId;
use crate::upload::EncodedDocument;
use async_trait::async_trait;

/// Content pinning service
#[async_trait]
pub trait ContentPinner: Send + Sync {
    /// Upload the document and return the identifier it was pinned under
    async fn pin(&self, document: &EncodedDocument) -> Result<ContentId>;
}
