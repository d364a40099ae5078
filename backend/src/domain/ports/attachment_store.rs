//! Driven port for storing request attachments (photos and voice notes).

use async_trait::async_trait;

use crate::domain::{Attachment, AttachmentKind, RequestId};

use super::define_port_error;

/// Largest accepted upload, before any transport encoding.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Raw attachment bytes as uploaded by a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub kind: AttachmentKind,
    /// File extension without the leading dot, such as `jpg` or `m4a`.
    pub extension: String,
    pub bytes: Vec<u8>,
}

define_port_error! {
    /// Errors surfaced while storing an attachment.
    pub enum AttachmentStoreError {
        /// The upload was refused before writing.
        Rejected { message: String } =>
            "attachment rejected: {message}",
        /// Writing the attachment failed.
        Io { message: String } =>
            "attachment storage failed: {message}",
    }
}

/// Port for persisting attachment blobs and returning their public URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store one upload belonging to `request_id`.
    async fn store(
        &self,
        request_id: RequestId,
        upload: AttachmentUpload,
    ) -> Result<Attachment, AttachmentStoreError>;

    /// Remove everything stored for `request_id`.
    ///
    /// Used when the request itself could not be saved. Removing nothing is
    /// not an error.
    async fn discard(&self, request_id: RequestId) -> Result<(), AttachmentStoreError>;
}

/// Fixture store that pretends every upload succeeded.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAttachmentStore;

#[async_trait]
impl AttachmentStore for FixtureAttachmentStore {
    async fn store(
        &self,
        request_id: RequestId,
        upload: AttachmentUpload,
    ) -> Result<Attachment, AttachmentStoreError> {
        Ok(Attachment {
            kind: upload.kind,
            url: format!(
                "memory://attachments/{request_id}/{}.{}",
                upload.kind, upload.extension
            ),
        })
    }

    async fn discard(&self, _request_id: RequestId) -> Result<(), AttachmentStoreError> {
        Ok(())
    }
}
