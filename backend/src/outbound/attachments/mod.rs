//! Filesystem-backed attachment store.
//!
//! Files land under `<root>/<request id>/<uuid>.<ext>` and are addressed by
//! `<public base url>/<request id>/<uuid>.<ext>`. Serving the directory is left
//! to whatever fronts the service.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    AttachmentStore, AttachmentStoreError, AttachmentUpload, MAX_ATTACHMENT_BYTES,
};
use crate::domain::{Attachment, AttachmentKind, RequestId};

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic"];
const VOICE_EXTENSIONS: &[&str] = &["m4a", "aac", "mp3", "ogg", "wav"];

/// Attachment store writing into a local directory.
#[derive(Debug, Clone)]
pub struct FilesystemAttachmentStore {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemAttachmentStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_owned();
        Self {
            root: root.into(),
            public_base_url,
        }
    }
}

fn normalise_extension(upload: &AttachmentUpload) -> Result<String, AttachmentStoreError> {
    let extension = upload.extension.trim().trim_start_matches('.').to_lowercase();
    let allowed = match upload.kind {
        AttachmentKind::Photo => PHOTO_EXTENSIONS,
        AttachmentKind::Voice => VOICE_EXTENSIONS,
    };
    if !allowed.contains(&extension.as_str()) {
        return Err(AttachmentStoreError::rejected(format!(
            "{} attachments cannot be .{extension}",
            upload.kind
        )));
    }
    Ok(extension)
}

fn check_size(upload: &AttachmentUpload) -> Result<(), AttachmentStoreError> {
    if upload.bytes.is_empty() {
        return Err(AttachmentStoreError::rejected("attachment is empty"));
    }
    if upload.bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentStoreError::rejected(format!(
            "attachment exceeds {MAX_ATTACHMENT_BYTES} bytes"
        )));
    }
    Ok(())
}

#[async_trait]
impl AttachmentStore for FilesystemAttachmentStore {
    async fn store(
        &self,
        request_id: RequestId,
        upload: AttachmentUpload,
    ) -> Result<Attachment, AttachmentStoreError> {
        check_size(&upload)?;
        let extension = normalise_extension(&upload)?;
        let file_name = format!("{}.{extension}", Uuid::new_v4());
        let directory = self.root.join(request_id.to_string());

        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?;
        tokio::fs::write(directory.join(&file_name), &upload.bytes)
            .await
            .map_err(|err| AttachmentStoreError::io(err.to_string()))?;
        debug!(%request_id, kind = %upload.kind, bytes = upload.bytes.len(), "attachment stored");

        Ok(Attachment {
            kind: upload.kind,
            url: format!("{}/{request_id}/{file_name}", self.public_base_url),
        })
    }

    async fn discard(&self, request_id: RequestId) -> Result<(), AttachmentStoreError> {
        match tokio::fs::remove_dir_all(self.root.join(request_id.to_string())).await {
            Ok(()) => {
                debug!(%request_id, "attachments discarded");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AttachmentStoreError::io(err.to_string())),
        }
    }
}
