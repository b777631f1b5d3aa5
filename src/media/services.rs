use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::StorageClient;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub key: String,
    pub url: String,
}

/// Uploads one file under `folder` and returns its public URL.
///
/// Any failure is logged and reported as `None`; callers decide whether a
/// missing upload is fatal.
pub async fn upload(
    storage: &dyn StorageClient,
    folder: &str,
    item: Option<UploadItem>,
) -> Option<UploadedMedia> {
    let item = item?;
    match put(storage, folder, item).await {
        Ok(m) => {
            debug!(key = %m.key, "media uploaded");
            Some(m)
        }
        Err(e) => {
            warn!(error = ?e, folder, "media upload failed");
            None
        }
    }
}

async fn put(storage: &dyn StorageClient, folder: &str, item: UploadItem) -> anyhow::Result<UploadedMedia> {
    anyhow::ensure!(!item.body.is_empty(), "empty file");
    let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
    let key = format!("users/{}/{}.{}", folder, Uuid::new_v4(), ext);
    storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    let url = storage.public_url(&key);
    Ok(UploadedMedia { key, url })
}

/// Best-effort removal of media that ended up unreferenced.
pub async fn discard(storage: &dyn StorageClient, media: &[&UploadedMedia]) {
    for m in media {
        if let Err(e) = storage.delete_object(&m.key).await {
            warn!(error = ?e, key = %m.key, "failed to delete orphaned media");
        }
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}
