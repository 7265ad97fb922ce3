use super::{PutObject, StorageService};
use crate::models::{ResourceType, SlideDocument, StorageDescriptor};
use crate::{Error, Result};
use tracing::{error, info};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Storage key for a deck titled `title` inside `folder`: `<folder>/<title>.json`.
///
/// Path separators in the title are replaced so every title lands directly in
/// the folder.
pub fn object_key(folder: &str, title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    let folder = folder.trim().trim_matches('/');
    if folder.is_empty() {
        format!("{}.json", stem)
    } else {
        format!("{}/{}.json", folder, stem)
    }
}

/// Serialize `document` and write it under the key derived from `title`.
///
/// An existing object with the same key is replaced.
pub async fn commit(
    storage: &dyn StorageService,
    folder: &str,
    title: &str,
    document: &SlideDocument,
) -> Result<StorageDescriptor> {
    let key = object_key(folder, title);
    let body = serde_json::to_vec_pretty(document).map_err(|e| {
        Error::StorageWriteFailed(format!("Failed to serialize slide document: {}", e))
    })?;

    info!(
        "Committing {} slides ({} bytes) to {}",
        document.len(),
        body.len(),
        key
    );

    let descriptor = storage
        .put_object(PutObject {
            key: key.clone(),
            body,
            content_type: JSON_CONTENT_TYPE.to_string(),
            resource_type: ResourceType::Raw,
        })
        .await
        .map_err(|e| {
            error!("Commit to {} failed: {}", key, e);
            match e {
                Error::StorageWriteFailed(_) => e,
                other => Error::StorageWriteFailed(other.to_string()),
            }
        })?;

    info!("Committed {} ({} bytes)", descriptor.key, descriptor.size);
    Ok(descriptor)
}
