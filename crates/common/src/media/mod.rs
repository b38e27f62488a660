//! Media storage boundary
//!
//! Recipe and avatar images arrive as inline base64 payloads (optionally a
//! `data:image/...;base64,` URI). This module decodes them, writes the bytes
//! under the media root, and hands back a public URL. Nothing here inspects
//! pixels.

use crate::errors::{AppError, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Media types accepted for upload
const ACCEPTED: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// Split an inline image payload into (file extension, raw bytes).
///
/// Accepts both a full data URI and a bare base64 string; a bare string is
/// assumed to be PNG.
pub fn parse_image_payload(payload: &str) -> Result<(&'static str, Vec<u8>)> {
    let (ext, encoded) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (media_type, encoded) = rest.split_once(";base64,").ok_or_else(invalid)?;
            let ext = ACCEPTED
                .iter()
                .find(|(mt, _)| *mt == media_type)
                .map(|(_, ext)| *ext)
                .ok_or_else(|| AppError::InvalidFormat {
                    message: format!("unsupported media type: {}", media_type),
                })?;
            (ext, encoded)
        }
        None => ("png", payload),
    };

    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|_| invalid())?;

    if bytes.is_empty() {
        return Err(invalid());
    }

    Ok((ext, bytes))
}

fn invalid() -> AppError {
    AppError::InvalidFormat {
        message: "expected a base64-encoded image".to_string(),
    }
}

/// Content-addressed file store resolving uploads to public URLs
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let mut url_prefix = url_prefix.into();
        while url_prefix.ends_with('/') {
            url_prefix.pop();
        }
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Decode an inline image payload, persist it under `subdir`, and return
    /// its public URL. The filename is derived from the content hash, so
    /// re-uploading identical bytes is idempotent.
    pub async fn store(&self, subdir: &str, payload: &str) -> Result<String> {
        let (ext, bytes) = parse_image_payload(payload)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());
        let filename = format!("{}.{}", &digest[..32], ext);

        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&filename), &bytes).await?;

        Ok(format!("{}/{}/{}", self.url_prefix, subdir, filename))
    }

    /// Best-effort removal of a previously stored file by its public URL.
    /// Missing files are ignored.
    pub async fn remove(&self, url: &str) {
        let Some(relative) = url.strip_prefix(&self.url_prefix) else {
            return;
        };
        let path = self.root.join(relative.trim_start_matches('/'));
        let _ = tokio::fs::remove_file(path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_parse_data_uri() {
        let payload = format!("data:image/png;base64,{}", PNG_B64);
        let (ext, bytes) = parse_image_payload(&payload).unwrap();
        assert_eq!(ext, "png");
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_parse_bare_base64_defaults_to_png() {
        let (ext, _) = parse_image_payload(PNG_B64).unwrap();
        assert_eq!(ext, "png");
    }

    #[test]
    fn test_parse_rejects_unknown_media_type() {
        let payload = format!("data:application/pdf;base64,{}", PNG_B64);
        assert!(parse_image_payload(&payload).is_err());
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert!(parse_image_payload("not base64 at all!!!").is_err());
        assert!(parse_image_payload("").is_err());
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", std::process::id()));
        let store = MediaStore::new(&root, "/media/");

        let payload = format!("data:image/png;base64,{}", PNG_B64);
        let url = store.store("recipes", &payload).await.unwrap();
        assert!(url.starts_with("/media/recipes/"));
        assert!(url.ends_with(".png"));

        // Idempotent for identical bytes
        let again = store.store("recipes", &payload).await.unwrap();
        assert_eq!(url, again);

        store.remove(&url).await;
        let _ = tokio::fs::remove_dir_all(root).await;
    }
}
