//! Copies a part's content into a local cache directory so callers can
//! hand out a plain file path. Unlike resolution and extraction, failures
//! here surface to the caller with a stable code.

use crate::models::CachedPart;
use crate::store::RecordStore;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};

const PART_URI_PREFIX: &str = "content://mms/part/";

static CACHE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub enum CacheError {
    /// Missing or unparseable part reference
    InvalidUri(String),
    /// Part or its backing file not found
    OpenStream(String),
    /// Store or filesystem failure while copying
    Copy(String),
}

impl CacheError {
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::InvalidUri(_) => "E_INVALID_URI",
            CacheError::OpenStream(_) => "E_OPEN_STREAM",
            CacheError::Copy(_) => "E_COPY_URI",
        }
    }
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::InvalidUri(msg) => write!(f, "Invalid part uri: {}", msg),
            CacheError::OpenStream(msg) => write!(f, "Unable to open part: {}", msg),
            CacheError::Copy(msg) => write!(f, "Copy failed: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// Accepts `content://mms/part/<id>` or a bare numeric id.
pub fn parse_part_reference(reference: &str) -> Option<String> {
    let trimmed = reference.trim();
    let id = trimmed.strip_prefix(PART_URI_PREFIX).unwrap_or(trimmed);
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// File extension for a cached part: the subtype of `image/*` and
/// `audio/*` types (`jpeg` becomes `jpg`), `bin` for everything else.
pub fn extension_for_mime(mime_type: Option<&str>) -> String {
    let subtype = mime_type.and_then(|mime| {
        mime.strip_prefix("image/")
            .or_else(|| mime.strip_prefix("audio/"))
    });
    let ext = subtype
        .map(|s| s.split(';').next().unwrap_or("").trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "bin".to_string());

    if ext == "jpeg" {
        "jpg".to_string()
    } else {
        ext
    }
}

fn cache_file_path(cache_dir: &Path, ext: &str) -> PathBuf {
    let seq = CACHE_SEQ.fetch_add(1, Ordering::Relaxed);
    cache_dir.join(format!(
        "mms_{}_{}_{}.{}",
        chrono::Utc::now().timestamp_millis(),
        std::process::id(),
        seq,
        ext
    ))
}

pub fn copy_part_to_cache(
    store: &dyn RecordStore,
    reference: &str,
    cache_dir: &Path,
) -> Result<CachedPart, CacheError> {
    if reference.trim().is_empty() {
        return Err(CacheError::InvalidUri("contentUri is required".to_string()));
    }
    let part_id = parse_part_reference(reference)
        .ok_or_else(|| CacheError::InvalidUri(reference.to_string()))?;

    let blob = match store.open_part(&part_id) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            return Err(CacheError::OpenStream(format!(
                "Unable to open input stream for {}",
                reference
            )))
        }
        Err(e) => {
            error!(target: "cache", part_id = part_id.as_str(), "Failed to read part: {}", e);
            return Err(CacheError::Copy(e.to_string()));
        }
    };

    let ext = extension_for_mime(blob.mime_type.as_deref());
    std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Copy(e.to_string()))?;
    let path = cache_file_path(cache_dir, &ext);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| CacheError::Copy(e.to_string()))?;
    file.write_all(&blob.bytes)
        .and_then(|_| file.flush())
        .map_err(|e| {
            error!(target: "cache", path = %path.display(), "Failed to write cache file: {}", e);
            CacheError::Copy(e.to_string())
        })?;

    info!(
        target: "cache",
        part_id = part_id.as_str(),
        path = %path.display(),
        size = blob.bytes.len(),
        "Copied part to cache"
    );

    Ok(CachedPart {
        file_uri: format!("file://{}", path.display()),
        mime_type: blob.mime_type,
        size: blob.bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn test_parse_part_reference() {
        assert_eq!(parse_part_reference("content://mms/part/12"), Some("12".to_string()));
        assert_eq!(parse_part_reference(" 7 "), Some("7".to_string()));
        assert_eq!(parse_part_reference("content://mms/part/"), None);
        assert_eq!(parse_part_reference("content://sms/3"), None);
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for_mime(Some("image/PNG")), "png");
        assert_eq!(extension_for_mime(Some("audio/amr")), "amr");
        assert_eq!(extension_for_mime(Some("audio/ogg; codecs=opus")), "ogg");
        assert_eq!(extension_for_mime(Some("image/")), "bin");
        assert_eq!(extension_for_mime(Some("text/plain")), "bin");
        assert_eq!(extension_for_mime(None), "bin");
    }

    #[test]
    fn copies_part_into_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new().blob("12", b"\xff\xd8\xff\xe0jpeg", Some("image/jpeg"));

        let cached = copy_part_to_cache(&store, "content://mms/part/12", dir.path()).unwrap();
        assert_eq!(cached.size, 8);
        assert_eq!(cached.mime_type.as_deref(), Some("image/jpeg"));
        assert!(cached.file_uri.starts_with("file://"));
        assert!(cached.file_uri.ends_with(".jpg"));

        let path = cached.file_uri.trim_start_matches("file://");
        assert_eq!(std::fs::read(path).unwrap(), b"\xff\xd8\xff\xe0jpeg".to_vec());

        let again = copy_part_to_cache(&store, "12", dir.path()).unwrap();
        assert_ne!(again.file_uri, cached.file_uri);
    }

    #[test]
    fn labeled_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();

        let err = copy_part_to_cache(&store, "  ", dir.path()).unwrap_err();
        assert_eq!(err.code(), "E_INVALID_URI");

        let err = copy_part_to_cache(&store, "content://sms/1", dir.path()).unwrap_err();
        assert_eq!(err.code(), "E_INVALID_URI");

        let err = copy_part_to_cache(&store, "content://mms/part/5", dir.path()).unwrap_err();
        assert_eq!(err.code(), "E_OPEN_STREAM");
    }
}
