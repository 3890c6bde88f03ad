//! Local-disk storage sink.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::BufWriter;
use tracing::{debug, info, instrument};
use url::Url;

use super::{DrainError, StorageError, StorageSink, StoredObject, drain_into};
use crate::download::{BodyStream, FALLBACK_FILENAME, is_meaningful, sanitize_filename};

/// Highest numeric suffix tried before falling back to a timestamp.
const MAX_SUFFIX: usize = 1000;

/// Longest stored name in bytes. Leaves room for a `_<n>` or timestamp
/// suffix under the common 255-byte file name limit.
const MAX_NAME_BYTES: usize = 200;

/// Length retried with when the filesystem still rejects a capped name.
const SHORT_NAME_BYTES: usize = 64;

/// Extensions longer than this are cut along with the stem.
const MAX_EXTENSION_BYTES: usize = 16;

/// Writes each object to a file under `root`.
///
/// Existing files are never overwritten: a clashing name gets a numeric
/// suffix (`data.csv`, `data_1.csv`, `data_2.csv`, ...). Objects are
/// addressed by `file://` URIs.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates a sink rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a `file://` URI produced by this sink back to its path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUri`] for URIs that are not `file://`
    /// or point outside the root.
    pub async fn path_for(&self, uri: &str) -> Result<PathBuf, StorageError> {
        let path = Url::parse(uri)
            .ok()
            .filter(|url| url.scheme() == "file")
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| StorageError::invalid_uri(uri))?;
        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;
        if path.parent() != Some(root.as_path()) {
            return Err(StorageError::invalid_uri(uri));
        }
        Ok(path)
    }

    /// Reads back the whole object stored under `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the file is gone, or the
    /// errors of [`path_for`](Self::path_for).
    pub async fn read(&self, uri: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(uri).await?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::not_found(uri)
            } else {
                StorageError::io(path, e)
            }
        })
    }
}

#[async_trait]
impl StorageSink for LocalStorage {
    #[instrument(skip(self, body), fields(root = %self.root.display()))]
    async fn write(&self, name_hint: &str, body: BodyStream) -> Result<StoredObject, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;
        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| StorageError::io(&self.root, e))?;

        let (file_path, file) = create_unique_file(&root, name_hint).await?;
        debug!(path = %file_path.display(), "resolved output path");

        let mut writer = BufWriter::new(file);
        let drained = drain_into(body, &mut writer).await;

        let length = match drained {
            Ok(length) => length,
            Err(error) => {
                drop(writer);
                debug!(path = %file_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&file_path).await;
                return Err(match error {
                    DrainError::Body(source) => StorageError::Body { source },
                    DrainError::Write(source) => StorageError::io(file_path, source),
                });
            }
        };

        let uri = Url::from_file_path(&file_path)
            .map_err(|()| StorageError::invalid_uri(file_path.display().to_string()))?
            .to_string();
        info!(path = %file_path.display(), bytes = length, "stored object on disk");

        Ok(StoredObject { uri, length })
    }
}

/// Creates a new file for `name_hint` under `dir`.
///
/// Tries the capped name first. A name the filesystem refuses as invalid is
/// retried shortened, then as [`FALLBACK_FILENAME`].
async fn create_unique_file(dir: &Path, name_hint: &str) -> Result<(PathBuf, File), StorageError> {
    let preferred = safe_file_name(name_hint);
    let short = cap_file_name(&preferred, SHORT_NAME_BYTES);
    let mut names = vec![preferred, short, FALLBACK_FILENAME.to_string()];
    names.dedup();

    let mut rejected = None;
    for name in names {
        match create_with_suffix(dir, &name).await {
            Ok(created) => return Ok(created),
            Err((path, e)) if e.kind() == ErrorKind::InvalidFilename => {
                debug!(path = %path.display(), error = %e, "file name rejected, trying a shorter one");
                rejected = Some(StorageError::io(path, e));
            }
            Err((path, e)) => return Err(StorageError::io(path, e)),
        }
    }

    Err(rejected.unwrap_or_else(|| {
        StorageError::io(
            dir,
            io::Error::new(ErrorKind::InvalidFilename, "no usable file name"),
        )
    }))
}

/// Opens `filename` under `dir` with `create_new`, adding a numeric suffix if
/// the name is taken, so two writers never share a file.
async fn create_with_suffix(dir: &Path, filename: &str) -> Result<(PathBuf, File), (PathBuf, io::Error)> {
    let (stem, ext) = split_extension(filename);

    let timestamp_name = || {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("{stem}_{timestamp}{ext}")
    };
    let candidates = std::iter::once(filename.to_string())
        .chain((1..MAX_SUFFIX).map(|i| format!("{stem}_{i}{ext}")))
        .chain(std::iter::once_with(timestamp_name));

    for candidate in candidates {
        let path = dir.join(&candidate);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err((path, e)),
        }
    }

    Err((
        dir.join(filename),
        io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
    ))
}

/// Reduces a name hint to a single safe path segment of bounded length.
fn safe_file_name(name_hint: &str) -> String {
    let sanitized = sanitize_filename(name_hint);
    if is_meaningful(&sanitized) {
        cap_file_name(&sanitized, MAX_NAME_BYTES)
    } else {
        FALLBACK_FILENAME.to_string()
    }
}

/// Splits `name` into stem and extension (with its dot). A leading dot does
/// not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Truncates `name` to at most `max_bytes`, cutting the stem on a char
/// boundary and keeping a short extension.
fn cap_file_name(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }
    let (stem, ext) = match split_extension(name) {
        (stem, ext) if ext.len() <= MAX_EXTENSION_BYTES => (stem, ext),
        _ => (name, ""),
    };
    let mut end = stem.len().min(max_bytes - ext.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{ext}", &stem[..end])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;
    use std::path::Component;

    use bytes::Bytes;
    use futures_util::stream;
    use tempfile::TempDir;

    use super::*;

    fn body(chunks: Vec<io::Result<Bytes>>) -> BodyStream {
        Box::pin(stream::iter(chunks))
    }

    fn bytes(data: &'static [u8]) -> BodyStream {
        body(vec![Ok(Bytes::from_static(data))])
    }

    #[tokio::test]
    async fn test_write_creates_file_and_file_uri() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let stored = storage.write("report.csv", bytes(b"x,y\n")).await.unwrap();

        assert_eq!(stored.length, 4);
        assert!(stored.uri.starts_with("file://"));
        assert!(stored.uri.ends_with("/report.csv"), "got {}", stored.uri);
        assert_eq!(storage.read(&stored.uri).await.unwrap(), b"x,y\n");
    }

    #[tokio::test]
    async fn test_write_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("nested/out"));
        let stored = storage.write("a.txt", bytes(b"a")).await.unwrap();
        assert_eq!(storage.read(&stored.uri).await.unwrap(), b"a");
    }

    #[tokio::test]
    async fn test_write_zero_length() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let stored = storage.write("empty.txt", body(vec![])).await.unwrap();
        assert_eq!(stored.length, 0);
        assert!(storage.read(&stored.uri).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("data.csv"), b"existing").unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let first = storage.write("data.csv", bytes(b"1")).await.unwrap();
        let second = storage.write("data.csv", bytes(b"2")).await.unwrap();

        assert!(first.uri.ends_with("/data_1.csv"), "got {}", first.uri);
        assert!(second.uri.ends_with("/data_2.csv"), "got {}", second.uri);
        assert_eq!(
            std::fs::read(temp_dir.path().join("data.csv")).unwrap(),
            b"existing"
        );
    }

    #[tokio::test]
    async fn test_write_without_extension_suffixes_stem() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("download"), b"").unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let stored = storage.write("download", body(vec![])).await.unwrap();
        assert!(stored.uri.ends_with("/download_1"), "got {}", stored.uri);
    }

    #[tokio::test]
    async fn test_write_stays_under_root() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let root = temp_dir.path().canonicalize().unwrap();

        for malicious in ["../../etc/passwd", "..", "a/\\b\\c", ""] {
            let stored = storage.write(malicious, body(vec![])).await.unwrap();
            let path = Url::parse(&stored.uri).unwrap().to_file_path().unwrap();
            assert_eq!(path.parent(), Some(root.as_path()), "hint {malicious:?}");
            assert!(!path.components().any(|c| c == Component::ParentDir));
        }
    }

    #[tokio::test]
    async fn test_body_failure_removes_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let result = storage
            .write(
                "partial.bin",
                body(vec![
                    Ok(Bytes::from_static(b"some bytes")),
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
                ]),
            )
            .await;

        assert!(matches!(result, Err(StorageError::Body { .. })));
        assert!(!temp_dir.path().join("partial.bin").exists());
    }

    #[tokio::test]
    async fn test_read_rejects_foreign_uris() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        storage.write("a.txt", bytes(b"a")).await.unwrap();

        assert!(matches!(
            storage.read("memory:///1/a.txt").await,
            Err(StorageError::InvalidUri { .. })
        ));
        assert!(matches!(
            storage.read("file:///etc/hostname").await,
            Err(StorageError::InvalidUri { .. })
        ));
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("filename.jpg"), "filename.jpg");
        assert_eq!(safe_file_name("../x"), ".._x");
        assert_eq!(safe_file_name(".."), FALLBACK_FILENAME);
        assert_eq!(safe_file_name("  "), FALLBACK_FILENAME);
    }

    #[test]
    fn test_safe_file_name_agrees_with_resolver_sanitizing() {
        for hint in ["a/b.csv", "x:y?.txt", "report (1).pdf", ".hidden"] {
            assert_eq!(safe_file_name(hint), sanitize_filename(hint), "hint {hint:?}");
        }
    }

    #[test]
    fn test_cap_file_name_keeps_extension() {
        let name = format!("{}.pdf", "a".repeat(300));
        let capped = cap_file_name(&name, MAX_NAME_BYTES);
        assert_eq!(capped.len(), MAX_NAME_BYTES);
        assert!(capped.ends_with(".pdf"));
        assert_eq!(cap_file_name("short.pdf", MAX_NAME_BYTES), "short.pdf");
    }

    #[test]
    fn test_cap_file_name_respects_char_boundaries() {
        let name = format!("{}.txt", "é".repeat(150));
        let capped = cap_file_name(&name, MAX_NAME_BYTES);
        assert!(capped.len() <= MAX_NAME_BYTES);
        assert!(capped.starts_with('é'));
        assert!(capped.ends_with(".txt"));
    }

    #[test]
    fn test_cap_file_name_drops_oversized_extension() {
        let name = format!("a.{}", "b".repeat(300));
        let capped = cap_file_name(&name, MAX_NAME_BYTES);
        assert_eq!(capped.len(), MAX_NAME_BYTES);
        assert!(capped.starts_with("a.bbb"));
    }

    #[tokio::test]
    async fn test_write_overlong_name_is_capped() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let hint = format!("{}.pdf", "a".repeat(300));

        let first = storage.write(&hint, bytes(b"%PDF")).await.unwrap();
        let second = storage.write(&hint, bytes(b"%PDF")).await.unwrap();

        for stored in [&first, &second] {
            let path = Url::parse(&stored.uri).unwrap().to_file_path().unwrap();
            let file_name = path.file_name().unwrap().to_str().unwrap();
            assert!(file_name.len() < 255, "{} bytes", file_name.len());
            assert!(file_name.ends_with(".pdf"));
            assert_eq!(storage.read(&stored.uri).await.unwrap(), b"%PDF");
        }
        assert!(second.uri.ends_with("_1.pdf"), "got {}", second.uri);
    }
}
