//! Guarded file-sharing operations over the shared root.
//!
//! Every operation resolves its path arguments through [`PathGuard`] before
//! touching the filesystem, then mirrors the result into a metadata record.

pub mod error;
pub mod guard;
pub mod links;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use error::ShareError;
pub use guard::PathGuard;
pub use links::ShareLinkRegistry;

use crate::db::{self, DbPool, ShareLink};

/// Upper bound on the `_1, _2, …` collision probe. Exhaustion surfaces as a
/// create/upload fault instead of looping over a pathological name set.
const NAME_RETRY_CAP: u32 = 1000;

/// One row of a directory listing.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub path: String,
    pub modified: Option<DateTime<Utc>>,
}

/// File content ready to be served with attachment disposition.
pub struct DownloadedFile {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

pub struct FileStore {
    guard: PathGuard,
    links: ShareLinkRegistry,
    pool: DbPool,
}

impl FileStore {
    pub fn new(
        root: impl AsRef<Path>,
        pool: DbPool,
        link_validity_days: i64,
    ) -> Result<Self, ShareError> {
        Ok(Self {
            guard: PathGuard::new(root)?,
            links: ShareLinkRegistry::new(pool.clone(), link_validity_days),
            pool,
        })
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    pub fn links(&self) -> &ShareLinkRegistry {
        &self.links
    }

    /// List a directory beneath the root. Entries that cannot be stat'ed are
    /// skipped; directories sort before files, then case-sensitive by name.
    pub fn list(&self, raw_path: Option<&str>) -> Result<Vec<EntryInfo>, ShareError> {
        let dir = self.guard.resolve(raw_path)?;
        let read = fs::read_dir(&dir).map_err(|e| ShareError::List(e.to_string()))?;

        let mut entries = Vec::new();
        for item in read {
            let Ok(item) = item else { continue };
            let Ok(meta) = item.metadata() else { continue };
            entries.push(EntryInfo {
                name: item.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
                path: item.path().to_string_lossy().into_owned(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// Store uploaded bytes at the shared root under a sanitized, de-duplicated
    /// name, then record the entry. Returns the final filename.
    pub async fn upload(
        &self,
        owner: Uuid,
        original_filename: &str,
        content: &[u8],
    ) -> Result<String, ShareError> {
        if content.is_empty() {
            return Err(ShareError::NoFile);
        }
        let name = sanitize_file_name(original_filename);
        if name.is_empty() {
            return Err(ShareError::NoFile);
        }

        let (path, final_name) = self.write_file_exclusive(&name, content)?;
        db::entries::insert_entry(
            &self.pool,
            owner,
            &path.to_string_lossy(),
            &final_name,
            content.len() as i64,
            false,
        )
        .await?;
        tracing::info!(filename = %final_name, size = content.len(), "stored upload");
        Ok(final_name)
    }

    /// Exclusive-create is the arbiter for concurrent uploads of the same
    /// name: a loser sees `AlreadyExists` and moves to the next suffix.
    fn write_file_exclusive(
        &self,
        name: &str,
        content: &[u8],
    ) -> Result<(PathBuf, String), ShareError> {
        for counter in 0..NAME_RETRY_CAP {
            let candidate = numbered_name(name, counter, true);
            let path = self.guard.root().join(&candidate);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| ShareError::Upload(e.to_string()))?;
                    return Ok((path, candidate));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ShareError::Upload(e.to_string())),
            }
        }
        Err(ShareError::Upload(format!(
            "no free filename for {name} after {NAME_RETRY_CAP} attempts"
        )))
    }

    /// Create a folder under `parent` (root if absent) with the same
    /// sanitization and dedup policy as uploads, except the counter suffix
    /// applies to the whole name. Returns the final folder name.
    pub async fn create_folder(
        &self,
        owner: Uuid,
        requested_name: Option<&str>,
        parent: Option<&str>,
    ) -> Result<String, ShareError> {
        let raw = requested_name.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(ShareError::MissingName);
        }
        let name = sanitize_file_name(raw);
        if name.is_empty() {
            return Err(ShareError::MissingName);
        }

        let parent_dir = self.guard.resolve(parent)?;
        for counter in 0..NAME_RETRY_CAP {
            let candidate = numbered_name(&name, counter, false);
            let path = parent_dir.join(&candidate);
            // create_dir is exclusive, so a concurrent winner pushes us to the
            // next suffix instead of silently sharing the directory.
            match fs::create_dir(&path) {
                Ok(()) => {
                    db::entries::insert_entry(
                        &self.pool,
                        owner,
                        &path.to_string_lossy(),
                        &candidate,
                        0,
                        true,
                    )
                    .await?;
                    tracing::info!(folder = %candidate, "created folder");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ShareError::Create(e.to_string())),
            }
        }
        Err(ShareError::Create(format!(
            "no free folder name for {name} after {NAME_RETRY_CAP} attempts"
        )))
    }

    /// Remove a file or directory (recursively) and its metadata record.
    /// Irreversible; there is no trash.
    pub async fn delete(&self, raw_path: &str) -> Result<(), ShareError> {
        let path = self.guard.resolve(Some(raw_path))?;
        if path == self.guard.root() {
            return Err(ShareError::Delete("refusing to remove the shared root".into()));
        }

        let meta = fs::metadata(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ShareError::NotFound(raw_path.to_string()),
            _ => ShareError::Delete(e.to_string()),
        })?;

        let removed = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| ShareError::Delete(e.to_string()))?;

        db::entries::delete_entries_by_path(&self.pool, &path.to_string_lossy()).await?;
        tracing::info!(path = %path.display(), "deleted entry");
        Ok(())
    }

    /// Read a file for serving as an attachment.
    pub fn download(&self, raw_path: &str) -> Result<DownloadedFile, ShareError> {
        let path = self.guard.resolve(Some(raw_path))?;
        if !path.is_file() {
            return Err(ShareError::NotFound(raw_path.to_string()));
        }
        let content = fs::read(&path).map_err(|e| ShareError::Read(e.to_string()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();
        Ok(DownloadedFile {
            filename,
            content_type,
            content,
        })
    }

    /// Issue an expiring public link for a guarded path.
    pub async fn generate_share_link(
        &self,
        owner: Uuid,
        raw_path: &str,
    ) -> Result<ShareLink, ShareError> {
        let path = self.guard.resolve(Some(raw_path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "shared".to_string());
        self.links.issue(owner, &path.to_string_lossy(), &name).await
    }
}

/// Strip directory components and disallowed characters from a
/// client-supplied filename. May return an empty string, which callers treat
/// as missing input.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_matches('.').to_string()
}

/// `counter == 0` keeps the name as-is; otherwise the suffix goes before the
/// extension for files and after the whole name for folders.
fn numbered_name(name: &str, counter: u32, split_extension: bool) -> String {
    if counter == 0 {
        return name.to_string();
    }
    if split_extension {
        if let Some((stem, ext)) = name.rsplit_once('.') {
            if !stem.is_empty() {
                return format!("{stem}_{counter}.{ext}");
            }
        }
    }
    format!("{name}_{counter}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn store_with_owner() -> (tempfile::TempDir, FileStore, Uuid) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = test_pool().await;
        let owner = db::users::create_user(&pool, "alice", "x", false)
            .await
            .unwrap()
            .id;
        let store = FileStore::new(tmp.path().join("Shared"), pool, 7).unwrap();
        (tmp, store, owner)
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.txt"), "report.txt");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_file_name("my file (1).txt"), "my_file_1.txt");
        assert_eq!(sanitize_file_name(".."), "");
        assert_eq!(sanitize_file_name("..."), "");
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("report.txt", 0, true), "report.txt");
        assert_eq!(numbered_name("report.txt", 2, true), "report_2.txt");
        assert_eq!(numbered_name(".bashrc", 1, true), ".bashrc_1");
        assert_eq!(numbered_name("photos", 1, false), "photos_1");
        assert_eq!(numbered_name("a.b.c", 1, true), "a.b_1.c");
    }

    #[tokio::test]
    async fn test_upload_records_entry() {
        let (_tmp, store, owner) = store_with_owner().await;
        let name = store.upload(owner, "notes.txt", b"hello").await.unwrap();
        assert_eq!(name, "notes.txt");

        let path = store.guard().root().join("notes.txt");
        assert_eq!(fs::read(&path).unwrap(), b"hello");

        let entry = db::entries::get_entry_by_path(&store.pool, &path.to_string_lossy())
            .await
            .unwrap()
            .expect("metadata record");
        assert_eq!(entry.user_id, owner);
        assert_eq!(entry.size, 5);
        assert!(!entry.is_directory);
    }

    #[tokio::test]
    async fn test_repeated_uploads_get_suffixed_names() {
        let (_tmp, store, owner) = store_with_owner().await;
        let mut names = Vec::new();
        for _ in 0..3 {
            names.push(store.upload(owner, "report.txt", b"data").await.unwrap());
        }
        assert_eq!(names, ["report.txt", "report_1.txt", "report_2.txt"]);
        for name in &names {
            assert!(store.guard().root().join(name).is_file());
        }
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let (_tmp, store, owner) = store_with_owner().await;
        assert!(matches!(
            store.upload(owner, "a.txt", b"").await,
            Err(ShareError::NoFile)
        ));
        assert!(matches!(
            store.upload(owner, "..", b"data").await,
            Err(ShareError::NoFile)
        ));
    }

    #[tokio::test]
    async fn test_folder_collision_appends_suffix() {
        let (_tmp, store, owner) = store_with_owner().await;
        assert_eq!(
            store.create_folder(owner, Some("photos"), None).await.unwrap(),
            "photos"
        );
        assert_eq!(
            store.create_folder(owner, Some("photos"), None).await.unwrap(),
            "photos_1"
        );
        assert!(store.guard().root().join("photos").is_dir());
        assert!(store.guard().root().join("photos_1").is_dir());
    }

    #[tokio::test]
    async fn test_folder_in_parent() {
        let (_tmp, store, owner) = store_with_owner().await;
        store.create_folder(owner, Some("media"), None).await.unwrap();
        let name = store
            .create_folder(owner, Some("music"), Some("media"))
            .await
            .unwrap();
        assert_eq!(name, "music");
        assert!(store.guard().root().join("media").join("music").is_dir());
    }

    #[tokio::test]
    async fn test_missing_folder_name_rejected() {
        let (_tmp, store, owner) = store_with_owner().await;
        assert!(matches!(
            store.create_folder(owner, None, None).await,
            Err(ShareError::MissingName)
        ));
        assert!(matches!(
            store.create_folder(owner, Some("  "), None).await,
            Err(ShareError::MissingName)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_record() {
        let (_tmp, store, owner) = store_with_owner().await;
        store.upload(owner, "gone.txt", b"bye").await.unwrap();
        let path = store.guard().root().join("gone.txt");

        store.delete(path.to_str().unwrap()).await.unwrap();
        assert!(!path.exists());
        assert!(db::entries::get_entry_by_path(&store.pool, &path.to_string_lossy())
            .await
            .unwrap()
            .is_none());
        assert!(store.list(None).unwrap().iter().all(|e| e.name != "gone.txt"));
    }

    #[tokio::test]
    async fn test_delete_outside_root_rejected() {
        let (_tmp, store, _owner) = store_with_owner().await;
        assert!(matches!(
            store.delete("/etc/hosts").await,
            Err(ShareError::PathEscape)
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (_tmp, store, _owner) = store_with_owner().await;
        assert!(matches!(
            store.delete("nope.txt").await,
            Err(ShareError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_orders_directories_first() {
        let (_tmp, store, owner) = store_with_owner().await;
        store.upload(owner, "b.txt", b"b").await.unwrap();
        store.upload(owner, "a.txt", b"a").await.unwrap();
        store.create_folder(owner, Some("zeta"), None).await.unwrap();
        store.create_folder(owner, Some("alpha"), None).await.unwrap();

        let names: Vec<String> = store.list(None).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["alpha", "zeta", "a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_list_missing_directory_fails() {
        let (_tmp, store, _owner) = store_with_owner().await;
        assert!(matches!(
            store.list(Some("nowhere")),
            Err(ShareError::List(_))
        ));
    }

    #[tokio::test]
    async fn test_download_roundtrip() {
        let (_tmp, store, owner) = store_with_owner().await;
        store.upload(owner, "song.mp3", b"\x00\x01").await.unwrap();
        let file = store.download("song.mp3").unwrap();
        assert_eq!(file.filename, "song.mp3");
        assert_eq!(file.content, b"\x00\x01");
        assert_eq!(file.content_type, "audio/mpeg");

        assert!(matches!(
            store.download("absent.mp3"),
            Err(ShareError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_share_link_for_entry() {
        let (_tmp, store, owner) = store_with_owner().await;
        store.upload(owner, "doc.pdf", b"pdf").await.unwrap();

        let link = store.generate_share_link(owner, "doc.pdf").await.unwrap();
        assert_eq!(link.name, "doc.pdf");

        let resolved = store.links().resolve(&link.token).await.unwrap();
        let file = store.download(&resolved.path).unwrap();
        assert_eq!(file.content, b"pdf");
    }

    #[tokio::test]
    async fn test_share_link_outside_root_rejected() {
        let (_tmp, store, owner) = store_with_owner().await;
        assert!(matches!(
            store.generate_share_link(owner, "../secret.txt").await,
            Err(ShareError::PathEscape)
        ));
    }
}
