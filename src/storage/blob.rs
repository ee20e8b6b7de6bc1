//! Filesystem blob store: one file per record id.
//!
//! Writes go through a temp file in the same directory followed by a
//! rename, so a reader never sees a half-written payload. Ids must be
//! UUIDs; anything else is treated as absent and never reaches the
//! filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::BlobStore;
use crate::errors::{internal, KeepVaultError, Result};
use crate::vault::RecordId;

/// Suffix of uncommitted writes; the name also starts with a dot.
const TMP_SUFFIX: &str = ".tmp";

/// Blob store rooted at a directory.
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Open the store, creating `dir` if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(internal("create blob directory"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            let _ = fs::set_permissions(dir, perms);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, id: &RecordId) -> Result<PathBuf> {
        let uuid = Uuid::parse_str(&id.0).map_err(|_| KeepVaultError::RecordNotFound)?;
        Ok(self.dir.join(uuid.hyphenated().to_string()))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, id: &RecordId, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(id)?;
        let tmp_path = self.dir.join(format!(".{}{TMP_SUFFIX}", id.0));

        fs::write(&tmp_path, bytes).map_err(internal("write blob"))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&tmp_path, perms);
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(internal("commit blob")(e));
        }
        Ok(())
    }

    fn get(&self, id: &RecordId) -> Result<Vec<u8>> {
        let path = self.blob_path(id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(KeepVaultError::RecordNotFound),
            Err(e) => Err(internal("read blob")(e)),
        }
    }

    fn exists(&self, id: &RecordId) -> Result<bool> {
        let path = match self.blob_path(id) {
            Ok(path) => path,
            Err(KeepVaultError::RecordNotFound) => return Ok(false),
            Err(e) => return Err(e),
        };
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(internal("stat blob")(e)),
        }
    }

    fn delete(&self, id: &RecordId) -> Result<()> {
        let path = self.blob_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(KeepVaultError::RecordNotFound),
            Err(e) => Err(internal("delete blob")(e)),
        }
    }

    fn list(&self) -> Result<Vec<RecordId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(internal("list blob directory"))? {
            let entry = entry.map_err(internal("read blob directory entry"))?;
            let name = entry.file_name();
            // Temp files and strays are skipped.
            if let Some(uuid) = name.to_str().and_then(|n| Uuid::parse_str(n).ok()) {
                ids.push(RecordId(uuid.hyphenated().to_string()));
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn remove_partial_writes(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).map_err(internal("list blob directory"))? {
            let entry = entry.map_err(internal("read blob directory entry"))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !(name.starts_with('.') && name.ends_with(TMP_SUFFIX)) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(internal("remove partial blob")(e)),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_id() -> RecordId {
        RecordId(Uuid::new_v4().to_string())
    }

    #[test]
    fn open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("files");
        let store = FsBlobStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.dir(), root.as_path());
    }

    #[test]
    fn put_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let id = new_id();

        store.put(&id, b"ciphertext").unwrap();
        assert_eq!(store.get(&id).unwrap(), b"ciphertext");
        assert_eq!(store.list().unwrap(), vec![id.clone()]);

        store.delete(&id).unwrap();
        assert!(matches!(store.get(&id), Err(KeepVaultError::RecordNotFound)));
        assert!(matches!(
            store.delete(&id),
            Err(KeepVaultError::RecordNotFound)
        ));
    }

    #[test]
    fn put_replaces_existing_payload() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let id = new_id();

        store.put(&id, b"first").unwrap();
        store.put(&id, b"second").unwrap();
        assert_eq!(store.get(&id).unwrap(), b"second");
    }

    #[test]
    fn non_uuid_ids_never_touch_the_filesystem() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let escape = RecordId::from("../outside");

        assert!(matches!(
            store.put(&escape, b"x"),
            Err(KeepVaultError::RecordNotFound)
        ));
        assert!(matches!(
            store.get(&escape),
            Err(KeepVaultError::RecordNotFound)
        ));
        assert!(!dir.path().parent().unwrap().join("outside").exists());
    }

    #[test]
    fn list_ignores_stray_files() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), b"stray").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn blobs_have_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let id = new_id();
        store.put(&id, b"x").unwrap();

        let perms = fs::metadata(dir.path().join(&id.0)).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn exists_checks_without_reading() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let id = new_id();

        assert!(!store.exists(&id).unwrap());
        store.put(&id, b"x").unwrap();
        assert!(store.exists(&id).unwrap());
        assert!(!store.exists(&RecordId::from("../outside")).unwrap());
    }

    #[test]
    fn partial_writes_are_swept() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let committed = new_id();
        store.put(&committed, b"kept").unwrap();

        let partial = dir.path().join(format!(".{}.tmp", new_id()));
        fs::write(&partial, b"half").unwrap();
        fs::write(dir.path().join("notes.txt"), b"stray").unwrap();

        assert_eq!(store.remove_partial_writes().unwrap(), 1);
        assert!(!partial.exists());
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(store.get(&committed).unwrap(), b"kept");
        assert_eq!(store.remove_partial_writes().unwrap(), 0);
    }
}
