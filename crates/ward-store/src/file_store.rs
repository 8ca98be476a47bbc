//! File-based durable store.
//!
//! Stores one file per name directly inside `base_dir`. Write protection is
//! the file's read-only permission bit.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::traits::DurableStore;

/// File-based store rooted at a single directory.
///
/// Writes are atomic and durable: data is written to a temporary file,
/// fsynced, then renamed into place, and the directory is fsynced after the
/// rename.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new file store rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Directory this store writes into.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Compute the full path for a name, rejecting anything that would
    /// escape the base directory.
    fn path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.base_dir.join(name))
    }

    fn readonly(path: &Path) -> Result<Option<bool>, StoreError> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(meta.permissions().readonly())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn not_found(name: &str, e: std::io::Error) -> StoreError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(name.to_string())
        } else {
            StoreError::Io(e)
        }
    }

    #[cfg(unix)]
    fn sync_dir(&self) -> Result<(), StoreError> {
        File::open(&self.base_dir)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl DurableStore for FileStore {
    fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String, StoreError> {
        let path = self.path(name)?;
        fs::read_to_string(&path).map_err(|e| Self::not_found(name, e))
    }

    fn write(&self, name: &str, text: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        if Self::readonly(&path)? == Some(true) {
            return Err(StoreError::Immutable(name.to_string()));
        }

        // Atomic write: temp file in the same directory, fsync, then rename.
        let tmp_path = self.base_dir.join(format!(".{name}.tmp"));
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        self.sync_dir()?;

        debug!(path = %path.display(), size = text.len(), "wrote file");
        Ok(())
    }

    fn contains(&self, name: &str) -> Result<bool, StoreError> {
        Ok(Self::readonly(&self.path(name)?)?.is_some())
    }

    fn set_immutable(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let mut perms = fs::metadata(&path)
            .map_err(|e| Self::not_found(name, e))?
            .permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms)?;
        debug!(path = %path.display(), "marked read-only");
        Ok(())
    }

    fn clear_immutable(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        let mut perms = fs::metadata(&path)
            .map_err(|e| Self::not_found(name, e))?
            .permissions();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(perms.mode() | 0o200);
        }
        #[cfg(not(unix))]
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);

        fs::set_permissions(&path, perms)?;
        debug!(path = %path.display(), "cleared read-only");
        Ok(())
    }

    fn is_immutable(&self, name: &str) -> Result<bool, StoreError> {
        Self::readonly(&self.path(name)?)?.ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path(name)?;
        match Self::readonly(&path)? {
            None => return Ok(()),
            Some(true) => return Err(StoreError::Immutable(name.to_string())),
            Some(false) => {}
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "deleted file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
