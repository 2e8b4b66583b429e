//! Filesystem persistence for published artifacts.

use anyhow::{Context, Result};
use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single artifact file (encrypted blob, verifier record, or a decrypted
/// dataset written by `unlock`).
///
/// Writes never leave a half-written artifact behind: readers see either the
/// previous content or the new content.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("failed to read {}", self.path.display()))
    }

    /// Replaces the artifact with `data`.
    ///
    /// The data goes to a uniquely named sibling file which is fsynced, then
    /// renamed over the target, then the parent directory is fsynced. Missing
    /// parent directories are created.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        self.save_with(|file| file.write_all(data))?;
        debug!(path = %self.path.display(), bytes = data.len(), "artifact written");
        Ok(())
    }

    /// Runs `write` against the temp file; on any failure the temp file is
    /// removed and the target is left untouched.
    fn save_with(&self, write: impl FnOnce(&mut File) -> std::io::Result<()>) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        let tmp_path = self.random_tmp_path()?;

        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .context("failed to create temporary file")?;

        let written = write(&mut tmp_file)
            .and_then(|()| tmp_file.sync_all())
            .context("failed to write temporary file");
        drop(tmp_file);

        if let Err(e) = written.and_then(|()| self.atomic_replace(&tmp_path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        #[cfg(not(target_os = "windows"))]
        File::open(parent)?.sync_all()?;

        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// `<file name>.tmp.<16 hex chars>` next to the target.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8];
        fill(&mut buf).map_err(|_| anyhow::anyhow!("OS random generator unavailable"))?;

        let file_name = self
            .path
            .file_name()
            .with_context(|| format!("{} has no file name", self.path.display()))?
            .to_string_lossy();

        let tmp_name = format!("{}.tmp.{}", file_name, hex::encode(buf));
        Ok(self.path.with_file_name(tmp_name))
    }

    /// Uses `ReplaceFileW` with `REPLACEFILE_WRITE_THROUGH` when the target
    /// exists, since `rename` cannot overwrite on Windows.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY: both buffers are NUL-terminated UTF-16 that outlive the
        // call, and the API does not retain them.
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context("atomic replace failed");
        }

        Ok(())
    }

    /// `rename()` is atomic within one filesystem, and the temp file is a
    /// sibling of the target.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))
    }
}
