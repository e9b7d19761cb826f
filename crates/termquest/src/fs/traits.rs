//! Filesystem trait definitions

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Default owner for files created inside a session.
pub const DEFAULT_OWNER: &str = "user";

/// Default mode for files created inside a session.
pub const DEFAULT_FILE_MODE: &str = "0644";

/// Default mode for directories.
pub const DEFAULT_DIR_MODE: &str = "0755";

/// Async filesystem trait.
///
/// Paths handed to these methods are absolute and already normalized by
/// [`resolve_path`](crate::resolve_path). Implementations must treat a path
/// whose parent chain runs through a file as missing.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file's contents.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Write contents to a file, creating it with default metadata.
    ///
    /// Overwriting an existing file keeps its mode and owner.
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Append contents to a file, creating it if missing.
    async fn append_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Create (or replace) a file with explicit metadata.
    async fn create_file(&self, path: &Path, content: &str, mode: &str, owner: &str)
    -> Result<()>;

    /// Create a directory.
    ///
    /// With `recursive`, missing parents are created and an existing
    /// directory is not an error.
    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<()>;

    /// Remove a file or directory.
    async fn remove(&self, path: &Path, recursive: bool) -> Result<()>;

    /// Get file metadata.
    async fn stat(&self, path: &Path) -> Result<Metadata>;

    /// Read directory entries, sorted by name.
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Rename/move a file or directory (with everything below it).
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copy a file or directory (with everything below it).
    async fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    /// Change the permission mode string.
    async fn set_mode(&self, path: &Path, mode: &str) -> Result<()>;

    /// Change the owner.
    async fn set_owner(&self, path: &Path, owner: &str) -> Result<()>;
}

/// File metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// File type
    pub file_type: FileType,
    /// Content length in bytes (0 for directories)
    pub size: u64,
    /// Octal permission string, e.g. "0644"
    pub mode: String,
    /// Owning user name
    pub owner: String,
}

impl Metadata {
    /// Metadata for a regular file with the given size.
    pub fn file(size: u64, mode: &str, owner: &str) -> Self {
        Self {
            file_type: FileType::File,
            size,
            mode: mode.to_string(),
            owner: owner.to_string(),
        }
    }

    /// Metadata for a directory with default mode and owner.
    pub fn directory() -> Self {
        Self {
            file_type: FileType::Directory,
            size: 0,
            mode: DEFAULT_DIR_MODE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
        }
    }

    /// Render the mode as an `ls -l` permission column.
    ///
    /// Accepts three or four digit octal strings; anything unparsable
    /// falls back to `-rw-r--r--`.
    pub fn permission_string(&self) -> String {
        if self.file_type.is_dir() {
            return "drwxr-xr-x".to_string();
        }

        let digits = self.permission_digits();
        let bits: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(8)).collect();
        if bits.len() != 3 {
            return "-rw-r--r--".to_string();
        }

        let mut out = String::from("-");
        for b in bits {
            out.push(if b & 4 != 0 { 'r' } else { '-' });
            out.push(if b & 2 != 0 { 'w' } else { '-' });
            out.push(if b & 1 != 0 { 'x' } else { '-' });
        }
        out
    }

    /// The last three characters of a four character mode, else the mode.
    fn permission_digits(&self) -> &str {
        match self.mode.char_indices().nth(1) {
            Some((start, _)) if self.mode.chars().count() == 4 => &self.mode[start..],
            _ => self.mode.as_str(),
        }
    }

    /// Whether the owner-read bit is set.
    pub fn owner_can_read(&self) -> bool {
        let digits = self.permission_digits();
        match digits.chars().next().and_then(|c| c.to_digit(8)) {
            Some(b) => b & 4 != 0,
            None => true,
        }
    }
}

/// File type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file
    File,
    /// Directory
    Directory,
}

impl FileType {
    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Directory entry.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name (not full path)
    pub name: String,
    /// Entry metadata
    pub metadata: Metadata,
}
