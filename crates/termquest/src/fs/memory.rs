//! In-memory filesystem implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::traits::{
    DEFAULT_FILE_MODE, DEFAULT_OWNER, DirEntry, FileSystem, FileType, Metadata,
};
use crate::error::{FsError, Result};
use crate::path::normalize_path;

/// In-memory filesystem.
///
/// Stores every file and directory in a map keyed by absolute path. Each
/// session owns its own instance; nothing is shared between sessions.
pub struct InMemoryFs {
    entries: RwLock<HashMap<PathBuf, FsEntry>>,
}

#[derive(Debug, Clone)]
enum FsEntry {
    File { content: String, metadata: Metadata },
    Directory { metadata: Metadata },
}

impl FsEntry {
    fn metadata(&self) -> &Metadata {
        match self {
            FsEntry::File { metadata, .. } | FsEntry::Directory { metadata } => metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            FsEntry::File { metadata, .. } | FsEntry::Directory { metadata } => metadata,
        }
    }

    fn directory() -> Self {
        FsEntry::Directory {
            metadata: Metadata::directory(),
        }
    }

    fn file(content: &str, mode: &str, owner: &str) -> Self {
        FsEntry::File {
            content: content.to_string(),
            metadata: Metadata::file(content.len() as u64, mode, owner),
        }
    }
}

type Entries = HashMap<PathBuf, FsEntry>;

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFs {
    /// Create a new in-memory filesystem with `/home/user` and `/tmp`.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for dir in ["/", "/home", "/home/user", "/tmp"] {
            entries.insert(PathBuf::from(dir), FsEntry::directory());
        }

        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Create an empty filesystem containing only `/`.
    pub fn empty() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("/"), FsEntry::directory());
        Self {
            entries: RwLock::new(entries),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a file synchronously, creating missing parent directories.
    ///
    /// Used to build fixed trees before any session exists. Entries already
    /// occupying a parent slot are left alone and the file is skipped.
    pub(crate) fn insert_file(&self, path: &Path, content: &str, mode: &str, owner: &str) {
        let path = normalize_path(path);
        let mut entries = self.write();

        if let Some(parent) = path.parent() {
            for dir in parent.ancestors().collect::<Vec<_>>().into_iter().rev() {
                match entries.get(dir) {
                    Some(FsEntry::Directory { .. }) => {}
                    Some(FsEntry::File { .. }) => return,
                    None => {
                        entries.insert(dir.to_path_buf(), FsEntry::directory());
                    }
                }
            }
        }
        entries.insert(path, FsEntry::file(content, mode, owner));
    }

    /// The parent of `path` must exist and be a directory.
    fn check_parent(entries: &Entries, path: &Path) -> Result<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };

        match entries.get(parent) {
            Some(FsEntry::Directory { .. }) => Ok(()),
            Some(FsEntry::File { .. }) => Err(FsError::NotADirectory.into()),
            None => {
                let blocked = path
                    .ancestors()
                    .skip(2)
                    .any(|a| matches!(entries.get(a), Some(FsEntry::File { .. })));
                if blocked {
                    Err(FsError::NotADirectory.into())
                } else {
                    Err(FsError::NotFound.into())
                }
            }
        }
    }

    /// All paths strictly below `path`.
    fn descendants(entries: &Entries, path: &Path) -> Vec<PathBuf> {
        entries
            .keys()
            .filter(|p| p.as_path() != path && p.starts_with(path))
            .cloned()
            .collect()
    }

    /// Detach `path` and everything below it, keyed relative to `path`.
    fn take_subtree(entries: &mut Entries, path: &Path) -> Vec<(PathBuf, FsEntry)> {
        let mut keys = Self::descendants(entries, path);
        keys.push(path.to_path_buf());
        keys.into_iter()
            .filter_map(|k| {
                let entry = entries.remove(&k)?;
                let rel = k.strip_prefix(path).ok()?.to_path_buf();
                Some((rel, entry))
            })
            .collect()
    }

    fn clone_subtree(entries: &Entries, path: &Path) -> Vec<(PathBuf, FsEntry)> {
        let mut keys = Self::descendants(entries, path);
        keys.push(path.to_path_buf());
        keys.into_iter()
            .filter_map(|k| {
                let entry = entries.get(&k)?.clone();
                let rel = k.strip_prefix(path).ok()?.to_path_buf();
                Some((rel, entry))
            })
            .collect()
    }

    fn graft(entries: &mut Entries, to: &Path, subtree: Vec<(PathBuf, FsEntry)>) {
        for k in Self::descendants(entries, to) {
            entries.remove(&k);
        }
        entries.remove(to);
        for (rel, entry) in subtree {
            let key = if rel.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(rel)
            };
            entries.insert(key, entry);
        }
    }

    fn check_move(from: &Path, to: &Path) -> Result<()> {
        if from == Path::new("/") || to == Path::new("/") {
            return Err(FsError::Busy.into());
        }
        if to != from && to.starts_with(from) {
            return Err(FsError::InvalidArgument.into());
        }
        Ok(())
    }
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn read_file(&self, path: &Path) -> Result<String> {
        let path = normalize_path(path);
        let entries = self.read();

        match entries.get(&path) {
            Some(FsEntry::File { content, .. }) => Ok(content.clone()),
            Some(FsEntry::Directory { .. }) => Err(FsError::IsADirectory.into()),
            None => Err(FsError::NotFound.into()),
        }
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let path = normalize_path(path);
        let mut entries = self.write();

        match entries.get_mut(&path) {
            Some(FsEntry::File {
                content: existing,
                metadata,
            }) => {
                *existing = content.to_string();
                metadata.size = existing.len() as u64;
                Ok(())
            }
            Some(FsEntry::Directory { .. }) => Err(FsError::IsADirectory.into()),
            None => {
                Self::check_parent(&entries, &path)?;
                entries.insert(path, FsEntry::file(content, DEFAULT_FILE_MODE, DEFAULT_OWNER));
                Ok(())
            }
        }
    }

    async fn append_file(&self, path: &Path, content: &str) -> Result<()> {
        let path = normalize_path(path);
        let mut entries = self.write();

        match entries.get_mut(&path) {
            Some(FsEntry::File {
                content: existing,
                metadata,
            }) => {
                existing.push_str(content);
                metadata.size = existing.len() as u64;
                Ok(())
            }
            Some(FsEntry::Directory { .. }) => Err(FsError::IsADirectory.into()),
            None => {
                Self::check_parent(&entries, &path)?;
                entries.insert(path, FsEntry::file(content, DEFAULT_FILE_MODE, DEFAULT_OWNER));
                Ok(())
            }
        }
    }

    async fn create_file(
        &self,
        path: &Path,
        content: &str,
        mode: &str,
        owner: &str,
    ) -> Result<()> {
        let path = normalize_path(path);
        let mut entries = self.write();

        if let Some(FsEntry::Directory { .. }) = entries.get(&path) {
            return Err(FsError::IsADirectory.into());
        }
        Self::check_parent(&entries, &path)?;
        entries.insert(path, FsEntry::file(content, mode, owner));
        Ok(())
    }

    async fn mkdir(&self, path: &Path, recursive: bool) -> Result<()> {
        let path = normalize_path(path);
        let mut entries = self.write();

        if recursive {
            let chain: Vec<PathBuf> = path.ancestors().map(Path::to_path_buf).collect();
            for current in chain.into_iter().rev() {
                match entries.get(&current) {
                    Some(FsEntry::Directory { .. }) => {}
                    Some(FsEntry::File { .. }) => return Err(FsError::NotADirectory.into()),
                    None => {
                        entries.insert(current, FsEntry::directory());
                    }
                }
            }
            return Ok(());
        }

        if entries.contains_key(&path) {
            return Err(FsError::AlreadyExists.into());
        }
        Self::check_parent(&entries, &path)?;
        entries.insert(path, FsEntry::directory());
        Ok(())
    }

    async fn remove(&self, path: &Path, recursive: bool) -> Result<()> {
        let path = normalize_path(path);
        if path == Path::new("/") {
            return Err(FsError::Busy.into());
        }
        let mut entries = self.write();

        match entries.get(&path) {
            Some(FsEntry::Directory { .. }) => {
                let children = Self::descendants(&entries, &path);
                if !children.is_empty() && !recursive {
                    return Err(FsError::DirectoryNotEmpty.into());
                }
                for child in children {
                    entries.remove(&child);
                }
                entries.remove(&path);
                Ok(())
            }
            Some(FsEntry::File { .. }) => {
                entries.remove(&path);
                Ok(())
            }
            None => Err(FsError::NotFound.into()),
        }
    }

    async fn stat(&self, path: &Path) -> Result<Metadata> {
        let path = normalize_path(path);
        let entries = self.read();

        entries
            .get(&path)
            .map(|e| e.metadata().clone())
            .ok_or_else(|| FsError::NotFound.into())
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = normalize_path(path);
        let entries = self.read();

        match entries.get(&path) {
            Some(FsEntry::Directory { .. }) => {
                let mut result: Vec<DirEntry> = entries
                    .iter()
                    .filter(|(p, _)| p.as_path() != path && p.parent() == Some(path.as_path()))
                    .map(|(p, entry)| DirEntry {
                        name: p
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        metadata: entry.metadata().clone(),
                    })
                    .collect();
                result.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(result)
            }
            Some(FsEntry::File { .. }) => Err(FsError::NotADirectory.into()),
            None => Err(FsError::NotFound.into()),
        }
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = normalize_path(path);
        Ok(self.read().contains_key(&path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        Self::check_move(&from, &to)?;
        if from == to {
            return Ok(());
        }
        let mut entries = self.write();

        if !entries.contains_key(&from) {
            return Err(FsError::NotFound.into());
        }
        Self::check_parent(&entries, &to)?;

        let subtree = Self::take_subtree(&mut entries, &from);
        Self::graft(&mut entries, &to, subtree);
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        Self::check_move(&from, &to)?;
        if from == to {
            return Ok(());
        }
        let mut entries = self.write();

        if !entries.contains_key(&from) {
            return Err(FsError::NotFound.into());
        }
        Self::check_parent(&entries, &to)?;

        let subtree = Self::clone_subtree(&entries, &from);
        Self::graft(&mut entries, &to, subtree);
        Ok(())
    }

    async fn set_mode(&self, path: &Path, mode: &str) -> Result<()> {
        let path = normalize_path(path);
        let mut entries = self.write();

        match entries.get_mut(&path) {
            Some(entry) => {
                entry.metadata_mut().mode = mode.to_string();
                Ok(())
            }
            None => Err(FsError::NotFound.into()),
        }
    }

    async fn set_owner(&self, path: &Path, owner: &str) -> Result<()> {
        let path = normalize_path(path);
        let mut entries = self.write();

        match entries.get_mut(&path) {
            Some(entry) => {
                entry.metadata_mut().owner = owner.to_string();
                Ok(())
            }
            None => Err(FsError::NotFound.into()),
        }
    }
}

impl std::fmt::Debug for InMemoryFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.read();
        let files = entries
            .values()
            .filter(|e| e.metadata().file_type == FileType::File)
            .count();
        f.debug_struct("InMemoryFs")
            .field("entries", &entries.len())
            .field("files", &files)
            .finish()
    }
}
