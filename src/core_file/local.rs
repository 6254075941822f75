//! File provider backed by a directory of the local filesystem.
//!
//! Every user sees the same root. FTP paths are normalised lexically against the
//! working directory and may never climb above the root.

use crate::core_file::error::FileError;
use crate::core_file::provider::{
    FileProvider, FileProviderFactory, FileReader, FileSystemEntry, FileWriter,
};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalFileProvider {
    root: PathBuf,
    working_directory: String,
}

impl LocalFileProvider {
    /// Creates a provider rooted at `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FileError> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .map_err(|e| FileError::from_access(&root.display().to_string(), e))?;
        if !root.is_dir() {
            return Err(FileError::NoAccess(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            working_directory: String::from("/"),
        })
    }

    /// Resolves `path` against the working directory into an absolute FTP path.
    fn resolve(&self, path: &str) -> Result<String, FileError> {
        let joined = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", self.working_directory, path)
        };
        normalize_ftp_path(&joined)
            .ok_or_else(|| FileError::NoAccess(format!("{}: outside of the root directory", path)))
    }

    fn local_path(&self, ftp_path: &str) -> PathBuf {
        let relative = ftp_path.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    fn resolve_local(&self, path: &str) -> Result<(String, PathBuf), FileError> {
        let ftp_path = self.resolve(path)?;
        let local = self.local_path(&ftp_path);
        Ok((ftp_path, local))
    }

    fn resolve_listing_target(&self, path: Option<&str>) -> Result<(String, PathBuf), FileError> {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => self.resolve_local(p),
            None => self.resolve_local(&self.working_directory),
        }
    }
}

/// Collapses `.`, `..` and repeated separators. Returns `None` when `..` climbs above `/`.
pub fn normalize_ftp_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(format!("/{}", parts.join("/")))
}

fn entry_from_metadata(name: String, metadata: &Metadata) -> FileSystemEntry {
    let last_write_time = metadata
        .modified()
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now());
    FileSystemEntry {
        name,
        last_write_time,
        length: if metadata.is_dir() { 0 } else { metadata.len() },
        is_directory: metadata.is_dir(),
        is_read_only: metadata.permissions().readonly(),
    }
}

#[async_trait]
impl FileProvider for LocalFileProvider {
    fn working_directory(&self) -> String {
        self.working_directory.clone()
    }

    async fn set_working_directory(&mut self, path: &str) -> Result<(), FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        let metadata = fs::metadata(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        if !metadata.is_dir() {
            return Err(FileError::NoAccess(format!("{}: not a directory", ftp_path)));
        }
        debug!("Working directory changed to {}", ftp_path);
        self.working_directory = ftp_path;
        Ok(())
    }

    async fn create_directory(&self, path: &str) -> Result<String, FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        fs::create_dir(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        info!("Directory created: {:?}", local);
        Ok(ftp_path)
    }

    async fn delete_directory(&self, path: &str) -> Result<(), FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        if ftp_path == "/" {
            return Err(FileError::NoAccess(String::from(
                "the root directory cannot be deleted",
            )));
        }
        fs::remove_dir_all(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        info!("Directory removed: {:?}", local);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        fs::remove_file(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        info!("File deleted: {:?}", local);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FileError> {
        let (from_ftp, from_local) = self.resolve_local(from)?;
        let (to_ftp, to_local) = self.resolve_local(to)?;
        if from_ftp == "/" || to_ftp == "/" {
            return Err(FileError::NoAccess(String::from(
                "the root directory cannot be renamed",
            )));
        }
        fs::rename(&from_local, &to_local)
            .await
            .map_err(|e| FileError::from_access(&from_ftp, e))?;
        info!("Renamed {} to {}", from_ftp, to_ftp);
        Ok(())
    }

    async fn open_for_read(&self, path: &str) -> Result<FileReader, FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        let metadata = fs::metadata(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        if metadata.is_dir() {
            return Err(FileError::NoAccess(format!("{}: is a directory", ftp_path)));
        }
        let file = fs::File::open(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        Ok(Box::new(file))
    }

    async fn open_for_write(&self, path: &str) -> Result<FileWriter, FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&local)
            .await
            .map_err(|e| FileError::from_create(&ftp_path, e))?;
        Ok(Box::new(file))
    }

    async fn create_for_write(&self, path: &str) -> Result<FileWriter, FileError> {
        let (ftp_path, local) = self.resolve_local(path)?;
        let file = fs::File::create(&local)
            .await
            .map_err(|e| FileError::from_create(&ftp_path, e))?;
        Ok(Box::new(file))
    }

    async fn name_listing(&self, path: Option<&str>) -> Result<Vec<String>, FileError> {
        let (ftp_path, local) = self.resolve_listing_target(path)?;
        let mut dir = fs::read_dir(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn listing(&self, path: Option<&str>) -> Result<Vec<FileSystemEntry>, FileError> {
        let (ftp_path, local) = self.resolve_listing_target(path)?;
        let metadata = fs::metadata(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;

        if !metadata.is_dir() {
            let name = local
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(vec![entry_from_metadata(name, &metadata)]);
        }

        let mut dir = fs::read_dir(&local)
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?;
        let mut directories = Vec::new();
        let mut files = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| FileError::from_access(&ftp_path, e))?
        {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Entry vanished between read_dir and stat.
                Err(_) => continue,
            };
            let item = entry_from_metadata(entry.file_name().to_string_lossy().into_owned(), &metadata);
            if item.is_directory {
                directories.push(item);
            } else {
                files.push(item);
            }
        }
        directories.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        directories.extend(files);
        Ok(directories)
    }
}

/// Gives every user a `LocalFileProvider` over the same root directory.
#[derive(Debug, Clone)]
pub struct LocalFileProviderFactory {
    root: PathBuf,
}

impl LocalFileProviderFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileProviderFactory for LocalFileProviderFactory {
    fn get_provider(&self, user_name: &str) -> Result<Box<dyn FileProvider>, FileError> {
        debug!("Binding {:?} to root {:?}", user_name, self.root);
        Ok(Box::new(LocalFileProvider::new(&self.root)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn provider() -> (TempDir, LocalFileProvider) {
        let dir = TempDir::new().unwrap();
        let provider = LocalFileProvider::new(dir.path()).unwrap();
        (dir, provider)
    }

    #[test]
    fn test_normalize_ftp_path() {
        assert_eq!(normalize_ftp_path("/").as_deref(), Some("/"));
        assert_eq!(normalize_ftp_path("/a/./b//c/..").as_deref(), Some("/a/b"));
        assert_eq!(normalize_ftp_path("/a/../..").as_deref(), None);
        assert_eq!(normalize_ftp_path("/a\\b").as_deref(), Some("/a/b"));
    }

    #[tokio::test]
    async fn test_working_directory_moves_and_stays_confined() {
        let (dir, mut provider) = provider();
        std::fs::create_dir(dir.path().join("pub")).unwrap();

        assert_eq!(provider.working_directory(), "/");
        provider.set_working_directory("pub").await.unwrap();
        assert_eq!(provider.working_directory(), "/pub");
        provider.set_working_directory("..").await.unwrap();
        assert_eq!(provider.working_directory(), "/");

        let escape = provider.set_working_directory("..").await;
        assert!(matches!(escape, Err(FileError::NoAccess(_))));
        let missing = provider.set_working_directory("/nope").await;
        assert!(matches!(missing, Err(FileError::NoAccess(_))));
        assert_eq!(provider.working_directory(), "/");
    }

    #[tokio::test]
    async fn test_create_directory_returns_ftp_path() {
        let (dir, mut provider) = provider();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        provider.set_working_directory("/a").await.unwrap();
        assert_eq!(provider.create_directory("b").await.unwrap(), "/a/b");
        assert!(dir.path().join("a/b").is_dir());
    }

    #[tokio::test]
    async fn test_root_cannot_be_deleted() {
        let (_dir, provider) = provider();
        let result = provider.delete_directory("/").await;
        assert!(matches!(result, Err(FileError::NoAccess(_))));
    }

    #[tokio::test]
    async fn test_write_read_rename_delete() {
        let (dir, provider) = provider();
        let mut writer = provider.create_for_write("hello.txt").await.unwrap();
        writer.write_all(b"hello").await.unwrap();
        writer.flush().await.unwrap();
        drop(writer);

        let mut appender = provider.open_for_write("hello.txt").await.unwrap();
        appender.write_all(b" world").await.unwrap();
        appender.flush().await.unwrap();
        drop(appender);

        provider.rename("hello.txt", "greeting.txt").await.unwrap();
        let mut reader = provider.open_for_read("/greeting.txt").await.unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "hello world");

        provider.delete("greeting.txt").await.unwrap();
        assert!(!dir.path().join("greeting.txt").exists());
        let missing = provider.open_for_read("greeting.txt").await;
        assert!(matches!(missing, Err(FileError::NoAccess(_))));
    }

    #[tokio::test]
    async fn test_listing_puts_directories_first() {
        let (dir, provider) = provider();
        std::fs::write(dir.path().join("a.txt"), b"12345").unwrap();
        std::fs::create_dir(dir.path().join("zdir")).unwrap();

        let entries = provider.listing(None).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["zdir", "a.txt"]);
        assert!(entries[0].is_directory);
        assert_eq!(entries[1].length, 5);

        let single = provider.listing(Some("a.txt")).await.unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].name, "a.txt");

        let names = provider.name_listing(Some("/")).await.unwrap();
        assert_eq!(names, vec!["a.txt", "zdir"]);
    }

    #[tokio::test]
    async fn test_factory_rejects_missing_root() {
        let factory = LocalFileProviderFactory::new("/definitely/not/here");
        assert!(factory.get_provider("anonymous").is_err());
    }
}
