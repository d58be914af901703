//! A file-store gateway backed by a local directory tree.
//!
//! Every path the orchestrator sends is resolved under the configured root,
//! so the same flow that talks to a remote store can be run against disk.

mod archive;
mod naming;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bulkfile_core::{DirectoryEntry, GatewayError, LocalGatewayConfig, SelectionSet};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::debug;

use crate::RemoteFileGateway;

pub use naming::{archive_file_name, unique_path, validate_entry_name};

/// Gateway over a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalFileGateway {
    config: LocalGatewayConfig,
}

impl LocalFileGateway {
    pub fn new(config: LocalGatewayConfig) -> Self {
        Self { config }
    }

    /// Create a gateway with default settings rooted at `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self::new(LocalGatewayConfig::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn config(&self) -> &LocalGatewayConfig {
        &self.config
    }

    /// Map a store directory (e.g. `/logs`) to a path under the root.
    pub fn resolve_directory(&self, directory: &str) -> Result<PathBuf, GatewayError> {
        let mut path = self.config.root.clone();
        for segment in directory
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
        {
            if segment == ".." {
                return Err(GatewayError::rejected(format!(
                    "Path escapes the store root: {directory}"
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Destination for a move: absolute store paths start at the root,
    /// anything else is relative to the source directory.
    fn resolve_destination(
        &self,
        directory: &str,
        destination: &str,
    ) -> Result<PathBuf, GatewayError> {
        if destination.starts_with('/') {
            self.resolve_directory(destination)
        } else {
            self.resolve_directory(&format!("{directory}/{destination}"))
        }
    }
}

#[async_trait]
impl RemoteFileGateway for LocalFileGateway {
    async fn list(&self, directory: &str) -> Result<Vec<DirectoryEntry>, GatewayError> {
        let dir = self.resolve_directory(directory)?;
        let label = directory.to_string();
        blocking(move || list_dir(&dir, &label)).await
    }

    async fn compress(
        &self,
        directory: &str,
        names: &SelectionSet,
    ) -> Result<DirectoryEntry, GatewayError> {
        let dir = self.resolve_directory(directory)?;
        let names = names.to_names();
        let prefix = self.config.archive_prefix.clone();

        blocking(move || {
            let targets = resolve_targets(&dir, &names)?;
            let archive_path = unique_path(&dir.join(archive_file_name(&prefix, Utc::now())));
            let label = archive_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            archive::write_archive(&targets, &archive_path)
                .map_err(|e| GatewayError::io(&label, &e))?;
            debug!(target: "bulkfile::local", archive = %archive_path.display(), count = targets.len(), "archive written");

            let metadata = fs::metadata(&archive_path).map_err(|e| GatewayError::io(&label, &e))?;
            Ok(entry_from_metadata(label, &metadata))
        })
        .await
    }

    async fn delete(&self, directory: &str, names: &SelectionSet) -> Result<(), GatewayError> {
        let dir = self.resolve_directory(directory)?;
        let names = names.to_names();
        let use_trash = self.config.use_trash;

        blocking(move || {
            let targets = resolve_targets(&dir, &names)?;
            if use_trash {
                return trash::delete_all(targets.iter().map(|(_, path)| path)).map_err(|e| {
                    GatewayError::rejected(format!("Failed to move to trash: {e}"))
                });
            }
            for (name, path) in &targets {
                remove_entry(path).map_err(|e| GatewayError::io(name, &e))?;
            }
            debug!(target: "bulkfile::local", count = targets.len(), "entries removed");
            Ok(())
        })
        .await
    }

    async fn move_entries(
        &self,
        directory: &str,
        names: &SelectionSet,
        destination: &str,
    ) -> Result<(), GatewayError> {
        let dir = self.resolve_directory(directory)?;
        let dest = self.resolve_destination(directory, destination)?;
        let names = names.to_names();
        let dest_label = destination.to_string();

        blocking(move || {
            let targets = resolve_targets(&dir, &names)?;

            // Check everything up front so a bad target moves nothing.
            for (name, source) in &targets {
                if dest.starts_with(source) {
                    return Err(GatewayError::rejected(format!(
                        "Cannot move '{name}' into itself"
                    )));
                }
                if dest.join(name).exists() {
                    return Err(GatewayError::rejected(format!(
                        "'{name}' already exists in {dest_label}"
                    )));
                }
            }

            fs::create_dir_all(&dest).map_err(|e| GatewayError::io(&dest_label, &e))?;
            for (name, source) in &targets {
                move_item(source, &dest.join(name)).map_err(|e| GatewayError::io(name, &e))?;
            }
            debug!(target: "bulkfile::local", count = targets.len(), destination = %dest.display(), "entries moved");
            Ok(())
        })
        .await
    }
}

/// Run blocking filesystem work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, GatewayError>
where
    F: FnOnce() -> Result<T, GatewayError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| GatewayError::rejected(format!("Task failed: {e}")))?
}

/// Validate names and pair each with its path. Every target must exist.
fn resolve_targets(dir: &Path, names: &[String]) -> Result<Vec<(String, PathBuf)>, GatewayError> {
    names
        .iter()
        .map(|name| -> Result<(String, PathBuf), GatewayError> {
            validate_entry_name(name).map_err(GatewayError::rejected)?;
            let path = dir.join(name);
            fs::symlink_metadata(&path).map_err(|e| GatewayError::io(name, &e))?;
            Ok((name.clone(), path))
        })
        .collect()
}

/// List a directory, folders first, then by name.
fn list_dir(dir: &Path, label: &str) -> Result<Vec<DirectoryEntry>, GatewayError> {
    let entries = fs::read_dir(dir).map_err(|e| GatewayError::io(label, &e))?;

    let mut listing = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GatewayError::io(label, &e))?;
        // Links are listed as themselves, not as their targets.
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            // Vanished between read_dir and stat.
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        listing.push(entry_from_metadata(name, &metadata));
    }

    Ok(listing
        .into_iter()
        .sorted_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| a.name.cmp(&b.name))
        })
        .collect())
}

fn entry_from_metadata(name: String, metadata: &fs::Metadata) -> DirectoryEntry {
    let entry = if metadata.is_dir() {
        DirectoryEntry::folder(name)
    } else {
        DirectoryEntry::file(name, metadata.len())
    };
    match metadata.modified() {
        Ok(modified) => entry.with_modified(DateTime::<Utc>::from(modified)),
        Err(_) => entry,
    }
}

fn remove_entry(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Move a single file or folder, copying across filesystems if needed.
fn move_item(source: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }

    let file_type = fs::symlink_metadata(source)?.file_type();
    if file_type.is_symlink() {
        copy_link(source, dest)?;
        fs::remove_file(source)
    } else if file_type.is_dir() {
        copy_dir_recursive(source, dest)?;
        fs::remove_dir_all(source)
    } else {
        fs::copy(source, dest)?;
        fs::remove_file(source)
    }
}

/// Copy a tree without following symbolic links.
fn copy_dir_recursive(source: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            copy_link(&path, &dest_path)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&path, &dest_path)?;
        } else {
            fs::copy(&path, &dest_path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(source)?, dest)
}

#[cfg(not(unix))]
fn copy_link(source: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("Cannot copy link {}", source.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, LocalFileGateway) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::write(dir.path().join("b.txt"), b"bravo!").unwrap();
        fs::create_dir(dir.path().join("logs")).unwrap();
        fs::write(dir.path().join("logs").join("latest.log"), b"log").unwrap();
        let gateway = LocalFileGateway::from_root(dir.path());
        (dir, gateway)
    }

    fn names(names: &[&str]) -> SelectionSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_resolve_directory_stays_under_root() {
        let gateway = LocalFileGateway::from_root("/srv/store");
        assert_eq!(
            gateway.resolve_directory("/logs/").unwrap(),
            PathBuf::from("/srv/store/logs")
        );
        assert_eq!(
            gateway.resolve_directory("").unwrap(),
            PathBuf::from("/srv/store")
        );
        assert!(gateway.resolve_directory("/../etc").is_err());
    }

    #[tokio::test]
    async fn test_list_folders_first() {
        let (_dir, gateway) = setup();
        let listing = gateway.list("/").await.unwrap();
        let names: Vec<&str> = listing.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["logs", "a.txt", "b.txt"]);
        assert_eq!(listing[2].size, 6);
        assert!(listing[0].metadata.modified.is_some());
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let (_dir, gateway) = setup();
        let err = gateway.list("/missing").await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_files_and_folders() {
        let (dir, gateway) = setup();
        gateway.delete("/", &names(&["a.txt", "logs"])).await.unwrap();

        assert!(!dir.path().join("a.txt").exists());
        assert!(!dir.path().join("logs").exists());
        assert!(dir.path().join("b.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_missing_name_removes_nothing() {
        let (dir, gateway) = setup();
        let err = gateway
            .delete("/", &names(&["a.txt", "ghost.txt"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Not found: ghost.txt");
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_rejects_traversal() {
        let (_dir, gateway) = setup();
        let err = gateway.delete("/", &names(&[".."])).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_move_into_new_folder() {
        let (dir, gateway) = setup();
        gateway
            .move_entries("/", &names(&["a.txt", "b.txt"]), "backup")
            .await
            .unwrap();

        assert!(dir.path().join("backup").join("a.txt").exists());
        assert!(dir.path().join("backup").join("b.txt").exists());
        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_move_folder_into_itself() {
        let (dir, gateway) = setup();
        let err = gateway
            .move_entries("/", &names(&["logs"]), "/logs/old")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("into itself"));
        assert!(dir.path().join("logs").join("latest.log").exists());
    }

    #[tokio::test]
    async fn test_move_conflict_moves_nothing() {
        let (dir, gateway) = setup();
        fs::write(dir.path().join("logs").join("b.txt"), b"other").unwrap();

        let err = gateway
            .move_entries("/", &names(&["a.txt", "b.txt"]), "/logs")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_compress_creates_archive_entry() {
        let (dir, gateway) = setup();
        let archive = gateway
            .compress("/", &names(&["a.txt", "logs"]))
            .await
            .unwrap();

        assert!(archive.name.starts_with("archive-"));
        assert!(archive.name.ends_with(".zip"));
        assert!(archive.size > 0);
        assert!(dir.path().join(archive.name.as_str()).exists());
        // Sources stay in place.
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_compress_twice_does_not_overwrite() {
        let (_dir, gateway) = setup();
        let first = gateway.compress("/", &names(&["a.txt"])).await.unwrap();
        let second = gateway.compress("/", &names(&["b.txt"])).await.unwrap();
        assert_ne!(first.name, second.name);
    }

    #[cfg(unix)]
    fn link_outside(dir: &Path) -> tempfile::TempDir {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"top secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.join("link")).unwrap();
        outside
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compress_does_not_follow_links_out_of_root() {
        let (dir, gateway) = setup();
        let _outside = link_outside(dir.path());

        let archive = gateway.compress("/", &names(&["link"])).await.unwrap();

        let file = fs::File::open(dir.path().join(archive.name.as_str())).unwrap();
        let mut reader = zip::ZipArchive::new(file).unwrap();
        let entries: Vec<String> = reader.file_names().map(str::to_owned).collect();
        assert_eq!(entries, vec!["link"]);

        let mut contents = Vec::new();
        io::Read::read_to_end(&mut reader.by_name("link").unwrap(), &mut contents).unwrap();
        assert!(!contents.windows(6).any(|w| w == b"secret"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_reports_links_as_files() {
        let (dir, gateway) = setup();
        let _outside = link_outside(dir.path());

        let listing = gateway.list("/").await.unwrap();
        let link = listing.iter().find(|e| e.name == "link").unwrap();
        assert!(!link.is_folder());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_recursive_keeps_links() {
        let (dir, _gateway) = setup();
        let _outside = link_outside(&dir.path().join("logs"));

        let copy = dir.path().join("copy");
        copy_dir_recursive(&dir.path().join("logs"), &copy).unwrap();

        let copied = copy.join("link");
        assert!(fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&copied).unwrap(), fs::read_link(dir.path().join("logs").join("link")).unwrap());
        assert!(copy.join("latest.log").is_file());
    }
}
