//! Zip archive creation.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `targets` (name, path) into a new zip at `archive`.
///
/// Folders are added recursively. Symbolic links are stored as links and
/// never followed. Fails if `archive` already exists; a partially written
/// archive is removed.
pub fn write_archive(targets: &[(String, PathBuf)], archive: &Path) -> io::Result<()> {
    let file = File::create_new(archive)?;
    let result = write_entries(file, targets);
    if result.is_err() {
        let _ = fs::remove_file(archive);
    }
    result
}

fn write_entries(file: File, targets: &[(String, PathBuf)]) -> io::Result<()> {
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, path) in targets {
        add_path(&mut zip, path, name, &options)?;
    }

    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

fn add_path(
    zip: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: &SimpleFileOptions,
) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_symlink() {
        let target = fs::read_link(path)?;
        zip.add_symlink(name, target.to_string_lossy(), options.clone())
            .map_err(io::Error::other)?;
    } else if file_type.is_dir() {
        zip.add_directory(name, options.clone())
            .map_err(io::Error::other)?;

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let child = format!("{}/{}", name, entry.file_name().to_string_lossy());
            add_path(zip, &entry.path(), &child, options)?;
        }
    } else {
        zip.start_file(name, options.clone())
            .map_err(io::Error::other)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, zip)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_archive_with_folder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::create_dir(dir.path().join("logs")).unwrap();
        fs::write(dir.path().join("logs").join("latest.log"), b"log").unwrap();

        let archive = dir.path().join("out.zip");
        let targets = vec![
            ("a.txt".to_string(), dir.path().join("a.txt")),
            ("logs".to_string(), dir.path().join("logs")),
        ];
        write_archive(&targets, &archive).unwrap();

        let mut reader = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<String> = reader.file_names().map(str::to_owned).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "logs/", "logs/latest.log"]);

        let mut contents = String::new();
        io::Read::read_to_string(&mut reader.by_name("a.txt").unwrap(), &mut contents).unwrap();
        assert_eq!(contents, "alpha");
    }

    #[test]
    fn test_write_archive_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("out.zip");
        fs::write(&archive, b"taken").unwrap();

        let err = write_archive(&[], &archive).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        // Someone else's file is left alone.
        assert_eq!(fs::read(&archive).unwrap(), b"taken");
    }

    #[test]
    fn test_write_archive_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        let archive = dir.path().join("out.zip");
        let targets = vec![
            ("a.txt".to_string(), dir.path().join("a.txt")),
            ("gone.txt".to_string(), dir.path().join("gone.txt")),
        ];

        let err = write_archive(&targets, &archive).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!archive.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_archive_stores_symlink_without_following() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"top secret").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let archive = dir.path().join("out.zip");
        write_archive(&[("link".to_string(), dir.path().join("link"))], &archive).unwrap();

        let reader = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<&str> = reader.file_names().collect();
        assert_eq!(names, vec!["link"]);
    }
}
