//! Name validation and archive naming for the local gateway.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Check that `name` addresses a single entry inside its directory.
pub fn validate_entry_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    for c in ['/', '\\', '\0'] {
        if name.contains(c) {
            return Err(format!("Name cannot contain '{}'", c.escape_default()));
        }
    }

    if name == "." || name == ".." {
        return Err("'.' and '..' are reserved names".into());
    }

    Ok(())
}

/// File name for a new archive, e.g. `archive-2024-05-01T101500.zip`.
pub fn archive_file_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.zip", prefix, now.format("%Y-%m-%dT%H%M%S"))
}

/// Return `path` if it is free, otherwise the first free `name (n).ext`.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let extension = path.extension().and_then(|e| e.to_str());

    for i in 1..1000 {
        let candidate = match extension {
            Some(ext) => parent.join(format!("{stem} ({i}).{ext}")),
            None => parent.join(format!("{stem} ({i})")),
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    match extension {
        Some(ext) => parent.join(format!("{stem}_{nanos}.{ext}")),
        None => parent.join(format!("{stem}_{nanos}")),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_validate_entry_name() {
        assert!(validate_entry_name("server.jar").is_ok());
        assert!(validate_entry_name(".env").is_ok());
        assert!(validate_entry_name("trailing ").is_ok());

        assert!(validate_entry_name("").is_err());
        assert!(validate_entry_name("a/b").is_err());
        assert!(validate_entry_name("a\\b").is_err());
        assert!(validate_entry_name(".").is_err());
        assert!(validate_entry_name("..").is_err());
    }

    #[test]
    fn test_archive_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
        assert_eq!(
            archive_file_name("archive", now),
            "archive-2024-05-01T101500.zip"
        );
    }

    #[test]
    fn test_unique_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.zip");
        assert_eq!(unique_path(&path), path);

        std::fs::write(&path, b"").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("archive (1).zip"));

        std::fs::write(dir.path().join("archive (1).zip"), b"").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("archive (2).zip"));
    }
}
