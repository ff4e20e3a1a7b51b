//! Directory operations for creating and copying trees.
//!
//! Deletion is deliberately absent here: every recursive delete goes through
//! [`ManagedRoots::remove_tree`](crate::utils::roots::ManagedRoots::remove_tree)
//! so it is prefix-checked first.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Returns
///
/// - `Ok(())` if the directory exists or was successfully created
/// - `Err` if the path exists but is not a directory, or creation fails
///
/// # Examples
///
/// ```rust,no_run
/// use bedrock_steward::utils::fs::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// ensure_dir(Path::new("/srv/bedrock/backups"))?;
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Ensures that the parent directory of a file path exists.
///
/// Paths without a parent (root-level files) are accepted as-is.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Recursively copies a directory and all its contents to a new location.
///
/// # Behavior
///
/// - Creates the destination directory if it doesn't exist
/// - Merges into an existing destination, overwriting files with the same name
/// - Copies only regular files and directories (symlinks and special files are skipped)
/// - File permissions are carried over by [`std::fs::copy`]
///
/// # Examples
///
/// ```rust,no_run
/// use bedrock_steward::utils::fs::copy_dir;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// copy_dir(Path::new("/srv/bedrock/server/worlds"), Path::new("/tmp/worlds-copy"))?;
/// # Ok(())
/// # }
/// ```
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!("Failed to copy file from {} to {}", src_path.display(), dst_path.display())
            })?;
        }
        // Skip symlinks and other file types
    }

    Ok(())
}

/// Copies a file or a directory tree to `dst`.
///
/// Directories are merged via [`copy_dir`]; files overwrite `dst` and get their
/// parent directory created first.
pub fn copy_path(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir(src, dst)
    } else {
        ensure_parent_dir(dst)?;
        fs::copy(src, dst).with_context(|| {
            format!("Failed to copy file from {} to {}", src.display(), dst.display())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir() {
        let temp = tempdir().unwrap();
        let test_dir = temp.path().join("test_dir");

        assert!(!test_dir.exists());
        ensure_dir(&test_dir).unwrap();
        assert!(test_dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_on_file() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("file.txt");
        std::fs::write(&file_path, "content").unwrap();

        assert!(ensure_dir(&file_path).is_err());
    }

    #[test]
    fn test_ensure_parent_dir() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("parent").join("child").join("file.txt");

        ensure_parent_dir(&file_path).unwrap();
        assert!(file_path.parent().unwrap().exists());

        // Bare file names have an empty parent
        ensure_parent_dir(Path::new("file.txt")).unwrap();
    }

    #[test]
    fn test_copy_dir() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");

        ensure_dir(&src.join("subdir")).unwrap();
        std::fs::write(src.join("file1.txt"), "content1").unwrap();
        std::fs::write(src.join("subdir/file2.txt"), "content2").unwrap();

        copy_dir(&src, &dst).unwrap();

        assert_eq!(std::fs::read_to_string(dst.join("file1.txt")).unwrap(), "content1");
        assert_eq!(std::fs::read_to_string(dst.join("subdir/file2.txt")).unwrap(), "content2");
    }

    #[test]
    fn test_copy_dir_merges_into_existing() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");

        ensure_dir(&src).unwrap();
        ensure_dir(&dst).unwrap();
        std::fs::write(src.join("shared.txt"), "new").unwrap();
        std::fs::write(dst.join("shared.txt"), "old").unwrap();
        std::fs::write(dst.join("kept.txt"), "kept").unwrap();

        copy_dir(&src, &dst).unwrap();

        assert_eq!(std::fs::read_to_string(dst.join("shared.txt")).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(dst.join("kept.txt")).unwrap(), "kept");
    }

    #[test]
    fn test_copy_dir_with_permissions() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");

        ensure_dir(&src).unwrap();
        std::fs::write(src.join("bedrock_server"), "#!/bin/sh").unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(src.join("bedrock_server")).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(src.join("bedrock_server"), perms).unwrap();
        }

        copy_dir(&src, &dst).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::metadata(dst.join("bedrock_server")).unwrap().permissions();
            assert_eq!(perms.mode() & 0o777, 0o755);
        }
    }

    #[test]
    fn test_copy_path_file_creates_parent() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("server.properties");
        std::fs::write(&src, "level-name=A").unwrap();

        let dst = temp.path().join("nested/dir/server.properties");
        copy_path(&src, &dst).unwrap();
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "level-name=A");
    }
}
