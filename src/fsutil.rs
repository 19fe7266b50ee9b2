//! File tree helpers used by steps and the relocation protocol.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively copy `source` into `target`, creating `target` if needed.
pub fn copy_dir(source: &Path, target: &Path) -> io::Result<()> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", source.display()),
        ));
    }
    fs::create_dir_all(target)?;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

/// Delete a directory tree; a missing directory is not an error.
pub fn delete_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Move a directory, falling back to copy + delete across file systems.
pub fn move_dir(source: &Path, target: &Path) -> io::Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    copy_dir(source, target)?;
    delete_dir(source)
}

/// Content of every file under `root`, keyed by relative path.
///
/// Two snapshots are equal iff both trees hold the same files with the same
/// bytes. Directories only show up through the files they contain.
pub fn tree_snapshot(root: &Path) -> io::Result<BTreeMap<PathBuf, Vec<u8>>> {
    let mut snapshot = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
                .to_path_buf();
            snapshot.insert(relative, fs::read(entry.path())?);
        }
    }
    Ok(snapshot)
}

/// Directories directly under `path` containing a `file_name`, sorted by name.
pub fn subdirs_containing(path: &Path, file_name: &str) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let candidate = entry.path();
        if candidate.is_dir() && candidate.join(file_name).is_file() {
            dirs.push(candidate);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copy_dir_preserves_tree() {
        let source = tempfile::tempdir().unwrap();
        write(source.path(), "pom.xml", "<project/>");
        write(source.path(), "app/src/Main.groovy", "println 'hi'");
        fs::create_dir_all(source.path().join("empty")).unwrap();

        let target = tempfile::tempdir().unwrap();
        let copy = target.path().join("copy");
        copy_dir(source.path(), &copy).unwrap();

        assert_eq!(
            tree_snapshot(source.path()).unwrap(),
            tree_snapshot(&copy).unwrap()
        );
        assert!(copy.join("empty").is_dir());
    }

    #[test]
    fn test_delete_missing_dir_is_ok() {
        let root = tempfile::tempdir().unwrap();
        assert!(delete_dir(&root.path().join("missing")).is_ok());
    }

    #[test]
    fn test_move_dir() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "a/b.txt", "b");
        move_dir(&root.path().join("a"), &root.path().join("c")).unwrap();
        assert!(!root.path().join("a").exists());
        assert_eq!(fs::read_to_string(root.path().join("c/b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_snapshot_detects_changes() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "a.txt", "one");
        let before = tree_snapshot(root.path()).unwrap();
        write(root.path(), "a.txt", "two");
        assert_ne!(before, tree_snapshot(root.path()).unwrap());
    }

    #[test]
    fn test_subdirs_containing() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "b/pom.xml", "");
        write(root.path(), "a/pom.xml", "");
        write(root.path(), "c/readme.md", "");
        let found = subdirs_containing(root.path(), "pom.xml").unwrap();
        assert_eq!(found, vec![root.path().join("a"), root.path().join("b")]);
    }
}
