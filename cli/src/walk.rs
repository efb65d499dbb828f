//! Recursive file enumeration for `-r`.

use std::path::{Path, PathBuf};

/// Walks `root` recursively, yielding every regular file, skipping any
/// directory named `.git`.
pub fn walk_files(root: impl AsRef<Path>) -> impl Iterator<Item = PathBuf> {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walk_files_skips_git_directory() {
        let dir = std::env::temp_dir().join(format!("threadgrep-walk-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::write(dir.join(".git/HEAD"), b"ref: refs/heads/main\n").unwrap();
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/main.rs"), b"fn main() {}\n").unwrap();

        let files: Vec<_> = walk_files(&dir).collect();
        assert!(files.iter().any(|p| p.ends_with("src/main.rs")));
        assert!(!files.iter().any(|p| p.components().any(|c| c.as_os_str() == ".git")));

        fs::remove_dir_all(&dir).unwrap();
    }
}
