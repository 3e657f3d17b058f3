//! Numbered run directories.

use std::path::{Path, PathBuf};

use tracing::info;

/// Create and return the next `output<N>` directory under `base`.
///
/// Existing children matching `output<digits>` determine the highest run
/// number; the new directory is numbered one above it.
pub fn next_run_dir(base: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let base = base.as_ref();
    std::fs::create_dir_all(base)?;

    let mut max_num = 0u32;
    for entry in std::fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(num) = run_number(&entry.file_name().to_string_lossy()) {
            max_num = max_num.max(num);
        }
    }

    let run_dir = base.join(format!("output{}", max_num + 1));
    std::fs::create_dir_all(&run_dir)?;
    info!("Created run directory: {}", run_dir.display());
    Ok(run_dir)
}

fn run_number(name: &str) -> Option<u32> {
    name.strip_prefix("output")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_run_dir_is_output1() {
        let base = TempDir::new().unwrap();
        let dir = next_run_dir(base.path()).unwrap();
        assert_eq!(dir, base.path().join("output1"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_numbering_continues_from_highest() {
        let base = TempDir::new().unwrap();
        std::fs::create_dir(base.path().join("output2")).unwrap();
        std::fs::create_dir(base.path().join("output7")).unwrap();

        let dir = next_run_dir(base.path()).unwrap();
        assert_eq!(dir, base.path().join("output8"));
    }

    #[test]
    fn test_unrelated_entries_ignored() {
        let base = TempDir::new().unwrap();
        std::fs::create_dir(base.path().join("outputs")).unwrap();
        std::fs::create_dir(base.path().join("archive3")).unwrap();
        std::fs::write(base.path().join("output9"), b"a file, not a dir").unwrap();

        let dir = next_run_dir(base.path()).unwrap();
        assert_eq!(dir, base.path().join("output1"));
    }

    #[test]
    fn test_base_created_when_missing() {
        let base = TempDir::new().unwrap();
        let nested = base.path().join("runs");
        let dir = next_run_dir(&nested).unwrap();
        assert_eq!(dir, nested.join("output1"));
    }
}
