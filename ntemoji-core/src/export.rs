//! Sticker export pipeline: account discovery, recursive copy, then the
//! extension-repair pass over the copied tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::reconcile::{self, ReconcileStats};

/// Progress callback: (files done, files total, current file name).
pub type ProgressFn = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Fixed location of a user's personal sticker originals inside their
/// account directory.
pub const STICKER_SUBPATH: &[&str] = &["nt_qq", "nt_data", "Emoji", "personal_emoji", "Ori"];

/// Immediate subdirectories of `parent` whose names are QQ account numbers
/// (all ASCII digits). A missing or unreadable parent yields an empty list.
pub fn numeric_subdirectories(parent: &Path) -> Vec<String> {
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot list {}: {}", parent.display(), e);
            return Vec::new();
        }
    };
    let mut accounts: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
        .collect();
    accounts.sort();
    accounts
}

/// Sticker originals directory for one account under the user-data root.
pub fn sticker_dir(user_data_root: &Path, account: &str) -> PathBuf {
    let mut path = user_data_root.join(account);
    for part in STICKER_SUBPATH {
        path.push(part);
    }
    path
}

/// Counters for one copy pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CopyStats {
    pub total: usize,
    pub copied: usize,
    /// Per-file failures; the copy continues past these.
    pub failed: usize,
}

/// Recursively copy `src` into `dst`, preserving relative layout. Per-file
/// errors are logged and counted, never aborting the pass.
pub fn copy_tree(src: &Path, dst: &Path, progress: Option<&ProgressFn>) -> Result<CopyStats> {
    if !src.is_dir() {
        bail!("source directory does not exist: {}", src.display());
    }
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create output directory {}", dst.display()))?;

    let files: Vec<PathBuf> = WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();

    let mut stats = CopyStats {
        total: files.len(),
        ..CopyStats::default()
    };

    for (index, file) in files.iter().enumerate() {
        let Ok(rel) = file.strip_prefix(src) else {
            // Walked paths always live under src.
            continue;
        };
        let dest = dst.join(rel);
        let outcome = (|| -> Result<()> {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(file, &dest)
                .with_context(|| format!("Failed to copy {}", file.display()))?;
            Ok(())
        })();
        match outcome {
            Ok(()) => stats.copied += 1,
            Err(e) => {
                stats.failed += 1;
                log::warn!("copy failed: {:#}", e);
            }
        }
        if let Some(cb) = progress {
            let name = rel.to_string_lossy();
            cb(index + 1, stats.total, &name);
        }
    }
    Ok(stats)
}

/// Summary of one full export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub source: PathBuf,
    pub output: PathBuf,
    pub copy: CopyStats,
    /// Absent when the caller disabled the rename pass.
    pub reconcile: Option<ReconcileStats>,
}

/// Copy one account's sticker originals to `output`, then reconcile file
/// extensions in the copy (the source tree is never modified).
pub fn export_stickers(
    user_data_root: &Path,
    account: &str,
    output: &Path,
    rename: bool,
    progress: Option<&ProgressFn>,
) -> Result<ExportResult> {
    let source = sticker_dir(user_data_root, account);
    if !source.is_dir() {
        bail!(
            "no sticker directory for account {}: {}",
            account,
            source.display()
        );
    }

    let copy = copy_tree(&source, output, progress)?;
    let reconcile = if rename {
        Some(reconcile::reconcile_tree(output))
    } else {
        None
    };

    Ok(ExportResult {
        source,
        output: output.to_path_buf(),
        copy,
        reconcile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_filter_accepts_only_all_digit_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["123456789", "10000", "nt_qq", "123abc", "global"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("987654"), b"a file, not a dir").unwrap();

        let accounts = numeric_subdirectories(dir.path());
        assert_eq!(accounts, vec!["10000".to_string(), "123456789".to_string()]);
    }

    #[test]
    fn missing_parent_yields_empty_list() {
        assert!(numeric_subdirectories(Path::new("/no/such/dir")).is_empty());
    }

    #[test]
    fn sticker_dir_joins_fixed_suffix() {
        let path = sticker_dir(Path::new("/data"), "10001");
        assert_eq!(
            path,
            Path::new("/data/10001/nt_qq/nt_data/Emoji/personal_emoji/Ori")
        );
    }

    #[test]
    fn copy_tree_preserves_layout_and_counts() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("thumbs")).unwrap();
        fs::write(src.path().join("a.png"), b"one").unwrap();
        fs::write(src.path().join("thumbs/b.png"), b"two").unwrap();

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let progress: ProgressFn = Arc::new(move |done, total, _name| {
            seen_cb.lock().unwrap().push((done, total));
        });

        let out = dst.path().join("exported");
        let stats = copy_tree(src.path(), &out, Some(&progress)).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.copied, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(fs::read(out.join("a.png")).unwrap(), b"one");
        assert_eq!(fs::read(out.join("thumbs/b.png")).unwrap(), b"two");
        assert_eq!(seen.lock().unwrap().last(), Some(&(2, 2)));
    }

    #[test]
    fn copy_tree_rejects_missing_source() {
        let dst = tempfile::tempdir().unwrap();
        assert!(copy_tree(Path::new("/no/such/src"), dst.path(), None).is_err());
    }
}
