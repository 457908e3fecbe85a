//! Reconciling a file's declared type against its true type.
//!
//! The producing application sometimes writes image payloads with a stale or
//! generic extension; the binary header is the only reliable ground truth.
//! Mirrors the encoding resolver's philosophy: ordered candidates, first
//! validated interpretation wins, and failure to classify is not an error.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::filetype::{self, HEADER_LEN};

/// Outcome of reconciling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Extension-derived media type is not `image/*`; the file was never
    /// inspected.
    NotAnImage,
    /// No registered signature matched the header. Expected for plenty of
    /// legitimate files; the file is left untouched.
    Unrecognized,
    /// The current extension maps to no known tag, so there is nothing to
    /// compare against.
    NoExpectedTag,
    /// Header-derived and extension-derived tags agree.
    AlreadyCorrect,
    /// Extension was wrong; the file now lives at the contained path.
    Renamed(PathBuf),
    /// A file already exists at the corrected path; rename skipped to avoid
    /// silent overwrite.
    SkippedExisting(PathBuf),
}

/// Compare `path`'s header-derived type against its extension-derived type
/// and rename on mismatch, preserving base name and directory.
pub fn reconcile(path: &Path) -> Result<Reconciliation> {
    if !filetype::is_image_path(path) {
        return Ok(Reconciliation::NotAnImage);
    }

    let header = read_header(path)?;
    let Some(actual) = filetype::sniff_tag(&header) else {
        return Ok(Reconciliation::Unrecognized);
    };
    let Some(expected) = filetype::expected_tag(path) else {
        return Ok(Reconciliation::NoExpectedTag);
    };
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(Reconciliation::AlreadyCorrect);
    }

    let target = path.with_extension(actual);
    if target.exists() {
        log::info!("target already exists, skipping rename: {}", target.display());
        return Ok(Reconciliation::SkippedExisting(target));
    }
    fs::rename(path, &target)
        .with_context(|| format!("Failed to rename {} -> {}", path.display(), target.display()))?;
    log::debug!("renamed {} -> {}", path.display(), target.display());
    Ok(Reconciliation::Renamed(target))
}

/// First [`HEADER_LEN`] bytes of the file; fewer if the file is shorter.
fn read_header(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .with_context(|| format!("Failed to read header of {}", path.display()))?;
    Ok(header)
}

/// Per-outcome counts for a batch pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileStats {
    /// Image files inspected.
    pub examined: usize,
    pub renamed: usize,
    pub already_correct: usize,
    pub unrecognized: usize,
    pub no_expected_tag: usize,
    pub skipped_existing: usize,
    /// Per-file I/O failures; the batch continues past these.
    pub failed: usize,
}

/// Sequentially reconcile every image file under `dir`. Per-file errors are
/// logged and counted, never aborting the pass.
pub fn reconcile_tree(dir: &Path) -> ReconcileStats {
    let mut stats = ReconcileStats::default();
    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        match reconcile(path) {
            Ok(Reconciliation::NotAnImage) => {}
            Ok(outcome) => {
                stats.examined += 1;
                match outcome {
                    Reconciliation::Renamed(_) => stats.renamed += 1,
                    Reconciliation::AlreadyCorrect => stats.already_correct += 1,
                    Reconciliation::Unrecognized => stats.unrecognized += 1,
                    Reconciliation::NoExpectedTag => stats.no_expected_tag += 1,
                    Reconciliation::SkippedExisting(_) => stats.skipped_existing += 1,
                    Reconciliation::NotAnImage => unreachable!(),
                }
            }
            Err(e) => {
                stats.examined += 1;
                stats.failed += 1;
                log::warn!("failed to reconcile {}: {:#}", path.display(), e);
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIF_BODY: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
    const JPEG_BODY: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    #[test]
    fn gif_payload_named_png_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, GIF_BODY).unwrap();

        let outcome = reconcile(&path).unwrap();
        let expected = dir.path().join("a.gif");
        assert_eq!(outcome, Reconciliation::Renamed(expected.clone()));
        assert!(expected.exists());
        assert!(!path.exists());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, GIF_BODY).unwrap();

        let first = reconcile(&path).unwrap();
        let Reconciliation::Renamed(renamed) = first else {
            panic!("expected rename, got {:?}", first);
        };
        // The corrected file is now in its terminal state.
        assert_eq!(reconcile(&renamed).unwrap(), Reconciliation::AlreadyCorrect);
    }

    #[test]
    fn rename_skipped_when_target_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        let taken = dir.path().join("a.gif");
        fs::write(&path, GIF_BODY).unwrap();
        fs::write(&taken, b"already here").unwrap();

        let outcome = reconcile(&path).unwrap();
        assert_eq!(outcome, Reconciliation::SkippedExisting(taken.clone()));
        // Neither file was touched.
        assert!(path.exists());
        assert_eq!(fs::read(&taken).unwrap(), b"already here");
    }

    #[test]
    fn matching_extension_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, JPEG_BODY).unwrap();
        assert_eq!(reconcile(&path).unwrap(), Reconciliation::AlreadyCorrect);
        assert!(path.exists());
    }

    #[test]
    fn unrecognized_header_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.png");
        fs::write(&path, b"no signature here").unwrap();
        assert_eq!(reconcile(&path).unwrap(), Reconciliation::Unrecognized);
        assert!(path.exists());
    }

    #[test]
    fn non_image_extension_is_never_inspected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        fs::write(&path, GIF_BODY).unwrap();
        assert_eq!(reconcile(&path).unwrap(), Reconciliation::NotAnImage);
        assert!(path.exists());
    }

    #[test]
    fn short_file_cannot_match_longer_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        fs::write(&path, b"\x89P").unwrap();
        assert_eq!(reconcile(&path).unwrap(), Reconciliation::Unrecognized);
    }

    #[test]
    fn tree_pass_counts_outcomes_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("a.png"), GIF_BODY).unwrap();
        fs::write(dir.path().join("b.jpg"), JPEG_BODY).unwrap();
        fs::write(nested.join("c.png"), b"garbage").unwrap();
        fs::write(nested.join("d.txt"), GIF_BODY).unwrap();

        let stats = reconcile_tree(dir.path());
        assert_eq!(stats.examined, 3);
        assert_eq!(stats.renamed, 1);
        assert_eq!(stats.already_correct, 1);
        assert_eq!(stats.unrecognized, 1);
        assert_eq!(stats.failed, 0);
        assert!(dir.path().join("a.gif").exists());
        assert!(nested.join("d.txt").exists());
    }
}
