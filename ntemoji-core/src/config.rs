//! QQ `UserDataInfo.ini` access: INI parsing on top of the encoding resolver.
//!
//! This layer is a direct pass-through once the encoding is known. Sections
//! are kept in file order, duplicate keys within a section follow standard
//! INI last-write-wins semantics, and key lookup is case-insensitive.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::encoding::{self, EncodingError, ResolvedEncoding};

/// Section holding the user-data directory entry.
pub const USER_DATA_SECTION: &str = "UserDataSet";

/// Key naming the user-data directory inside [`USER_DATA_SECTION`].
pub const USER_DATA_PATH_KEY: &str = "UserDataSavePath";

/// Well-known location of the QQ NT config file on Windows.
pub const DEFAULT_INI_PATH: &str = r"C:\Users\Public\Documents\Tencent\QQ\UserDataInfo.ini";

/// The resolver's required marker for this format: the literal section
/// header token.
pub fn section_marker(section: &str) -> String {
    format!("[{}]", section)
}

/// Errors from config file access
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not determine the encoding of {path}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: EncodingError,
    },

    #[error("config file has no [{section}] {key} entry")]
    MissingKey { section: String, key: String },
}

/// An ordered INI document.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

#[derive(Debug, Clone)]
struct IniSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl IniDocument {
    /// Parse already-decoded INI text. Lenient: blank lines, `;`/`#` comments
    /// and lines without `=` outside a section header are ignored.
    pub fn parse(text: &str) -> Self {
        let mut doc = IniDocument::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                doc.sections.push(IniSection {
                    name: name.trim().to_string(),
                    entries: Vec::new(),
                });
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::debug!("ignoring malformed ini line: {}", line);
                continue;
            };
            if let Some(section) = doc.sections.last_mut() {
                section
                    .entries
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
        }
        doc
    }

    /// Whether a section with this exact name exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.iter().any(|s| s.name == section)
    }

    /// Look up a value. Section names compare exactly, keys
    /// case-insensitively; the last write for a duplicate key wins.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .filter(|s| s.name == section)
            .flat_map(|s| s.entries.iter())
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .next_back()
            .map(|(_, v)| v.as_str())
    }
}

/// Read and decode an INI file whose encoding is undeclared, using `marker`
/// to validate the winning candidate.
pub fn load_ini(path: &Path, marker: &str) -> Result<(IniDocument, ResolvedEncoding), ConfigError> {
    let raw = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let resolved = encoding::resolve(&raw, marker).map_err(|source| ConfigError::Encoding {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = IniDocument::parse(&resolved.text);
    Ok((doc, resolved))
}

/// Locates the QQ user-data root via `UserDataInfo.ini`.
///
/// The first successfully resolved path is cached for the lifetime of the
/// locator; later calls never re-read the file.
#[derive(Debug)]
pub struct UserDataLocator {
    ini_path: PathBuf,
    cached: Option<PathBuf>,
}

impl UserDataLocator {
    pub fn new(ini_path: impl Into<PathBuf>) -> Self {
        Self {
            ini_path: ini_path.into(),
            cached: None,
        }
    }

    pub fn ini_path(&self) -> &Path {
        &self.ini_path
    }

    /// Resolve `[UserDataSet] UserDataSavePath`.
    pub fn user_data_save_path(&mut self) -> Result<PathBuf, ConfigError> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }

        let marker = section_marker(USER_DATA_SECTION);
        let (doc, resolved) = load_ini(&self.ini_path, &marker)?;
        log::info!(
            "decoded {} as {}",
            self.ini_path.display(),
            resolved.encoding.name()
        );

        let value = doc
            .get(USER_DATA_SECTION, USER_DATA_PATH_KEY)
            .ok_or_else(|| ConfigError::MissingKey {
                section: USER_DATA_SECTION.to_string(),
                key: USER_DATA_PATH_KEY.to_string(),
            })?;

        let path = PathBuf::from(value);
        self.cached = Some(path.clone());
        Ok(path)
    }
}
