//! Core library for ntemoji: resolving the encoding of QQ's undeclared-
//! encoding config file, locating the user-data root, exporting personal
//! sticker collections, and repairing file extensions against binary
//! headers.

pub mod config;
pub mod encoding;
pub mod export;
pub mod filetype;
pub mod reconcile;

// Re-exports
pub use config::{ConfigError, IniDocument, UserDataLocator};
pub use encoding::{resolve, EncodingError, ResolvedEncoding};
pub use export::{export_stickers, ExportResult, ProgressFn};
pub use filetype::sniff_tag;
pub use reconcile::{reconcile, reconcile_tree, Reconciliation};
