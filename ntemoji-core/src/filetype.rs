//! Image-format identification from binary headers and file extensions.
//!
//! The signature table is scanned in declaration order and the first match
//! wins. Order matters: several signatures share leading bytes (the JPEG
//! variants are prefixes of one another, the ICO variants differ in a single
//! byte), so position in the table carries the specificity logic that a
//! longest-match scheme would otherwise need.

use std::path::Path;

use mime_guess::mime;

/// How many leading bytes of a file are inspected.
pub const HEADER_LEN: usize = 16;

/// One canonical type tag with the byte prefixes that identify it.
pub struct SignatureEntry {
    pub tag: &'static str,
    pub signatures: &'static [&'static [u8]],
}

/// Built-in signature table. Not user-configurable.
pub const SIGNATURES: &[SignatureEntry] = &[
    SignatureEntry {
        tag: "jpg",
        signatures: &[b"\xff\xd8\xff", b"\xff\xd8\xff\xe0", b"\xff\xd8\xff\xe1"],
    },
    SignatureEntry {
        tag: "png",
        signatures: &[b"\x89PNG\r\n\x1a\n"],
    },
    SignatureEntry {
        tag: "gif",
        signatures: &[b"GIF87a", b"GIF89a"],
    },
    SignatureEntry {
        tag: "bmp",
        signatures: &[b"BM"],
    },
    SignatureEntry {
        tag: "tiff",
        signatures: &[b"II*\x00", b"MM\x00*"],
    },
    SignatureEntry {
        tag: "webp",
        signatures: &[b"RIFF", b"WEBP"],
    },
    SignatureEntry {
        tag: "ico",
        signatures: &[b"\x00\x00\x01\x00", b"\x00\x00\x02\x00"],
    },
    SignatureEntry {
        tag: "psd",
        signatures: &[b"8BPS"],
    },
    SignatureEntry {
        tag: "svg",
        signatures: &[b"<?xml", b"<svg"],
    },
    SignatureEntry {
        tag: "heic",
        signatures: &[b"ftypheic", b"ftypheix", b"ftyphevc", b"ftyphevx"],
    },
    SignatureEntry {
        tag: "avif",
        signatures: &[b"ftypavif", b"ftypavis"],
    },
];

/// Canonical tag to standard media-type string, for deriving the expected
/// tag from a file's current extension via the media-type registry.
pub const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tiff", "image/tiff"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("psd", "image/vnd.adobe.photoshop"),
    ("svg", "image/svg+xml"),
    ("heic", "image/heic"),
    ("avif", "image/avif"),
];

/// Identify the true type tag from a header prefix. Short headers match
/// against whatever bytes are available; a signature longer than the header
/// simply cannot match. `None` means no registered signature matched, which
/// is an expected outcome for plenty of legitimate files.
pub fn sniff_tag(header: &[u8]) -> Option<&'static str> {
    for entry in SIGNATURES {
        for signature in entry.signatures {
            if header.starts_with(signature) {
                return Some(entry.tag);
            }
        }
    }
    None
}

/// Canonical tag for a media-type string, the reverse of [`MEDIA_TYPES`].
pub fn tag_for_media_type(media_type: &str) -> Option<&'static str> {
    MEDIA_TYPES
        .iter()
        .find(|(_, mt)| *mt == media_type)
        .map(|(tag, _)| *tag)
}

/// The tag a file's current extension claims, via the media-type registry.
pub fn expected_tag(path: &Path) -> Option<&'static str> {
    let guessed = mime_guess::from_path(path).first()?;
    tag_for_media_type(guessed.essence_str())
}

/// Whether the extension-derived media type is `image/*`. Only such files
/// are ever inspected or renamed.
pub fn is_image_path(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false)
}
