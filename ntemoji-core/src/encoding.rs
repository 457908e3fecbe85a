//! Encoding resolution for configuration files with no declared encoding.
//!
//! QQ's `UserDataInfo.ini` may be written in any of several legacy Chinese or
//! Western code pages. A statistical detector alone is unreliable for short,
//! mostly-ASCII INI text, so detection is combined with an ordered candidate
//! trial: strict-decode each candidate and accept the first one whose output
//! passes content-shape validation (marker present, at least one CJK
//! character). First fit wins, not best fit.

use encoding_rs::Encoding;
use thiserror::Error;

/// Detector guesses below this confidence are tried late instead of first.
pub const DETECTOR_TRUST_THRESHOLD: f32 = 0.7;

/// Minimum CJK Unified Ideograph count for a decode to be considered genuine.
const MIN_CJK_CHARS: usize = 1;

/// Encodings that can represent the Chinese text expected in the config file.
/// A detector guess is only trusted up-front when it names one of these.
const CHINESE_CAPABLE: &[&str] = &["gb18030", "gbk", "utf-8"];

/// Fixed preference order tried before anything the detector suggests at low
/// trust. GB18030 is a superset of legacy GBK and goes first.
const PRIORITY_SEED: &[&str] = &["gb18030", "utf-8", "utf-16", "ascii"];

/// Long tail of legacy/regional encodings for graceful degradation. Labels
/// the runtime does not support (cp936, utf-7) are skipped during trials.
const FALLBACK_TAIL: &[&str] = &[
    "gbk",
    "big5",
    "utf-16le",
    "utf-16be",
    "shift_jis",
    "iso-8859-1",
    "latin-1",
    "cp936",
    "cp950",
    "utf-7",
];

/// Errors from encoding resolution
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("input is empty, nothing to decode")]
    EmptyInput,

    #[error("no candidate encoding decoded the input and passed validation ({tried} tried)")]
    Unresolvable { tried: usize },
}

/// A statistical detector's best guess for some raw bytes.
#[derive(Debug, Clone)]
pub struct EncodingGuess {
    /// Encoding label as reported by the detector.
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

/// Statistical encoding detector seam. The production implementation wraps
/// chardetng; tests inject fixed guesses with fixed confidences.
pub trait EncodingSniffer {
    fn sniff(&self, raw: &[u8]) -> Option<EncodingGuess>;
}

/// chardetng-backed detector.
///
/// chardetng does not expose a calibrated score, so the assessment flag from
/// `guess_assess` is mapped onto a coarse confidence: 0.8 when the guess
/// scored above the non-ASCII default, 0.4 otherwise. Only the position of
/// the guess relative to [`DETECTOR_TRUST_THRESHOLD`] matters.
pub struct ChardetngSniffer;

impl EncodingSniffer for ChardetngSniffer {
    fn sniff(&self, raw: &[u8]) -> Option<EncodingGuess> {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(raw, true);
        let (encoding, scored) = detector.guess_assess(None, true);
        Some(EncodingGuess {
            label: encoding.name().to_string(),
            confidence: if scored { 0.8 } else { 0.4 },
        })
    }
}

/// A successfully resolved encoding plus the text it produced.
#[derive(Debug, Clone)]
pub struct ResolvedEncoding {
    /// The candidate label that won (as it appeared in the candidate list).
    pub label: String,
    /// The runtime encoding the label resolved to.
    pub encoding: &'static Encoding,
    /// The strictly decoded content.
    pub text: String,
}

/// Ordered candidate encodings. Position is priority: lower index is tried
/// first. Duplicate labels (case-insensitive) keep their first-seen position.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    labels: Vec<String>,
}

impl CandidateList {
    /// Build the full trial order for one resolution attempt: the fixed seed,
    /// the detector guess spliced in by trust, then the fallback tail.
    pub fn build(guess: Option<&EncodingGuess>) -> Self {
        let mut list = CandidateList::default();
        for label in PRIORITY_SEED {
            list.push(label);
        }
        if let Some(guess) = guess {
            let trusted = guess.confidence >= DETECTOR_TRUST_THRESHOLD
                && CHINESE_CAPABLE.contains(&guess.label.to_lowercase().as_str());
            if trusted {
                list.push_front(&guess.label);
            } else {
                // Low trust: tried after the seed but before the long tail.
                list.push(&guess.label);
            }
        }
        for label in FALLBACK_TAIL {
            list.push(label);
        }
        list
    }

    fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    fn push(&mut self, label: &str) {
        if !self.contains(label) {
            self.labels.push(label.to_string());
        }
    }

    fn push_front(&mut self, label: &str) {
        // Front insertion carries priority: any existing occurrence of the
        // label gives way so the trusted guess really is tried first.
        self.labels.retain(|l| !l.eq_ignore_ascii_case(label));
        self.labels.insert(0, label.to_string());
    }

    /// Candidate labels in trial order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Resolve the encoding of `raw` using the production detector.
///
/// `marker` is a literal substring expected in correctly decoded content,
/// e.g. the `[UserDataSet]` section header of the QQ config format.
pub fn resolve(raw: &[u8], marker: &str) -> Result<ResolvedEncoding, EncodingError> {
    resolve_with_sniffer(raw, marker, &ChardetngSniffer)
}

/// Resolve with an explicit detector. First candidate that strictly decodes
/// and passes validation wins; no further candidates are tried.
pub fn resolve_with_sniffer(
    raw: &[u8],
    marker: &str,
    sniffer: &dyn EncodingSniffer,
) -> Result<ResolvedEncoding, EncodingError> {
    if raw.is_empty() {
        return Err(EncodingError::EmptyInput);
    }

    let guess = sniffer.sniff(raw);
    let candidates = CandidateList::build(guess.as_ref());

    let mut tried = 0usize;
    for label in candidates.labels() {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            log::debug!("skipping unsupported encoding label: {}", label);
            continue;
        };
        tried += 1;

        let Some(text) = strict_decode(encoding, raw) else {
            continue;
        };
        if text.contains(marker) && cjk_char_count(&text) >= MIN_CJK_CHARS {
            log::debug!(
                "resolved {} byte input as {} (candidate #{})",
                raw.len(),
                encoding.name(),
                tried
            );
            return Ok(ResolvedEncoding {
                label: label.clone(),
                encoding,
                text,
            });
        }
    }

    Err(EncodingError::Unresolvable { tried })
}

/// Decode without substituting replacement characters: any byte sequence
/// invalid for the encoding fails the whole attempt.
fn strict_decode(encoding: &'static Encoding, raw: &[u8]) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(raw);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Count code points in the CJK Unified Ideographs block (U+4E00..=U+9FFF).
pub fn cjk_char_count(text: &str) -> usize {
    text.chars()
        .filter(|c| ('\u{4e00}'..='\u{9fff}').contains(c))
        .count()
}
