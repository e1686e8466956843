//! Content fingerprints for page snapshots.
//!
//! A signature covers a reduced projection of the page (URL, title,
//! language, word count, the first headings and a content prefix), so small
//! changes outside that projection still hit the cache.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;
use crate::normalize::normalize_url;
use crate::page::{PageSnapshot, slice_text};

const SIGNATURE_HEADINGS: usize = 10;
const HEADING_TEXT_CHARS: usize = 80;
const CONTENT_PREVIEW_CHARS: usize = 800;
const FALLBACK_PREFIX: &str = "fallback-";

/// How signatures are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureStrategy {
    /// SHA-256 over the canonical form.
    #[default]
    Sha256,
    /// 32-bit rolling hash; collision-prone, kept for stores written by
    /// runtimes without a digest primitive.
    Fallback,
}

/// A page fingerprint.
///
/// `Display` renders the string stored in history entries: lowercase hex
/// for SHA-256, `fallback-<n>` for the rolling hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Sha256(String),
    Fallback(u32),
}

impl Signature {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Signature::Fallback(_))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::Sha256(hex) => f.write_str(hex),
            Signature::Fallback(hash) => write!(f, "{FALLBACK_PREFIX}{hash}"),
        }
    }
}

/// Field order here is the canonical serialization order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalPage<'a> {
    url: &'a str,
    title: &'a str,
    language: &'a str,
    word_count: u64,
    headings: Vec<CanonicalHeading>,
    content_preview: String,
}

#[derive(Serialize)]
struct CanonicalHeading {
    level: u8,
    text: String,
}

/// Serialize the reduced projection of `page` that signatures cover.
///
/// `normalized_url` wins over the snapshot's own URL when it is non-empty.
pub fn canonical_form(page: &PageSnapshot, normalized_url: &str) -> Result<String, Error> {
    let fallback_url;
    let url = if normalized_url.is_empty() {
        fallback_url = normalize_url(&page.url);
        fallback_url.as_str()
    } else {
        normalized_url
    };

    let canonical = CanonicalPage {
        url,
        title: &page.title,
        language: &page.language,
        word_count: page.total_words(),
        headings: page
            .headings
            .iter()
            .take(SIGNATURE_HEADINGS)
            .map(|h| CanonicalHeading { level: h.level, text: slice_text(&h.text, HEADING_TEXT_CHARS) })
            .collect(),
        content_preview: slice_text(&page.content, CONTENT_PREVIEW_CHARS),
    };

    Ok(serde_json::to_string(&canonical)?)
}

/// Compute the signature of `page` with the given strategy.
pub fn compute_signature(
    page: &PageSnapshot, normalized_url: &str, strategy: SignatureStrategy,
) -> Result<Signature, Error> {
    let payload = canonical_form(page, normalized_url)?;
    Ok(match strategy {
        SignatureStrategy::Sha256 => Signature::Sha256(hex::encode(Sha256::digest(payload.as_bytes()))),
        SignatureStrategy::Fallback => Signature::Fallback(rolling_hash(&payload)),
    })
}

/// `hash = hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits.
fn rolling_hash(text: &str) -> u32 {
    let hash = text
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}
