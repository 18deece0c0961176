//! Policy body extraction.
//!
//! Policy pages are prose-heavy, so the heuristic is simple: strip the
//! chrome, prefer the `<main>` region, and take the largest contiguous run
//! of text blocks. A dominant block is high confidence; a page with only
//! scattered short text degrades to a raw-text candidate.

use super::html::{main_region, strip_chrome, text_blocks};
use super::{Confidence, RawCandidate};

/// Minimum length for a block run to count as a structural match.
pub const MIN_POLICY_BLOCK_LEN: usize = 200;

/// Extracts the policy body from a fetched page.
///
/// Returns `None` when the page has no usable text at all.
#[must_use]
pub fn extract_policy_text(page_html: &str) -> Option<RawCandidate> {
    let content = strip_chrome(page_html);
    let region = main_region(&content);
    let blocks = text_blocks(region);

    let largest = blocks.iter().max_by_key(|b| b.len())?.clone();
    if largest.len() >= MIN_POLICY_BLOCK_LEN {
        return Some(RawCandidate {
            text: largest,
            confidence: Confidence::Structural,
        });
    }

    // No dominant block: hand the whole (small) page text to the caller as a
    // low-confidence candidate.
    let all = blocks.join("\n");
    if all.trim().is_empty() {
        return None;
    }
    Some(RawCandidate {
        text: all,
        confidence: Confidence::RawFallback,
    })
}
