//! Per-category content extraction from fetched pages.
//!
//! Every extractor is a pure function of the page HTML. Extractors report a
//! confidence: [`Confidence::Structural`] when a recognized markup pattern
//! matched, [`Confidence::RawFallback`] when only undifferentiated page text
//! was available. The structuring fallback (LLM) is invoked for low-confidence
//! candidates only.

pub mod brand;
pub mod contact;
pub mod faq;
pub(crate) mod html;
pub mod links;
pub mod policy;
pub mod social;

/// Whether an extraction came from a recognized structural pattern or from
/// a raw-text fallback that still needs structuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Structural,
    RawFallback,
}

/// Candidate text pulled from a page for one target field.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub text: String,
    pub confidence: Confidence,
}
