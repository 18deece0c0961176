//! FAQ extraction.
//!
//! Three structural passes run in order of markup specificity: definition
//! lists, `<details>`/`<summary>` accordions, then "?"-ended headings paired
//! with the text that follows them. The first pass producing at least
//! [`MIN_FAQ_PAIRS`] pairs wins. When none does, the page text is returned
//! as an unstructured candidate for the structuring fallback. Extraction is
//! a pure function of the input HTML.

use std::sync::LazyLock;

use regex::Regex;
use shopsight_core::FaqEntry;

use super::html::{clean_text, html_to_text, main_region, strip_chrome, strip_tags};

/// Minimum pair count for a structural pass to be trusted.
pub const MIN_FAQ_PAIRS: usize = 2;

static DL_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<dt[^>]*>(.*?)</dt>\s*<dd[^>]*>(.*?)</dd>").expect("valid dl regex")
});
static DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<details[^>]*>\s*<summary[^>]*>(.*?)</summary>(.*?)</details>")
        .expect("valid details regex")
});
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").expect("valid heading regex")
});

/// Outcome of the heuristic FAQ pass over one page.
#[derive(Debug, Clone)]
pub enum FaqOutcome {
    /// A structural pattern matched with enough pairs.
    Structured(Vec<FaqEntry>),
    /// No structural pattern matched; the flattened page text is a
    /// low-confidence candidate for the structuring fallback.
    RawText(String),
}

/// Extracts FAQ entries from a fetched page.
#[must_use]
pub fn extract_faqs(page_html: &str) -> FaqOutcome {
    let content = strip_chrome(page_html);

    for pass in [definition_list_pairs, accordion_pairs, heading_pairs] {
        let pairs = pass(&content);
        if pairs.len() >= MIN_FAQ_PAIRS {
            return FaqOutcome::Structured(pairs);
        }
    }

    FaqOutcome::RawText(html_to_text(main_region(&content)))
}

fn definition_list_pairs(html: &str) -> Vec<FaqEntry> {
    DL_PAIR_RE
        .captures_iter(html)
        .filter_map(|cap| entry(&cap[1], &cap[2]))
        .collect()
}

fn accordion_pairs(html: &str) -> Vec<FaqEntry> {
    DETAILS_RE
        .captures_iter(html)
        .filter_map(|cap| entry(&cap[1], &cap[2]))
        .collect()
}

/// Pairs a "?"-ended heading with the text between it and the next heading.
fn heading_pairs(html: &str) -> Vec<FaqEntry> {
    let matches: Vec<_> = HEADING_RE.captures_iter(html).collect();
    let mut pairs = Vec::new();

    for (idx, cap) in matches.iter().enumerate() {
        let question = clean_text(&strip_tags(&cap[1]));
        if !question.ends_with('?') {
            continue;
        }
        let body_start = cap.get(0).map_or(0, |m| m.end());
        let body_end = matches
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(html.len(), |m| m.start());
        let answer = clean_text(&html_to_text(&html[body_start..body_end]));
        if answer.is_empty() {
            continue;
        }
        pairs.push(FaqEntry { question, answer });
    }

    pairs
}

fn entry(raw_question: &str, raw_answer: &str) -> Option<FaqEntry> {
    let question = clean_text(&strip_tags(raw_question));
    let answer = clean_text(&html_to_text(raw_answer));
    if question.is_empty() || answer.is_empty() {
        return None;
    }
    Some(FaqEntry { question, answer })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(outcome: FaqOutcome) -> Vec<FaqEntry> {
        match outcome {
            FaqOutcome::Structured(entries) => entries,
            FaqOutcome::RawText(text) => panic!("expected structured FAQs, got raw text: {text:?}"),
        }
    }

    #[test]
    fn extracts_definition_list_pairs_in_order() {
        let html = r"
            <main><dl>
              <dt>Do you ship internationally?</dt><dd>Yes, to 40 countries.</dd>
              <dt>How long do returns take?</dt><dd><p>About 7 days.</p></dd>
              <dt>Is gift wrap available?</dt><dd>At checkout.</dd>
              <dt>Can I change my order?</dt><dd>Within 2 hours.</dd>
            </dl></main>
        ";
        let entries = structured(extract_faqs(html));
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].question, "Do you ship internationally?");
        assert_eq!(entries[0].answer, "Yes, to 40 countries.");
        assert_eq!(entries[1].answer, "About 7 days.");
    }

    #[test]
    fn extracts_accordion_pairs() {
        let html = r"
            <details><summary>Where is my order?</summary><p>Check your tracking email.</p></details>
            <details><summary>Do you restock?</summary><div>Every month.</div></details>
        ";
        let entries = structured(extract_faqs(html));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].question, "Do you restock?");
        assert_eq!(entries[1].answer, "Every month.");
    }

    #[test]
    fn extracts_question_headings_with_following_text() {
        let html = r"
            <h3>What sizes do you carry?</h3><p>XS through 4XL.</p>
            <h3>Our mission</h3><p>Not a question, skipped.</p>
            <h3>Do you offer student discounts?</h3><p>Yes, 10% with a valid ID.</p>
        ";
        let entries = structured(extract_faqs(html));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "What sizes do you carry?");
        assert_eq!(entries[0].answer, "XS through 4XL.");
        assert_eq!(entries[1].answer, "Yes, 10% with a valid ID.");
    }

    #[test]
    fn repeated_question_phrasing_is_kept() {
        let html = r"
            <dl>
              <dt>Do you ship?</dt><dd>Domestically.</dd>
              <dt>Do you ship?</dt><dd>Also internationally.</dd>
            </dl>
        ";
        let entries = structured(extract_faqs(html));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, entries[1].question);
    }

    #[test]
    fn single_pair_falls_back_to_raw_text() {
        let html = "<main><dt>Only one?</dt><dd>Not enough.</dd>How do refunds work? Contact support.</main>";
        match extract_faqs(html) {
            FaqOutcome::RawText(text) => assert!(text.contains("refunds")),
            FaqOutcome::Structured(entries) => panic!("expected raw text, got {entries:?}"),
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let html = r"
            <details><summary>A?</summary>One.</details>
            <details><summary>B?</summary>Two.</details>
        ";
        let first = structured(extract_faqs(html));
        let second = structured(extract_faqs(html));
        assert_eq!(first, second);
    }
}
