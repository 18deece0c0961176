//! Candidate-page discovery.
//!
//! Storefront themes disagree about where policy/FAQ/contact pages live, so
//! discovery scores every homepage anchor against category-specific keyword
//! and path-segment sets and returns candidates best-first. A fixed list of
//! well-known paths is appended after the scored candidates, which keeps
//! discovery useful even when the homepage itself could not be fetched.

use shopsight_core::PolicyType;

use crate::extract::html::scan_anchors;
use crate::normalize::{absolutize, store_origin};

/// Categories of sub-pages the pipeline goes looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCategory {
    Policy(PolicyType),
    Faq,
    Contact,
}

impl std::fmt::Display for PageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageCategory::Policy(kind) => write!(f, "{kind} policy"),
            PageCategory::Faq => write!(f, "faq"),
            PageCategory::Contact => write!(f, "contact"),
        }
    }
}

/// Keyword set matched against anchor text (weight 2 per hit) and path
/// segment set matched against the href (weight 3 per hit).
fn category_patterns(category: PageCategory) -> (&'static [&'static str], &'static [&'static str]) {
    match category {
        PageCategory::Policy(PolicyType::Privacy) => (
            &["privacy policy", "privacy"],
            &["/policies/privacy-policy", "/pages/privacy", "/privacy"],
        ),
        PageCategory::Policy(PolicyType::Return) => (
            &["return policy", "returns", "exchanges"],
            &["/policies/return-policy", "/pages/return", "/returns", "/return-policy"],
        ),
        PageCategory::Policy(PolicyType::Refund) => (
            &["refund policy", "refunds"],
            &["/policies/refund-policy", "/pages/refund", "/refunds", "/refund-policy"],
        ),
        PageCategory::Policy(PolicyType::Shipping) => (
            &["shipping policy", "shipping", "delivery"],
            &["/policies/shipping-policy", "/pages/shipping", "/shipping"],
        ),
        PageCategory::Policy(PolicyType::Terms) => (
            &["terms of service", "terms & conditions", "terms"],
            &["/policies/terms-of-service", "/pages/terms", "/terms"],
        ),
        PageCategory::Faq => (
            &["frequently asked", "faqs", "faq", "help center", "help", "support"],
            &["/pages/faq", "/pages/help", "/pages/support", "/faq", "/help"],
        ),
        PageCategory::Contact => (
            &["contact us", "contact", "get in touch", "reach us"],
            &["/pages/contact", "/contact"],
        ),
    }
}

/// Well-known paths tried when nothing on the homepage scored — or when the
/// homepage was unreachable entirely. Ordered most- to least-conventional.
#[must_use]
pub fn well_known_paths(base_url: &str, category: PageCategory) -> Vec<String> {
    let origin = store_origin(base_url);
    let paths: &[&str] = match category {
        PageCategory::Policy(PolicyType::Privacy) => {
            &["/policies/privacy-policy", "/pages/privacy-policy", "/pages/privacy"]
        }
        PageCategory::Policy(PolicyType::Return) => {
            &["/policies/refund-policy", "/pages/return-policy", "/pages/returns"]
        }
        PageCategory::Policy(PolicyType::Refund) => {
            &["/policies/refund-policy", "/pages/refund-policy", "/pages/refunds"]
        }
        PageCategory::Policy(PolicyType::Shipping) => {
            &["/policies/shipping-policy", "/pages/shipping-policy", "/pages/shipping"]
        }
        PageCategory::Policy(PolicyType::Terms) => {
            &["/policies/terms-of-service", "/pages/terms-of-service", "/pages/terms"]
        }
        PageCategory::Faq => &["/pages/faq", "/pages/faqs", "/pages/help", "/pages/support"],
        PageCategory::Contact => &["/pages/contact", "/pages/contact-us", "/contact"],
    };
    paths.iter().map(|p| format!("{origin}{p}")).collect()
}

/// Discovers candidate URLs for `category`, best-scoring first, ties in
/// document order, deduplicated. No match yields an empty vec, not an error.
#[must_use]
pub fn discover_pages(homepage_html: &str, base_url: &str, category: PageCategory) -> Vec<String> {
    let (keywords, path_segments) = category_patterns(category);

    let mut scored: Vec<(u32, String)> = Vec::new();
    for anchor in scan_anchors(homepage_html) {
        let Some(url) = absolutize(base_url, &anchor.href) else {
            continue;
        };
        let text = anchor.text.to_ascii_lowercase();
        let href = anchor.href.to_ascii_lowercase();

        let mut score = 0u32;
        for keyword in keywords {
            if text.contains(keyword) {
                score += 2;
            }
        }
        for segment in path_segments {
            if href.contains(segment) {
                score += 3;
            }
        }

        if score > 0 && !scored.iter().any(|(_, u)| u == &url) {
            scored.push((score, url));
        }
    }

    // Stable sort keeps document order within equal scores.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, url)| url).collect()
}

/// Scored homepage candidates followed by the well-known fallback paths,
/// deduplicated. This is the candidate list the aggregator actually fetches.
#[must_use]
pub fn candidate_pages(
    homepage_html: Option<&str>,
    base_url: &str,
    category: PageCategory,
) -> Vec<String> {
    let mut candidates = homepage_html
        .map(|html| discover_pages(html, base_url, category))
        .unwrap_or_default();
    for url in well_known_paths(base_url, category) {
        if !candidates.contains(&url) {
            candidates.push(url);
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.test";

    #[test]
    fn scores_path_match_above_text_match() {
        let html = r#"
            <a href="/pages/about">Our privacy promise</a>
            <a href="/policies/privacy-policy">Privacy policy</a>
        "#;
        let found = discover_pages(html, BASE, PageCategory::Policy(PolicyType::Privacy));
        assert_eq!(found[0], "https://shop.test/policies/privacy-policy");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn ties_break_in_document_order() {
        // Both anchors score identically (one path hit, one keyword hit).
        let html = r#"
            <a href="/faq-general">FAQ</a>
            <a href="/faq-shipping">FAQ</a>
        "#;
        let found = discover_pages(html, BASE, PageCategory::Faq);
        assert_eq!(
            found,
            vec![
                "https://shop.test/faq-general".to_string(),
                "https://shop.test/faq-shipping".to_string(),
            ]
        );
    }

    #[test]
    fn no_match_yields_empty() {
        let html = r#"<a href="/collections/all">Shop all</a>"#;
        assert!(discover_pages(html, BASE, PageCategory::Contact).is_empty());
    }

    #[test]
    fn duplicate_hrefs_are_collapsed() {
        let html = r#"
            <a href="/pages/faq">FAQ</a>
            <a href="/pages/faq">FAQ (footer)</a>
        "#;
        let found = discover_pages(html, BASE, PageCategory::Faq);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn discovery_is_deterministic() {
        let html = r#"
            <a href="/pages/faq">FAQ</a>
            <a href="/help">Help</a>
            <a href="/pages/support">Support</a>
        "#;
        let first = discover_pages(html, BASE, PageCategory::Faq);
        let second = discover_pages(html, BASE, PageCategory::Faq);
        assert_eq!(first, second);
    }

    #[test]
    fn candidate_pages_appends_well_known_fallbacks() {
        let candidates = candidate_pages(None, BASE, PageCategory::Faq);
        assert_eq!(candidates[0], "https://shop.test/pages/faq");
        assert!(candidates.contains(&"https://shop.test/pages/help".to_string()));
    }

    #[test]
    fn candidate_pages_does_not_duplicate_discovered_well_known() {
        let html = r#"<a href="/pages/faq">FAQ</a>"#;
        let candidates = candidate_pages(Some(html), BASE, PageCategory::Faq);
        let faq_count = candidates
            .iter()
            .filter(|u| u.as_str() == "https://shop.test/pages/faq")
            .count();
        assert_eq!(faq_count, 1);
    }
}
