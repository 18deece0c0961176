//! Important-link extraction.
//!
//! Matches homepage/footer anchors into the fixed [`LinkCategory`] set by
//! anchor-text keywords and href segments. The first match per category in
//! document order wins — storefronts repeat the same links in the header and
//! footer, and the earlier one is invariably the canonical navigation entry.

use std::collections::BTreeMap;

use shopsight_core::LinkCategory;

use crate::normalize::absolutize;

use super::html::scan_anchors;

fn category_patterns(category: LinkCategory) -> (&'static [&'static str], &'static [&'static str]) {
    match category {
        LinkCategory::OrderTracking => (
            &["track your order", "track order", "order status", "tracking"],
            &["track", "order-status"],
        ),
        LinkCategory::ContactUs => (&["contact us", "contact", "get in touch"], &["/contact"]),
        LinkCategory::Blog => (&["blog", "journal", "stories", "news"], &["/blogs/", "/blog"]),
        LinkCategory::SizeGuide => (
            &["size guide", "size chart", "sizing", "fit guide"],
            &["size-guide", "size-chart", "sizing"],
        ),
        LinkCategory::Help => (&["help center", "help", "faq", "support"], &["/help", "/faq", "/support"]),
        LinkCategory::Shipping => (&["shipping", "delivery"], &["shipping"]),
    }
}

/// Extracts one absolute URL per matched link category.
#[must_use]
pub fn extract_important_links(
    page_html: &str,
    base_url: &str,
) -> BTreeMap<LinkCategory, String> {
    let anchors = scan_anchors(page_html);
    let mut links = BTreeMap::new();

    for category in LinkCategory::ALL {
        let (keywords, segments) = category_patterns(category);
        for anchor in &anchors {
            let text = anchor.text.to_ascii_lowercase();
            let href = anchor.href.to_ascii_lowercase();
            let hit = keywords.iter().any(|k| text.contains(k))
                || segments.iter().any(|s| href.contains(s));
            if !hit {
                continue;
            }
            if let Some(url) = absolutize(base_url, &anchor.href) {
                links.insert(category, url);
                break;
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.test";

    #[test]
    fn categorizes_common_footer_links() {
        let html = r#"
            <footer>
              <a href="/apps/track">Track your order</a>
              <a href="/pages/contact-us">Contact</a>
              <a href="/blogs/news">Journal</a>
              <a href="/pages/size-guide">Size guide</a>
            </footer>
        "#;
        let links = extract_important_links(html, BASE);
        assert_eq!(links[&LinkCategory::OrderTracking], "https://shop.test/apps/track");
        assert_eq!(links[&LinkCategory::ContactUs], "https://shop.test/pages/contact-us");
        assert_eq!(links[&LinkCategory::Blog], "https://shop.test/blogs/news");
        assert_eq!(links[&LinkCategory::SizeGuide], "https://shop.test/pages/size-guide");
    }

    #[test]
    fn first_match_in_document_order_wins() {
        let html = r#"
            <a href="/pages/contact">Contact us</a>
            <a href="/pages/contact-alt">Contact us</a>
        "#;
        let links = extract_important_links(html, BASE);
        assert_eq!(links[&LinkCategory::ContactUs], "https://shop.test/pages/contact");
    }

    #[test]
    fn unmatched_categories_are_absent() {
        let html = r#"<a href="/collections/all">Shop all</a>"#;
        let links = extract_important_links(html, BASE);
        assert!(links.is_empty());
    }
}
