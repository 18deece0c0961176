//! Brand identity extraction from the homepage.
//!
//! Name comes from `og:site_name` or the `<title>` (with " | Shop" style
//! decorations stripped); description from the standard meta tags. When no
//! meta description exists, the largest homepage text block is kept as raw
//! about-text for the structuring fallback to condense.

use super::html::{extract_title, find_meta_content, main_region, strip_chrome, text_blocks};

/// Homepage text used as LLM input is capped to keep prompts bounded.
const MAX_ABOUT_TEXT_LEN: usize = 2000;

/// Raw brand signals mined from the homepage. `about_text` is only set when
/// the metas gave no description and prose was available to structure.
#[derive(Debug, Clone, Default)]
pub struct BrandCandidate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub about_text: Option<String>,
}

/// Extracts brand signals from the homepage HTML.
#[must_use]
pub fn extract_brand(homepage_html: &str) -> BrandCandidate {
    let name = find_meta_content(homepage_html, "property", "og:site_name")
        .or_else(|| extract_title(homepage_html).map(|t| strip_title_decoration(&t)));

    let description = find_meta_content(homepage_html, "name", "description")
        .or_else(|| find_meta_content(homepage_html, "property", "og:description"));

    let about_text = if description.is_none() {
        largest_text_block(homepage_html)
    } else {
        None
    };

    BrandCandidate {
        name,
        description,
        about_text,
    }
}

/// Drops trailing taglines from a title: `"Cann | Social Tonics"` → `"Cann"`.
fn strip_title_decoration(title: &str) -> String {
    for sep in [" | ", " — ", " – ", " - ", " · "] {
        if let Some((head, _)) = title.split_once(sep) {
            let head = head.trim();
            if !head.is_empty() {
                return head.to_owned();
            }
        }
    }
    title.trim().to_owned()
}

fn largest_text_block(html: &str) -> Option<String> {
    let content = strip_chrome(html);
    let blocks = text_blocks(main_region(&content));
    let mut largest = blocks.into_iter().max_by_key(String::len)?;
    if largest.trim().is_empty() {
        return None;
    }
    if largest.len() > MAX_ABOUT_TEXT_LEN {
        largest.truncate(MAX_ABOUT_TEXT_LEN);
    }
    Some(largest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_og_site_name_over_title() {
        let html = r#"
            <meta property="og:site_name" content="Cann">
            <title>Cann | THC-infused social tonics</title>
        "#;
        let brand = extract_brand(html);
        assert_eq!(brand.name.as_deref(), Some("Cann"));
    }

    #[test]
    fn strips_title_decorations() {
        let html = "<title>Velvet Nine – Streetwear for everyone</title>";
        let brand = extract_brand(html);
        assert_eq!(brand.name.as_deref(), Some("Velvet Nine"));
    }

    #[test]
    fn reads_meta_description() {
        let html = r#"
            <title>Shop</title>
            <meta name="description" content="Small-batch candles made in Duluth.">
        "#;
        let brand = extract_brand(html);
        assert_eq!(
            brand.description.as_deref(),
            Some("Small-batch candles made in Duluth.")
        );
        assert!(brand.about_text.is_none());
    }

    #[test]
    fn captures_about_text_when_description_missing() {
        let prose = "We started making candles in a garage in 2019. ".repeat(5);
        let html = format!("<title>Shop</title><main><p>{prose}</p></main>");
        let brand = extract_brand(&html);
        assert!(brand.description.is_none());
        assert!(brand.about_text.unwrap().contains("garage"));
    }

    #[test]
    fn empty_homepage_yields_empty_candidate() {
        let brand = extract_brand("<html><head></head><body></body></html>");
        assert!(brand.name.is_none());
        assert!(brand.description.is_none());
        assert!(brand.about_text.is_none());
    }
}
