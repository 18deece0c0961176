//! Regex-based HTML mining helpers shared by the extractors.
//!
//! Storefront themes are uncontrolled, so none of this assumes well-formed
//! markup. The helpers here strip chrome regions (scripts, nav, header,
//! footer), flatten markup to text while preserving block boundaries, and
//! scan anchors/meta tags. All scanning is pure string work over the fetched
//! body — deterministic for identical input.

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("valid anchor regex")
});
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));
static BLOCK_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:p|div|li|ul|ol|h[1-6]|tr|table|dt|dd|dl|section|article|blockquote)>|<br\s*/?>")
        .expect("valid block-close regex")
});
static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*)</main>").expect("valid main regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Tag regions that never carry extractable content. `nav`/`header`/`footer`
/// are stripped for policy and FAQ bodies but NOT for anchor scanning —
/// socials and important links usually live in the footer.
const CHROME_REGIONS: [&str; 8] =
    ["script", "style", "noscript", "svg", "form", "nav", "header", "footer"];

static CHROME_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CHROME_REGIONS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}>")).expect("valid region regex"))
        .collect()
});

/// One `<a>` element: resolved-later href, flattened inner text, in document order.
#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    pub href: String,
    pub text: String,
}

/// Scans all anchors in document order. Inner markup is flattened to text.
pub(crate) fn scan_anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(html)
        .map(|cap| Anchor {
            href: cap[1].trim().to_owned(),
            text: clean_text(&strip_tags(&cap[2])),
        })
        .collect()
}

/// Removes chrome regions (scripts, styles, nav/header/footer, comments)
/// so the remaining markup is the content region of the page.
pub(crate) fn strip_chrome(html: &str) -> String {
    let mut out = COMMENT_RE.replace_all(html, " ").into_owned();
    for re in CHROME_RES.iter() {
        out = re.replace_all(&out, " ").into_owned();
    }
    out
}

/// Returns the `<main>` region when the theme marks one, otherwise the whole
/// input. Callers strip chrome first so "whole input" is already content-ish.
pub(crate) fn main_region(html: &str) -> &str {
    MAIN_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map_or(html, |m| m.as_str())
}

/// Flattens markup to plain text, preserving block boundaries as newlines.
pub(crate) fn html_to_text(html: &str) -> String {
    let with_breaks = BLOCK_CLOSE_RE.replace_all(html, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&stripped);
    decoded
        .lines()
        .map(|line| WS_RE.replace_all(line.trim(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits flattened text into contiguous block runs: groups of consecutive
/// non-empty lines, each joined with single spaces.
pub(crate) fn text_blocks(html: &str) -> Vec<String> {
    let text = html_to_text(html);
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }
    blocks
}

/// Strips all tags without preserving block structure.
pub(crate) fn strip_tags(html: &str) -> String {
    decode_entities(&TAG_RE.replace_all(html, " "))
}

/// Collapses all whitespace runs to single spaces and trims.
pub(crate) fn clean_text(text: &str) -> String {
    WS_RE.replace_all(text.trim(), " ").into_owned()
}

/// Extracts the value of a named attribute from a single tag's source.
pub(crate) fn extract_attr(tag: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"(?is){name}\s*=\s*["']([^"']*)["']"#)).ok()?;
    re.captures(tag)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

/// Finds `<meta ... {attr}="{value}" ... content="...">` and returns the
/// decoded content. Attribute order within the tag does not matter.
pub(crate) fn find_meta_content(html: &str, attr: &str, value: &str) -> Option<String> {
    for m in META_TAG_RE.find_iter(html) {
        let tag = m.as_str();
        let matches_key = extract_attr(tag, attr)
            .is_some_and(|v| v.eq_ignore_ascii_case(value));
        if !matches_key {
            continue;
        }
        if let Some(content) = extract_attr(tag, "content") {
            let cleaned = clean_text(&decode_entities(&content));
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

/// Extracts the document `<title>` text.
pub(crate) fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| clean_text(&decode_entities(m.as_str())))
        .filter(|t| !t.is_empty())
}

/// Minimal entity decoding for the handful that matter in extracted prose.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&rsquo;", "'")
        .replace("&nbsp;", " ")
}
