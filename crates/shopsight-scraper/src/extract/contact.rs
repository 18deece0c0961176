//! Email and phone extraction.
//!
//! Scans both the flattened page text and `mailto:`/`tel:` hrefs. Emails are
//! lower-cased and deduplicated; phones are normalized to digits with an
//! optional leading `+` and bounded to plausible lengths. Asset filenames
//! that happen to match the email shape (`logo@2x.png`) are filtered out.

use std::sync::LazyLock;

use regex::Regex;
use shopsight_core::ContactInfo;

use super::html::{scan_anchors, strip_tags};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

/// Requires separator structure so bare digit runs (order numbers, years)
/// do not match. `tel:` hrefs skip this gate entirely.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d{1,4}\)?[\s.\-]\(?\d{2,4}\)?[\s.\-]\d{3,4}(?:[\s.\-]\d{2,4})?")
        .expect("valid phone regex")
});

const ASSET_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// Extracts deduplicated contact details from a fetched page.
#[must_use]
pub fn extract_contact_info(page_html: &str) -> ContactInfo {
    let mut info = ContactInfo::default();
    let text = strip_tags(page_html);

    for m in EMAIL_RE.find_iter(&text) {
        push_email(&mut info, m.as_str());
    }

    for m in PHONE_RE.find_iter(&text) {
        if let Some(phone) = normalize_phone(m.as_str()) {
            info.phones.insert(phone);
        }
    }

    for anchor in scan_anchors(page_html) {
        if let Some(addr) = anchor.href.strip_prefix("mailto:") {
            // Strip mailto query parts like ?subject=...
            let addr = addr.split('?').next().unwrap_or(addr);
            push_email(&mut info, addr);
        } else if let Some(number) = anchor.href.strip_prefix("tel:") {
            if let Some(phone) = normalize_phone(number) {
                info.phones.insert(phone);
            }
        }
    }

    info
}

fn push_email(info: &mut ContactInfo, raw: &str) {
    let email = raw.trim().to_ascii_lowercase();
    if email.is_empty() || ASSET_SUFFIXES.iter().any(|s| email.ends_with(s)) {
        return;
    }
    info.emails.insert(email);
}

/// Normalizes a phone candidate to digits with an optional leading `+`.
/// Rejects anything outside 7–15 digits (the E.164 bounds).
fn normalize_phone(raw: &str) -> Option<String> {
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(7..=15).contains(&digits.len()) {
        return None;
    }
    Some(if has_plus {
        format!("+{digits}")
    } else {
        digits
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_lowercases_emails() {
        let html = "<p>Write to Support@Shop.COM or press@shop.com for help.</p>";
        let info = extract_contact_info(html);
        assert!(info.emails.contains("support@shop.com"));
        assert!(info.emails.contains("press@shop.com"));
        assert_eq!(info.emails.len(), 2);
    }

    #[test]
    fn dedupes_case_variants() {
        let html = "<p>hi@shop.com and HI@SHOP.COM</p>";
        let info = extract_contact_info(html);
        assert_eq!(info.emails.len(), 1);
    }

    #[test]
    fn skips_asset_filenames() {
        let html = "<p>logo@2x.png looks like an address but is not one</p>";
        let info = extract_contact_info(html);
        assert!(info.emails.is_empty());
    }

    #[test]
    fn reads_mailto_and_tel_hrefs() {
        let html = r#"<a href="mailto:care@shop.com?subject=Hi">Email</a>
                      <a href="tel:+1-555-867-5309">Call</a>"#;
        let info = extract_contact_info(html);
        assert!(info.emails.contains("care@shop.com"));
        assert!(info.phones.contains("+15558675309"));
    }

    #[test]
    fn normalizes_formatted_phone_from_text() {
        let html = "<p>Call us: (555) 867-5309 weekdays.</p>";
        let info = extract_contact_info(html);
        assert!(info.phones.contains("5558675309"), "got {:?}", info.phones);
    }

    #[test]
    fn rejects_short_and_long_digit_runs() {
        assert!(normalize_phone("12-34").is_none());
        assert!(normalize_phone("+1234 5678 9012 3456 78").is_none());
        assert_eq!(normalize_phone("555 867 5309").as_deref(), Some("5558675309"));
    }

    #[test]
    fn empty_page_yields_empty_info() {
        let info = extract_contact_info("<html><body><p>No contacts here.</p></body></html>");
        assert!(info.is_empty());
    }
}
