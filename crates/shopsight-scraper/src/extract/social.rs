//! Social handle extraction from anchor hrefs.
//!
//! Only known platform domains are considered; the handle is the first
//! meaningful path segment. Share/intent URLs (`facebook.com/sharer`,
//! `twitter.com/intent`) are link-out widgets, not the store's own profile,
//! and are skipped. The first profile found per platform wins.

use std::collections::BTreeMap;

use shopsight_core::SocialPlatform;

use super::html::scan_anchors;

/// Path segments that mark share widgets rather than profiles.
const SHARE_SEGMENTS: [&str; 5] = ["sharer", "share", "intent", "pin/create", "hashtag"];

/// Extracts one handle per recognized platform from all anchors on a page.
#[must_use]
pub fn extract_social_handles(page_html: &str) -> BTreeMap<SocialPlatform, String> {
    let mut handles = BTreeMap::new();
    for anchor in scan_anchors(page_html) {
        let Some((platform, handle)) = classify(&anchor.href) else {
            continue;
        };
        handles.entry(platform).or_insert(handle);
    }
    handles
}

fn classify(href: &str) -> Option<(SocialPlatform, String)> {
    let url = reqwest::Url::parse(href).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").to_ascii_lowercase();
    let path = url.path();

    if SHARE_SEGMENTS.iter().any(|s| path.contains(s)) {
        return None;
    }

    let platform = match host.as_str() {
        "instagram.com" => SocialPlatform::Instagram,
        "facebook.com" | "fb.com" => SocialPlatform::Facebook,
        "tiktok.com" => SocialPlatform::Tiktok,
        "twitter.com" | "x.com" => SocialPlatform::Twitter,
        "youtube.com" | "youtu.be" => SocialPlatform::Youtube,
        "pinterest.com" => SocialPlatform::Pinterest,
        "linkedin.com" => SocialPlatform::Linkedin,
        _ => return None,
    };

    let handle = extract_handle(platform, path)?;
    Some((platform, handle))
}

/// Pulls the profile handle out of the path for each platform's URL shape.
fn extract_handle(platform: SocialPlatform, path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;

    let handle = match platform {
        // tiktok.com/@handle; youtube also supports /@handle
        SocialPlatform::Tiktok => first.strip_prefix('@')?,
        SocialPlatform::Youtube => match first {
            // youtube.com/c/Name, /channel/ID, /user/Name
            "c" | "channel" | "user" => segments.next()?,
            other => other.strip_prefix('@').unwrap_or(other),
        },
        // linkedin.com/company/name or /in/name
        SocialPlatform::Linkedin => match first {
            "company" | "in" | "school" => segments.next()?,
            _ => return None,
        },
        _ => first.strip_prefix('@').unwrap_or(first),
    };

    if handle.is_empty() {
        None
    } else {
        Some(handle.to_owned())
    }
}
