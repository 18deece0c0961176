//! Canonicalization of raw storefront URLs.
//!
//! Storefront URLs arrive in every shape users type them: bare domains,
//! mixed-case hosts, tracking-tagged campaign links, trailing slashes. All of
//! them must normalize to one canonical form so catalog URLs, discovered page
//! URLs, and hero-product URLs compare equal. Normalization is idempotent:
//! `normalize(normalize(u)) == normalize(u)`.

use crate::error::ExtractError;

/// Query parameters that carry campaign/tracking state and never affect
/// which storefront is being addressed.
const TRACKING_PARAMS: [&str; 6] = ["gclid", "fbclid", "ref", "mc_cid", "mc_eid", "igshid"];

/// Validates and canonicalizes a raw storefront URL.
///
/// - forces `https` when no scheme is present (an explicit `http` is kept);
/// - lower-cases scheme and host;
/// - drops the fragment, default ports, trailing slashes, and tracking
///   query parameters (`utm_*`, `gclid`, `fbclid`, `ref`, ...);
/// - keeps all other query parameters.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidUrl`] for empty input, unparseable URLs,
/// non-http(s) schemes, and hosts without a dot.
pub fn normalize_store_url(raw: &str) -> Result<String, ExtractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::InvalidUrl {
            url: raw.to_owned(),
            reason: "URL is empty".to_owned(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = reqwest::Url::parse(&with_scheme).map_err(|e| ExtractError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ExtractError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme {scheme:?}"),
        });
    }

    let Some(host) = url.host_str() else {
        return Err(ExtractError::InvalidUrl {
            url: raw.to_owned(),
            reason: "URL has no host".to_owned(),
        });
    };
    if !host.contains('.') {
        return Err(ExtractError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("host {host:?} is not a domain"),
        });
    }

    // Url already lower-cases scheme and host during parsing; assemble the
    // canonical string by hand so a bare origin carries no trailing slash.
    let mut canonical = format!("{scheme}://{host}");
    if let Some(port) = url.port() {
        // Url::port() is None for the scheme default, so anything here is
        // a genuinely non-default port and must be kept.
        canonical.push_str(&format!(":{port}"));
    }

    let path = url.path().trim_end_matches('/');
    canonical.push_str(path);

    // Filter the raw query text rather than the decoded pairs: kept pairs
    // stay byte-for-byte intact, so percent-encoded values survive and the
    // result stays idempotent.
    let kept: Vec<&str> = url
        .query()
        .map(|q| {
            q.split('&')
                .filter(|pair| {
                    let key = pair.split('=').next().unwrap_or(pair);
                    !pair.is_empty() && !is_tracking_param(key)
                })
                .collect()
        })
        .unwrap_or_default();
    if !kept.is_empty() {
        canonical.push('?');
        canonical.push_str(&kept.join("&"));
    }

    Ok(canonical)
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

/// Extracts the scheme+host origin from a normalized store URL.
///
/// Given `"https://shop.com/collections/all"`, returns `"https://shop.com"`.
/// Feed endpoints are always fetched from the store root, regardless of
/// whether the input URL carried a collection path.
pub(crate) fn store_origin(store_url: &str) -> String {
    reqwest::Url::parse(store_url).map_or_else(
        |_| {
            // fallback: take "https://host" by splitting on '/' and taking first 3 parts
            store_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a store URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn store_domain(store_url: &str) -> String {
    let without_scheme = store_url
        .strip_prefix("https://")
        .or_else(|| store_url.strip_prefix("http://"))
        .unwrap_or(store_url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(store_url)
        .to_owned()
}

/// Resolves an href against a base URL and returns an absolute http(s) URL.
///
/// Returns `None` for fragments, `mailto:`/`tel:`/`javascript:` links, and
/// anything that fails to resolve.
pub(crate) fn absolutize(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }
    let base = reqwest::Url::parse(base_url).ok()?;
    let resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    Some(resolved.to_string())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
