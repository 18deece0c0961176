//! Catalog and pages feed readers.
//!
//! The public `products.json` feed is the definitional check for "is this a
//! storefront": a first page that 404s or does not parse means the target is
//! not one, and the whole extraction aborts. Pagination is page-number based
//! (`?limit=N&page=K`) and stops on the first empty page or the configured
//! page cap. Failures on later pages truncate the read with a partial marker
//! instead of failing it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use shopsight_core::{PolicyType, ProductSummary};

use crate::client::StoreClient;
use crate::error::ExtractError;
use crate::extract::html::scan_anchors;
use crate::normalize::store_origin;

/// One page of the public products feed.
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<RawProduct>,
}

/// A product as the feed returns it. Only the fields the summary needs are
/// modeled; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct RawProduct {
    /// Shopify numeric product ID (e.g., `6789012345678`).
    pub id: i64,
    pub title: String,
    /// URL slug for the product page (e.g., `"hi-boy-blood-orange-5mg"`).
    pub handle: String,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
pub struct RawVariant {
    /// Price as a decimal string (e.g., `"30.00"`). Defaulted defensively —
    /// very old stores have been seen omitting it.
    #[serde(default)]
    pub price: Option<String>,
    /// 1-based position; `1` is the storefront-default variant.
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RawImage {
    pub src: String,
}

/// Result of a full catalog read: the products plus an optional truncation
/// reason when later pages failed or the page cap was hit.
#[derive(Debug)]
pub struct CatalogRead {
    pub products: Vec<ProductSummary>,
    pub truncated: Option<String>,
}

/// One page from the public `/pages.json` feed.
#[derive(Debug, Deserialize)]
pub struct PagesFeed {
    pub pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
pub struct RawPage {
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
}

fn products_url(store_url: &str, limit: u32, page: usize) -> String {
    let origin = store_origin(store_url);
    format!("{origin}/products.json?limit={limit}&page={page}")
}

/// Reads the full product catalog from the storefront's public feed.
///
/// # Errors
///
/// - [`ExtractError::NotAStorefront`] — first page 404s or is not a valid
///   products payload. This is the one fatal precondition of the pipeline.
/// - Any transport error from the first page after retries (the store is
///   unreachable, so nothing downstream can proceed either).
pub async fn read_catalog(
    client: &StoreClient,
    store_url: &str,
    page_limit: u32,
    max_pages: usize,
) -> Result<CatalogRead, ExtractError> {
    let origin = store_origin(store_url);
    let mut products: Vec<ProductSummary> = Vec::new();
    let mut page = 1usize;

    loop {
        if page > max_pages {
            tracing::warn!(store_url, max_pages, "catalog page cap reached, truncating");
            return Ok(CatalogRead {
                products,
                truncated: Some(format!("page cap of {max_pages} reached")),
            });
        }

        let url = products_url(store_url, page_limit, page);
        let fetched = client
            .fetch_json::<ProductsPage>(&url, "products feed page")
            .await;

        let parsed = match fetched {
            Ok(parsed) => parsed,
            // First-page classification: a missing or malformed feed means
            // the target is not a storefront at all.
            Err(ExtractError::NotFound { .. } | ExtractError::Deserialize { .. }) if page == 1 => {
                return Err(ExtractError::NotAStorefront { url });
            }
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                tracing::warn!(page, error = %e, "catalog page fetch failed, truncating read");
                return Ok(CatalogRead {
                    products,
                    truncated: Some(format!("page {page} failed: {e}")),
                });
            }
        };

        if parsed.products.is_empty() {
            return Ok(CatalogRead {
                products,
                truncated: None,
            });
        }

        products.extend(parsed.products.into_iter().map(|p| summarize(p, &origin)));
        page += 1;
    }
}

/// Maps a raw feed product to its report summary. Price comes from the
/// storefront-default variant (position 1, falling back to the first).
fn summarize(product: RawProduct, origin: &str) -> ProductSummary {
    let default_variant = product
        .variants
        .iter()
        .find(|v| v.position == Some(1))
        .or_else(|| product.variants.first());

    ProductSummary {
        id: product.id.to_string(),
        title: product.title,
        price: default_variant.and_then(|v| v.price.clone()),
        image_url: product.images.first().map(|i| i.src.clone()),
        product_url: format!("{origin}/products/{}", product.handle),
    }
}

/// Fetches the storefront's public `/pages.json` feed.
///
/// Stores expose their static pages (policies, about, FAQ) here more often
/// than not, which gives policy extraction a clean pre-rendered source before
/// any crawling happens. Absence of the feed is not an error.
///
/// # Errors
///
/// Propagates transport errors other than 404; callers treat any error as
/// "feed unavailable" and fall back to page discovery.
pub async fn read_pages_feed(
    client: &StoreClient,
    store_url: &str,
) -> Result<Vec<RawPage>, ExtractError> {
    let origin = store_origin(store_url);
    let url = format!("{origin}/pages.json");
    let feed = client.fetch_json::<PagesFeed>(&url, "pages feed").await?;
    Ok(feed.pages)
}

/// Classifies a page handle into a policy type, if it names one.
///
/// Order matters: `"shipping-returns"` must classify as shipping, so the
/// longer/more specific patterns are checked before bare substrings.
#[must_use]
pub fn policy_type_for_handle(handle: &str) -> Option<PolicyType> {
    let h = handle.to_ascii_lowercase();
    if h.contains("privacy") {
        Some(PolicyType::Privacy)
    } else if h.contains("refund") {
        Some(PolicyType::Refund)
    } else if h.contains("shipping") {
        Some(PolicyType::Shipping)
    } else if h.contains("return") {
        Some(PolicyType::Return)
    } else if h.contains("terms") {
        Some(PolicyType::Terms)
    } else {
        None
    }
}

static PRODUCT_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/products/([A-Za-z0-9_-]+)").expect("valid product path regex"));

/// Computes the hero set: catalog products also linked from the homepage,
/// in homepage document order, deduplicated by handle.
#[must_use]
pub fn detect_hero_products(
    homepage_html: &str,
    catalog: &[ProductSummary],
) -> Vec<ProductSummary> {
    let by_handle: BTreeMap<&str, &ProductSummary> = catalog
        .iter()
        .filter_map(|p| {
            PRODUCT_PATH_RE
                .captures(&p.product_url)
                .and_then(|cap| cap.get(1))
                .map(|m| (m.as_str(), p))
        })
        .collect();

    let mut seen: Vec<String> = Vec::new();
    let mut heroes = Vec::new();
    for anchor in scan_anchors(homepage_html) {
        let Some(handle) = PRODUCT_PATH_RE
            .captures(&anchor.href)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };
        if seen.iter().any(|s| s == handle) {
            continue;
        }
        seen.push(handle.to_owned());
        if let Some(product) = by_handle.get(handle) {
            heroes.push((*product).clone());
        }
    }
    heroes
}
