//! Domain model for extracted storefront intelligence.
//!
//! Everything here is assembled once per extraction and serialized as-is in
//! the final report. Every top-level field is independently optional: a store
//! with no discoverable FAQ page is a valid result, not an error. The
//! [`FieldStatusReport`] carries the per-field outcome so callers can tell
//! "absent by design" apart from "absent because extraction failed".

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single product from the storefront's public catalog feed, reduced to
/// the fields the insight report cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Shopify numeric product ID, stored as a string to avoid precision loss.
    pub id: String,
    pub title: String,
    /// Price of the storefront-default variant as a decimal string, e.g. `"24.00"`.
    pub price: Option<String>,
    /// Primary image CDN URL, if the product has one.
    pub image_url: Option<String>,
    /// Canonical product page URL, e.g. `"https://shop.com/products/hi-boy"`.
    pub product_url: String,
}

/// The full product catalog plus the hero subset.
///
/// Invariants: `total_count == catalog.len()` and every hero product appears
/// in the catalog by id. An empty catalog (`total_count == 0`) is a valid
/// successful read and is never conflated with "catalog unreachable".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub total_count: usize,
    pub catalog: Vec<ProductSummary>,
    /// Catalog products also linked from the homepage, in homepage order.
    pub hero_products: Vec<ProductSummary>,
}

impl ProductCatalog {
    /// Returns `true` if the count invariant holds and every hero product
    /// is present in the catalog by id.
    #[must_use]
    pub fn is_internally_consistent(&self) -> bool {
        if self.total_count != self.catalog.len() {
            return false;
        }
        let ids: BTreeSet<&str> = self.catalog.iter().map(|p| p.id.as_str()).collect();
        self.hero_products.iter().all(|h| ids.contains(h.id.as_str()))
    }
}

/// Brand identity derived from homepage title/meta/about text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandInfo {
    pub name: String,
    pub description: Option<String>,
    pub website_url: String,
}

/// The closed set of policy documents the pipeline looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    Privacy,
    Return,
    Refund,
    Shipping,
    Terms,
}

impl PolicyType {
    pub const ALL: [PolicyType; 5] = [
        PolicyType::Privacy,
        PolicyType::Return,
        PolicyType::Refund,
        PolicyType::Shipping,
        PolicyType::Terms,
    ];
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PolicyType::Privacy => "privacy",
            PolicyType::Return => "return",
            PolicyType::Refund => "refund",
            PolicyType::Shipping => "shipping",
            PolicyType::Terms => "terms",
        };
        write!(f, "{s}")
    }
}

/// Extracted policy text per policy type. Presence is best-effort; absence
/// is valid, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySet {
    pub privacy_policy: Option<String>,
    pub return_policy: Option<String>,
    pub refund_policy: Option<String>,
    pub shipping_policy: Option<String>,
    pub terms_of_service: Option<String>,
}

impl PolicySet {
    pub fn set(&mut self, kind: PolicyType, text: String) {
        let slot = match kind {
            PolicyType::Privacy => &mut self.privacy_policy,
            PolicyType::Return => &mut self.return_policy,
            PolicyType::Refund => &mut self.refund_policy,
            PolicyType::Shipping => &mut self.shipping_policy,
            PolicyType::Terms => &mut self.terms_of_service,
        };
        *slot = Some(text);
    }

    #[must_use]
    pub fn get(&self, kind: PolicyType) -> Option<&str> {
        match kind {
            PolicyType::Privacy => self.privacy_policy.as_deref(),
            PolicyType::Return => self.return_policy.as_deref(),
            PolicyType::Refund => self.refund_policy.as_deref(),
            PolicyType::Shipping => self.shipping_policy.as_deref(),
            PolicyType::Terms => self.terms_of_service.as_deref(),
        }
    }

    /// Number of policy slots carrying text.
    #[must_use]
    pub fn present_count(&self) -> usize {
        PolicyType::ALL.iter().filter(|k| self.get(**k).is_some()).count()
    }
}

/// One question/answer pair. Both sides are non-empty when emitted; a store
/// may repeat the same question phrasing, so entries are ordered and not
/// deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Social platforms we recognize in storefront footers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Instagram,
    Facebook,
    Tiktok,
    Twitter,
    Youtube,
    Pinterest,
    Linkedin,
}

/// Deduplicated contact details scraped from page text and `mailto:`/`tel:` links.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Lower-cased, deduplicated email addresses.
    pub emails: BTreeSet<String>,
    /// Phone numbers normalized to digits with an optional leading `+`.
    pub phones: BTreeSet<String>,
}

impl ContactInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty()
    }
}

/// Fixed categories of "important links" surfaced in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    OrderTracking,
    ContactUs,
    Blog,
    SizeGuide,
    Help,
    Shipping,
}

impl LinkCategory {
    pub const ALL: [LinkCategory; 6] = [
        LinkCategory::OrderTracking,
        LinkCategory::ContactUs,
        LinkCategory::Blog,
        LinkCategory::SizeGuide,
        LinkCategory::Help,
        LinkCategory::Shipping,
    ];
}

/// Per-field outcome marker distinguishing true absence from extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Ok,
    Partial,
    Failed,
}

/// A field outcome plus an optional human-readable reason for degradation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReport {
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FieldReport {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: FieldStatus::Ok,
            reason: None,
        }
    }

    #[must_use]
    pub fn partial(reason: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Partial,
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Failed,
            reason: Some(reason.into()),
        }
    }
}

/// One [`FieldReport`] slot per top-level field of [`StoreInsights`].
///
/// A closed struct rather than a string-keyed map so a missing slot is a
/// compile error, not a silent omission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldStatusReport {
    pub brand_info: FieldReport,
    pub product_catalog: FieldReport,
    pub hero_products: FieldReport,
    pub policies: FieldReport,
    pub faqs: FieldReport,
    pub social_handles: FieldReport,
    pub contact_info: FieldReport,
    pub important_links: FieldReport,
}

/// The root aggregate: one per extraction request, constructed fresh and
/// never mutated after assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInsights {
    pub website_url: String,
    pub brand_info: Option<BrandInfo>,
    pub product_catalog: Option<ProductCatalog>,
    pub policies: PolicySet,
    pub faqs: Vec<FaqEntry>,
    pub social_handles: BTreeMap<SocialPlatform, String>,
    pub contact_info: ContactInfo,
    pub important_links: BTreeMap<LinkCategory, String>,
    pub extracted_at: DateTime<Utc>,
    pub field_status: FieldStatusReport,
}

/// The JSON envelope handed to callers.
///
/// `success` is `true` whenever the storefront check passed, regardless of
/// how many secondary fields degraded — the field report carries the detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub success: bool,
    pub insights: StoreInsights,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str) -> ProductSummary {
        ProductSummary {
            id: id.to_string(),
            title: format!("Product {id}"),
            price: Some("10.00".to_string()),
            image_url: None,
            product_url: format!("https://shop.test/products/p{id}"),
        }
    }

    #[test]
    fn catalog_consistency_holds_for_hero_subset() {
        let catalog = ProductCatalog {
            total_count: 3,
            catalog: vec![product("1"), product("2"), product("3")],
            hero_products: vec![product("2"), product("3")],
        };
        assert!(catalog.is_internally_consistent());
    }

    #[test]
    fn catalog_consistency_fails_on_count_mismatch() {
        let catalog = ProductCatalog {
            total_count: 2,
            catalog: vec![product("1")],
            hero_products: vec![],
        };
        assert!(!catalog.is_internally_consistent());
    }

    #[test]
    fn catalog_consistency_fails_on_unknown_hero() {
        let catalog = ProductCatalog {
            total_count: 1,
            catalog: vec![product("1")],
            hero_products: vec![product("99")],
        };
        assert!(!catalog.is_internally_consistent());
    }

    #[test]
    fn policy_set_roundtrips_by_type() {
        let mut policies = PolicySet::default();
        policies.set(PolicyType::Return, "30-day returns".to_string());
        assert_eq!(policies.get(PolicyType::Return), Some("30-day returns"));
        assert_eq!(policies.get(PolicyType::Privacy), None);
        assert_eq!(policies.present_count(), 1);
    }

    #[test]
    fn social_platform_serializes_as_snake_case_map_key() {
        let mut handles = BTreeMap::new();
        handles.insert(SocialPlatform::Instagram, "drinkshop".to_string());
        let json = serde_json::to_value(&handles).unwrap();
        assert_eq!(json["instagram"], "drinkshop");
    }

    #[test]
    fn field_report_reason_omitted_when_ok() {
        let json = serde_json::to_value(FieldReport::ok()).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json.get("reason").is_none());
    }
}
