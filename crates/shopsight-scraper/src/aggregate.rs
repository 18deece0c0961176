//! Pipeline orchestration: one storefront URL in, one insight report out.
//!
//! Two hard gates run up front: URL normalization and the catalog read. A
//! target that fails either is rejected with a typed error. Everything after
//! the gates is best-effort: secondary pages are fetched through a bounded
//! concurrent runner, each task capped by the global deadline, and a failed
//! task degrades its own field in the status report without touching the
//! others.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use shopsight_core::{
    AppConfig, BrandInfo, ContactInfo, ExtractionReport, FaqEntry, FieldReport, FieldStatusReport,
    PolicySet, PolicyType, ProductCatalog, StoreInsights,
};
use tokio::time::{timeout_at, Duration, Instant};

use crate::catalog::{detect_hero_products, policy_type_for_handle, read_catalog, read_pages_feed};
use crate::client::StoreClient;
use crate::discover::{candidate_pages, PageCategory};
use crate::error::ExtractError;
use crate::extract::brand::extract_brand;
use crate::extract::contact::extract_contact_info;
use crate::extract::faq::{extract_faqs, FaqOutcome};
use crate::extract::links::extract_important_links;
use crate::extract::policy::extract_policy_text;
use crate::extract::social::extract_social_handles;
use crate::extract::Confidence;
use crate::llm::{SchemaSpec, Structurer};
use crate::normalize::normalize_store_url;

/// Upper bound on candidate URLs fetched per secondary field.
const MAX_CANDIDATE_FETCHES: usize = 4;

/// Raw text handed to the structuring model is clipped to keep prompts bounded.
const MAX_STRUCTURING_INPUT_LEN: usize = 6000;

type BoxedTask<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one secondary-field task.
enum TaskOutcome {
    Policy {
        kind: PolicyType,
        text: Option<String>,
        degraded: Option<String>,
    },
    Faqs {
        entries: Vec<FaqEntry>,
        report: FieldReport,
    },
    Contact {
        info: ContactInfo,
        report: FieldReport,
    },
}

/// Runs the full extraction pipeline against `raw_url`.
///
/// `structurer` is optional: without one, low-confidence candidates are kept
/// as raw text (policies) or dropped (FAQ pairs, brand description) and the
/// affected fields are marked partial.
///
/// # Errors
///
/// - [`ExtractError::InvalidUrl`] — the input cannot be normalized.
/// - [`ExtractError::NotAStorefront`] — the products feed is missing or
///   malformed on its first page.
/// - Transport errors from the first catalog page, after retries.
///
/// No other failure aborts the pipeline; secondary degradation lands in the
/// per-field status report instead.
pub async fn extract_store_insights(
    client: &StoreClient,
    structurer: Option<&Structurer>,
    config: &AppConfig,
    raw_url: &str,
) -> Result<ExtractionReport, ExtractError> {
    let website_url = normalize_store_url(raw_url)?;
    let deadline = Instant::now() + Duration::from_secs(config.global_deadline_secs);
    tracing::info!(url = %website_url, "starting storefront extraction");

    // Gate: the catalog read doubles as the storefront check.
    let catalog_read = read_catalog(
        client,
        &website_url,
        config.catalog_page_limit,
        config.max_catalog_pages,
    )
    .await?;
    let catalog_report = match &catalog_read.truncated {
        Some(reason) => FieldReport::partial(reason.clone()),
        None => FieldReport::ok(),
    };

    // Everything from here on is best-effort.
    let homepage = match timeout_at(deadline, client.fetch_text(&website_url)).await {
        Ok(Ok(html)) => Some(html),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "homepage fetch failed, continuing without it");
            None
        }
        Err(_) => {
            tracing::warn!("global deadline hit before homepage fetch completed");
            None
        }
    };

    let (hero_products, hero_report) = match homepage.as_deref() {
        Some(html) => (
            detect_hero_products(html, &catalog_read.products),
            FieldReport::ok(),
        ),
        None => (Vec::new(), FieldReport::partial("homepage unreachable")),
    };
    let product_catalog = ProductCatalog {
        total_count: catalog_read.products.len(),
        catalog: catalog_read.products,
        hero_products,
    };

    // Policy pre-pass over the public pages feed: pre-rendered bodies, no
    // crawling. Only structural extractions are accepted here.
    let mut policies = PolicySet::default();
    match timeout_at(deadline, read_pages_feed(client, &website_url)).await {
        Ok(Ok(pages)) => {
            for page in pages {
                let Some(kind) = policy_type_for_handle(&page.handle) else {
                    continue;
                };
                if policies.get(kind).is_some() {
                    continue;
                }
                let Some(body) = page.body_html.as_deref() else {
                    continue;
                };
                if let Some(candidate) = extract_policy_text(body) {
                    if candidate.confidence == Confidence::Structural {
                        tracing::debug!(%kind, handle = %page.handle, "policy taken from pages feed");
                        policies.set(kind, candidate.text);
                    }
                }
            }
        }
        Ok(Err(e)) => tracing::debug!(error = %e, "pages feed unavailable, falling back to discovery"),
        Err(_) => tracing::warn!("global deadline hit before pages feed completed"),
    }

    // Secondary-field tasks, run through the bounded concurrent runner. Each
    // task is individually capped by the global deadline so a slow store
    // degrades fields instead of hanging the request.
    let mut tasks: Vec<BoxedTask<'_, TaskOutcome>> = Vec::new();
    for kind in PolicyType::ALL {
        if policies.get(kind).is_some() {
            continue;
        }
        let candidates = candidate_pages(
            homepage.as_deref(),
            &website_url,
            PageCategory::Policy(kind),
        );
        tasks.push(guarded(
            deadline,
            TaskOutcome::Policy {
                kind,
                text: None,
                degraded: Some(format!("{kind} policy: global deadline exceeded")),
            },
            Box::pin(policy_task(client, structurer, kind, candidates)),
        ));
    }
    tasks.push(guarded(
        deadline,
        TaskOutcome::Faqs {
            entries: Vec::new(),
            report: FieldReport::failed("global deadline exceeded"),
        },
        Box::pin(faq_task(
            client,
            structurer,
            candidate_pages(homepage.as_deref(), &website_url, PageCategory::Faq),
        )),
    ));
    tasks.push(guarded(
        deadline,
        TaskOutcome::Contact {
            info: ContactInfo::default(),
            report: FieldReport::failed("global deadline exceeded"),
        },
        Box::pin(contact_task(
            client,
            homepage.clone(),
            candidate_pages(homepage.as_deref(), &website_url, PageCategory::Contact),
        )),
    ));

    let outcomes = run_bounded(tasks, config.fetch_concurrency).await;

    let mut policy_degradations: Vec<String> = Vec::new();
    let mut faqs = Vec::new();
    let mut faq_report = FieldReport::failed("faq task did not run");
    let mut contact_info = ContactInfo::default();
    let mut contact_report = FieldReport::failed("contact task did not run");
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Policy {
                kind,
                text,
                degraded,
            } => {
                if let Some(text) = text {
                    policies.set(kind, text);
                }
                if let Some(reason) = degraded {
                    policy_degradations.push(reason);
                }
            }
            TaskOutcome::Faqs { entries, report } => {
                faqs = entries;
                faq_report = report;
            }
            TaskOutcome::Contact { info, report } => {
                contact_info = info;
                contact_report = report;
            }
        }
    }

    policy_degradations.sort();
    let policies_report = if policy_degradations.is_empty() {
        if policies.present_count() > 0 {
            FieldReport::ok()
        } else {
            FieldReport::failed("no policy pages found")
        }
    } else {
        FieldReport::partial(policy_degradations.join("; "))
    };

    // Homepage-local fields.
    let (brand_info, brand_report) =
        brand_field(homepage.as_deref(), structurer, &website_url, deadline).await;
    let (social_handles, social_report) = match homepage.as_deref() {
        Some(html) => (extract_social_handles(html), FieldReport::ok()),
        None => (BTreeMap::new(), FieldReport::failed("homepage unreachable")),
    };
    let (important_links, links_report) = match homepage.as_deref() {
        Some(html) => (
            extract_important_links(html, &website_url),
            FieldReport::ok(),
        ),
        None => (BTreeMap::new(), FieldReport::failed("homepage unreachable")),
    };

    let insights = StoreInsights {
        website_url,
        brand_info,
        product_catalog: Some(product_catalog),
        policies,
        faqs,
        social_handles,
        contact_info,
        important_links,
        extracted_at: Utc::now(),
        field_status: FieldStatusReport {
            brand_info: brand_report,
            product_catalog: catalog_report,
            hero_products: hero_report,
            policies: policies_report,
            faqs: faq_report,
            social_handles: social_report,
            contact_info: contact_report,
            important_links: links_report,
        },
    };
    tracing::info!(
        url = %insights.website_url,
        products = insights.product_catalog.as_ref().map_or(0, |c| c.total_count),
        policies = insights.policies.present_count(),
        faqs = insights.faqs.len(),
        "extraction complete"
    );

    // The storefront gate passed, so the request as a whole succeeded no
    // matter how many secondary fields degraded.
    Ok(ExtractionReport {
        success: true,
        insights,
    })
}

/// Runs boxed tasks with at most `cap` in flight at once, collecting results
/// in completion order.
async fn run_bounded<'a, T>(tasks: Vec<BoxedTask<'a, T>>, cap: usize) -> Vec<T> {
    stream::iter(tasks).buffer_unordered(cap.max(1)).collect().await
}

/// Caps a task with the global deadline, substituting `fallback` on expiry.
fn guarded<'a, T: Send + 'a>(
    deadline: Instant,
    fallback: T,
    task: BoxedTask<'a, T>,
) -> BoxedTask<'a, T> {
    Box::pin(async move {
        match timeout_at(deadline, task).await {
            Ok(outcome) => outcome,
            Err(_) => fallback,
        }
    })
}

/// Fetches policy candidates for `kind` until one yields text. Structural
/// extractions are taken as-is; raw fallbacks go through the structuring
/// model when one is configured.
async fn policy_task(
    client: &StoreClient,
    structurer: Option<&Structurer>,
    kind: PolicyType,
    candidates: Vec<String>,
) -> TaskOutcome {
    let mut degraded = None;
    for url in candidates.iter().take(MAX_CANDIDATE_FETCHES) {
        let html = match client.fetch_text(url).await {
            Ok(html) => html,
            // A missing well-known path is ordinary absence, not degradation.
            Err(ExtractError::NotFound { .. }) => continue,
            Err(e) => {
                tracing::debug!(%kind, url, error = %e, "policy candidate unreachable");
                degraded = Some(format!("{kind} policy candidate unreachable"));
                continue;
            }
        };
        let Some(candidate) = extract_policy_text(&html) else {
            continue;
        };
        return match candidate.confidence {
            Confidence::Structural => TaskOutcome::Policy {
                kind,
                text: Some(candidate.text),
                degraded: None,
            },
            Confidence::RawFallback => {
                let (text, degraded) = structure_policy(structurer, kind, candidate.text).await;
                TaskOutcome::Policy {
                    kind,
                    text: Some(text),
                    degraded,
                }
            }
        };
    }
    TaskOutcome::Policy {
        kind,
        text: None,
        degraded,
    }
}

/// Structures a low-confidence policy candidate. The raw text is kept (with
/// a degradation note) when no model is configured or structuring fails.
async fn structure_policy(
    structurer: Option<&Structurer>,
    kind: PolicyType,
    raw: String,
) -> (String, Option<String>) {
    let Some(structurer) = structurer else {
        return (
            raw,
            Some(format!("{kind} policy kept as raw text, no structuring model configured")),
        );
    };
    match structurer
        .structure(clip(&raw, MAX_STRUCTURING_INPUT_LEN), &SchemaSpec::policy_text())
        .await
    {
        Ok(value) => match value.get("policy_text").and_then(|v| v.as_str()) {
            Some(text) if !text.trim().is_empty() => (text.to_owned(), None),
            _ => (
                raw,
                Some(format!("{kind} policy structuring returned empty text")),
            ),
        },
        Err(e) => {
            tracing::warn!(%kind, error = %e, "policy structuring failed, keeping raw text");
            (raw, Some(format!("{kind} policy structuring failed")))
        }
    }
}

/// Fetches FAQ candidates. The first structural hit wins; otherwise the first
/// non-empty raw text goes through the structuring model.
async fn faq_task(
    client: &StoreClient,
    structurer: Option<&Structurer>,
    candidates: Vec<String>,
) -> TaskOutcome {
    let mut raw_fallback: Option<String> = None;
    let mut degraded = false;
    for url in candidates.iter().take(MAX_CANDIDATE_FETCHES) {
        let html = match client.fetch_text(url).await {
            Ok(html) => html,
            Err(ExtractError::NotFound { .. }) => continue,
            Err(e) => {
                tracing::debug!(url, error = %e, "faq candidate unreachable");
                degraded = true;
                continue;
            }
        };
        match extract_faqs(&html) {
            FaqOutcome::Structured(entries) => {
                let entries: Vec<FaqEntry> = entries
                    .into_iter()
                    .filter(|e| !e.question.trim().is_empty() && !e.answer.trim().is_empty())
                    .collect();
                return TaskOutcome::Faqs {
                    entries,
                    report: FieldReport::ok(),
                };
            }
            FaqOutcome::RawText(text) => {
                if raw_fallback.is_none() && !text.trim().is_empty() {
                    raw_fallback = Some(text);
                }
            }
        }
    }

    if let Some(raw) = raw_fallback {
        let Some(structurer) = structurer else {
            return TaskOutcome::Faqs {
                entries: Vec::new(),
                report: FieldReport::failed(
                    "faq page needs structuring, no structuring model configured",
                ),
            };
        };
        return match structurer
            .structure(clip(&raw, MAX_STRUCTURING_INPUT_LEN), &SchemaSpec::faq_list())
            .await
        {
            Ok(value) => TaskOutcome::Faqs {
                entries: faq_entries_from_reply(&value),
                report: FieldReport::ok(),
            },
            Err(e) => {
                // No heuristic pairs to fall back on, so the field carries no data.
                tracing::warn!(error = %e, "faq structuring failed");
                TaskOutcome::Faqs {
                    entries: Vec::new(),
                    report: FieldReport::failed("faq structuring failed"),
                }
            }
        };
    }

    TaskOutcome::Faqs {
        entries: Vec::new(),
        report: if degraded {
            FieldReport::partial("faq candidates unreachable")
        } else {
            FieldReport::failed("no faq page found")
        },
    }
}

/// Converts a validated faq-list reply into entries, dropping empty sides.
fn faq_entries_from_reply(value: &serde_json::Value) -> Vec<FaqEntry> {
    value
        .get("faqs")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let question = item.get("question")?.as_str()?.trim();
                    let answer = item.get("answer")?.as_str()?.trim();
                    if question.is_empty() || answer.is_empty() {
                        return None;
                    }
                    Some(FaqEntry {
                        question: question.to_owned(),
                        answer: answer.to_owned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Merges contact details from the homepage with the first reachable contact
/// candidate page.
async fn contact_task(
    client: &StoreClient,
    homepage: Option<String>,
    candidates: Vec<String>,
) -> TaskOutcome {
    let mut info = homepage
        .as_deref()
        .map(extract_contact_info)
        .unwrap_or_default();
    let mut degraded = false;
    for url in candidates.iter().take(2) {
        match client.fetch_text(url).await {
            Ok(html) => {
                let found = extract_contact_info(&html);
                info.emails.extend(found.emails);
                info.phones.extend(found.phones);
                break;
            }
            Err(ExtractError::NotFound { .. }) => continue,
            Err(e) => {
                tracing::debug!(url, error = %e, "contact candidate unreachable");
                degraded = true;
            }
        }
    }
    TaskOutcome::Contact {
        info,
        report: if degraded {
            FieldReport::partial("contact page unreachable")
        } else {
            FieldReport::ok()
        },
    }
}

/// Assembles brand info from homepage signals, condensing raw about-text
/// through the structuring model when the metas gave no description.
async fn brand_field(
    homepage: Option<&str>,
    structurer: Option<&Structurer>,
    website_url: &str,
    deadline: Instant,
) -> (Option<BrandInfo>, FieldReport) {
    let Some(html) = homepage else {
        return (None, FieldReport::failed("homepage unreachable"));
    };
    let candidate = extract_brand(html);
    let mut report = FieldReport::ok();
    let mut description = candidate.description;

    if description.is_none() {
        if let (Some(about), Some(structurer)) = (candidate.about_text.as_deref(), structurer) {
            match timeout_at(
                deadline,
                structurer.structure(about, &SchemaSpec::brand_description()),
            )
            .await
            {
                Ok(Ok(value)) => {
                    description = value
                        .get("description")
                        .and_then(|v| v.as_str())
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned);
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "brand description structuring failed");
                    report = FieldReport::partial("brand description structuring failed");
                }
                Err(_) => report = FieldReport::partial("global deadline exceeded"),
            }
        }
    }

    match candidate.name {
        Some(name) => (
            Some(BrandInfo {
                name,
                description,
                website_url: website_url.to_owned(),
            }),
            report,
        ),
        None => (None, FieldReport::partial("no brand name found on homepage")),
    }
}

/// Clips text to at most `max` bytes on a char boundary.
fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
