//! Structuring fallback: language-model conversion of unstructured text
//! into schema-conformant JSON.
//!
//! The model is an opaque capability behind [`StructuringModel`] — one
//! prompt in, one reply out — so tests script it and the pipeline never
//! depends on a provider's wire format beyond that contract. Replies are
//! never trusted: every one is parsed and validated against the target
//! schema, with a bounded corrective-retry loop. Exhausting retries fails
//! only the field being structured, never the request.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::error::ExtractError;

/// An opaque text-completion capability. Implementations must return the
/// model's raw reply text; parsing and validation happen in [`Structurer`].
#[async_trait]
pub trait StructuringModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractError>;
}

/// Expected JSON type of a schema field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    /// Array of objects, each carrying the named string fields.
    ObjectArray { item_fields: &'static [&'static str] },
}

/// A target schema: the required top-level fields and a prose description
/// embedded in the prompt.
#[derive(Debug, Clone)]
pub struct SchemaSpec {
    /// Short name used in error messages ("faq list", "brand description").
    pub name: &'static str,
    /// JSON shape description shown to the model.
    pub description: &'static str,
    pub fields: &'static [(&'static str, FieldKind)],
}

impl SchemaSpec {
    #[must_use]
    pub fn faq_list() -> Self {
        Self {
            name: "faq list",
            description: r#"{"faqs": [{"question": "<question text>", "answer": "<answer text>"}]}"#,
            fields: &[(
                "faqs",
                FieldKind::ObjectArray {
                    item_fields: &["question", "answer"],
                },
            )],
        }
    }

    #[must_use]
    pub fn brand_description() -> Self {
        Self {
            name: "brand description",
            description: r#"{"description": "<one- or two-sentence factual brand description>"}"#,
            fields: &[("description", FieldKind::String)],
        }
    }

    #[must_use]
    pub fn policy_text() -> Self {
        Self {
            name: "policy text",
            description: r#"{"policy_text": "<the policy body as plain text>"}"#,
            fields: &[("policy_text", FieldKind::String)],
        }
    }
}

/// Validates a model reply against the schema: required keys present, types
/// conform. Returns the violation as prose for the corrective follow-up.
fn validate(value: &Value, schema: &SchemaSpec) -> Result<(), String> {
    let Some(obj) = value.as_object() else {
        return Err("reply is not a JSON object".to_owned());
    };
    for (field, kind) in schema.fields {
        let Some(v) = obj.get(*field) else {
            return Err(format!("required key {field:?} is missing"));
        };
        match kind {
            FieldKind::String => {
                if !v.is_string() {
                    return Err(format!("key {field:?} must be a string"));
                }
            }
            FieldKind::ObjectArray { item_fields } => {
                let Some(items) = v.as_array() else {
                    return Err(format!("key {field:?} must be an array"));
                };
                for (idx, item) in items.iter().enumerate() {
                    for inner in *item_fields {
                        if !item.get(*inner).is_some_and(Value::is_string) {
                            return Err(format!(
                                "item {idx} of {field:?} must carry string key {inner:?}"
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Strips markdown code fences some models wrap around JSON replies.
fn strip_code_fences(reply: &str) -> &str {
    reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Drives the structuring loop: prompt, parse, validate, corrective retry.
///
/// Holds its own concurrency cap, independent of the page-fetch cap — the
/// external capability usually has the stricter rate limit.
pub struct Structurer {
    model: Arc<dyn StructuringModel>,
    permits: Arc<Semaphore>,
    max_retries: u32,
}

impl Structurer {
    #[must_use]
    pub fn new(model: Arc<dyn StructuringModel>, llm_concurrency: usize, max_retries: u32) -> Self {
        Self {
            model,
            permits: Arc::new(Semaphore::new(llm_concurrency.max(1))),
            max_retries,
        }
    }

    /// Converts `raw_text` into JSON conforming to `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::StructuringFailed`] after `max_retries`
    /// corrective attempts beyond the first, or the transport error if the
    /// capability itself fails. Callers degrade the field on any error.
    pub async fn structure(
        &self,
        raw_text: &str,
        schema: &SchemaSpec,
    ) -> Result<Value, ExtractError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ExtractError::Internal(format!("LLM semaphore closed: {e}")))?;

        let mut prompt = initial_prompt(raw_text, schema);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let reply = self.model.complete(&prompt).await?;
            match serde_json::from_str::<Value>(strip_code_fences(&reply)) {
                Ok(value) => match validate(&value, schema) {
                    Ok(()) => return Ok(value),
                    Err(violation) => {
                        if attempts > self.max_retries {
                            break;
                        }
                        tracing::debug!(schema = schema.name, %violation, "reply failed validation, retrying");
                        prompt = corrective_prompt(raw_text, schema, &reply, &violation);
                    }
                },
                Err(e) => {
                    if attempts > self.max_retries {
                        break;
                    }
                    tracing::debug!(schema = schema.name, error = %e, "reply was not JSON, retrying");
                    prompt = corrective_prompt(raw_text, schema, &reply, &format!("not valid JSON: {e}"));
                }
            }
        }

        Err(ExtractError::StructuringFailed {
            context: schema.name.to_owned(),
            attempts,
        })
    }
}

fn initial_prompt(raw_text: &str, schema: &SchemaSpec) -> String {
    format!(
        "Extract the {name} from the storefront page text below.\n\
         Return ONLY a JSON object matching exactly this shape:\n{shape}\n\
         Do not invent content that is not present in the text.\n\n\
         Page text:\n{raw_text}",
        name = schema.name,
        shape = schema.description,
    )
}

fn corrective_prompt(raw_text: &str, schema: &SchemaSpec, bad_reply: &str, violation: &str) -> String {
    format!(
        "Your previous reply was rejected: {violation}.\n\
         Previous reply:\n{bad_reply}\n\n\
         Reply again with ONLY a JSON object matching exactly this shape:\n{shape}\n\n\
         Page text:\n{raw_text}",
        shape = schema.description,
    )
}

/// Production [`StructuringModel`] backed by the OpenAI chat-completions
/// API in JSON mode.
pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiModel {
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl StructuringModel for OpenAiModel {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": "You convert storefront page text into strict JSON. Reply with JSON only."
                },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.1
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::UnexpectedStatus {
                status: status.as_u16(),
                url: "https://api.openai.com/v1/chat/completions".to_owned(),
            });
        }

        let reply: Value = response.json().await?;
        reply
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                ExtractError::Internal("chat completion reply carried no message content".to_owned())
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted model: pops replies in order and records received prompts.
    struct FakeModel {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn scripted(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(ToString::to_string).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StructuringModel for FakeModel {
        async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ExtractError::Internal("fake model ran out of replies".to_owned()))
        }
    }

    #[tokio::test]
    async fn valid_reply_passes_on_first_attempt() {
        let model = FakeModel::scripted(&[r#"{"description": "Small-batch candles."}"#]);
        let structurer = Structurer::new(model.clone(), 2, 2);
        let value = structurer
            .structure("about text", &SchemaSpec::brand_description())
            .await
            .unwrap();
        assert_eq!(value["description"], "Small-batch candles.");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn fenced_reply_is_unwrapped() {
        let model = FakeModel::scripted(&["```json\n{\"description\": \"Fine goods.\"}\n```"]);
        let structurer = Structurer::new(model.clone(), 2, 0);
        let value = structurer
            .structure("about text", &SchemaSpec::brand_description())
            .await
            .unwrap();
        assert_eq!(value["description"], "Fine goods.");
    }

    #[tokio::test]
    async fn malformed_reply_triggers_corrective_retry() {
        let model = FakeModel::scripted(&[
            "this is not json",
            r#"{"faqs": [{"question": "Q?", "answer": "A."}]}"#,
        ]);
        let structurer = Structurer::new(model.clone(), 2, 2);
        let value = structurer
            .structure("page text", &SchemaSpec::faq_list())
            .await
            .unwrap();
        assert_eq!(value["faqs"][0]["question"], "Q?");
        assert_eq!(model.calls(), 2);
        let prompts = model.prompts.lock().unwrap();
        assert!(
            prompts[1].contains("rejected"),
            "second prompt should be corrective, got: {}",
            prompts[1]
        );
    }

    #[tokio::test]
    async fn schema_violation_triggers_corrective_retry() {
        let model = FakeModel::scripted(&[
            r#"{"faqs": "not an array"}"#,
            r#"{"faqs": []}"#,
        ]);
        let structurer = Structurer::new(model.clone(), 2, 1);
        let value = structurer
            .structure("page text", &SchemaSpec::faq_list())
            .await
            .unwrap();
        assert!(value["faqs"].as_array().unwrap().is_empty());
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn exhausting_retries_fails_with_structuring_failed() {
        let model = FakeModel::scripted(&["nope", "still nope", "never json"]);
        let structurer = Structurer::new(model.clone(), 2, 2);
        let err = structurer
            .structure("page text", &SchemaSpec::brand_description())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ExtractError::StructuringFailed { attempts: 3, .. }),
            "got: {err:?}"
        );
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn transport_error_propagates_immediately() {
        // Empty script: first call errors.
        let model = FakeModel::scripted(&[]);
        let structurer = Structurer::new(model.clone(), 2, 5);
        let err = structurer
            .structure("page text", &SchemaSpec::brand_description())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Internal(_)));
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn validate_rejects_missing_and_mistyped_keys() {
        let schema = SchemaSpec::faq_list();
        assert!(validate(&json!({"faqs": []}), &schema).is_ok());
        assert!(validate(&json!({}), &schema).is_err());
        assert!(validate(&json!({"faqs": 3}), &schema).is_err());
        assert!(validate(&json!({"faqs": [{"question": "q"}]}), &schema).is_err());
        assert!(validate(&json!([1, 2]), &schema).is_err());
    }
}
