#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub catalog_page_limit: u32,
    pub max_catalog_pages: usize,
    pub fetch_concurrency: usize,
    pub llm_concurrency: usize,
    pub llm_max_retries: u32,
    pub global_deadline_secs: u64,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("catalog_page_limit", &self.catalog_page_limit)
            .field("max_catalog_pages", &self.max_catalog_pages)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("llm_concurrency", &self.llm_concurrency)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("global_deadline_secs", &self.global_deadline_secs)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_model", &self.openai_model)
            .finish()
    }
}
