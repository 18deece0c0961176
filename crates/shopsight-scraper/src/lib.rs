pub mod aggregate;
pub mod catalog;
pub mod client;
pub mod discover;
pub mod error;
pub mod extract;
pub mod llm;
pub mod normalize;
mod rate_limit;

pub use aggregate::extract_store_insights;
pub use client::StoreClient;
pub use error::ExtractError;
pub use llm::{OpenAiModel, SchemaSpec, Structurer, StructuringModel};
pub use normalize::normalize_store_url;
