//! LLM provider implementations

pub mod openai_compat;

// Re-export for convenience
pub use openai_compat::OpenAiCompatClient;
