pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod client;
pub mod runner;
pub mod cli;

/*

prompt-runner: send one system/user prompt pair to an LLM provider
N times and keep every answer in its own timestamped file.

prompt-runner/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports, providers and model ids
│   ├── error.rs        # Custom error type
│   ├── config.rs       # Per-provider options (timeouts, keys, bases)
│   ├── client.rs       # ChatCompletion seam and provider dispatch
│   ├── providers/      # Provider-specific implementations
│   │   ├── mod.rs
│   │   └── openai_compat.rs
│   ├── request.rs      # Chat completion wire types
│   ├── runner.rs       # ask / name_output_file / run loop
│   ├── cli.rs          # Positional arguments and validation
│   └── main.rs
└── tests/

*/

pub use client::{ChatCompletion, Client};
pub use config::{ClientConfig, ProviderConfig};
pub use error::Error;
pub use runner::{name_output_file, name_output_file_at, PromptRunner, RunSettings, RunSummary};

/// PROVIDERS:

/// Enum representing the providers reachable through
/// an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider
{
  // ===== HOSTED PROVIDERS =====
  /// xAI (Grok models)
  Xai
  ,
  /// OpenAI (GPT models)
  OpenAI
  ,
  /// Mistral AI (Mistral models)
  MistralAi
  ,
  /// Groq (hosts Llama, Gemma, DeepSeek)
  Groq
  ,
  // ===== SELF-HOSTED/LOCAL =====
  /// Local Ollama server
  Ollama
}

impl Provider
{   pub const ALL: [Provider; 5] = [
      Provider::Xai
    , Provider::OpenAI
    , Provider::MistralAi
    , Provider::Groq
    , Provider::Ollama
    ];

    /// Prefix used in `provider:model` identifiers
    pub fn key(&self) -> &'static str
    {   match self
        {   Provider::Xai => "xai"
          , Provider::OpenAI => "openai"
          , Provider::MistralAi => "mistral"
          , Provider::Groq => "groq"
          , Provider::Ollama => "ollama"
        }
    }

    pub fn default_api_base(&self) -> &'static str
    {   match self
        {   Provider::Xai => "https://api.x.ai/v1"
          , Provider::OpenAI => "https://api.openai.com/v1"
          , Provider::MistralAi => "https://api.mistral.ai/v1"
          , Provider::Groq => "https://api.groq.com/openai/v1"
          , Provider::Ollama => "http://localhost:11434/v1"
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub fn default_api_key_env(&self) -> Option<&'static str>
    {   match self
        {   Provider::Xai => Some("XAI_API_KEY")
          , Provider::OpenAI => Some("OPENAI_API_KEY")
          , Provider::MistralAi => Some("MISTRAL_API_KEY")
          , Provider::Groq => Some("GROQ_API_KEY")
          , Provider::Ollama => None
        }
    }

    pub fn requires_api_key(&self) -> bool
    {   self.default_api_key_env().is_some()
    }
}

impl std::fmt::Display for Provider
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.key())
    }
}

impl std::str::FromStr for Provider
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   Provider::ALL
          .iter()
          .copied()
          .find(|p| p.key() == s)
          .ok_or_else(|| crate::error::Error::UnknownProvider(s.to_string()))
    }
}

/// A `provider:model` identifier split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId
{   pub provider: Provider
  , pub model: String
}

impl ModelId
{   /// Split on the first colon; the rest (colons included)
    /// is the provider-local model name.
    pub fn parse(id: &str) -> Result<Self, crate::error::Error>
    {   let (provider, model) = id
          .split_once(':')
          .ok_or_else(|| crate::error::Error::InvalidModel(id.to_string()))?;
        if model.is_empty()
        {   return Err(crate::error::Error::InvalidModel(id.to_string()));
        }
        Ok(ModelId
        {   provider: provider.parse()?
          , model: model.to_string()
        })
    }
}
