//! Configuration for chat completion providers

use serde::{Deserialize, Serialize};
use std::path::Path;
use log::debug;

/// Env var naming an optional JSON config file
pub const CONFIG_PATH_ENV: &str = "PROMPT_RUNNER_CONFIG";
/// Env var with the root URL of a local Ollama server
pub const OLLAMA_URL_ENV: &str = "OLLAMA_API_URL";

/// Timeout for the local inference backend, in seconds
pub const OLLAMA_TIMEOUT_SECS: u64 = 6000;
/// Timeout for the remote hosted provider, in seconds
pub const XAI_TIMEOUT_SECS: u64 = 600;

/// Provider configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Provider name (`ollama`, `xai`, ...)
    pub name: String
  , /// API base URL (if custom)
    #[serde(default)]
    pub api_base: Option<String>
  , /// Environment variable to read the API key from
    #[serde(default)]
    pub api_key_env: Option<String>
  , /// Literal API key, takes precedence over `api_key_env`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>
  , /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>
}

impl ProviderConfig
{   pub fn new(name: impl Into<String>) -> Self
    {   ProviderConfig
        {   name: name.into()
          , ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self
    {   self.timeout_secs = Some(secs);
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self
    {   self.api_base = Some(base.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    /// Overlay every field set in `other`
    pub fn merge(&mut self, other: ProviderConfig)
    {   if other.api_base.is_some()
        {   self.api_base = other.api_base;
        }
        if other.api_key_env.is_some()
        {   self.api_key_env = other.api_key_env;
        }
        if other.api_key.is_some()
        {   self.api_key = other.api_key;
        }
        if other.timeout_secs.is_some()
        {   self.timeout_secs = other.timeout_secs;
        }
    }

    /// Literal key first, then the configured env var
    pub fn resolve_api_key(&self) -> Option<String>
    {   self.api_key.clone().or_else(|| {
          self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
        })
    }
}

/// Client configuration, one entry per provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig
{   /// Provider configurations
    #[serde(default)]
    pub providers: Vec<ProviderConfig>
}

impl Default for ClientConfig
{   fn default() -> Self
    {   let providers = crate::Provider::ALL
          .iter()
          .map(|p| {
            let timeout_secs = match p
            {   crate::Provider::Ollama => Some(OLLAMA_TIMEOUT_SECS)
              , crate::Provider::Xai => Some(XAI_TIMEOUT_SECS)
              , _ => None
            };
            ProviderConfig
            {   name: p.key().to_string()
              , api_base: Some(p.default_api_base().to_string())
              , api_key_env: p.default_api_key_env().map(str::to_string)
              , api_key: None
              , timeout_secs
            }
          })
          .collect();
        ClientConfig { providers }
    }
}

impl ClientConfig
{   /// Built-in defaults plus the file and URL overrides from the environment
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   let path = std::env::var_os(CONFIG_PATH_ENV);
        let ollama_url = std::env::var(OLLAMA_URL_ENV).ok();
        Self::from_sources(
          path.as_deref().map(Path::new),
          ollama_url.as_deref()
        )
    }

    pub fn from_sources(
      config_path: Option<&Path>
    , ollama_url: Option<&str>
    ) -> Result<Self, crate::error::Error>
    {   let mut config = ClientConfig::default();
        if let Some(path) = config_path
        {   let file = Self::load(path)?;
            config.merge(file.providers);
        }
        if let Some(url) = ollama_url.filter(|u| !u.is_empty())
        {   debug!("Using Ollama server at {}", url);
            config.merge(vec![
              ProviderConfig::new("ollama")
                .with_api_base(format!("{}/v1", url.trim_end_matches('/')))
            ]);
        }
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self, crate::error::Error>
    {   debug!("Loading client config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })?;
        serde_json::from_str(&text).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })
    }

    /// Merge per-provider options by name
    pub fn merge(&mut self, overrides: Vec<ProviderConfig>)
    {   for o in overrides
        {   match self.providers.iter_mut().find(|p| p.name == o.name)
            {   Some(existing) => existing.merge(o)
              , None => self.providers.push(o)
            }
        }
    }

    pub fn get(&self, provider: crate::Provider) -> Option<&ProviderConfig>
    {   self.providers.iter().find(|p| p.name == provider.key())
    }

    /// Every entry must name a known provider
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   for p in &self.providers
        {   p.name.parse::<crate::Provider>().map_err(|_| {
              crate::error::Error::InvalidConfiguration(
                format!("unknown provider '{}'", p.name)
              )
            })?;
            if p.timeout_secs == Some(0)
            {   return Err(crate::error::Error::InvalidConfiguration(
                  format!("timeout for '{}' must be positive", p.name)
                ));
            }
        }
        Ok(())
    }
}
