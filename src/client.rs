use std::collections::HashMap;
use async_trait::async_trait;
use log::{debug, info};

use crate::request::{CompletionRequest, CompletionResponse};

/// The chat completion capability the runner depends on
#[async_trait]
pub trait ChatCompletion: Send + Sync
{   async fn create(
      &self
    , request: CompletionRequest
    ) -> Result<CompletionResponse, crate::error::Error>;
}

/// Routes `provider:model` requests to per-provider HTTP clients
pub struct Client
{   config: crate::config::ClientConfig
  , providers: HashMap<crate::Provider, crate::providers::OpenAiCompatClient>
}

impl Client
{   /// Build a client with every configured provider ready to use
    pub fn new(
      config: crate::config::ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Initializing Client");
        let mut client = Client
        {   config: crate::config::ClientConfig { providers: vec![] }
          , providers: HashMap::new()
        };
        client.configure(config.providers)?;
        Ok(client)
    }

    /// Merge per-provider options and rebuild the affected providers
    pub fn configure(
      &mut self
    , overrides: Vec<crate::config::ProviderConfig>
    ) -> Result<(), crate::error::Error>
    {   let names: Vec<String>
          = overrides.iter().map(|o| o.name.clone()).collect();
        let mut next = self.config.clone();
        next.merge(overrides);
        next.validate()?;

        for name in names
        {   let provider: crate::Provider = name.parse()?;
            if let Some(cfg) = next.get(provider)
            {   let http = crate::providers::OpenAiCompatClient::new(
                  provider, cfg
                )?;
                self.providers.insert(provider, http);
            }
        }
        self.config = next;
        info!("Configured {} provider(s)", self.providers.len());
        Ok(())
    }

    pub fn config(&self) -> &crate::config::ClientConfig
    {   &self.config
    }
}

#[async_trait]
impl ChatCompletion for Client
{   async fn create(
      &self
    , request: CompletionRequest
    ) -> Result<CompletionResponse, crate::error::Error>
    {   let id = crate::ModelId::parse(&request.model)?;
        let provider = self.providers
          .get(&id.provider)
          .ok_or_else(|| crate::error::Error::InvalidConfiguration(
            format!("provider '{}' is not configured", id.provider)
          ))?;
        provider.send_chat(&id.model, &request).await
    }
}
